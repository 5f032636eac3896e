//! File-per-entry storage for cached artifacts

use crate::key::CacheKey;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tokio::fs;
use tracing::{debug, warn};
use uuid::Uuid;

/// A cached entry as seen by a directory scan
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreEntry {
    pub key: CacheKey,
    pub size: u64,
    pub modified: SystemTime,
}

/// Maps cache keys to files directly under a root directory.
///
/// The directory listing is the only index. Writes are published by renaming
/// a fully written temp file over the key's path, so readers never observe a
/// partial entry.
#[derive(Debug, Clone)]
pub struct DiskStore {
    root: PathBuf,
}

impl DiskStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of the file holding `key`
    pub fn path_for(&self, key: &CacheKey) -> PathBuf {
        self.root.join(key.file_name())
    }

    fn temp_path_for(&self, key: &CacheKey) -> PathBuf {
        // Leading dot keeps in-progress writes out of `list`
        self.root
            .join(format!(".{}.{}.tmp", key.file_name(), Uuid::new_v4().simple()))
    }

    /// Store `data` under `key`, replacing any previous entry
    pub async fn put(&self, key: &CacheKey, data: &[u8]) -> std::io::Result<()> {
        let tmp = self.temp_path_for(key);

        if let Err(e) = fs::write(&tmp, data).await {
            let _ = fs::remove_file(&tmp).await;
            return Err(e);
        }

        if let Err(e) = fs::rename(&tmp, self.path_for(key)).await {
            let _ = fs::remove_file(&tmp).await;
            return Err(e);
        }

        debug!(key = %key, size = data.len(), "Stored disk cache entry");
        Ok(())
    }

    /// Read the entry for `key`. Absence is `Ok(None)`, not an error.
    pub async fn get(&self, key: &CacheKey) -> std::io::Result<Option<Vec<u8>>> {
        match fs::read(self.path_for(key)).await {
            Ok(data) => Ok(Some(data)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Enumerate all entries. Order is unspecified.
    pub async fn list(&self) -> std::io::Result<Vec<StoreEntry>> {
        let mut entries = Vec::new();
        let mut dir = fs::read_dir(&self.root).await?;

        while let Some(dirent) = dir.next_entry().await? {
            let name = dirent.file_name();
            let Some(name) = name.to_str() else {
                continue;
            };
            if name.starts_with('.') {
                continue;
            }
            let Some(key) = CacheKey::from_file_name(name) else {
                warn!(file = name, "Skipping unrecognized file in disk cache");
                continue;
            };

            let metadata = match dirent.metadata().await {
                Ok(m) => m,
                // Deleted between readdir and stat
                Err(e) if e.kind() == ErrorKind::NotFound => continue,
                Err(e) => return Err(e),
            };
            if !metadata.is_file() {
                continue;
            }

            entries.push(StoreEntry {
                key,
                size: metadata.len(),
                modified: metadata.modified()?,
            });
        }

        Ok(entries)
    }

    /// Remove the entry for `key`. Removing an absent entry succeeds.
    pub async fn delete(&self, key: &CacheKey) -> std::io::Result<()> {
        match fs::remove_file(self.path_for(key)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e),
        }
    }

    /// Sum of the sizes of all entries
    pub async fn total_size(&self) -> std::io::Result<u64> {
        Ok(self.list().await?.iter().map(|e| e.size).sum())
    }
}
