//! Backend reader over a local directory tree
//!
//! Layout: `<root>/<tenant>/<block uuid>/{meta,bloom,index,data}`.

use crate::error::{BackendError, Result};
use crate::reader::{BlockDescriptor, Reader};
use async_trait::async_trait;
use std::io::{ErrorKind, SeekFrom};
use std::path::{Component, Path, PathBuf};
use tokio::fs;
use tokio::io::{AsyncReadExt, AsyncSeekExt};
use tracing::debug;
use uuid::Uuid;

const META_FILE: &str = "meta";
const BLOOM_FILE: &str = "bloom";
const INDEX_FILE: &str = "index";
const DATA_FILE: &str = "data";

/// Reads tenant blocks straight from the local filesystem
pub struct LocalReader {
    root: PathBuf,
}

impl LocalReader {
    /// Create a reader rooted at `root`
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory of a tenant. Ids that are not a single plain path
    /// component would resolve outside the root and are never found.
    fn tenant_path(&self, tenant_id: &str) -> Result<PathBuf> {
        let mut components = Path::new(tenant_id).components();
        let single_normal = matches!(
            (components.next(), components.next()),
            (Some(Component::Normal(_)), None)
        );
        if !single_normal || tenant_id.contains(|c: char| matches!(c, '/' | '\\' | '\0')) {
            return Err(BackendError::NotFound(format!("tenant {:?}", tenant_id)));
        }
        Ok(self.root.join(tenant_id))
    }

    fn block_path(&self, block_id: Uuid, tenant_id: &str) -> Result<PathBuf> {
        Ok(self.tenant_path(tenant_id)?.join(block_id.to_string()))
    }

    async fn read_block_file(
        &self,
        block_id: Uuid,
        tenant_id: &str,
        name: &str,
    ) -> Result<Vec<u8>> {
        let path = self.block_path(block_id, tenant_id)?.join(name);
        debug!(path = ?path, "Reading block file");
        fs::read(&path).await.map_err(|e| not_found_or_io(e, &path))
    }
}

fn not_found_or_io(err: std::io::Error, path: &Path) -> BackendError {
    if err.kind() == ErrorKind::NotFound {
        BackendError::NotFound(path.display().to_string())
    } else {
        BackendError::from(err)
    }
}

#[async_trait]
impl Reader for LocalReader {
    async fn tenants(&self) -> Result<Vec<String>> {
        let mut tenants = Vec::new();
        let mut dir = fs::read_dir(&self.root).await?;

        while let Some(entry) = dir.next_entry().await? {
            if !entry.file_type().await?.is_dir() {
                continue;
            }
            if let Some(name) = entry.file_name().to_str() {
                tenants.push(name.to_string());
            }
        }

        tenants.sort();
        Ok(tenants)
    }

    async fn blocklist(&self, tenant_id: &str) -> Result<Vec<BlockDescriptor>> {
        let tenant_path = self.tenant_path(tenant_id)?;
        let mut dir = match fs::read_dir(&tenant_path).await {
            Ok(dir) => dir,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut blocks = Vec::new();
        while let Some(entry) = dir.next_entry().await? {
            let name = entry.file_name();
            let Some(block_id) = name.to_str().and_then(|n| Uuid::parse_str(n).ok()) else {
                continue;
            };

            match fs::read(entry.path().join(META_FILE)).await {
                Ok(meta) => blocks.push((block_id, meta)),
                // Block still being written
                Err(e) if e.kind() == ErrorKind::NotFound => continue,
                Err(e) => return Err(e.into()),
            }
        }

        blocks.sort_by_key(|(id, _)| *id);
        Ok(blocks.into_iter().map(|(_, meta)| meta).collect())
    }

    async fn bloom(&self, block_id: Uuid, tenant_id: &str) -> Result<Vec<u8>> {
        self.read_block_file(block_id, tenant_id, BLOOM_FILE).await
    }

    async fn index(&self, block_id: Uuid, tenant_id: &str) -> Result<Vec<u8>> {
        self.read_block_file(block_id, tenant_id, INDEX_FILE).await
    }

    async fn object(
        &self,
        block_id: Uuid,
        tenant_id: &str,
        start: u64,
        length: u32,
    ) -> Result<Vec<u8>> {
        let path = self.block_path(block_id, tenant_id)?.join(DATA_FILE);
        let mut file = fs::File::open(&path)
            .await
            .map_err(|e| not_found_or_io(e, &path))?;

        let size = file.metadata().await?.len();
        let end = start.saturating_add(u64::from(length));
        if end > size {
            return Err(BackendError::InvalidRange(format!(
                "{}..{} exceeds object size {}",
                start, end, size
            )));
        }

        file.seek(SeekFrom::Start(start)).await?;
        let mut buf = vec![0u8; length as usize];
        file.read_exact(&mut buf).await?;
        Ok(buf)
    }
}
