//! Disk cache configuration

use crate::error::{DiskCacheError, Result};
use std::path::PathBuf;
use std::time::Duration;

const BYTES_PER_MB: u64 = 1024 * 1024;

/// Configuration for the disk cache, fixed for the lifetime of the cache
#[derive(Debug, Clone)]
pub struct DiskCacheConfig {
    /// Cache root directory. Wiped on startup.
    pub path: PathBuf,
    /// Number of entries evicted per over-budget batch
    pub disk_prune_count: usize,
    /// Janitor wake interval
    pub disk_clean_rate: Duration,
    /// Disk usage ceiling in megabytes
    pub max_disk_mbs: u64,
}

impl DiskCacheConfig {
    /// Reject configurations the cache cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.path.as_os_str().is_empty() {
            return Err(DiskCacheError::Config(
                "must specify a cache path".to_string(),
            ));
        }

        if self.disk_prune_count == 0 {
            return Err(DiskCacheError::Config(
                "must specify disk prune count".to_string(),
            ));
        }

        if self.disk_clean_rate.is_zero() {
            return Err(DiskCacheError::Config(
                "must specify a clean rate".to_string(),
            ));
        }

        if self.max_disk_mbs == 0 {
            return Err(DiskCacheError::Config(
                "must specify a maximum number of MBs to save".to_string(),
            ));
        }

        Ok(())
    }

    /// Disk usage ceiling in bytes
    pub fn max_disk_bytes(&self) -> u64 {
        self.max_disk_mbs.saturating_mul(BYTES_PER_MB)
    }
}
