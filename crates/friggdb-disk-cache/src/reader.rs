//! Read-through disk cache over a backend reader

use crate::config::DiskCacheConfig;
use crate::error::Result;
use crate::janitor::{Janitor, JanitorHandle};
use crate::key::{ArtifactKind, CacheKey};
use crate::metrics::{CacheMetrics, FillOutcome};
use crate::store::DiskStore;
use crate::types::{CacheStats, EvictionReport};
use async_trait::async_trait;
use friggdb_backend::{BlockDescriptor, Reader};
use std::io::ErrorKind;
use std::sync::Arc;
use tokio::fs;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// A [`Reader`] that keeps block blooms and indexes on local disk.
///
/// Tenant and block listings and object reads go straight to the wrapped
/// reader. Disk failures never fail a request: an unreadable entry falls back
/// to the backend and a failed write only loses the cached copy.
pub struct DiskCacheReader<R> {
    next: R,
    store: DiskStore,
    janitor: Janitor,
    janitor_handle: Mutex<Option<JanitorHandle>>,
    metrics: Arc<CacheMetrics>,
    max_bytes: u64,
}

impl<R: Reader> DiskCacheReader<R> {
    /// Validate `config`, wipe and recreate the cache directory and start the janitor.
    ///
    /// Must be called within a tokio runtime.
    pub async fn new(next: R, config: DiskCacheConfig) -> Result<Self> {
        config.validate()?;

        match fs::remove_dir_all(&config.path).await {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }
        fs::create_dir_all(&config.path).await?;

        let max_bytes = config.max_disk_bytes();
        let metrics = Arc::new(CacheMetrics::default());
        let store = DiskStore::new(config.path.clone());
        let janitor = Janitor::new(
            store.clone(),
            max_bytes,
            config.disk_prune_count,
            metrics.clone(),
        );
        let handle = janitor.clone().spawn(config.disk_clean_rate);

        info!(
            cache_dir = ?config.path,
            max_disk_mbs = config.max_disk_mbs,
            prune_count = config.disk_prune_count,
            clean_rate = ?config.disk_clean_rate,
            "Disk cache initialized"
        );

        Ok(Self {
            next,
            store,
            janitor,
            janitor_handle: Mutex::new(Some(handle)),
            metrics,
            max_bytes,
        })
    }

    /// The wrapped reader
    pub fn inner(&self) -> &R {
        &self.next
    }

    pub fn store(&self) -> &DiskStore {
        &self.store
    }

    /// Run one janitor cycle now, independent of the background schedule
    pub async fn run_janitor_cycle(&self) -> EvictionReport {
        self.janitor.run_cycle().await
    }

    /// Current counters and disk usage
    pub async fn stats(&self) -> CacheStats {
        let (entries, total_size) = match self.store.list().await {
            Ok(list) => (list.len(), list.iter().map(|e| e.size).sum()),
            Err(e) => {
                warn!(error = %e, "Failed to scan disk cache for stats");
                (0, 0)
            }
        };
        self.metrics.snapshot(entries, total_size, self.max_bytes)
    }

    async fn read_or_fill(
        &self,
        block_id: Uuid,
        tenant_id: &str,
        kind: ArtifactKind,
    ) -> friggdb_backend::Result<Vec<u8>> {
        let key = CacheKey::new(block_id, tenant_id, kind);

        match self.store.get(&key).await {
            Ok(Some(data)) => {
                debug!(key = %key, "Disk cache hit");
                self.metrics.record_fill(kind, FillOutcome::Hit);
                return Ok(data);
            }
            Ok(None) => {}
            Err(e) => {
                warn!(key = %key, error = %e, "Failed to read disk cache entry, using backend");
                self.metrics.record_read_error(kind);
            }
        }

        let data = match kind {
            ArtifactKind::Bloom => self.next.bloom(block_id, tenant_id).await?,
            ArtifactKind::Index => self.next.index(block_id, tenant_id).await?,
        };

        match self.store.put(&key, &data).await {
            Ok(()) => self.metrics.record_fill(kind, FillOutcome::Stored),
            Err(e) => {
                error!(key = %key, error = %e, "Failed to write disk cache entry");
                self.metrics.record_fill(kind, FillOutcome::StoreError);
            }
        }

        Ok(data)
    }
}

#[async_trait]
impl<R: Reader> Reader for DiskCacheReader<R> {
    async fn tenants(&self) -> friggdb_backend::Result<Vec<String>> {
        self.next.tenants().await
    }

    async fn blocklist(&self, tenant_id: &str) -> friggdb_backend::Result<Vec<BlockDescriptor>> {
        self.next.blocklist(tenant_id).await
    }

    async fn bloom(&self, block_id: Uuid, tenant_id: &str) -> friggdb_backend::Result<Vec<u8>> {
        self.read_or_fill(block_id, tenant_id, ArtifactKind::Bloom).await
    }

    async fn index(&self, block_id: Uuid, tenant_id: &str) -> friggdb_backend::Result<Vec<u8>> {
        self.read_or_fill(block_id, tenant_id, ArtifactKind::Index).await
    }

    async fn object(
        &self,
        block_id: Uuid,
        tenant_id: &str,
        start: u64,
        length: u32,
    ) -> friggdb_backend::Result<Vec<u8>> {
        // Byte ranges are not cached
        self.next.object(block_id, tenant_id, start, length).await
    }

    async fn shutdown(&self) {
        if let Some(handle) = self.janitor_handle.lock().await.take() {
            handle.stop().await;
        }
        self.next.shutdown().await;
    }
}
