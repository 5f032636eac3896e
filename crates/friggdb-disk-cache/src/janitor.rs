//! Background eviction keeping the cache directory under its size ceiling

use crate::key::CacheKey;
use crate::metrics::CacheMetrics;
use crate::store::DiskStore;
use crate::types::EvictionReport;
use std::collections::HashSet;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, error, info, warn};

/// Evicts the oldest entries in batches whenever the store is over budget
#[derive(Clone)]
pub(crate) struct Janitor {
    store: DiskStore,
    max_bytes: u64,
    prune_count: usize,
    metrics: Arc<CacheMetrics>,
}

impl Janitor {
    pub(crate) fn new(
        store: DiskStore,
        max_bytes: u64,
        prune_count: usize,
        metrics: Arc<CacheMetrics>,
    ) -> Self {
        Self {
            store,
            max_bytes,
            prune_count,
            metrics,
        }
    }

    /// Run cycles every `clean_rate` until the returned handle is stopped or dropped
    pub(crate) fn spawn(self, clean_rate: Duration) -> JanitorHandle {
        let (stop_tx, mut stop_rx) = oneshot::channel::<()>();

        let task = tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + clean_rate, clean_rate);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = &mut stop_rx => break,
                    _ = ticker.tick() => {
                        self.run_cycle().await;
                    }
                }
            }

            info!("Disk cache janitor stopped");
        });

        JanitorHandle { stop_tx, task }
    }

    /// Scan the store and evict batches until it is back under budget.
    ///
    /// Each batch takes the `prune_count` entries with the oldest modification
    /// time, ties broken by key. A failed delete is logged and counted, the
    /// batch moves on to the next candidate, and the entry is passed over by
    /// later batches of the same cycle.
    pub(crate) async fn run_cycle(&self) -> EvictionReport {
        let store = self.store.clone();
        self.run_cycle_with(move |key| {
            let store = store.clone();
            async move { store.delete(&key).await }
        })
        .await
    }

    async fn run_cycle_with<F, Fut>(&self, mut delete: F) -> EvictionReport
    where
        F: FnMut(CacheKey) -> Fut,
        Fut: Future<Output = std::io::Result<()>>,
    {
        let mut report = EvictionReport::default();
        let mut failed: HashSet<CacheKey> = HashSet::new();
        self.metrics.record_janitor_cycle();

        loop {
            let entries = match self.store.list().await {
                Ok(entries) => entries,
                Err(e) => {
                    error!(error = %e, "Failed to scan disk cache");
                    return report;
                }
            };

            let total: u64 = entries.iter().map(|e| e.size).sum();
            report.remaining_bytes = total;
            if total <= self.max_bytes {
                debug!(total, max_bytes = self.max_bytes, "Disk cache within budget");
                break;
            }

            let mut candidates: Vec<_> = entries
                .into_iter()
                .filter(|e| !failed.contains(&e.key))
                .collect();
            if candidates.is_empty() {
                warn!(
                    total,
                    undeletable = failed.len(),
                    "Disk cache over budget with no evictable entries left"
                );
                break;
            }

            candidates.sort_by(|a, b| a.modified.cmp(&b.modified).then_with(|| a.key.cmp(&b.key)));
            report.passes += 1;

            for entry in candidates.into_iter().take(self.prune_count) {
                match delete(entry.key.clone()).await {
                    Ok(()) => {
                        debug!(key = %entry.key, size = entry.size, "Evicted disk cache entry");
                        self.metrics.record_eviction(true);
                        report.evicted += 1;
                        report.evicted_bytes += entry.size;
                    }
                    Err(e) => {
                        error!(key = %entry.key, error = %e, "Failed to evict disk cache entry");
                        self.metrics.record_eviction(false);
                        report.errors += 1;
                        failed.insert(entry.key);
                    }
                }
            }
        }

        if report.passes > 0 {
            info!(
                passes = report.passes,
                evicted = report.evicted,
                evicted_bytes = report.evicted_bytes,
                errors = report.errors,
                remaining_bytes = report.remaining_bytes,
                "Disk cache clean finished"
            );
        }

        report
    }
}

/// Stop signal and task handle of a running janitor
pub(crate) struct JanitorHandle {
    stop_tx: oneshot::Sender<()>,
    task: JoinHandle<()>,
}

impl JanitorHandle {
    /// Signal the janitor and wait for it to exit
    pub(crate) async fn stop(self) {
        let _ = self.stop_tx.send(());
        if let Err(e) = self.task.await {
            error!(error = %e, "Disk cache janitor task failed");
        }
    }
}
