//! In-process counters for cache and janitor outcomes

use crate::key::ArtifactKind;
use crate::types::{CacheStats, KindStats};
use std::sync::atomic::{AtomicU64, Ordering};

/// How a bloom or index request was served
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum FillOutcome {
    Hit,
    Stored,
    StoreError,
}

#[derive(Debug, Default)]
struct KindCounters {
    hits: AtomicU64,
    misses: AtomicU64,
    store_errors: AtomicU64,
    read_errors: AtomicU64,
}

impl KindCounters {
    fn snapshot(&self) -> KindStats {
        KindStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            store_errors: self.store_errors.load(Ordering::Relaxed),
            read_errors: self.read_errors.load(Ordering::Relaxed),
        }
    }
}

#[derive(Debug, Default)]
pub(crate) struct CacheMetrics {
    bloom: KindCounters,
    index: KindCounters,
    evictions: AtomicU64,
    eviction_errors: AtomicU64,
    janitor_cycles: AtomicU64,
}

impl CacheMetrics {
    fn kind(&self, kind: ArtifactKind) -> &KindCounters {
        match kind {
            ArtifactKind::Bloom => &self.bloom,
            ArtifactKind::Index => &self.index,
        }
    }

    pub(crate) fn record_fill(&self, kind: ArtifactKind, outcome: FillOutcome) {
        let counters = self.kind(kind);
        let counter = match outcome {
            FillOutcome::Hit => &counters.hits,
            FillOutcome::Stored => &counters.misses,
            FillOutcome::StoreError => &counters.store_errors,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_read_error(&self, kind: ArtifactKind) {
        self.kind(kind).read_errors.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_eviction(&self, ok: bool) {
        let counter = if ok {
            &self.evictions
        } else {
            &self.eviction_errors
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_janitor_cycle(&self) {
        self.janitor_cycles.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn snapshot(&self, entries: usize, total_size: u64, max_size: u64) -> CacheStats {
        CacheStats {
            entries,
            total_size,
            max_size,
            bloom: self.bloom.snapshot(),
            index: self.index.snapshot(),
            evictions: self.evictions.load(Ordering::Relaxed),
            eviction_errors: self.eviction_errors.load(Ordering::Relaxed),
            janitor_cycles: self.janitor_cycles.load(Ordering::Relaxed),
        }
    }
}
