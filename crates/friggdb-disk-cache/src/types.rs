//! Cache statistics types

use serde::{Deserialize, Serialize};

/// Counters for one artifact kind
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KindStats {
    /// Served from disk
    pub hits: u64,
    /// Fetched from the backend and stored
    pub misses: u64,
    /// Fetched from the backend but the disk write failed
    pub store_errors: u64,
    /// Disk read failed and the request fell back to the backend
    pub read_errors: u64,
}

/// Statistics about the disk cache
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CacheStats {
    pub entries: usize,
    pub total_size: u64,
    pub max_size: u64,
    pub bloom: KindStats,
    pub index: KindStats,
    pub evictions: u64,
    pub eviction_errors: u64,
    pub janitor_cycles: u64,
}

/// Outcome of one janitor cycle
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EvictionReport {
    /// Over-budget batches run this cycle
    pub passes: usize,
    pub evicted: usize,
    pub evicted_bytes: u64,
    pub errors: usize,
    /// Disk usage observed by the last scan of the cycle
    pub remaining_bytes: u64,
}
