//! Local disk read-through cache for friggdb block artifacts
//!
//! Wraps a backend [`Reader`](friggdb_backend::Reader) and keeps block blooms
//! and indexes as files under a dedicated cache directory. A background
//! janitor keeps the directory under a configured size by evicting the oldest
//! entries in batches.

mod config;
mod error;
mod janitor;
mod key;
mod metrics;
mod reader;
mod store;
mod types;

pub use config::DiskCacheConfig;
pub use error::{DiskCacheError, Result};
pub use key::{ArtifactKind, CacheKey};
pub use reader::DiskCacheReader;
pub use store::{DiskStore, StoreEntry};
pub use types::{CacheStats, EvictionReport, KindStats};
