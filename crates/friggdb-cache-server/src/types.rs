//! Core types for the friggdb cache server

use friggdb_disk_cache::{CacheStats, DiskCacheConfig};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Configuration for the cache server
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub port: u16,
    /// Root of the block tree served by the backend reader
    pub backend_path: PathBuf,
    pub cache: DiskCacheConfig,
}

/// Byte range of an object read
#[derive(Debug, Deserialize)]
pub struct ObjectQuery {
    pub start: u64,
    pub length: u32,
}

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub uptime_secs: u64,
    pub cache: CacheStats,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_health_response_serialization() {
        let response = HealthResponse {
            status: "ok".to_string(),
            uptime_secs: 3600,
            cache: CacheStats {
                entries: 12,
                total_size: 4096,
                ..Default::default()
            },
        };

        let json = serde_json::to_string(&response).unwrap();
        assert!(json.contains("\"status\":\"ok\""));
        assert!(json.contains("3600"));
        assert!(json.contains("\"entries\":12"));
    }

    #[test]
    fn test_object_query_deserialization() {
        let query: ObjectQuery = serde_json::from_str(r#"{"start": 10, "length": 20}"#).unwrap();
        assert_eq!(query.start, 10);
        assert_eq!(query.length, 20);
    }
}
