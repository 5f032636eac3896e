//! HTTP server exposing the cached block reader
//!
//! Provides /health, tenant and block listings, and bloom, index and object
//! reads per block.

use crate::error::ApiError;
use crate::types::{HealthResponse, ObjectQuery};
use axum::{
    extract::{Path, Query, State},
    http::header,
    response::{IntoResponse, Json, Response},
    routing::get,
    Router,
};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use chrono::{DateTime, Utc};
use friggdb_backend::{LocalReader, Reader};
use friggdb_disk_cache::DiskCacheReader;
use std::future::Future;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing::{debug, info};
use uuid::Uuid;

pub type CachedReader = DiskCacheReader<LocalReader>;

/// Shared state for the HTTP server
pub struct ServerState {
    pub reader: CachedReader,
    pub started_at: DateTime<Utc>,
}

impl ServerState {
    pub fn new(reader: CachedReader) -> Self {
        Self {
            reader,
            started_at: Utc::now(),
        }
    }
}

pub type SharedState = Arc<ServerState>;

/// Create the HTTP router
pub fn create_router(state: SharedState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/tenants", get(tenants))
        .route("/tenants/{tenant}/blocks", get(blocklist))
        .route("/tenants/{tenant}/blocks/{block}/bloom", get(bloom))
        .route("/tenants/{tenant}/blocks/{block}/index", get(index))
        .route("/tenants/{tenant}/blocks/{block}/object", get(object))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Serve until `shutdown` resolves, then finish in-flight requests
pub async fn start_server<F>(state: SharedState, port: u16, shutdown: F) -> std::io::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let router = create_router(state);
    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], port));
    info!("Starting HTTP server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown)
        .await
}

fn parse_block_id(block: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(block).map_err(|e| ApiError::BadRequest(format!("Invalid block id: {}", e)))
}

fn octet_stream(data: Vec<u8>) -> Response {
    ([(header::CONTENT_TYPE, "application/octet-stream")], data).into_response()
}

async fn health(State(state): State<SharedState>) -> Json<HealthResponse> {
    let cache = state.reader.stats().await;
    let uptime_secs = (Utc::now() - state.started_at).num_seconds().max(0) as u64;

    Json(HealthResponse {
        status: "ok".to_string(),
        uptime_secs,
        cache,
    })
}

async fn tenants(State(state): State<SharedState>) -> Result<Json<Vec<String>>, ApiError> {
    Ok(Json(state.reader.tenants().await?))
}

/// Block descriptors are opaque bytes, returned base64 encoded
async fn blocklist(
    State(state): State<SharedState>,
    Path(tenant): Path<String>,
) -> Result<Json<Vec<String>>, ApiError> {
    let blocks = state.reader.blocklist(&tenant).await?;
    debug!(tenant = %tenant, count = blocks.len(), "Listed blocks");
    Ok(Json(blocks.iter().map(|b| STANDARD.encode(b)).collect()))
}

async fn bloom(
    State(state): State<SharedState>,
    Path((tenant, block)): Path<(String, String)>,
) -> Result<Response, ApiError> {
    let block_id = parse_block_id(&block)?;
    Ok(octet_stream(state.reader.bloom(block_id, &tenant).await?))
}

async fn index(
    State(state): State<SharedState>,
    Path((tenant, block)): Path<(String, String)>,
) -> Result<Response, ApiError> {
    let block_id = parse_block_id(&block)?;
    Ok(octet_stream(state.reader.index(block_id, &tenant).await?))
}

async fn object(
    State(state): State<SharedState>,
    Path((tenant, block)): Path<(String, String)>,
    Query(range): Query<ObjectQuery>,
) -> Result<Response, ApiError> {
    let block_id = parse_block_id(&block)?;
    let data = state
        .reader
        .object(block_id, &tenant, range.start, range.length)
        .await?;
    Ok(octet_stream(data))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use friggdb_disk_cache::DiskCacheConfig;
    use std::path::Path as FsPath;
    use std::time::Duration;
    use tempfile::{tempdir, TempDir};
    use tower::ServiceExt;

    struct TestEnv {
        _backend_dir: TempDir,
        _cache_dir: TempDir,
        state: SharedState,
        block: Uuid,
    }

    fn write_block(root: &FsPath, tenant: &str, block: Uuid) {
        let dir = root.join(tenant).join(block.to_string());
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("meta"), b"meta-bytes").unwrap();
        std::fs::write(dir.join("bloom"), b"BLOOMDATA").unwrap();
        std::fs::write(dir.join("index"), b"INDEXDATA").unwrap();
        std::fs::write(dir.join("data"), b"0123456789").unwrap();
    }

    async fn create_test_env() -> TestEnv {
        let backend_dir = tempdir().unwrap();
        let cache_dir = tempdir().unwrap();
        let block = Uuid::new_v4();
        write_block(backend_dir.path(), "tenant1", block);

        let reader = DiskCacheReader::new(
            LocalReader::new(backend_dir.path()),
            DiskCacheConfig {
                path: cache_dir.path().to_path_buf(),
                disk_prune_count: 10,
                disk_clean_rate: Duration::from_secs(3600),
                max_disk_mbs: 16,
            },
        )
        .await
        .unwrap();

        TestEnv {
            _backend_dir: backend_dir,
            _cache_dir: cache_dir,
            state: Arc::new(ServerState::new(reader)),
            block,
        }
    }

    async fn get(router: Router, uri: &str) -> (StatusCode, Vec<u8>) {
        let response = router
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, body.to_vec())
    }

    #[tokio::test]
    async fn test_health_endpoint() {
        let env = create_test_env().await;
        let (status, body) = get(create_router(env.state.clone()), "/health").await;

        assert_eq!(status, StatusCode::OK);
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["status"], "ok");
        assert!(json["uptime_secs"].as_u64().is_some());
        assert_eq!(json["cache"]["entries"], 0);
        assert_eq!(json["cache"]["max_size"], 16 * 1024 * 1024);
    }

    #[tokio::test]
    async fn test_tenants_and_blocklist() {
        let env = create_test_env().await;

        let (status, body) = get(create_router(env.state.clone()), "/tenants").await;
        assert_eq!(status, StatusCode::OK);
        let tenants: Vec<String> = serde_json::from_slice(&body).unwrap();
        assert_eq!(tenants, vec!["tenant1".to_string()]);

        let (status, body) = get(create_router(env.state.clone()), "/tenants/tenant1/blocks").await;
        assert_eq!(status, StatusCode::OK);
        let blocks: Vec<String> = serde_json::from_slice(&body).unwrap();
        assert_eq!(blocks, vec![STANDARD.encode(b"meta-bytes")]);
    }

    #[tokio::test]
    async fn test_bloom_is_cached_after_first_request() {
        let env = create_test_env().await;
        let uri = format!("/tenants/tenant1/blocks/{}/bloom", env.block);

        let (status, body) = get(create_router(env.state.clone()), &uri).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, b"BLOOMDATA");

        let (_, body) = get(create_router(env.state.clone()), &uri).await;
        assert_eq!(body, b"BLOOMDATA");

        let stats = env.state.reader.stats().await;
        assert_eq!(stats.bloom.misses, 1);
        assert_eq!(stats.bloom.hits, 1);
    }

    #[tokio::test]
    async fn test_index_and_object() {
        let env = create_test_env().await;

        let uri = format!("/tenants/tenant1/blocks/{}/index", env.block);
        let (status, body) = get(create_router(env.state.clone()), &uri).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, b"INDEXDATA");

        let uri = format!("/tenants/tenant1/blocks/{}/object?start=3&length=4", env.block);
        let (status, body) = get(create_router(env.state.clone()), &uri).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, b"3456");
    }

    #[tokio::test]
    async fn test_unknown_block_is_not_found() {
        let env = create_test_env().await;
        let uri = format!("/tenants/tenant1/blocks/{}/bloom", Uuid::new_v4());

        let (status, _) = get(create_router(env.state.clone()), &uri).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(env.state.reader.stats().await.entries, 0);
    }

    #[tokio::test]
    async fn test_invalid_block_id_is_bad_request() {
        let env = create_test_env().await;
        let (status, body) =
            get(create_router(env.state.clone()), "/tenants/tenant1/blocks/nope/index").await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert!(json["error"].as_str().unwrap().contains("Invalid block id"));
    }

    #[tokio::test]
    async fn test_tenant_outside_backend_root_is_not_found() {
        let env = create_test_env().await;
        let outside = tempdir().unwrap();
        write_block(outside.path(), "victim", env.block);

        let encoded = outside
            .path()
            .join("victim")
            .display()
            .to_string()
            .replace('/', "%2F");
        let uris = [
            format!("/tenants/{}/blocks/{}/bloom", encoded, env.block),
            format!("/tenants/{}/blocks/{}/index", encoded, env.block),
            format!("/tenants/{}/blocks/{}/object?start=0&length=4", encoded, env.block),
            format!("/tenants/{}/blocks", encoded),
            format!("/tenants/%2E%2E/blocks/{}/bloom", env.block),
            "/tenants/%2E%2E/blocks".to_string(),
        ];

        for uri in &uris {
            let (status, body) = get(create_router(env.state.clone()), uri).await;
            assert_eq!(status, StatusCode::NOT_FOUND, "{}", uri);
            assert!(!body.windows(9).any(|w| w == b"BLOOMDATA"), "{}", uri);
        }
        assert_eq!(env.state.reader.stats().await.entries, 0);
    }

    #[tokio::test]
    async fn test_object_range_past_end_is_bad_request() {
        let env = create_test_env().await;
        let uri = format!("/tenants/tenant1/blocks/{}/object?start=8&length=5", env.block);

        let (status, _) = get(create_router(env.state.clone()), &uri).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}
