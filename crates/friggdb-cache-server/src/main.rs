//! friggdb cache server
//!
//! Serves block blooms, indexes and object reads from a local block tree,
//! keeping blooms and indexes in a size-bounded local disk cache.

mod error;
mod server;
mod types;

use crate::error::{Result, ServerError};
use crate::server::{start_server, ServerState, SharedState};
use crate::types::ServerConfig;
use friggdb_backend::{LocalReader, Reader};
use friggdb_disk_cache::{DiskCacheConfig, DiskCacheReader};
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};
use tracing_subscriber::{prelude::*, EnvFilter};

const DEFAULT_PORT: u16 = 3005;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    let env_filter = EnvFilter::from_default_env()
        .add_directive("friggdb_cache_server=info".parse()?)
        .add_directive("friggdb_disk_cache=info".parse()?);

    // Use JSON format for GCP Cloud Logging when LOG_FORMAT=json
    if std::env::var("LOG_FORMAT")
        .map(|v| v == "json")
        .unwrap_or(false)
    {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_stackdriver::layer())
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(env_filter).init();
    };

    info!("Starting friggdb cache server...");

    let config = load_config()?;
    info!("Port: {}", config.port);
    info!("Backend path: {:?}", config.backend_path);
    info!("Cache path: {:?}", config.cache.path);
    info!("Max disk cache size: {} MB", config.cache.max_disk_mbs);

    let backend = LocalReader::new(config.backend_path);
    let reader = DiskCacheReader::new(backend, config.cache).await?;
    let state: SharedState = Arc::new(ServerState::new(reader));

    let served = start_server(state.clone(), config.port, shutdown_signal()).await;

    // In-flight requests have drained, stop the janitor
    state.reader.shutdown().await;
    info!("friggdb cache server stopped");

    served.map_err(ServerError::from)
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                warn!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}

fn load_config() -> Result<ServerConfig> {
    config_from_lookup(|name| std::env::var(name).ok())
}

fn config_from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<ServerConfig> {
    let port = lookup("PORT")
        .and_then(|s| s.parse::<u16>().ok())
        .unwrap_or(DEFAULT_PORT);

    let backend_path = required::<PathBuf>(&lookup, "BACKEND_PATH")?;

    let cache = DiskCacheConfig {
        path: required(&lookup, "CACHE_PATH")?,
        disk_prune_count: required(&lookup, "DISK_PRUNE_COUNT")?,
        disk_clean_rate: Duration::from_secs(required(&lookup, "DISK_CLEAN_RATE_SECS")?),
        max_disk_mbs: required(&lookup, "MAX_DISK_MBS")?,
    };

    Ok(ServerConfig {
        port,
        backend_path,
        cache,
    })
}

fn required<T>(lookup: &impl Fn(&str) -> Option<String>, name: &str) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    let value = lookup(name).ok_or_else(|| {
        ServerError::Config(format!("{} environment variable is required", name))
    })?;

    value
        .parse()
        .map_err(|e| ServerError::Config(format!("invalid {}: {}", name, e)))
}
