//! Error types for the friggdb cache server

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use friggdb_backend::BackendError;
use friggdb_disk_cache::DiskCacheError;
use serde_json::json;
use std::fmt;

/// Startup and process-level errors
#[derive(Debug)]
pub enum ServerError {
    Config(String),
    Cache(DiskCacheError),
    Io(Box<std::io::Error>),
}

impl fmt::Display for ServerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServerError::Config(msg) => write!(f, "Configuration error: {}", msg),
            ServerError::Cache(err) => write!(f, "Disk cache error: {}", err),
            ServerError::Io(err) => write!(f, "IO error: {}", err),
        }
    }
}

impl std::error::Error for ServerError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ServerError::Cache(err) => Some(err),
            ServerError::Io(err) => Some(err.as_ref()),
            _ => None,
        }
    }
}

impl From<DiskCacheError> for ServerError {
    fn from(err: DiskCacheError) -> Self {
        ServerError::Cache(err)
    }
}

impl From<std::io::Error> for ServerError {
    fn from(err: std::io::Error) -> Self {
        ServerError::Io(Box::new(err))
    }
}

impl From<tracing_subscriber::filter::ParseError> for ServerError {
    fn from(err: tracing_subscriber::filter::ParseError) -> Self {
        ServerError::Config(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, ServerError>;

/// Request error that converts to an HTTP response
#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    Backend(BackendError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Backend(BackendError::NotFound(what)) => {
                (StatusCode::NOT_FOUND, format!("Not found: {}", what))
            }
            ApiError::Backend(err @ BackendError::InvalidRange(_)) => {
                (StatusCode::BAD_REQUEST, err.to_string())
            }
            ApiError::Backend(err) => {
                tracing::error!(error = %err, "Backend error");
                (StatusCode::BAD_GATEWAY, "Backend error".to_string())
            }
        };

        (status, axum::Json(json!({ "error": message }))).into_response()
    }
}

impl From<BackendError> for ApiError {
    fn from(err: BackendError) -> Self {
        ApiError::Backend(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error_display() {
        let err = ServerError::Config("missing CACHE_PATH".to_string());
        assert_eq!(format!("{}", err), "Configuration error: missing CACHE_PATH");
    }

    #[test]
    fn test_cache_error_display() {
        let err: ServerError =
            DiskCacheError::Config("must specify a clean rate".to_string()).into();
        assert_eq!(
            format!("{}", err),
            "Disk cache error: Configuration error: must specify a clean rate"
        );
    }

    #[test]
    fn test_api_error_status_codes() {
        let not_found = ApiError::Backend(BackendError::NotFound("x".to_string())).into_response();
        assert_eq!(not_found.status(), StatusCode::NOT_FOUND);

        let range = ApiError::Backend(BackendError::InvalidRange("x".to_string())).into_response();
        assert_eq!(range.status(), StatusCode::BAD_REQUEST);

        let remote = ApiError::Backend(BackendError::Remote("x".to_string())).into_response();
        assert_eq!(remote.status(), StatusCode::BAD_GATEWAY);

        let bad = ApiError::BadRequest("x".to_string()).into_response();
        assert_eq!(bad.status(), StatusCode::BAD_REQUEST);
    }
}
