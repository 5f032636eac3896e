//! Error types for the backend reader

use std::fmt;

#[derive(Debug)]
pub enum BackendError {
    NotFound(String),
    Io(Box<std::io::Error>),
    InvalidRange(String),
    Remote(String),
}

impl fmt::Display for BackendError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackendError::NotFound(what) => write!(f, "Not found: {}", what),
            BackendError::Io(err) => write!(f, "IO error: {}", err),
            BackendError::InvalidRange(msg) => write!(f, "Invalid range: {}", msg),
            BackendError::Remote(msg) => write!(f, "Remote error: {}", msg),
        }
    }
}

impl std::error::Error for BackendError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            BackendError::Io(err) => Some(err.as_ref()),
            _ => None,
        }
    }
}

impl From<std::io::Error> for BackendError {
    fn from(err: std::io::Error) -> Self {
        BackendError::Io(Box::new(err))
    }
}

pub type Result<T> = std::result::Result<T, BackendError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_display() {
        let err = BackendError::NotFound("tenant-a/bloom".to_string());
        assert_eq!(format!("{}", err), "Not found: tenant-a/bloom");
    }

    #[test]
    fn test_invalid_range_display() {
        let err = BackendError::InvalidRange("start 10 past end 4".to_string());
        assert_eq!(format!("{}", err), "Invalid range: start 10 past end 4");
    }

    #[test]
    fn test_io_error_has_source() {
        let err: BackendError =
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied").into();
        assert!(std::error::Error::source(&err).is_some());
        assert!(format!("{}", err).starts_with("IO error"));
    }

    #[test]
    fn test_error_is_debug() {
        let err = BackendError::Remote("timeout".to_string());
        let debug_str = format!("{:?}", err);
        assert!(debug_str.contains("Remote"));
    }
}
