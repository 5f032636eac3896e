//! Error types for the disk cache

use std::fmt;

#[derive(Debug)]
pub enum DiskCacheError {
    Config(String),
    Io(Box<std::io::Error>),
}

impl fmt::Display for DiskCacheError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiskCacheError::Config(msg) => write!(f, "Configuration error: {}", msg),
            DiskCacheError::Io(err) => write!(f, "IO error: {}", err),
        }
    }
}

impl std::error::Error for DiskCacheError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            DiskCacheError::Io(err) => Some(err.as_ref()),
            _ => None,
        }
    }
}

impl From<std::io::Error> for DiskCacheError {
    fn from(err: std::io::Error) -> Self {
        DiskCacheError::Io(Box::new(err))
    }
}

pub type Result<T> = std::result::Result<T, DiskCacheError>;
