//! Cache storage errors
//!
//! Any of these aborts a duplicate check. A cache that cannot be read must
//! never be mistaken for "not uploaded yet".

use shutterpost_core::{ErrorMetadata, LogLevel};
use std::io;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Failed to create cache directory {}: {source}", path.display())]
    CreateDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to open upload cache {}: {source}", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: sqlx::Error,
    },

    #[error("Failed to create upload cache schema: {0}")]
    Schema(#[source] sqlx::Error),

    #[error("Upload cache query failed: {0}")]
    Query(#[from] sqlx::Error),

    #[error("Invalid row in upload cache: {0}")]
    InvalidRow(String),
}

/// Result type for cache operations
pub type StorageResult<T> = Result<T, StorageError>;

impl ErrorMetadata for StorageError {
    fn error_code(&self) -> &'static str {
        match self {
            StorageError::CreateDir { .. } | StorageError::Open { .. } => "CACHE_OPEN_ERROR",
            StorageError::Schema(_) => "CACHE_SCHEMA_ERROR",
            StorageError::Query(_) => "CACHE_QUERY_ERROR",
            StorageError::InvalidRow(_) => "CACHE_INVALID_ROW",
        }
    }

    fn is_recoverable(&self) -> bool {
        matches!(self, StorageError::Query(_))
    }

    fn log_level(&self) -> LogLevel {
        LogLevel::Error
    }
}
