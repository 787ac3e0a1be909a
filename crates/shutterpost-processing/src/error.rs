//! Pipeline errors
//!
//! Only failures that abort an operation surface here. Best-effort steps
//! (precise remote search, metadata updates, cache write-through) are logged
//! or turned into warnings instead.

use shutterpost_core::{ErrorMetadata, FileError, LogLevel, UploadStep};
use shutterpost_db::StorageError;
use shutterpost_services::RemoteError;
use thiserror::Error;

/// Failure of a duplicate check.
#[derive(Debug, Error)]
pub enum CheckError {
    #[error(transparent)]
    File(#[from] FileError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error("Remote search failed: {0}")]
    Search(#[source] RemoteError),
}

impl ErrorMetadata for CheckError {
    fn error_code(&self) -> &'static str {
        match self {
            CheckError::File(err) => err.error_code(),
            CheckError::Storage(err) => err.error_code(),
            CheckError::Search(_) => "REMOTE_SEARCH_FAILED",
        }
    }

    fn is_recoverable(&self) -> bool {
        match self {
            CheckError::File(err) => err.is_recoverable(),
            CheckError::Storage(err) => err.is_recoverable(),
            CheckError::Search(err) => err.is_recoverable(),
        }
    }

    fn log_level(&self) -> LogLevel {
        match self {
            CheckError::File(err) => err.log_level(),
            CheckError::Storage(err) => err.log_level(),
            CheckError::Search(err) => err.log_level(),
        }
    }
}

/// Failure of an upload. Warnings from non-fatal steps are not errors.
#[derive(Debug, Error)]
pub enum UploadError {
    #[error(transparent)]
    File(#[from] FileError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error("Remote search failed: {0}")]
    Search(#[source] RemoteError),

    #[error("Upload step {step} failed: {source}")]
    Upload {
        step: UploadStep,
        #[source]
        source: RemoteError,
    },
}

impl From<CheckError> for UploadError {
    fn from(err: CheckError) -> Self {
        match err {
            CheckError::File(e) => UploadError::File(e),
            CheckError::Storage(e) => UploadError::Storage(e),
            CheckError::Search(e) => UploadError::Search(e),
        }
    }
}

impl ErrorMetadata for UploadError {
    fn error_code(&self) -> &'static str {
        match self {
            UploadError::File(err) => err.error_code(),
            UploadError::Storage(err) => err.error_code(),
            UploadError::Search(_) => "REMOTE_SEARCH_FAILED",
            UploadError::Upload { source, .. } if source.is_auth() => "UPLOAD_UNAUTHORIZED",
            UploadError::Upload { .. } => "UPLOAD_FAILED",
        }
    }

    fn is_recoverable(&self) -> bool {
        match self {
            UploadError::File(err) => err.is_recoverable(),
            UploadError::Storage(err) => err.is_recoverable(),
            UploadError::Search(err) | UploadError::Upload { source: err, .. } => {
                err.is_recoverable()
            }
        }
    }

    fn log_level(&self) -> LogLevel {
        match self {
            UploadError::File(err) => err.log_level(),
            UploadError::Storage(err) => err.log_level(),
            UploadError::Search(_) | UploadError::Upload { .. } => LogLevel::Error,
        }
    }
}
