//! Error types module
//!
//! File access errors live here because every layer needs them. Storage and
//! remote-service errors are defined by the crates that produce them and
//! describe themselves through [`ErrorMetadata`], so the CLI can report any
//! failure the same way.

use std::io;
use std::path::{Path, PathBuf};

/// Log level for error reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    /// Debug level - for expected errors like a missing input file
    Debug,
    /// Warning level - for recoverable issues
    Warn,
    /// Error level - for unexpected failures
    Error,
}

/// Metadata describing how an error should be presented to the user.
pub trait ErrorMetadata {
    /// Machine-readable error code (e.g., "FILE_NOT_FOUND")
    fn error_code(&self) -> &'static str;

    /// Whether re-running the same command may succeed
    fn is_recoverable(&self) -> bool;

    /// Log level for this error
    fn log_level(&self) -> LogLevel;
}

/// Failure to read a local file.
#[derive(Debug, thiserror::Error)]
pub enum FileError {
    #[error("File not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("Failed to read {}: {source}", path.display())]
    ReadFailure {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl FileError {
    /// Classify an IO error raised while opening or reading `path`.
    pub fn from_io(path: &Path, err: io::Error) -> Self {
        if err.kind() == io::ErrorKind::NotFound {
            FileError::NotFound(path.to_path_buf())
        } else {
            FileError::ReadFailure {
                path: path.to_path_buf(),
                source: err,
            }
        }
    }

    pub fn path(&self) -> &Path {
        match self {
            FileError::NotFound(path) => path,
            FileError::ReadFailure { path, .. } => path,
        }
    }
}

impl ErrorMetadata for FileError {
    fn error_code(&self) -> &'static str {
        match self {
            FileError::NotFound(_) => "FILE_NOT_FOUND",
            FileError::ReadFailure { .. } => "FILE_READ_FAILURE",
        }
    }

    fn is_recoverable(&self) -> bool {
        false
    }

    fn log_level(&self) -> LogLevel {
        match self {
            FileError::NotFound(_) => LogLevel::Debug,
            FileError::ReadFailure { .. } => LogLevel::Error,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_io_not_found() {
        let err = FileError::from_io(
            Path::new("/tmp/missing.jpg"),
            io::Error::new(io::ErrorKind::NotFound, "gone"),
        );
        assert!(matches!(err, FileError::NotFound(_)));
        assert_eq!(err.error_code(), "FILE_NOT_FOUND");
        assert_eq!(err.path(), Path::new("/tmp/missing.jpg"));
        assert_eq!(err.log_level(), LogLevel::Debug);
    }

    #[test]
    fn test_from_io_read_failure() {
        let err = FileError::from_io(
            Path::new("/tmp/locked.jpg"),
            io::Error::new(io::ErrorKind::PermissionDenied, "denied"),
        );
        assert!(matches!(err, FileError::ReadFailure { .. }));
        assert_eq!(err.error_code(), "FILE_READ_FAILURE");
        assert!(!err.is_recoverable());
        assert!(err.to_string().contains("/tmp/locked.jpg"));
    }
}
