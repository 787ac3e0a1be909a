//! Shutterpost Core Library
//!
//! This crate provides the domain models, error types and configuration
//! shared by the cache store, the remote service bindings and the upload
//! pipeline.

pub mod config;
pub mod constants;
pub mod error;
pub mod models;

// Re-export commonly used types
pub use config::ShutterpostConfig;
pub use error::{ErrorMetadata, FileError, LogLevel};
pub use models::{
    checksum_machine_tag, parse_checksum_machine_tag, FileFingerprint, FileInfo,
    FingerprintParseError, UploadOutcome, UploadRecord, UploadRequest, UploadStep, UploadWarning,
};
