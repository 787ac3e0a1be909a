//! Shutterpost Database Layer
//!
//! This crate provides the local upload cache: a single SQLite file mapping
//! content fingerprints to prior upload records.

// Module declarations
pub mod db;
pub mod error;

// Re-exports
pub use db::{UploadCacheRepository, UploadRow};
pub use error::{StorageError, StorageResult};
