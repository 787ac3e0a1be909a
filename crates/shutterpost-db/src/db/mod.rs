//! Database repositories for data access layer
//!
//! The upload cache is the only table. Schema creation runs on open, so a
//! deleted cache file is simply recreated empty.

pub mod schema;
pub mod upload_cache;

pub use upload_cache::{UploadCacheRepository, UploadRow};
