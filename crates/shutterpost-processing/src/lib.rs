//! Shutterpost processing
//!
//! Fingerprints local files, decides whether they already exist on the
//! active remote service and, when they do not, uploads and annotates them.

pub mod dedup;
pub mod error;
pub mod hasher;
pub mod upload;

pub use dedup::DuplicateChecker;
pub use error::{CheckError, UploadError};
pub use hasher::{file_info, fingerprint};
pub use upload::{UploadOrchestrator, UploadPipeline};
