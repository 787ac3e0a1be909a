//! Domain models for duplicate detection and uploads.

pub mod fingerprint;
pub mod upload;

pub use fingerprint::{
    checksum_machine_tag, parse_checksum_machine_tag, FileFingerprint, FileInfo,
    FingerprintParseError,
};
pub use upload::{UploadOutcome, UploadRecord, UploadRequest, UploadStep, UploadWarning};
