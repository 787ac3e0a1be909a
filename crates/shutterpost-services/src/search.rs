//! Remote duplicate search capability

use async_trait::async_trait;
use shutterpost_core::{FileFingerprint, FileInfo, UploadRecord};

use crate::error::RemoteResult;

/// Finds assets already present on a remote service.
///
/// A search that finds nothing returns `Ok(None)`. Errors are reserved for
/// transport and service failures.
#[async_trait]
pub trait RemoteSearcher: Send + Sync {
    /// Service this searcher queries
    fn service(&self) -> &str;

    /// Find an asset tagged with `<namespace>:checksum=<fingerprint>`.
    async fn search_by_fingerprint(
        &self,
        fingerprint: &FileFingerprint,
    ) -> RemoteResult<Option<UploadRecord>>;

    /// Approximate search by filename, confirmed by content hash when the
    /// service exposes one.
    async fn search_by_metadata(&self, file: &FileInfo) -> RemoteResult<Option<UploadRecord>>;
}
