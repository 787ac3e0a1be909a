use std::path::Path;
use std::sync::Arc;

use shutterpost_core::{FileInfo, UploadRecord};
use shutterpost_db::{StorageResult, UploadCacheRepository};
use shutterpost_services::{RemoteSearcher, SearcherRegistry};

use crate::error::CheckError;
use crate::hasher;

/// Decides whether a file was already uploaded to the active service.
///
/// The local cache is authoritative when it has an entry. Without one, the
/// service's searcher (if registered) is asked, precise search first. Remote
/// hits are written through to the cache so the next check stays local.
#[derive(Clone)]
pub struct DuplicateChecker {
    cache: UploadCacheRepository,
    service: String,
    searcher: Option<Arc<dyn RemoteSearcher>>,
}

impl DuplicateChecker {
    pub fn new(
        cache: UploadCacheRepository,
        service: impl Into<String>,
        searcher: Option<Arc<dyn RemoteSearcher>>,
    ) -> Self {
        Self {
            cache,
            service: service.into(),
            searcher,
        }
    }

    /// Checker for `service` using whatever searcher `registry` holds for it.
    pub async fn from_registry(
        cache: UploadCacheRepository,
        service: impl Into<String>,
        registry: &SearcherRegistry,
    ) -> Self {
        let service = service.into();
        let searcher = registry.get(&service).await;
        if searcher.is_none() {
            tracing::info!(service = %service, "No remote searcher registered, using local cache only");
        }
        Self::new(cache, service, searcher)
    }

    pub fn service(&self) -> &str {
        &self.service
    }

    pub fn cache(&self) -> &UploadCacheRepository {
        &self.cache
    }

    /// Fingerprint `path` and check it.
    pub async fn check(&self, path: &Path) -> Result<Option<UploadRecord>, CheckError> {
        let info = hasher::file_info(path).await?;
        self.check_file(&info).await
    }

    /// Check an already fingerprinted file.
    #[tracing::instrument(skip(self, file), fields(service = %self.service, fingerprint = %file.fingerprint))]
    pub async fn check_file(&self, file: &FileInfo) -> Result<Option<UploadRecord>, CheckError> {
        if let Some(record) = self.cache.lookup(&file.fingerprint).await? {
            if record.service == self.service {
                tracing::debug!(remote_id = %record.remote_id, "Found in local cache");
                return Ok(Some(record));
            }
            tracing::debug!(
                cached_service = %record.service,
                "Cached upload belongs to another service"
            );
        }

        let Some(searcher) = &self.searcher else {
            return Ok(None);
        };

        match searcher.search_by_fingerprint(&file.fingerprint).await {
            Ok(Some(found)) => {
                tracing::info!(remote_id = %found.remote_id, "Found on remote by checksum tag");
                return Ok(Some(self.write_through(file, found).await));
            }
            Ok(None) => {}
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    transport = e.is_transport(),
                    "Checksum search failed, falling back to filename search"
                );
            }
        }

        match searcher
            .search_by_metadata(file)
            .await
            .map_err(CheckError::Search)?
        {
            Some(found) => {
                tracing::info!(remote_id = %found.remote_id, "Found on remote by filename");
                Ok(Some(self.write_through(file, found).await))
            }
            None => Ok(None),
        }
    }

    /// Store `record` in the cache, replacing any previous entry.
    pub async fn record(&self, record: &UploadRecord) -> StorageResult<()> {
        self.cache.record(record).await
    }

    async fn write_through(&self, file: &FileInfo, mut found: UploadRecord) -> UploadRecord {
        found.fingerprint = file.fingerprint.clone();
        found.filename = file.filename.clone();
        found.size = file.size;
        if let Err(e) = self.cache.record(&found).await {
            tracing::warn!(error = %e, remote_id = %found.remote_id, "Failed to cache remote match");
        }
        found
    }
}
