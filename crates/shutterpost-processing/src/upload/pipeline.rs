//! Upload pipeline: fingerprint → check → upload → record.
//!
//! `ensure_uploaded` is the single entry point callers need. A file already
//! known to the cache or the remote service is never uploaded again unless
//! the request forces it; a forced upload still replaces the cached record.

use futures::stream::{self, StreamExt};
use std::path::{Path, PathBuf};

use shutterpost_core::constants::DEFAULT_MACHINE_TAG_NAMESPACE;
use shutterpost_core::{
    checksum_machine_tag, UploadOutcome, UploadRecord, UploadRequest, UploadStep, UploadWarning,
};

use super::orchestrator::UploadOrchestrator;
use crate::dedup::DuplicateChecker;
use crate::error::UploadError;
use crate::hasher;

/// Duplicate-aware upload of local files to one service.
#[derive(Clone)]
pub struct UploadPipeline {
    checker: DuplicateChecker,
    orchestrator: UploadOrchestrator,
    namespace: String,
}

impl UploadPipeline {
    pub fn new(checker: DuplicateChecker, orchestrator: UploadOrchestrator) -> Self {
        if checker.service() != orchestrator.service_name() {
            tracing::warn!(
                checker = checker.service(),
                uploader = orchestrator.service_name(),
                "Duplicate checker and uploader target different services"
            );
        }
        Self {
            checker,
            orchestrator,
            namespace: DEFAULT_MACHINE_TAG_NAMESPACE.to_string(),
        }
    }

    /// Namespace of the checksum tag attached to each upload.
    pub fn with_machine_tag_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = namespace.into();
        self
    }

    pub fn checker(&self) -> &DuplicateChecker {
        &self.checker
    }

    /// Upload `path` unless it is already present on the service.
    #[tracing::instrument(skip(self, path, request), fields(path = %path.display(), force = request.force_upload))]
    pub async fn ensure_uploaded(
        &self,
        path: &Path,
        request: &UploadRequest,
    ) -> Result<UploadOutcome, UploadError> {
        let info = hasher::file_info(path).await?;

        if !request.force_upload {
            if let Some(record) = self.checker.check_file(&info).await? {
                tracing::info!(
                    remote_id = %record.remote_id,
                    fingerprint = %info.fingerprint,
                    "Already uploaded, skipping"
                );
                return Ok(UploadOutcome::from_record(&record));
            }
        }

        let checksum_tag = checksum_machine_tag(&self.namespace, &info.fingerprint);
        let mut tags = request.tags.clone();
        if !tags.iter().any(|t| t.eq_ignore_ascii_case(&checksum_tag)) {
            tags.push(checksum_tag);
        }

        let mut outcome = self
            .orchestrator
            .upload(
                path,
                &request.title,
                &request.description,
                &tags,
                request.is_private,
            )
            .await?;

        let record = UploadRecord::from_outcome(&info, self.checker.service(), &outcome);
        if let Err(e) = self.checker.record(&record).await {
            tracing::warn!(
                error = %e,
                remote_id = %record.remote_id,
                "Uploaded but failed to record in cache"
            );
            outcome
                .warnings
                .push(UploadWarning::new(UploadStep::RecordCache, e));
        }

        Ok(outcome)
    }

    /// Run [`ensure_uploaded`](Self::ensure_uploaded) for each path with up to
    /// `concurrency` uploads in flight. Results are in input order.
    pub async fn ensure_uploaded_batch(
        &self,
        paths: &[PathBuf],
        request: &UploadRequest,
        concurrency: usize,
    ) -> Vec<(PathBuf, Result<UploadOutcome, UploadError>)> {
        let mut results: Vec<(usize, PathBuf, Result<UploadOutcome, UploadError>)> =
            stream::iter(paths.iter().cloned().enumerate())
                .map(|(index, path)| async move {
                    let result = self.ensure_uploaded(&path, request).await;
                    (index, path, result)
                })
                .buffer_unordered(concurrency.max(1))
                .collect()
                .await;

        results.sort_by_key(|(index, _, _)| *index);
        results
            .into_iter()
            .map(|(_, path, result)| (path, result))
            .collect()
    }
}
