//! Upload orchestration
//!
//! The raw upload is the only step that can fail the operation. Metadata
//! updates run afterwards against the new remote id; each failure becomes an
//! [`UploadWarning`] on the outcome and the remaining steps still run.

use std::path::Path;
use std::sync::Arc;

use shutterpost_core::{UploadOutcome, UploadStep, UploadWarning};
use shutterpost_services::{resolve_urls, PhotoService, RemoteError, RemoteResult};

use crate::error::UploadError;

/// Uploads one file to one service and annotates it.
#[derive(Clone)]
pub struct UploadOrchestrator {
    service: Arc<dyn PhotoService>,
}

impl UploadOrchestrator {
    pub fn new(service: Arc<dyn PhotoService>) -> Self {
        Self { service }
    }

    pub fn service_name(&self) -> &str {
        self.service.name()
    }

    #[tracing::instrument(skip(self, path, title, description, tags), fields(service = %self.service.name(), path = %path.display()))]
    pub async fn upload(
        &self,
        path: &Path,
        title: &str,
        description: &str,
        tags: &[String],
        is_private: bool,
    ) -> Result<UploadOutcome, UploadError> {
        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        let remote_id = self
            .service
            .upload_bytes(path, &filename)
            .await
            .map_err(|e| match e {
                RemoteError::File(err) => UploadError::File(err),
                source => UploadError::Upload {
                    step: UploadStep::UploadBytes,
                    source,
                },
            })?;

        let mut warnings = Vec::new();

        if !title.is_empty() || !description.is_empty() {
            let result = self.service.set_fields(&remote_id, title, description).await;
            note_failure(&mut warnings, UploadStep::SetFields, &remote_id, result);
        }

        if !tags.is_empty() {
            let result = self.service.add_tags(&remote_id, tags).await;
            note_failure(&mut warnings, UploadStep::AddTags, &remote_id, result);
        }

        if is_private {
            let result = self.service.set_visibility(&remote_id, true).await;
            note_failure(&mut warnings, UploadStep::SetVisibility, &remote_id, result);
        }

        let urls = resolve_urls(self.service.as_ref(), &remote_id).await;

        tracing::info!(
            remote_id = %remote_id,
            warnings = warnings.len(),
            "Upload complete"
        );

        Ok(UploadOutcome {
            remote_id,
            page_url: urls.page_url,
            image_url: urls.image_url,
            warnings,
            duplicate: false,
        })
    }
}

fn note_failure(
    warnings: &mut Vec<UploadWarning>,
    step: UploadStep,
    remote_id: &str,
    result: RemoteResult<()>,
) {
    if let Err(e) = result {
        tracing::warn!(step = %step, remote_id = %remote_id, error = %e, "Upload step failed");
        warnings.push(UploadWarning::new(step, e));
    }
}
