//! SmugMug duplicate search

use async_trait::async_trait;
use chrono::Utc;
use std::sync::Arc;

use shutterpost_core::constants::SMUGMUG_SERVICE;
use shutterpost_core::{checksum_machine_tag, FileFingerprint, FileInfo, UploadRecord};

use crate::error::RemoteResult;
use crate::search::RemoteSearcher;
use crate::service::resolve_urls;

use super::client::SmugMugClient;
use super::types::Image;

/// Finds earlier uploads by checksum keyword, falling back to filename search
/// confirmed against SmugMug's archived MD5.
pub struct SmugMugSearcher {
    client: Arc<SmugMugClient>,
    namespace: String,
    scope: Option<String>,
}

impl SmugMugSearcher {
    pub fn new(client: Arc<SmugMugClient>, namespace: impl Into<String>) -> Self {
        Self {
            client,
            namespace: namespace.into(),
            scope: None,
        }
    }

    /// Scope searches to the account with this nickname.
    pub fn with_nickname(mut self, nickname: &str) -> Self {
        self.scope = Some(format!("/api/v2/user/{}", nickname));
        self
    }

    async fn to_record(&self, fingerprint: &FileFingerprint, image: &Image) -> UploadRecord {
        let remote_id = image.remote_id();
        let urls = resolve_urls(self.client.as_ref(), &remote_id).await;
        UploadRecord {
            fingerprint: fingerprint.clone(),
            service: SMUGMUG_SERVICE.to_string(),
            remote_id,
            page_url: urls.page_url,
            image_url: urls.image_url,
            uploaded_at: image.uploaded_at().unwrap_or_else(Utc::now),
            filename: image.file_name.clone(),
            size: 0,
        }
    }
}

/// Filename contains the stem, and any archived MD5 equals the fingerprint.
fn confirms(image: &Image, file: &FileInfo) -> bool {
    let stem = file.stem().to_lowercase();
    if !image.file_name.to_lowercase().contains(&stem) {
        return false;
    }
    match image.archived_md5.as_deref().map(str::trim) {
        Some(md5) if !md5.is_empty() => md5.eq_ignore_ascii_case(file.fingerprint.as_str()),
        _ => true,
    }
}

#[async_trait]
impl RemoteSearcher for SmugMugSearcher {
    fn service(&self) -> &str {
        SMUGMUG_SERVICE
    }

    #[tracing::instrument(skip(self, fingerprint), fields(service = SMUGMUG_SERVICE, fingerprint = %fingerprint))]
    async fn search_by_fingerprint(
        &self,
        fingerprint: &FileFingerprint,
    ) -> RemoteResult<Option<UploadRecord>> {
        let keyword = checksum_machine_tag(&self.namespace, fingerprint);

        let mut images = match &self.scope {
            Some(scope) => {
                self.client
                    .search(&[("Scope", scope.as_str()), ("Keywords", keyword.as_str())])
                    .await?
            }
            None => Vec::new(),
        };
        if images.is_empty() {
            tracing::debug!("No scoped match, retrying unscoped");
            images = self.client.search(&[("Keywords", keyword.as_str())]).await?;
        }

        match images.first() {
            Some(image) => Ok(Some(self.to_record(fingerprint, image).await)),
            None => Ok(None),
        }
    }

    #[tracing::instrument(skip(self, file), fields(service = SMUGMUG_SERVICE, filename = %file.filename))]
    async fn search_by_metadata(&self, file: &FileInfo) -> RemoteResult<Option<UploadRecord>> {
        let mut params = vec![("Text", file.stem())];
        if let Some(scope) = &self.scope {
            params.push(("Scope", scope.as_str()));
        }
        let images = self.client.search(&params).await?;

        match images.iter().find(|image| confirms(image, file)) {
            Some(image) => {
                tracing::info!(remote_id = %image.remote_id(), "Matched earlier upload by filename");
                Ok(Some(self.to_record(&file.fingerprint, image).await))
            }
            None => Ok(None),
        }
    }
}
