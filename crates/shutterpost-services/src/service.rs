//! Remote operations of a photo service
//!
//! The upload orchestrator drives these calls in order: raw upload first,
//! then metadata, then URL resolution. URL resolution is shared with the
//! searchers, which also need canonical URLs for assets they find.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::RemoteResult;

/// One rendition of a remote image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageSize {
    pub label: String,
    pub url: String,
    pub width: Option<u32>,
    pub height: Option<u32>,
}

/// Remote operations needed to upload and annotate one image.
#[async_trait]
pub trait PhotoService: Send + Sync {
    /// Service name, matching the searcher registry key
    fn name(&self) -> &str;

    /// Upload raw bytes with no metadata. Returns the remote identifier.
    async fn upload_bytes(&self, path: &Path, filename: &str) -> RemoteResult<String>;

    /// Set title and description.
    async fn set_fields(&self, remote_id: &str, title: &str, description: &str)
        -> RemoteResult<()>;

    /// Add tags, keeping any the asset already has.
    async fn add_tags(&self, remote_id: &str, tags: &[String]) -> RemoteResult<()>;

    /// Make the asset private (or public).
    async fn set_visibility(&self, remote_id: &str, is_private: bool) -> RemoteResult<()>;

    /// Canonical page URL of the asset.
    async fn page_url(&self, remote_id: &str) -> RemoteResult<String>;

    /// Available renditions, in the order the service lists them.
    async fn available_sizes(&self, remote_id: &str) -> RemoteResult<Vec<ImageSize>>;

    /// Size labels, most preferred (largest) first.
    fn size_preference(&self) -> &[&'static str];

    /// Image URL used when no size information is available.
    fn default_image_url(&self, remote_id: &str) -> String;

    /// Page URL used when the page lookup fails.
    fn default_page_url(&self, remote_id: &str) -> String;
}

/// Pick the best direct-image URL: first preferred label present, else the
/// first listed size.
pub fn select_image_url(sizes: &[ImageSize], preference: &[&str]) -> Option<String> {
    preference
        .iter()
        .find_map(|label| {
            sizes
                .iter()
                .find(|size| size.label.eq_ignore_ascii_case(label))
        })
        .or_else(|| sizes.first())
        .map(|size| size.url.clone())
}

/// Page and image URL of a remote asset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedUrls {
    pub page_url: String,
    pub image_url: String,
}

/// Resolve canonical URLs for `remote_id`. Never fails: lookup errors fall
/// back to the service's deterministic defaults and are logged.
pub async fn resolve_urls(service: &dyn PhotoService, remote_id: &str) -> ResolvedUrls {
    let page_url = match service.page_url(remote_id).await {
        Ok(url) => url,
        Err(e) => {
            tracing::warn!(
                service = service.name(),
                remote_id = %remote_id,
                error = %e,
                "Page URL lookup failed, using default"
            );
            service.default_page_url(remote_id)
        }
    };

    let image_url = match service.available_sizes(remote_id).await {
        Ok(sizes) => select_image_url(&sizes, service.size_preference())
            .unwrap_or_else(|| service.default_image_url(remote_id)),
        Err(e) => {
            tracing::warn!(
                service = service.name(),
                remote_id = %remote_id,
                error = %e,
                "Size lookup failed, using default image URL"
            );
            service.default_image_url(remote_id)
        }
    };

    ResolvedUrls {
        page_url,
        image_url,
    }
}
