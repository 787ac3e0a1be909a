//! SmugMug API v2 and upload endpoints

use async_trait::async_trait;
use reqwest::{Method, RequestBuilder};
use serde::de::DeserializeOwned;
use serde_json::json;
use std::path::Path;
use std::time::Duration;

use shutterpost_core::config::SmugMugConfig;
use shutterpost_core::constants::SMUGMUG_SERVICE;

use crate::client::{file_body, ApiClient, Credentials};
use crate::error::{RemoteError, RemoteResult};
use crate::service::{ImageSize, PhotoService};

use super::types::{
    last_segment, Envelope, Image, ImageResponse, SearchResponse, SizeDetail, SizeDetailsResponse,
    UploadResponse,
};

/// Largest first
const SIZE_PREFERENCE: &[&str] = &[
    "Original", "X5Large", "X4Large", "X3Large", "X2Large", "XLarge", "Large", "Medium", "Small",
];

const SIZE_KEY_PREFIX: &str = "ImageSize";

/// Authenticated SmugMug client uploading into one album.
pub struct SmugMugClient {
    api: ApiClient,
    api_url: String,
    upload_url: String,
    web_url: String,
    album_uri: String,
}

impl SmugMugClient {
    pub fn new(config: &SmugMugConfig, timeout: Duration) -> RemoteResult<Self> {
        let mut credentials = Credentials::new();
        if let Some(key) = &config.api_key {
            credentials = credentials.with_api_key("APIKey", key);
        }
        if let Some(token) = &config.access_token {
            credentials = credentials.with_bearer(token);
        }

        Ok(Self {
            api: ApiClient::new(credentials, timeout)?,
            api_url: config.api_url.trim_end_matches('/').to_string(),
            upload_url: config.upload_url.clone(),
            web_url: config.web_url.trim_end_matches('/').to_string(),
            album_uri: config.album_uri.clone().unwrap_or_default(),
        })
    }

    fn endpoint(&self, method: Method, path: &str) -> RequestBuilder {
        self.api
            .request(method, &format!("{}{}", self.api_url, path))
            .header("Accept", "application/json")
    }

    fn image_path(remote_id: &str) -> String {
        format!("/api/v2/image/{}", urlencoding::encode(remote_id))
    }

    async fn fetch<T: DeserializeOwned>(&self, request: RequestBuilder) -> RemoteResult<T> {
        let envelope: Envelope<T> = self.api.send_json(request).await?;
        Ok(envelope.response)
    }

    pub(crate) async fn get_image(&self, remote_id: &str) -> RemoteResult<Image> {
        let request = self.endpoint(Method::GET, &Self::image_path(remote_id));
        let response: ImageResponse = self.fetch(request).await?;
        Ok(response.image)
    }

    async fn patch_image(&self, remote_id: &str, body: serde_json::Value) -> RemoteResult<()> {
        let request = self
            .endpoint(Method::PATCH, &Self::image_path(remote_id))
            .json(&body);
        let _: ImageResponse = self.fetch(request).await?;
        Ok(())
    }

    /// `image!search` with the given parameters. No results is an empty list.
    pub(crate) async fn search(&self, params: &[(&str, &str)]) -> RemoteResult<Vec<Image>> {
        let request = self.endpoint(Method::GET, "/api/v2/image!search").query(params);
        let response: Option<SearchResponse> = self.fetch(request).await?;
        Ok(response.map(|r| r.images).unwrap_or_default())
    }
}

#[async_trait]
impl PhotoService for SmugMugClient {
    fn name(&self) -> &str {
        SMUGMUG_SERVICE
    }

    #[tracing::instrument(skip(self, path), fields(service = SMUGMUG_SERVICE))]
    async fn upload_bytes(&self, path: &Path, filename: &str) -> RemoteResult<String> {
        let (body, length) = file_body(path).await?;
        let request = self
            .api
            .request(Method::POST, &self.upload_url)
            .header("Content-Length", length)
            .header("X-Smug-AlbumUri", &self.album_uri)
            .header("X-Smug-ResponseType", "JSON")
            .header("X-Smug-Version", "v2")
            .header("X-Smug-FileName", filename)
            .body(body);

        let response: UploadResponse = self.api.send_json(request).await?;
        if response.stat != "ok" {
            return Err(RemoteError::Api {
                code: response.code.unwrap_or(-1),
                message: response
                    .message
                    .unwrap_or_else(|| "Unknown error".to_string()),
            });
        }
        let remote_id = response
            .image
            .as_ref()
            .and_then(|image| last_segment(&image.image_uri))
            .map(str::to_string)
            .ok_or_else(|| {
                RemoteError::InvalidResponse("Upload response has no ImageUri".to_string())
            })?;

        tracing::info!(remote_id = %remote_id, bytes = length, "Uploaded photo to SmugMug");
        Ok(remote_id)
    }

    async fn set_fields(&self, remote_id: &str, title: &str, description: &str) -> RemoteResult<()> {
        self.patch_image(remote_id, json!({ "Title": title, "Caption": description }))
            .await
    }

    async fn add_tags(&self, remote_id: &str, tags: &[String]) -> RemoteResult<()> {
        if tags.is_empty() {
            return Ok(());
        }
        let existing = self.get_image(remote_id).await?.keyword_array;
        let keywords = merge_keywords(existing, tags);
        self.patch_image(remote_id, json!({ "KeywordArray": keywords }))
            .await
    }

    async fn set_visibility(&self, remote_id: &str, is_private: bool) -> RemoteResult<()> {
        self.patch_image(remote_id, json!({ "Hidden": is_private }))
            .await
    }

    async fn page_url(&self, remote_id: &str) -> RemoteResult<String> {
        self.get_image(remote_id).await?.web_uri.ok_or_else(|| {
            RemoteError::InvalidResponse(format!("Image {} has no WebUri", remote_id))
        })
    }

    async fn available_sizes(&self, remote_id: &str) -> RemoteResult<Vec<ImageSize>> {
        let path = format!("{}!sizedetails", Self::image_path(remote_id));
        let response: SizeDetailsResponse = self.fetch(self.endpoint(Method::GET, &path)).await?;
        Ok(sizes_from_details(response))
    }

    fn size_preference(&self) -> &[&'static str] {
        SIZE_PREFERENCE
    }

    fn default_image_url(&self, remote_id: &str) -> String {
        let key = image_key(remote_id);
        format!("{}/photos/i-{key}/0/O/i-{key}.jpg", self.web_url)
    }

    fn default_page_url(&self, remote_id: &str) -> String {
        format!("{}/i-{}", self.web_url, image_key(remote_id))
    }
}

/// Image key without the `-<version>` suffix of an image URI segment
fn image_key(remote_id: &str) -> &str {
    remote_id
        .split_once('-')
        .map(|(key, _)| key)
        .unwrap_or(remote_id)
}

/// Existing keywords followed by new ones, skipping case-insensitive duplicates.
fn merge_keywords(existing: Vec<String>, tags: &[String]) -> Vec<String> {
    let mut merged = existing;
    for tag in tags {
        if !merged.iter().any(|k| k.eq_ignore_ascii_case(tag)) {
            merged.push(tag.clone());
        }
    }
    merged
}

fn sizes_from_details(response: SizeDetailsResponse) -> Vec<ImageSize> {
    response
        .details
        .into_iter()
        .filter_map(|(key, value)| {
            let label = key.strip_prefix(SIZE_KEY_PREFIX)?.to_string();
            let detail: SizeDetail = serde_json::from_value(value).ok()?;
            Some(ImageSize {
                label,
                url: detail.url,
                width: detail.width,
                height: detail.height,
            })
        })
        .collect()
}
