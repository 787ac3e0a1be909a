//! SmugMug API v2 response shapes

use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::collections::BTreeMap;

/// `{"Response": {...}}` envelope around API v2 payloads
#[derive(Debug, Deserialize)]
pub(crate) struct Envelope<T> {
    #[serde(rename = "Response")]
    pub response: T,
}

/// Upload endpoint response
#[derive(Debug, Deserialize)]
pub(crate) struct UploadResponse {
    pub stat: String,
    #[serde(default)]
    pub code: Option<i64>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(rename = "Image", default)]
    pub image: Option<UploadedImage>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct UploadedImage {
    #[serde(rename = "ImageUri")]
    pub image_uri: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ImageResponse {
    #[serde(rename = "Image")]
    pub image: Image,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct SearchResponse {
    #[serde(rename = "Image", default)]
    pub images: Vec<Image>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub(crate) struct Image {
    #[serde(default)]
    pub image_key: String,
    #[serde(default)]
    pub uri: Option<String>,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub caption: String,
    #[serde(default)]
    pub keyword_array: Vec<String>,
    #[serde(default)]
    pub file_name: String,
    #[serde(rename = "ArchivedMD5", default)]
    pub archived_md5: Option<String>,
    #[serde(default)]
    pub web_uri: Option<String>,
    #[serde(default)]
    pub date: Option<String>,
}

impl Image {
    /// Identifier used in `/api/v2/image/<id>`
    pub fn remote_id(&self) -> String {
        self.uri
            .as_deref()
            .and_then(last_segment)
            .map(str::to_string)
            .unwrap_or_else(|| self.image_key.clone())
    }

    pub fn uploaded_at(&self) -> Option<DateTime<Utc>> {
        self.date
            .as_deref()
            .and_then(|d| DateTime::parse_from_rfc3339(d).ok())
            .map(|d| d.with_timezone(&Utc))
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct SizeDetailsResponse {
    #[serde(rename = "ImageSizeDetails")]
    pub details: BTreeMap<String, serde_json::Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub(crate) struct SizeDetail {
    pub url: String,
    #[serde(default)]
    pub width: Option<u32>,
    #[serde(default)]
    pub height: Option<u32>,
}

/// Last non-empty path segment of an API URI
pub(crate) fn last_segment(uri: &str) -> Option<&str> {
    uri.trim_end_matches('/')
        .rsplit('/')
        .next()
        .filter(|s| !s.is_empty())
}
