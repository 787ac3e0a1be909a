//! Flickr REST response shapes

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Deserializer};

/// `stat` envelope present on every REST response
#[derive(Debug, Deserialize)]
pub(crate) struct Status {
    pub stat: String,
    #[serde(default)]
    pub code: Option<i64>,
    #[serde(default)]
    pub message: Option<String>,
}

/// `{"_content": "..."}` wrapper used for text fields
#[derive(Debug, Default, Deserialize)]
pub(crate) struct Content {
    #[serde(rename = "_content", default)]
    pub content: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct SearchResponse {
    pub photos: SearchPage,
}

#[derive(Debug, Deserialize)]
pub(crate) struct SearchPage {
    #[serde(default)]
    pub photo: Vec<SearchPhoto>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct SearchPhoto {
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default, deserialize_with = "lenient_i64")]
    pub dateupload: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct InfoResponse {
    pub photo: PhotoInfo,
}

#[derive(Debug, Deserialize)]
pub(crate) struct PhotoInfo {
    pub id: String,
    #[serde(default, deserialize_with = "lenient_i64")]
    pub dateuploaded: Option<i64>,
    #[serde(default)]
    pub title: Content,
    #[serde(default)]
    pub description: Content,
    #[serde(default)]
    pub tags: Tags,
    #[serde(default)]
    pub urls: Urls,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct Tags {
    #[serde(default)]
    pub tag: Vec<Tag>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct Tag {
    #[serde(default)]
    pub raw: String,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct Urls {
    #[serde(default)]
    pub url: Vec<PhotoUrl>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct PhotoUrl {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(rename = "_content")]
    pub content: String,
}

impl PhotoInfo {
    pub fn photopage(&self) -> Option<&str> {
        self.urls
            .url
            .iter()
            .find(|u| u.kind == "photopage")
            .map(|u| u.content.as_str())
    }

    pub fn raw_tags(&self) -> impl Iterator<Item = &str> {
        self.tags.tag.iter().map(|t| t.raw.as_str())
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct SizesResponse {
    pub sizes: SizeList,
}

#[derive(Debug, Deserialize)]
pub(crate) struct SizeList {
    #[serde(default)]
    pub size: Vec<Size>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct Size {
    pub label: String,
    pub source: String,
    #[serde(default, deserialize_with = "lenient_u32")]
    pub width: Option<u32>,
    #[serde(default, deserialize_with = "lenient_u32")]
    pub height: Option<u32>,
}

/// Unix timestamp to UTC, if present and in range
pub(crate) fn timestamp(secs: Option<i64>) -> Option<DateTime<Utc>> {
    secs.and_then(|s| Utc.timestamp_opt(s, 0).single())
}

// Flickr sends numbers as JSON numbers, numeric strings or `false`.
fn lenient_u64<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(match value {
        serde_json::Value::Number(n) => n.as_u64(),
        serde_json::Value::String(s) => s.trim().parse().ok(),
        _ => None,
    })
}

fn lenient_u32<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(lenient_u64(deserializer)?.and_then(|n| u32::try_from(n).ok()))
}

fn lenient_i64<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(lenient_u64(deserializer)?.and_then(|n| i64::try_from(n).ok()))
}
