//! Flickr REST and upload endpoints

use async_trait::async_trait;
use regex::Regex;
use reqwest::multipart::{Form, Part};
use reqwest::Method;
use serde::de::DeserializeOwned;
use std::path::Path;
use std::sync::LazyLock;
use std::time::Duration;

use shutterpost_core::config::FlickrConfig;
use shutterpost_core::constants::FLICKR_SERVICE;

use crate::client::{file_body, ApiClient, Credentials};
use crate::error::{RemoteError, RemoteResult};
use crate::service::{ImageSize, PhotoService};

use super::types::{InfoResponse, PhotoInfo, SearchPhoto, SearchResponse, SizesResponse, Status};

/// Largest first
const SIZE_PREFERENCE: &[&str] = &[
    "Original",
    "Large 2048",
    "Large 1600",
    "Large",
    "Medium 800",
    "Medium 640",
    "Medium",
    "Small 320",
    "Small",
];

static PHOTO_ID: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"<photoid[^>]*>\s*([^<\s]+)\s*</photoid>").ok());
static UPLOAD_ERR: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r#"<err\s+code="(\d+)"\s+msg="([^"]*)""#).ok());

/// Authenticated Flickr client.
pub struct FlickrClient {
    api: ApiClient,
    api_url: String,
    upload_url: String,
    web_url: String,
}

impl FlickrClient {
    pub fn new(config: &FlickrConfig, timeout: Duration) -> RemoteResult<Self> {
        let mut credentials = Credentials::new();
        if let Some(key) = &config.api_key {
            credentials = credentials.with_api_key("api_key", key);
        }
        if let Some(token) = &config.access_token {
            credentials = credentials.with_bearer(token);
        }

        Ok(Self {
            api: ApiClient::new(credentials, timeout)?,
            api_url: config.api_url.clone(),
            upload_url: config.upload_url.clone(),
            web_url: config.web_url.trim_end_matches('/').to_string(),
        })
    }

    /// Read-only REST call
    async fn call<T: DeserializeOwned>(&self, method: &str, params: &[(&str, &str)]) -> RemoteResult<T> {
        let request = self
            .api
            .request(Method::GET, &self.api_url)
            .query(&[("method", method), ("format", "json"), ("nojsoncallback", "1")])
            .query(params);
        let text = self.api.send_text(request).await?;
        parse_rest(&text)
    }

    /// Mutating REST call, sent as a form post
    async fn call_write(&self, method: &str, params: &[(&str, &str)]) -> RemoteResult<()> {
        let mut form: Vec<(&str, &str)> =
            vec![("method", method), ("format", "json"), ("nojsoncallback", "1")];
        form.extend_from_slice(params);
        let request = self.api.request(Method::POST, &self.api_url).form(&form);
        let text = self.api.send_text(request).await?;
        parse_rest::<serde_json::Value>(&text).map(|_| ())
    }

    pub(crate) async fn get_info(&self, photo_id: &str) -> RemoteResult<PhotoInfo> {
        let response: InfoResponse = self
            .call("flickr.photos.getInfo", &[("photo_id", photo_id)])
            .await?;
        Ok(response.photo)
    }

    /// `flickr.photos.search`, with upload dates requested as extras
    pub(crate) async fn search(&self, params: &[(&str, &str)]) -> RemoteResult<Vec<SearchPhoto>> {
        let mut query: Vec<(&str, &str)> = vec![("extras", "date_upload")];
        query.extend_from_slice(params);
        let response: SearchResponse = self.call("flickr.photos.search", &query).await?;
        Ok(response.photos.photo)
    }
}

#[async_trait]
impl PhotoService for FlickrClient {
    fn name(&self) -> &str {
        FLICKR_SERVICE
    }

    #[tracing::instrument(skip(self, path), fields(service = FLICKR_SERVICE))]
    async fn upload_bytes(&self, path: &Path, filename: &str) -> RemoteResult<String> {
        let (body, length) = file_body(path).await?;
        let form = Form::new().part(
            "photo",
            Part::stream_with_length(body, length).file_name(filename.to_string()),
        );
        let request = self
            .api
            .request(Method::POST, &self.upload_url)
            .multipart(form);
        let text = self.api.send_text(request).await?;
        let photo_id = parse_upload_response(&text)?;

        tracing::info!(remote_id = %photo_id, bytes = length, "Uploaded photo to Flickr");
        Ok(photo_id)
    }

    async fn set_fields(&self, remote_id: &str, title: &str, description: &str) -> RemoteResult<()> {
        self.call_write(
            "flickr.photos.setMeta",
            &[
                ("photo_id", remote_id),
                ("title", title),
                ("description", description),
            ],
        )
        .await
    }

    async fn add_tags(&self, remote_id: &str, tags: &[String]) -> RemoteResult<()> {
        if tags.is_empty() {
            return Ok(());
        }
        let joined = join_tags(tags);
        self.call_write(
            "flickr.photos.addTags",
            &[("photo_id", remote_id), ("tags", joined.as_str())],
        )
        .await
    }

    async fn set_visibility(&self, remote_id: &str, is_private: bool) -> RemoteResult<()> {
        let is_public = if is_private { "0" } else { "1" };
        self.call_write(
            "flickr.photos.setPerms",
            &[
                ("photo_id", remote_id),
                ("is_public", is_public),
                ("is_friend", "0"),
                ("is_family", "0"),
            ],
        )
        .await
    }

    async fn page_url(&self, remote_id: &str) -> RemoteResult<String> {
        let info = self.get_info(remote_id).await?;
        info.photopage().map(str::to_string).ok_or_else(|| {
            RemoteError::InvalidResponse(format!("Photo {} has no photopage URL", remote_id))
        })
    }

    async fn available_sizes(&self, remote_id: &str) -> RemoteResult<Vec<ImageSize>> {
        let response: SizesResponse = self
            .call("flickr.photos.getSizes", &[("photo_id", remote_id)])
            .await?;
        Ok(response
            .sizes
            .size
            .into_iter()
            .map(|s| ImageSize {
                label: s.label,
                url: s.source,
                width: s.width,
                height: s.height,
            })
            .collect())
    }

    fn size_preference(&self) -> &[&'static str] {
        SIZE_PREFERENCE
    }

    fn default_image_url(&self, remote_id: &str) -> String {
        format!("{}/photo_zoom.gne?id={}&size=o", self.web_url, remote_id)
    }

    fn default_page_url(&self, remote_id: &str) -> String {
        format!("{}/photo.gne?id={}", self.web_url, remote_id)
    }
}

/// Space-separated tag list; tags containing spaces are double-quoted.
fn join_tags(tags: &[String]) -> String {
    tags.iter()
        .map(|tag| {
            let tag = tag.replace('"', "");
            if tag.contains(' ') {
                format!("\"{}\"", tag)
            } else {
                tag
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn parse_rest<T: DeserializeOwned>(text: &str) -> RemoteResult<T> {
    let status: Status = serde_json::from_str(text)
        .map_err(|e| RemoteError::InvalidResponse(format!("Failed to parse Flickr response: {}", e)))?;
    if status.stat != "ok" {
        return Err(RemoteError::Api {
            code: status.code.unwrap_or(-1),
            message: status.message.unwrap_or_else(|| "Unknown error".to_string()),
        });
    }
    serde_json::from_str(text)
        .map_err(|e| RemoteError::InvalidResponse(format!("Failed to parse Flickr response: {}", e)))
}

fn parse_upload_response(text: &str) -> RemoteResult<String> {
    if let Some(caps) = UPLOAD_ERR.as_ref().and_then(|re| re.captures(text)) {
        return Err(RemoteError::Api {
            code: caps[1].parse().unwrap_or(-1),
            message: caps[2].to_string(),
        });
    }
    PHOTO_ID
        .as_ref()
        .and_then(|re| re.captures(text))
        .map(|caps| caps[1].to_string())
        .ok_or_else(|| RemoteError::InvalidResponse(format!("No photo id in upload response: {}", text)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;
    use std::io::Write;

    fn client_for(server: &mockito::ServerGuard) -> FlickrClient {
        let config = FlickrConfig {
            api_url: format!("{}/services/rest/", server.url()),
            upload_url: format!("{}/services/upload/", server.url()),
            web_url: "https://www.flickr.com".to_string(),
            api_key: Some("key".to_string()),
            access_token: Some("token".to_string()),
            user_id: None,
        };
        FlickrClient::new(&config, Duration::from_secs(5)).unwrap()
    }

    #[test]
    fn test_join_tags_quotes_multiword() {
        let tags = vec![
            "sunset".to_string(),
            "golden hour".to_string(),
            "shutterpost:checksum=abc".to_string(),
        ];
        assert_eq!(
            join_tags(&tags),
            "sunset \"golden hour\" shutterpost:checksum=abc"
        );
    }

    #[test]
    fn test_parse_upload_response() {
        let ok = r#"<?xml version="1.0" encoding="utf-8" ?>
<rsp stat="ok">
<photoid>52814</photoid>
</rsp>"#;
        assert_eq!(parse_upload_response(ok).unwrap(), "52814");

        let fail = r#"<rsp stat="fail"><err code="5" msg="Filetype was not recognised" /></rsp>"#;
        match parse_upload_response(fail).unwrap_err() {
            RemoteError::Api { code, message } => {
                assert_eq!(code, 5);
                assert_eq!(message, "Filetype was not recognised");
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_parse_rest_failure() {
        let err = parse_rest::<serde_json::Value>(
            r#"{"stat":"fail","code":1,"message":"Photo not found"}"#,
        )
        .unwrap_err();
        assert!(matches!(err, RemoteError::Api { code: 1, .. }));
    }

    #[test]
    fn test_default_urls() {
        let config = FlickrConfig {
            api_url: "http://localhost/rest".to_string(),
            upload_url: "http://localhost/upload".to_string(),
            web_url: "https://www.flickr.com/".to_string(),
            api_key: None,
            access_token: None,
            user_id: None,
        };
        let client = FlickrClient::new(&config, Duration::from_secs(5)).unwrap();
        assert_eq!(
            client.default_page_url("123"),
            "https://www.flickr.com/photo.gne?id=123"
        );
        assert_eq!(client.name(), "flickr");
    }

    #[tokio::test]
    async fn test_upload_bytes_streams_file() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/services/upload/")
            .match_header("authorization", "Bearer token")
            .match_query(Matcher::UrlEncoded("api_key".into(), "key".into()))
            .match_body(Matcher::Regex("name=\"photo\"".to_string()))
            .with_body("<rsp stat=\"ok\"><photoid>777</photoid></rsp>")
            .create_async()
            .await;

        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"jpeg bytes").unwrap();

        let client = client_for(&server);
        let id = client.upload_bytes(file.path(), "IMG_1.jpg").await.unwrap();
        assert_eq!(id, "777");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_set_visibility_private() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/services/rest/")
            .match_query(Matcher::Any)
            .match_body(Matcher::AllOf(vec![
                Matcher::UrlEncoded("method".into(), "flickr.photos.setPerms".into()),
                Matcher::UrlEncoded("photo_id".into(), "777".into()),
                Matcher::UrlEncoded("is_public".into(), "0".into()),
                Matcher::UrlEncoded("is_friend".into(), "0".into()),
                Matcher::UrlEncoded("is_family".into(), "0".into()),
            ]))
            .with_body(r#"{"stat":"ok"}"#)
            .create_async()
            .await;

        client_for(&server).set_visibility("777", true).await.unwrap();
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_add_tags_failure_is_api_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/services/rest/")
            .match_query(Matcher::Any)
            .with_body(r#"{"stat":"fail","code":99,"message":"Insufficient permissions"}"#)
            .create_async()
            .await;

        let err = client_for(&server)
            .add_tags("777", &["a".to_string()])
            .await
            .unwrap_err();
        assert!(matches!(err, RemoteError::Api { code: 99, .. }));
    }

    #[tokio::test]
    async fn test_available_sizes() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/services/rest/")
            .match_query(Matcher::UrlEncoded(
                "method".into(),
                "flickr.photos.getSizes".into(),
            ))
            .with_body(
                r#"{"stat":"ok","sizes":{"size":[
                    {"label":"Small","width":240,"height":160,"source":"https://live/s.jpg"},
                    {"label":"Large","width":"1024","height":"683","source":"https://live/b.jpg"}
                ]}}"#,
            )
            .create_async()
            .await;

        let sizes = client_for(&server).available_sizes("777").await.unwrap();
        assert_eq!(sizes.len(), 2);
        assert_eq!(sizes[1].label, "Large");
        assert_eq!(sizes[1].url, "https://live/b.jpg");
        assert_eq!(sizes[1].width, Some(1024));
    }
}
