//! Flickr duplicate search

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;

use shutterpost_core::constants::FLICKR_SERVICE;
use shutterpost_core::{
    checksum_machine_tag, parse_checksum_machine_tag, FileFingerprint, FileInfo, UploadRecord,
};
use shutterpost_db::UploadCacheRepository;

use crate::error::{RemoteError, RemoteResult};
use crate::search::RemoteSearcher;
use crate::service::resolve_urls;

use super::client::FlickrClient;
use super::types::{timestamp, PhotoInfo};

/// Flickr error code for an unknown or inaccessible photo
const PHOTO_NOT_FOUND: i64 = 1;

/// Free-text candidates fetched per metadata search
const TEXT_SEARCH_PER_PAGE: &str = "20";

/// Finds earlier uploads by checksum machine tag, falling back to title search.
pub struct FlickrSearcher {
    client: Arc<FlickrClient>,
    namespace: String,
    user_id: Option<String>,
    hints: Option<UploadCacheRepository>,
}

impl FlickrSearcher {
    pub fn new(client: Arc<FlickrClient>, namespace: impl Into<String>) -> Self {
        Self {
            client,
            namespace: namespace.into(),
            user_id: None,
            hints: None,
        }
    }

    /// Scope searches to this account instead of the calling user (`me`).
    pub fn with_user_id(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }

    /// Use prior cache rows with the same filename as metadata-search candidates.
    pub fn with_cache_hints(mut self, cache: UploadCacheRepository) -> Self {
        self.hints = Some(cache);
        self
    }

    fn user_scope(&self) -> &str {
        self.user_id.as_deref().unwrap_or("me")
    }

    async fn to_record(
        &self,
        fingerprint: &FileFingerprint,
        remote_id: &str,
        filename: &str,
        uploaded_at: Option<DateTime<Utc>>,
    ) -> UploadRecord {
        let urls = resolve_urls(self.client.as_ref(), remote_id).await;
        UploadRecord {
            fingerprint: fingerprint.clone(),
            service: FLICKR_SERVICE.to_string(),
            remote_id: remote_id.to_string(),
            page_url: urls.page_url,
            image_url: urls.image_url,
            uploaded_at: uploaded_at.unwrap_or_else(Utc::now),
            filename: filename.to_string(),
            size: 0,
        }
    }

    /// Remote ids of cached uploads with the same filename, newest first.
    async fn hinted_ids(&self, filename: &str) -> Vec<String> {
        let Some(cache) = &self.hints else {
            return Vec::new();
        };
        match cache.find_by_filename(filename).await {
            Ok(records) => records
                .into_iter()
                .filter(|r| r.service == FLICKR_SERVICE)
                .map(|r| r.remote_id)
                .collect(),
            Err(e) => {
                tracing::warn!(error = %e, filename = %filename, "Cache filename lookup failed");
                Vec::new()
            }
        }
    }

    /// Title or description mentions the stem, and any checksum tag agrees.
    fn confirms(&self, info: &PhotoInfo, file: &FileInfo) -> bool {
        let stem = file.stem().to_lowercase();
        let mentioned = info.title.content.to_lowercase().contains(&stem)
            || info.description.content.to_lowercase().contains(&stem);
        if !mentioned {
            return false;
        }
        info.raw_tags()
            .filter_map(|tag| parse_checksum_machine_tag(&self.namespace, tag))
            .all(|tagged| tagged == file.fingerprint)
    }
}

#[async_trait]
impl RemoteSearcher for FlickrSearcher {
    fn service(&self) -> &str {
        FLICKR_SERVICE
    }

    #[tracing::instrument(skip(self, fingerprint), fields(service = FLICKR_SERVICE, fingerprint = %fingerprint))]
    async fn search_by_fingerprint(
        &self,
        fingerprint: &FileFingerprint,
    ) -> RemoteResult<Option<UploadRecord>> {
        let tag = checksum_machine_tag(&self.namespace, fingerprint);

        let mut photos = self
            .client
            .search(&[("machine_tags", tag.as_str()), ("user_id", self.user_scope())])
            .await?;
        if photos.is_empty() {
            tracing::debug!("No scoped match, retrying unscoped");
            photos = self.client.search(&[("machine_tags", tag.as_str())]).await?;
        }

        let Some(photo) = photos.into_iter().next() else {
            return Ok(None);
        };
        let record = self
            .to_record(fingerprint, &photo.id, &photo.title, timestamp(photo.dateupload))
            .await;
        Ok(Some(record))
    }

    #[tracing::instrument(skip(self, file), fields(service = FLICKR_SERVICE, filename = %file.filename))]
    async fn search_by_metadata(&self, file: &FileInfo) -> RemoteResult<Option<UploadRecord>> {
        let mut candidates = self.hinted_ids(&file.filename).await;
        let found = self
            .client
            .search(&[
                ("text", file.stem()),
                ("user_id", self.user_scope()),
                ("per_page", TEXT_SEARCH_PER_PAGE),
            ])
            .await?;
        for photo in found {
            if !candidates.contains(&photo.id) {
                candidates.push(photo.id);
            }
        }

        for remote_id in candidates {
            let info = match self.client.get_info(&remote_id).await {
                Ok(info) => info,
                Err(RemoteError::Api {
                    code: PHOTO_NOT_FOUND,
                    ..
                }) => {
                    tracing::debug!(remote_id = %remote_id, "Candidate no longer exists");
                    continue;
                }
                Err(e) => return Err(e),
            };
            if self.confirms(&info, file) {
                tracing::info!(remote_id = %remote_id, "Matched earlier upload by filename");
                let record = self
                    .to_record(
                        &file.fingerprint,
                        &info.id,
                        &file.filename,
                        timestamp(info.dateuploaded),
                    )
                    .await;
                return Ok(Some(record));
            }
        }

        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;
    use shutterpost_core::config::FlickrConfig;
    use std::time::Duration;

    const MD5: &str = "5eb63bbbe01eeed093cb22bb8f5acdc3";

    fn searcher_for(server: &mockito::ServerGuard) -> FlickrSearcher {
        let config = FlickrConfig {
            api_url: format!("{}/rest", server.url()),
            upload_url: format!("{}/upload", server.url()),
            web_url: "https://www.flickr.com".to_string(),
            api_key: Some("key".to_string()),
            access_token: None,
            user_id: None,
        };
        let client = Arc::new(FlickrClient::new(&config, Duration::from_secs(5)).unwrap());
        FlickrSearcher::new(client, "shutterpost").with_user_id("12345@N00")
    }

    fn file_info() -> FileInfo {
        FileInfo::new("/photos/IMG_0001.jpg", MD5.parse().unwrap(), 11)
    }

    async fn mock_method(
        server: &mut mockito::ServerGuard,
        method: &str,
        extra: Vec<Matcher>,
        body: &str,
    ) -> mockito::Mock {
        let mut matchers = vec![Matcher::UrlEncoded("method".into(), method.into())];
        matchers.extend(extra);
        server
            .mock("GET", "/rest")
            .match_query(Matcher::AllOf(matchers))
            .with_body(body)
            .create_async()
            .await
    }

    async fn mock_urls(server: &mut mockito::ServerGuard, id: &str) {
        mock_method(
            server,
            "flickr.photos.getInfo",
            vec![Matcher::UrlEncoded("photo_id".into(), id.into())],
            &format!(
                r#"{{"stat":"ok","photo":{{"id":"{id}","title":{{"_content":"IMG_0001"}},
                "description":{{"_content":""}},"tags":{{"tag":[]}},
                "urls":{{"url":[{{"type":"photopage","_content":"https://www.flickr.com/photos/me/{id}/"}}]}}}}}}"#
            ),
        )
        .await;
        mock_method(
            server,
            "flickr.photos.getSizes",
            vec![Matcher::UrlEncoded("photo_id".into(), id.into())],
            r#"{"stat":"ok","sizes":{"size":[{"label":"Original","width":10,"height":10,"source":"https://live/o.jpg"}]}}"#,
        )
        .await;
    }

    #[tokio::test]
    async fn test_fingerprint_search_scoped_hit() {
        let mut server = mockito::Server::new_async().await;
        let search = mock_method(
            &mut server,
            "flickr.photos.search",
            vec![
                Matcher::UrlEncoded(
                    "machine_tags".into(),
                    format!("shutterpost:checksum={}", MD5),
                ),
                Matcher::UrlEncoded("user_id".into(), "12345@N00".into()),
            ],
            r#"{"stat":"ok","photos":{"photo":[{"id":"99","title":"IMG_0001","dateupload":"1700000000"}]}}"#,
        )
        .await;
        mock_urls(&mut server, "99").await;

        let searcher = searcher_for(&server);
        let record = searcher
            .search_by_fingerprint(&MD5.parse().unwrap())
            .await
            .unwrap()
            .unwrap();

        assert_eq!(record.remote_id, "99");
        assert_eq!(record.service, "flickr");
        assert_eq!(record.page_url, "https://www.flickr.com/photos/me/99/");
        assert_eq!(record.image_url, "https://live/o.jpg");
        assert_eq!(record.uploaded_at.timestamp(), 1_700_000_000);
        search.assert_async().await;
    }

    #[tokio::test]
    async fn test_fingerprint_search_miss_tries_unscoped() {
        let mut server = mockito::Server::new_async().await;
        let searches = server
            .mock("GET", "/rest")
            .match_query(Matcher::UrlEncoded(
                "method".into(),
                "flickr.photos.search".into(),
            ))
            .with_body(r#"{"stat":"ok","photos":{"photo":[]}}"#)
            .expect(2)
            .create_async()
            .await;

        let searcher = searcher_for(&server);
        let record = searcher
            .search_by_fingerprint(&MD5.parse().unwrap())
            .await
            .unwrap();

        assert!(record.is_none());
        searches.assert_async().await;
    }

    #[tokio::test]
    async fn test_fingerprint_search_transport_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/rest")
            .match_query(Matcher::Any)
            .with_status(502)
            .create_async()
            .await;

        let err = searcher_for(&server)
            .search_by_fingerprint(&MD5.parse().unwrap())
            .await
            .unwrap_err();
        assert!(err.is_transport());
    }

    #[tokio::test]
    async fn test_metadata_search_rejects_conflicting_checksum() {
        let mut server = mockito::Server::new_async().await;
        mock_method(
            &mut server,
            "flickr.photos.search",
            vec![Matcher::UrlEncoded("text".into(), "IMG_0001".into())],
            r#"{"stat":"ok","photos":{"photo":[{"id":"55","title":"IMG_0001"}]}}"#,
        )
        .await;
        mock_method(
            &mut server,
            "flickr.photos.getInfo",
            vec![Matcher::UrlEncoded("photo_id".into(), "55".into())],
            r#"{"stat":"ok","photo":{"id":"55","title":{"_content":"IMG_0001"},
            "description":{"_content":""},
            "tags":{"tag":[{"raw":"shutterpost:checksum=00000000000000000000000000000000"}]},
            "urls":{"url":[]}}}"#,
        )
        .await;

        let record = searcher_for(&server)
            .search_by_metadata(&file_info())
            .await
            .unwrap();
        assert!(record.is_none());
    }

    #[tokio::test]
    async fn test_metadata_search_confirms_title_match() {
        let mut server = mockito::Server::new_async().await;
        mock_method(
            &mut server,
            "flickr.photos.search",
            vec![Matcher::UrlEncoded("text".into(), "IMG_0001".into())],
            r#"{"stat":"ok","photos":{"photo":[{"id":"66","title":"img_0001 at the beach"}]}}"#,
        )
        .await;
        mock_urls(&mut server, "66").await;

        let record = searcher_for(&server)
            .search_by_metadata(&file_info())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(record.remote_id, "66");
        assert_eq!(record.filename, "IMG_0001.jpg");
        assert_eq!(record.fingerprint.as_str(), MD5);
    }

    #[tokio::test]
    async fn test_metadata_search_skips_deleted_candidate() {
        let mut server = mockito::Server::new_async().await;
        mock_method(
            &mut server,
            "flickr.photos.search",
            vec![],
            r#"{"stat":"ok","photos":{"photo":[{"id":"77","title":"IMG_0001"}]}}"#,
        )
        .await;
        mock_method(
            &mut server,
            "flickr.photos.getInfo",
            vec![],
            r#"{"stat":"fail","code":1,"message":"Photo not found"}"#,
        )
        .await;

        let record = searcher_for(&server)
            .search_by_metadata(&file_info())
            .await
            .unwrap();
        assert!(record.is_none());
    }

    #[tokio::test]
    async fn test_metadata_search_transport_error_propagates() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/rest")
            .match_query(Matcher::Any)
            .with_status(500)
            .create_async()
            .await;

        let err = searcher_for(&server)
            .search_by_metadata(&file_info())
            .await
            .unwrap_err();
        assert!(err.is_transport());
    }
}
