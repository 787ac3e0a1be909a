//! Recording mocks of the remote service and searcher

use async_trait::async_trait;
use chrono::Utc;
use shutterpost_core::{FileFingerprint, FileInfo, UploadRecord};
use shutterpost_services::{ImageSize, PhotoService, RemoteError, RemoteResult, RemoteSearcher};
use std::collections::HashSet;
use std::path::Path;
use std::sync::{Arc, Mutex};

pub const SERVICE: &str = "mocksvc";

fn failure(call: &str) -> RemoteError {
    RemoteError::Api {
        code: 500,
        message: format!("{} rejected", call),
    }
}

/// Photo service that records every call and fails the ones it is told to.
#[derive(Clone, Default)]
pub struct MockPhotoService {
    calls: Arc<Mutex<Vec<String>>>,
    failing: Arc<Mutex<HashSet<&'static str>>>,
    tags: Arc<Mutex<Vec<String>>>,
    next_id: Arc<Mutex<u32>>,
}

impl MockPhotoService {
    pub fn new() -> Self {
        let service = Self::default();
        *service.next_id.lock().unwrap() = 100;
        service
    }

    /// Make `call` (e.g. "upload_bytes", "set_fields") fail from now on.
    pub fn fail(&self, call: &'static str) -> &Self {
        self.failing.lock().unwrap().insert(call);
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count(&self, call: &str) -> usize {
        self.calls().iter().filter(|c| c.as_str() == call).count()
    }

    pub fn tags(&self) -> Vec<String> {
        self.tags.lock().unwrap().clone()
    }

    fn enter(&self, call: &'static str) -> RemoteResult<()> {
        self.calls.lock().unwrap().push(call.to_string());
        if self.failing.lock().unwrap().contains(call) {
            Err(failure(call))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl PhotoService for MockPhotoService {
    fn name(&self) -> &str {
        SERVICE
    }

    async fn upload_bytes(&self, _path: &Path, _filename: &str) -> RemoteResult<String> {
        self.enter("upload_bytes")?;
        let mut next = self.next_id.lock().unwrap();
        *next += 1;
        Ok(next.to_string())
    }

    async fn set_fields(&self, _id: &str, _title: &str, _description: &str) -> RemoteResult<()> {
        self.enter("set_fields")
    }

    async fn add_tags(&self, _id: &str, tags: &[String]) -> RemoteResult<()> {
        self.enter("add_tags")?;
        self.tags.lock().unwrap().extend(tags.iter().cloned());
        Ok(())
    }

    async fn set_visibility(&self, _id: &str, _is_private: bool) -> RemoteResult<()> {
        self.enter("set_visibility")
    }

    async fn page_url(&self, id: &str) -> RemoteResult<String> {
        self.enter("page_url")?;
        Ok(format!("https://svc/x/{}", id))
    }

    async fn available_sizes(&self, id: &str) -> RemoteResult<Vec<ImageSize>> {
        self.enter("available_sizes")?;
        Ok(vec![
            ImageSize {
                label: "Small".to_string(),
                url: format!("https://svc/img/{}_s.jpg", id),
                width: Some(240),
                height: Some(160),
            },
            ImageSize {
                label: "Original".to_string(),
                url: format!("https://svc/img/{}_o.jpg", id),
                width: Some(4000),
                height: Some(3000),
            },
        ])
    }

    fn size_preference(&self) -> &[&'static str] {
        &["Original", "Large", "Small"]
    }

    fn default_image_url(&self, id: &str) -> String {
        format!("https://svc/default/{}.jpg", id)
    }

    fn default_page_url(&self, id: &str) -> String {
        format!("https://svc/page/{}", id)
    }
}

/// Canned answer of one searcher method
#[derive(Clone)]
pub enum Answer {
    Miss,
    Hit(&'static str),
    Fail,
}

/// Searcher returning canned answers and counting calls.
#[derive(Clone)]
pub struct MockSearcher {
    by_fingerprint: Answer,
    by_metadata: Answer,
    calls: Arc<Mutex<Vec<&'static str>>>,
}

impl MockSearcher {
    pub fn new(by_fingerprint: Answer, by_metadata: Answer) -> Self {
        Self {
            by_fingerprint,
            by_metadata,
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn count(&self, call: &str) -> usize {
        self.calls.lock().unwrap().iter().filter(|c| **c == call).count()
    }

    fn respond(&self, call: &'static str, answer: &Answer, fp: &FileFingerprint) -> RemoteResult<Option<UploadRecord>> {
        self.calls.lock().unwrap().push(call);
        match answer {
            Answer::Miss => Ok(None),
            Answer::Hit(id) => Ok(Some(UploadRecord {
                fingerprint: fp.clone(),
                service: SERVICE.to_string(),
                remote_id: id.to_string(),
                page_url: format!("https://svc/x/{}", id),
                image_url: format!("https://svc/img/{}_o.jpg", id),
                uploaded_at: Utc::now(),
                filename: "remote".to_string(),
                size: 0,
            })),
            Answer::Fail => Err(RemoteError::Status {
                status: 503,
                body: "unavailable".to_string(),
            }),
        }
    }
}

#[async_trait]
impl RemoteSearcher for MockSearcher {
    fn service(&self) -> &str {
        SERVICE
    }

    async fn search_by_fingerprint(
        &self,
        fingerprint: &FileFingerprint,
    ) -> RemoteResult<Option<UploadRecord>> {
        self.respond("search_by_fingerprint", &self.by_fingerprint, fingerprint)
    }

    async fn search_by_metadata(&self, file: &FileInfo) -> RemoteResult<Option<UploadRecord>> {
        self.respond("search_by_metadata", &self.by_metadata, &file.fingerprint)
    }
}
