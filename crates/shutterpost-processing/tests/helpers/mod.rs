//! Shared fixtures for pipeline integration tests.

#![allow(dead_code)]

pub mod mocks;

use std::path::PathBuf;
use std::sync::Arc;
use tempfile::TempDir;

use shutterpost_db::UploadCacheRepository;
use shutterpost_processing::{DuplicateChecker, UploadOrchestrator, UploadPipeline};

use mocks::{MockPhotoService, MockSearcher, SERVICE};

/// Scratch directory holding the cache file and test photos.
pub struct TestEnv {
    pub dir: TempDir,
    pub cache: UploadCacheRepository,
    pub service: MockPhotoService,
}

impl TestEnv {
    pub async fn new() -> Self {
        let dir = tempfile::tempdir().expect("temp dir");
        let cache = UploadCacheRepository::open(dir.path().join("cache/uploads.db"), 4)
            .await
            .expect("open cache");
        Self {
            dir,
            cache,
            service: MockPhotoService::new(),
        }
    }

    /// Write a photo with the given contents and return its path.
    pub fn photo(&self, name: &str, contents: &[u8]) -> PathBuf {
        let path = self.dir.path().join(name);
        std::fs::write(&path, contents).expect("write photo");
        path
    }

    pub fn checker(&self, searcher: Option<MockSearcher>) -> DuplicateChecker {
        DuplicateChecker::new(
            self.cache.clone(),
            SERVICE,
            searcher.map(|s| Arc::new(s) as Arc<dyn shutterpost_services::RemoteSearcher>),
        )
    }

    pub fn orchestrator(&self) -> UploadOrchestrator {
        UploadOrchestrator::new(Arc::new(self.service.clone()))
    }

    pub fn pipeline(&self, searcher: Option<MockSearcher>) -> UploadPipeline {
        UploadPipeline::new(self.checker(searcher), self.orchestrator())
    }
}
