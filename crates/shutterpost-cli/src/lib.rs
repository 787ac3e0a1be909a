//! Wiring shared by the `shutterpost` binary: tracing setup, service
//! construction from configuration and JSON reporting.

use anyhow::Context;
use serde::Serialize;
use serde_json::json;
use std::fmt::Display;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use shutterpost_core::constants::{FLICKR_SERVICE, SMUGMUG_SERVICE};
use shutterpost_core::{ErrorMetadata, LogLevel, ShutterpostConfig};
use shutterpost_db::UploadCacheRepository;
use shutterpost_processing::{DuplicateChecker, UploadOrchestrator, UploadPipeline};
use shutterpost_services::{
    FlickrClient, FlickrSearcher, PhotoService, SearcherRegistry, SmugMugClient, SmugMugSearcher,
};

/// Initialize tracing. Logs go to stderr so stdout carries only JSON.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("shutterpost=info")),
        )
        .init();
}

/// Open the upload cache named by the configuration.
pub async fn open_cache(config: &ShutterpostConfig) -> anyhow::Result<UploadCacheRepository> {
    UploadCacheRepository::open(&config.cache_path, config.db_max_connections)
        .await
        .with_context(|| format!("Failed to open upload cache at {}", config.cache_path.display()))
}

/// Remote operations for the active service, plus its searcher when remote
/// search is enabled.
pub async fn build_service(
    config: &ShutterpostConfig,
    cache: &UploadCacheRepository,
) -> anyhow::Result<(Arc<dyn PhotoService>, SearcherRegistry)> {
    let timeout = Duration::from_secs(config.http_timeout_secs);
    let registry = SearcherRegistry::new();

    let service: Arc<dyn PhotoService> = match config.service.as_str() {
        FLICKR_SERVICE => {
            let client = Arc::new(
                FlickrClient::new(&config.flickr, timeout)
                    .context("Failed to create Flickr client")?,
            );
            if config.remote_search_enabled {
                let mut searcher = FlickrSearcher::new(client.clone(), &config.machine_tag_namespace)
                    .with_cache_hints(cache.clone());
                if let Some(user_id) = &config.flickr.user_id {
                    searcher = searcher.with_user_id(user_id);
                }
                registry.register(Arc::new(searcher)).await;
            }
            client as Arc<dyn PhotoService>
        }
        SMUGMUG_SERVICE => {
            let client = Arc::new(
                SmugMugClient::new(&config.smugmug, timeout)
                    .context("Failed to create SmugMug client")?,
            );
            if config.remote_search_enabled {
                let mut searcher =
                    SmugMugSearcher::new(client.clone(), &config.machine_tag_namespace);
                if let Some(nickname) = &config.smugmug.nickname {
                    searcher = searcher.with_nickname(nickname);
                }
                registry.register(Arc::new(searcher)).await;
            }
            client as Arc<dyn PhotoService>
        }
        other => anyhow::bail!("Unknown service '{}'", other),
    };

    Ok((service, registry))
}

/// Full upload pipeline for the active service.
pub async fn build_pipeline(
    config: &ShutterpostConfig,
    cache: &UploadCacheRepository,
) -> anyhow::Result<UploadPipeline> {
    let (service, registry) = build_service(config, cache).await?;
    let checker = DuplicateChecker::from_registry(cache.clone(), &config.service, &registry).await;
    Ok(
        UploadPipeline::new(checker, UploadOrchestrator::new(service))
            .with_machine_tag_namespace(&config.machine_tag_namespace),
    )
}

/// One JSON line per input file: `{"path", "result"}` or `{"path", "error"}`.
pub fn file_report<T, E>(path: &Path, result: &Result<T, E>) -> serde_json::Value
where
    T: Serialize,
    E: ErrorMetadata + Display,
{
    match result {
        Ok(value) => json!({
            "path": path.display().to_string(),
            "result": value,
        }),
        Err(err) => {
            log_error(path, err);
            json!({
                "path": path.display().to_string(),
                "error": {
                    "code": err.error_code(),
                    "message": err.to_string(),
                    "recoverable": err.is_recoverable(),
                },
            })
        }
    }
}

fn log_error<E: ErrorMetadata + Display>(path: &Path, err: &E) {
    let path = path.display();
    match err.log_level() {
        LogLevel::Debug => tracing::debug!(path = %path, code = err.error_code(), error = %err, "Failed"),
        LogLevel::Warn => tracing::warn!(path = %path, code = err.error_code(), error = %err, "Failed"),
        LogLevel::Error => tracing::error!(path = %path, code = err.error_code(), error = %err, "Failed"),
    }
}

/// Print a value as compact JSON on one line.
pub fn print_json(value: &impl Serialize) -> anyhow::Result<()> {
    let out = serde_json::to_string(value).context("Serialize output")?;
    println!("{}", out);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use shutterpost_core::FileError;
    use std::collections::HashMap;
    use std::path::PathBuf;

    fn config(pairs: &[(&str, &str)], cache_dir: &Path) -> ShutterpostConfig {
        let mut vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        vars.insert(
            "SHUTTERPOST_CACHE_PATH".to_string(),
            cache_dir.join("uploads.db").display().to_string(),
        );
        ShutterpostConfig::from_lookup(|key| vars.get(key).cloned()).unwrap()
    }

    #[test]
    fn test_file_report_success() {
        let result: Result<_, FileError> = Ok(json!({"remote_id": "1"}));
        let report = file_report(Path::new("/a.jpg"), &result);
        assert_eq!(report["path"], "/a.jpg");
        assert_eq!(report["result"]["remote_id"], "1");
        assert!(report.get("error").is_none());
    }

    #[test]
    fn test_file_report_error() {
        let result: Result<(), _> = Err(FileError::NotFound(PathBuf::from("/a.jpg")));
        let report = file_report(Path::new("/a.jpg"), &result);
        assert_eq!(report["error"]["code"], "FILE_NOT_FOUND");
        assert_eq!(report["error"]["recoverable"], false);
    }

    #[tokio::test]
    async fn test_build_service_registers_searcher() {
        let dir = tempfile::tempdir().unwrap();
        let config = config(&[("FLICKR_API_KEY", "k")], dir.path());
        let cache = open_cache(&config).await.unwrap();

        let (service, registry) = build_service(&config, &cache).await.unwrap();
        assert_eq!(service.name(), "flickr");
        assert_eq!(registry.names().await, vec!["flickr"]);
    }

    #[tokio::test]
    async fn test_remote_search_disabled_leaves_registry_empty() {
        let dir = tempfile::tempdir().unwrap();
        let config = config(
            &[
                ("SHUTTERPOST_SERVICE", "smugmug"),
                ("SHUTTERPOST_REMOTE_SEARCH", "false"),
                ("SMUGMUG_API_KEY", "k"),
                ("SMUGMUG_ALBUM_URI", "/api/v2/album/x"),
            ],
            dir.path(),
        );
        let cache = open_cache(&config).await.unwrap();

        let (service, registry) = build_service(&config, &cache).await.unwrap();
        assert_eq!(service.name(), "smugmug");
        assert!(registry.names().await.is_empty());
    }

    #[tokio::test]
    async fn test_unknown_service_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let config = config(&[("SHUTTERPOST_SERVICE", "picasa")], dir.path());
        let cache = open_cache(&config).await.unwrap();

        assert!(build_service(&config, &cache).await.is_err());
    }
}
