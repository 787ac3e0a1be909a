//! Configuration module
//!
//! Settings for the cache store, the active remote service and the
//! credentials of the already-authenticated service clients. Only the binary
//! reads the environment; the pipeline receives everything through these
//! structures.

use std::env;
use std::path::PathBuf;

use crate::constants::{
    APP_DIR_NAME, CACHE_FILE_NAME, DEFAULT_MACHINE_TAG_NAMESPACE, DEFAULT_SERVICE,
    FLICKR_SERVICE, SMUGMUG_SERVICE,
};

// Common constants
const BATCH_CONCURRENCY: usize = 2;
const HTTP_TIMEOUT_SECS: u64 = 120;
const DB_MAX_CONNECTIONS: u32 = 4;

const FLICKR_API_URL: &str = "https://api.flickr.com/services/rest/";
const FLICKR_UPLOAD_URL: &str = "https://up.flickr.com/services/upload/";
const FLICKR_WEB_URL: &str = "https://www.flickr.com";
const SMUGMUG_API_URL: &str = "https://api.smugmug.com";
const SMUGMUG_UPLOAD_URL: &str = "https://upload.smugmug.com/";
const SMUGMUG_WEB_URL: &str = "https://www.smugmug.com";

/// Flickr client settings
#[derive(Clone, Debug)]
pub struct FlickrConfig {
    pub api_url: String,
    pub upload_url: String,
    pub web_url: String,
    pub api_key: Option<String>,
    pub access_token: Option<String>,
    /// NSID used to scope searches; `me` is used when unset.
    pub user_id: Option<String>,
}

/// SmugMug client settings
#[derive(Clone, Debug)]
pub struct SmugMugConfig {
    pub api_url: String,
    pub upload_url: String,
    pub web_url: String,
    pub api_key: Option<String>,
    pub access_token: Option<String>,
    pub nickname: Option<String>,
    /// Album receiving uploads, e.g. `/api/v2/album/abc123`.
    pub album_uri: Option<String>,
}

/// Application configuration.
#[derive(Clone, Debug)]
pub struct ShutterpostConfig {
    pub cache_path: PathBuf,
    pub service: String,
    pub remote_search_enabled: bool,
    pub machine_tag_namespace: String,
    pub batch_concurrency: usize,
    pub http_timeout_secs: u64,
    pub db_max_connections: u32,
    pub flickr: FlickrConfig,
    pub smugmug: SmugMugConfig,
}

/// Fixed location of the cache file under the user's config directory.
pub fn default_cache_path() -> PathBuf {
    dirs::config_dir()
        .or_else(dirs::home_dir)
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR_NAME)
        .join(CACHE_FILE_NAME)
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

impl ShutterpostConfig {
    /// Load configuration from the process environment (and `.env`, if present).
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build configuration from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, anyhow::Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| non_empty(lookup(key));

        let cache_path = var("SHUTTERPOST_CACHE_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(default_cache_path);

        let remote_search_enabled = match var("SHUTTERPOST_REMOTE_SEARCH") {
            Some(raw) => parse_bool(&raw).ok_or_else(|| {
                anyhow::anyhow!("SHUTTERPOST_REMOTE_SEARCH must be a boolean, got '{}'", raw)
            })?,
            None => true,
        };

        let batch_concurrency = match var("SHUTTERPOST_BATCH_CONCURRENCY") {
            Some(raw) => raw.trim().parse::<usize>().map_err(|e| {
                anyhow::anyhow!("SHUTTERPOST_BATCH_CONCURRENCY is invalid: {}", e)
            })?,
            None => BATCH_CONCURRENCY,
        };

        let http_timeout_secs = var("SHUTTERPOST_HTTP_TIMEOUT_SECS")
            .and_then(|v| v.trim().parse::<u64>().ok())
            .unwrap_or(HTTP_TIMEOUT_SECS);

        let db_max_connections = var("SHUTTERPOST_DB_MAX_CONNECTIONS")
            .and_then(|v| v.trim().parse::<u32>().ok())
            .unwrap_or(DB_MAX_CONNECTIONS);

        let config = ShutterpostConfig {
            cache_path,
            service: var("SHUTTERPOST_SERVICE")
                .map(|s| s.trim().to_lowercase())
                .unwrap_or_else(|| DEFAULT_SERVICE.to_string()),
            remote_search_enabled,
            machine_tag_namespace: var("SHUTTERPOST_MACHINE_TAG_NAMESPACE")
                .unwrap_or_else(|| DEFAULT_MACHINE_TAG_NAMESPACE.to_string()),
            batch_concurrency,
            http_timeout_secs,
            db_max_connections,
            flickr: FlickrConfig {
                api_url: var("FLICKR_API_URL").unwrap_or_else(|| FLICKR_API_URL.to_string()),
                upload_url: var("FLICKR_UPLOAD_URL")
                    .unwrap_or_else(|| FLICKR_UPLOAD_URL.to_string()),
                web_url: var("FLICKR_WEB_URL").unwrap_or_else(|| FLICKR_WEB_URL.to_string()),
                api_key: var("FLICKR_API_KEY"),
                access_token: var("FLICKR_ACCESS_TOKEN"),
                user_id: var("FLICKR_USER_ID"),
            },
            smugmug: SmugMugConfig {
                api_url: var("SMUGMUG_API_URL").unwrap_or_else(|| SMUGMUG_API_URL.to_string()),
                upload_url: var("SMUGMUG_UPLOAD_URL")
                    .unwrap_or_else(|| SMUGMUG_UPLOAD_URL.to_string()),
                web_url: var("SMUGMUG_WEB_URL").unwrap_or_else(|| SMUGMUG_WEB_URL.to_string()),
                api_key: var("SMUGMUG_API_KEY"),
                access_token: var("SMUGMUG_ACCESS_TOKEN"),
                nickname: var("SMUGMUG_NICKNAME"),
                album_uri: var("SMUGMUG_ALBUM_URI"),
            },
        };

        Ok(config)
    }

    /// Check that the active service is known and has credentials.
    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if self.batch_concurrency == 0 {
            return Err(anyhow::anyhow!(
                "SHUTTERPOST_BATCH_CONCURRENCY must be at least 1"
            ));
        }
        if self.machine_tag_namespace.contains(&[':', '=', ' '][..]) {
            return Err(anyhow::anyhow!(
                "SHUTTERPOST_MACHINE_TAG_NAMESPACE must not contain ':', '=' or spaces"
            ));
        }

        match self.service.as_str() {
            FLICKR_SERVICE => {
                if self.flickr.access_token.is_none() && self.flickr.api_key.is_none() {
                    return Err(anyhow::anyhow!(
                        "Flickr credentials missing. Set FLICKR_ACCESS_TOKEN or FLICKR_API_KEY"
                    ));
                }
            }
            SMUGMUG_SERVICE => {
                if self.smugmug.access_token.is_none() && self.smugmug.api_key.is_none() {
                    return Err(anyhow::anyhow!(
                        "SmugMug credentials missing. Set SMUGMUG_ACCESS_TOKEN or SMUGMUG_API_KEY"
                    ));
                }
                if self.smugmug.album_uri.is_none() {
                    return Err(anyhow::anyhow!(
                        "SMUGMUG_ALBUM_URI is required to upload to SmugMug"
                    ));
                }
            }
            other => {
                return Err(anyhow::anyhow!(
                    "Unknown service '{}'. Expected '{}' or '{}'",
                    other,
                    FLICKR_SERVICE,
                    SMUGMUG_SERVICE
                ));
            }
        }

        Ok(())
    }
}
