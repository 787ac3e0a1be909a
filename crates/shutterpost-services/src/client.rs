//! Shared HTTP client for the remote photo services.
//!
//! Holds credentials of an already-authenticated account and applies them to
//! every request. Request signing itself happens elsewhere: the token passed
//! in here is used as-is.

use reqwest::{Client, Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use std::path::Path;
use std::time::Duration;
use tokio_util::io::ReaderStream;

use shutterpost_core::FileError;

use crate::error::{RemoteError, RemoteResult};

/// Credentials applied to each request.
#[derive(Clone, Debug, Default)]
pub struct Credentials {
    bearer: Option<String>,
    api_key: Option<(String, String)>,
}

impl Credentials {
    pub fn new() -> Self {
        Self::default()
    }

    /// `Authorization: Bearer {token}`
    pub fn with_bearer(mut self, token: impl Into<String>) -> Self {
        self.bearer = Some(token.into());
        self
    }

    /// API key sent as query parameter `param`.
    pub fn with_api_key(mut self, param: impl Into<String>, key: impl Into<String>) -> Self {
        self.api_key = Some((param.into(), key.into()));
        self
    }

    fn apply(&self, mut request: RequestBuilder) -> RequestBuilder {
        if let Some(token) = &self.bearer {
            request = request.header("Authorization", format!("Bearer {}", token));
        }
        if let Some((param, key)) = &self.api_key {
            request = request.query(&[(param.as_str(), key.as_str())]);
        }
        request
    }
}

/// Authenticated HTTP client.
#[derive(Clone, Debug)]
pub struct ApiClient {
    client: Client,
    credentials: Credentials,
}

impl ApiClient {
    pub fn new(credentials: Credentials, timeout: Duration) -> RemoteResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("shutterpost/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            credentials,
        })
    }

    /// Start a request with credentials applied.
    pub fn request(&self, method: Method, url: &str) -> RequestBuilder {
        self.credentials.apply(self.client.request(method, url))
    }

    /// Send a request, failing on non-success status. Returns the body text.
    pub async fn send_text(&self, request: RequestBuilder) -> RemoteResult<String> {
        let response = request.send().await?;
        let response = Self::check_status(response).await?;
        Ok(response.text().await?)
    }

    /// Send a request, failing on non-success status. Deserializes the JSON body.
    pub async fn send_json<T: DeserializeOwned>(&self, request: RequestBuilder) -> RemoteResult<T> {
        let text = self.send_text(request).await?;
        serde_json::from_str(&text)
            .map_err(|e| RemoteError::InvalidResponse(format!("Failed to parse JSON: {}", e)))
    }

    async fn check_status(response: Response) -> RemoteResult<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());
        Err(RemoteError::Status {
            status: status.as_u16(),
            body,
        })
    }
}

/// Open `path` as a streaming request body. Returns the body and its length.
pub async fn file_body(path: &Path) -> RemoteResult<(reqwest::Body, u64)> {
    let file = tokio::fs::File::open(path)
        .await
        .map_err(|e| FileError::from_io(path, e))?;
    let length = file
        .metadata()
        .await
        .map_err(|e| FileError::from_io(path, e))?
        .len();
    let body = reqwest::Body::wrap_stream(ReaderStream::new(file));
    Ok((body, length))
}
