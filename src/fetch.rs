use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, CONTENT_TYPE};
use tracing::debug;

use crate::config::FetchConfig;
use crate::models::DownloadResult;

// ── Error type ───────────────────────────────────────────────────────────────

#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("could not build HTTP client: {0}")]
    Client(String),
    #[error("request timed out: {0}")]
    Timeout(String),
    #[error("connection failed: {0}")]
    Connect(String),
    #[error("request failed: {0}")]
    Request(String),
    #[error("server answered {0}")]
    Status(u16),
    #[error("reading body failed: {0}")]
    Body(String),
}

/// Source of image bytes. One call is one attempt; callers decide what a
/// failure means.
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<DownloadResult, FetchError>;
}

// ── HTTP fetch ───────────────────────────────────────────────────────────────

/// reqwest-backed fetcher that presents itself as a desktop browser.
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new(config: &FetchConfig) -> Result<Self, FetchError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT,
            HeaderValue::from_str(&config.accept).map_err(|e| FetchError::Client(e.to_string()))?,
        );

        let mut builder = reqwest::ClientBuilder::new()
            .connect_timeout(config.connect_timeout)
            .timeout(config.timeout)
            .redirect(reqwest::redirect::Policy::limited(config.max_redirects))
            .user_agent(config.user_agent.as_str())
            .default_headers(headers);

        if config.insecure {
            builder = builder.danger_accept_invalid_certs(true);
        }

        let client = builder
            .build()
            .map_err(|e| FetchError::Client(e.to_string()))?;

        Ok(Self { client })
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<DownloadResult, FetchError> {
        let response = self.client.get(url).send().await.map_err(classify)?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.to_string());

        let bytes = response.bytes().await.map_err(|e| {
            if e.is_timeout() {
                FetchError::Timeout(e.to_string())
            } else {
                FetchError::Body(e.to_string())
            }
        })?;

        debug!(url, len = bytes.len(), content_type = ?content_type, "fetched image");
        Ok(DownloadResult { bytes, content_type })
    }
}

fn classify(e: reqwest::Error) -> FetchError {
    if e.is_timeout() {
        FetchError::Timeout(e.to_string())
    } else if e.is_connect() {
        FetchError::Connect(e.to_string())
    } else {
        FetchError::Request(e.to_string())
    }
}
