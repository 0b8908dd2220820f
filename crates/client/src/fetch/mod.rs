//! HTTP fetch pipeline: the extraction pipeline's only I/O boundary.
//!
//! ### URL Validation
//! - Only absolute `http`/`https` URLs are fetched; anything else fails
//!   before a request is made.
//! - Host is lowercased and fragments are dropped.
//!
//! ### Request Policy
//! - Single GET per URL with a fixed timeout (default: 30s)
//! - Descriptive User-Agent
//! - Max redirects: 5
//! - Max body bytes: 5MB (configurable)
//! - Only 2xx responses count as success

pub mod url;

use bytes::Bytes;
use pagesift_core::{AppConfig, Error, Log, TracingLog};
use reqwest::Url;
use reqwest::{Client, StatusCode, header};
use std::sync::Arc;
use std::time::{Duration, Instant};

pub use url::{UrlError, normalize_route, parse_absolute, route_url};

/// Source of raw route payloads.
///
/// The orchestrator only depends on this trait so the network can be swapped
/// out in tests.
#[async_trait::async_trait]
pub trait Fetcher: Send + Sync {
    /// Fetch the body of `url` as text.
    async fn fetch_text(&self, url: &str) -> Result<String, Error>;
}

/// Configuration for the fetch client.
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// User agent string (default: "pagesift/0.1 (+content extraction)")
    pub user_agent: String,

    /// Maximum response body size in bytes (default: 5MB)
    pub max_bytes: usize,

    /// Request timeout (default: 30s)
    pub timeout: Duration,

    /// Maximum number of redirects to follow (default: 5)
    pub max_redirects: usize,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            user_agent: "pagesift/0.1 (+content extraction)".to_string(),
            max_bytes: 5 * 1024 * 1024,
            timeout: Duration::from_millis(30000),
            max_redirects: 5,
        }
    }
}

impl From<&AppConfig> for FetchConfig {
    fn from(config: &AppConfig) -> Self {
        Self {
            user_agent: config.user_agent.clone(),
            max_bytes: config.max_bytes,
            timeout: config.timeout(),
            max_redirects: config.max_redirects,
        }
    }
}

/// Response from a fetch operation.
#[derive(Debug, Clone)]
pub struct FetchResponse {
    /// The original URL requested
    pub url: Url,
    /// The final URL after redirects
    pub final_url: Url,
    /// HTTP status code
    pub status: StatusCode,
    /// Content-Type header
    pub content_type: Option<String>,
    /// Response body bytes
    pub bytes: Bytes,
    /// Time taken to fetch in milliseconds
    pub fetch_ms: u64,
}

impl FetchResponse {
    /// Body decoded as UTF-8, replacing invalid sequences.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.bytes).into_owned()
    }
}

/// HTTP fetch client.
pub struct FetchClient {
    http: Client,
    config: FetchConfig,
    log: Arc<dyn Log>,
}

impl FetchClient {
    /// Create a new fetch client that logs through `tracing`.
    pub fn new(config: FetchConfig) -> Result<Self, Error> {
        Self::with_log(config, Arc::new(TracingLog))
    }

    /// Create a new fetch client with an explicit logging port.
    pub fn with_log(config: FetchConfig, log: Arc<dyn Log>) -> Result<Self, Error> {
        let http = Client::builder()
            .user_agent(&config.user_agent)
            .timeout(config.timeout)
            .redirect(reqwest::redirect::Policy::limited(config.max_redirects))
            .use_rustls_tls()
            .gzip(true)
            .brotli(true)
            .deflate(true)
            .build()
            .map_err(|e| Error::HttpError(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self { http, config, log })
    }

    /// Fetch a URL, returning raw bytes and metadata.
    ///
    /// Validates the URL, then performs a single GET that respects the
    /// timeout, redirect and byte limits.
    pub async fn fetch(&self, url_str: &str) -> Result<FetchResponse, Error> {
        let start = Instant::now();
        let url = parse_absolute(url_str).map_err(|e| Error::InvalidUrl(format!("{url_str}: {e}")))?;

        let response = self
            .http
            .get(url.as_str())
            .header(
                header::ACCEPT,
                "text/html,application/xhtml+xml,application/json;q=0.9,*/*;q=0.8",
            )
            .send()
            .await
            .map_err(|e| self.classify(&url, e))?;

        let status = response.status();

        if !status.is_success() {
            return Err(Error::HttpError(format!("status {} for {}", status.as_u16(), url)));
        }

        if let Some(len) = response.content_length()
            && len as usize > self.config.max_bytes
        {
            return Err(Error::FetchTooLarge(format!(
                "{} bytes exceeds {}",
                len, self.config.max_bytes
            )));
        }

        let final_url = response.url().clone();
        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string());

        let bytes = response.bytes().await.map_err(|e| self.classify(&url, e))?;

        if bytes.len() > self.config.max_bytes {
            return Err(Error::FetchTooLarge(format!(
                "{} bytes exceeds {}",
                bytes.len(),
                self.config.max_bytes
            )));
        }

        let fetch_ms = start.elapsed().as_millis() as u64;

        self.log.debug(&format!(
            "fetched {} -> {} in {}ms ({} bytes)",
            url,
            final_url,
            fetch_ms,
            bytes.len()
        ));

        Ok(FetchResponse { url, final_url, status, content_type, bytes, fetch_ms })
    }

    /// Fetch a URL's body, or `None` on any failure.
    ///
    /// Invalid URLs, timeouts, network errors and non-2xx statuses are logged
    /// and never returned to the caller.
    pub async fn fetch_content(&self, url: &str) -> Option<String> {
        match self.fetch(url).await {
            Ok(response) => Some(response.text()),
            Err(e) => {
                self.log.warn(&format!("fetch failed for {url}: {e}"));
                None
            }
        }
    }

    /// Get reference to the configuration.
    pub fn config(&self) -> &FetchConfig {
        &self.config
    }

    fn classify(&self, url: &Url, err: reqwest::Error) -> Error {
        if err.is_timeout() {
            Error::FetchTimeout(format!("{} after {}ms", url, self.config.timeout.as_millis()))
        } else {
            Error::HttpError(format!("network error for {}: {}", url, err))
        }
    }
}

#[async_trait::async_trait]
impl Fetcher for FetchClient {
    async fn fetch_text(&self, url: &str) -> Result<String, Error> {
        self.fetch(url).await.map(|response| response.text())
    }
}
