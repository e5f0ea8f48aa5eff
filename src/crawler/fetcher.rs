//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests for the crawler, including:
//! - Building HTTP clients with proper user agent strings
//! - Single GET attempts behind the [`PageSource`] trait
//! - Bounded retry of transport, body, and status failures
//! - Error classification

use crate::config::{CrawlerConfig, UserAgentConfig};
use crate::extract::Document;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use std::time::Duration;
use thiserror::Error;

/// Errors produced while fetching a page
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("HTTP error for {url}: {source}")]
    Transport { url: String, source: reqwest::Error },

    #[error("Unreadable response body for {url}: {source}")]
    Body { url: String, source: reqwest::Error },

    #[error("Status code {status} for {url}")]
    Status { url: String, status: StatusCode },

    #[error("Giving up on {url} after {attempts} attempts: {last}")]
    Exhausted {
        url: String,
        attempts: u32,
        #[source]
        last: Box<FetchError>,
    },
}

impl FetchError {
    /// The URL the failed request was made for
    pub fn url(&self) -> &str {
        match self {
            Self::Transport { url, .. }
            | Self::Body { url, .. }
            | Self::Status { url, .. }
            | Self::Exhausted { url, .. } => url,
        }
    }
}

/// Something that can GET a URL and hand back its document
///
/// One call is one attempt; retrying is layered on top by [`fetch_with_retry`].
#[async_trait]
pub trait PageSource: Send + Sync {
    async fn get(&self, url: &str) -> Result<Document, FetchError>;
}

/// Number of extra attempts made after a failed GET
///
/// A policy with `max_retries = 2` makes at most three requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
}

impl RetryPolicy {
    pub fn new(max_retries: u32) -> Self {
        Self { max_retries }
    }

    /// Total number of requests this policy allows
    pub fn attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(3)
    }
}

/// Builds an HTTP client with proper configuration
///
/// # Arguments
///
/// * `user_agent` - The user agent configuration
/// * `crawler` - Crawler settings providing the request timeout
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(reqwest::Error)` - Failed to build client
pub fn build_http_client(
    user_agent: &UserAgentConfig,
    crawler: &CrawlerConfig,
) -> Result<Client, reqwest::Error> {
    // Format: CrawlerName/Version
    let user_agent = format!("{}/{}", user_agent.crawler_name, user_agent.crawler_version);

    Client::builder()
        .user_agent(user_agent)
        .timeout(Duration::from_secs(crawler.request_timeout_secs))
        .connect_timeout(Duration::from_secs(10))
        .gzip(true)
        .brotli(true)
        .build()
}

/// [`PageSource`] backed by a shared reqwest client
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl PageSource for HttpFetcher {
    /// Sends one GET request
    ///
    /// | Condition | Result |
    /// |-----------|--------|
    /// | Connection, TLS, or timeout failure | `Transport` |
    /// | Non-2xx status | `Status` |
    /// | Body cannot be decoded as text | `Body` |
    /// | Otherwise | `Document` keyed by the requested URL |
    async fn get(&self, url: &str) -> Result<Document, FetchError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|source| FetchError::Transport {
                url: url.to_string(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status,
            });
        }

        let body = response.text().await.map_err(|source| FetchError::Body {
            url: url.to_string(),
            source,
        })?;

        Ok(Document::new(url, body))
    }
}

/// Fetches a URL, retrying failed attempts without delay
///
/// Returns as soon as one attempt succeeds. When every attempt allowed by
/// `policy` has failed, the last failure is returned wrapped in
/// [`FetchError::Exhausted`]. Each failed attempt is logged with its cause.
pub async fn fetch_with_retry<S>(
    source: &S,
    url: &str,
    policy: RetryPolicy,
) -> Result<Document, FetchError>
where
    S: PageSource + ?Sized,
{
    let attempts = policy.attempts();
    let mut attempt = 1;

    loop {
        match source.get(url).await {
            Ok(document) => {
                if attempt > 1 {
                    tracing::debug!("Fetched {} on attempt {}", url, attempt);
                }
                return Ok(document);
            }
            Err(e) if attempt < attempts => {
                tracing::warn!("Attempt {}/{} for {} failed: {}", attempt, attempts, url, e);
                attempt += 1;
            }
            Err(e) => {
                tracing::warn!("Attempt {}/{} for {} failed: {}", attempt, attempts, url, e);
                return Err(FetchError::Exhausted {
                    url: url.to_string(),
                    attempts,
                    last: Box::new(e),
                });
            }
        }
    }
}
