//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests for the crawler, including:
//! - Building HTTP clients with a browser-like header set
//! - GET requests with bounded retries
//! - Error classification into [`FetchErrorKind`]
//!
//! Fetch failures are values, never errors: the caller treats a failed URL
//! as "no data" and carries on.

use crate::config::CrawlerConfig;
use crate::crawler::scheduler::RetryPolicy;
use reqwest::header::{self, HeaderMap, HeaderValue};
use reqwest::{Client, StatusCode};
use std::fmt;
use std::future::Future;

/// Browser identity sent when the site configuration does not override it
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
    AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36";

/// Result of a fetch operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    /// Page fetched with HTTP 200
    Success {
        /// Page body content
        body: String,
        /// HTTP status code
        status: u16,
    },

    /// Every attempt was used up and the last one was answered with HTTP 429
    RateLimited,

    /// Every attempt was used up; carries the cause of the last one
    Failed(FetchErrorKind),
}

impl FetchOutcome {
    /// The body of a successful fetch
    pub fn into_body(self) -> Option<String> {
        match self {
            FetchOutcome::Success { body, .. } => Some(body),
            _ => None,
        }
    }
}

/// Why a single attempt produced no page
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchErrorKind {
    Timeout,
    Connect,
    Status(u16),
    Body,
    Request,
}

impl fmt::Display for FetchErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FetchErrorKind::Timeout => f.write_str("request timeout"),
            FetchErrorKind::Connect => f.write_str("connection failed"),
            FetchErrorKind::Status(code) => write!(f, "HTTP {}", code),
            FetchErrorKind::Body => f.write_str("failed to read body"),
            FetchErrorKind::Request => f.write_str("request error"),
        }
    }
}

impl From<&reqwest::Error> for FetchErrorKind {
    fn from(error: &reqwest::Error) -> Self {
        if error.is_timeout() {
            FetchErrorKind::Timeout
        } else if error.is_connect() {
            FetchErrorKind::Connect
        } else if error.is_body() || error.is_decode() {
            FetchErrorKind::Body
        } else {
            FetchErrorKind::Request
        }
    }
}

/// Outcome of one attempt, before retry bookkeeping
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AttemptError {
    RateLimited,
    Failed(FetchErrorKind),
}

impl AttemptError {
    fn into_outcome(self) -> FetchOutcome {
        match self {
            AttemptError::RateLimited => FetchOutcome::RateLimited,
            AttemptError::Failed(kind) => FetchOutcome::Failed(kind),
        }
    }
}

/// Seam between the orchestrator and the network
pub trait PageFetch: Send + Sync {
    /// Fetches `url`, retrying internally; never fails outward
    fn fetch(&self, url: &str) -> impl Future<Output = FetchOutcome> + Send;
}

/// Builds an HTTP client with proper configuration
///
/// The target sites reject bare clients, so every request carries a
/// browser-like header set.
///
/// # Arguments
///
/// * `config` - The crawler configuration (request timeout)
/// * `user_agent` - Optional override of [`DEFAULT_USER_AGENT`]
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(reqwest::Error)` - Failed to build client (e.g. invalid user agent)
pub fn build_http_client(
    config: &CrawlerConfig,
    user_agent: Option<&str>,
) -> Result<Client, reqwest::Error> {
    let mut headers = HeaderMap::new();
    headers.insert(
        header::ACCEPT,
        HeaderValue::from_static(
            "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8",
        ),
    );
    headers.insert(
        header::ACCEPT_LANGUAGE,
        HeaderValue::from_static("en-US,en;q=0.9"),
    );
    headers.insert(header::ACCEPT_ENCODING, HeaderValue::from_static("gzip, br"));
    headers.insert(header::CONNECTION, HeaderValue::from_static("keep-alive"));
    headers.insert(
        header::UPGRADE_INSECURE_REQUESTS,
        HeaderValue::from_static("1"),
    );

    Client::builder()
        .user_agent(user_agent.unwrap_or(DEFAULT_USER_AGENT))
        .default_headers(headers)
        .timeout(config.request_timeout())
        .connect_timeout(config.request_timeout())
        .gzip(true)
        .brotli(true)
        .build()
}

/// Retrying HTTP fetcher
#[derive(Debug, Clone)]
pub struct Fetcher {
    client: Client,
    policy: RetryPolicy,
}

impl Fetcher {
    pub fn new(client: Client, policy: RetryPolicy) -> Self {
        Self { client, policy }
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Fetches a URL, retrying retryable failures per the [`RetryPolicy`]
    ///
    /// # Retry Logic
    ///
    /// | Condition | Action |
    /// |-----------|--------|
    /// | HTTP 200 | Success, stop |
    /// | HTTP 429 | Wait `max(cooldown, base * n)`, retry |
    /// | Other status | Wait `base * n`, retry |
    /// | Timeout / connect / body error | Wait `base * n`, retry |
    ///
    /// Every retry consumes one of `max_retries` attempts.
    pub async fn fetch_with_retry(&self, url: &str) -> FetchOutcome {
        let attempts = self.policy.max_retries.max(1);
        let mut attempt = 1;

        loop {
            let error = match self.attempt(url).await {
                Ok(body) => {
                    tracing::debug!(url, attempt, status = 200, "Fetched");
                    return FetchOutcome::Success { body, status: 200 };
                }
                Err(error) => error,
            };

            match error {
                AttemptError::RateLimited => {
                    tracing::debug!(url, attempt, status = 429, "Rate limited");
                }
                AttemptError::Failed(kind) => {
                    tracing::debug!(url, attempt, error = %kind, "Attempt failed");
                }
            }

            if attempt >= attempts {
                tracing::warn!(url, attempts, "Giving up after exhausting retries");
                return error.into_outcome();
            }

            let delay = self
                .policy
                .delay_after(attempt, error == AttemptError::RateLimited);
            tracing::warn!(url, attempt, ?delay, "Retrying");
            tokio::time::sleep(delay).await;
            attempt += 1;
        }
    }

    async fn attempt(&self, url: &str) -> Result<String, AttemptError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| AttemptError::Failed(FetchErrorKind::from(&e)))?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(AttemptError::RateLimited);
        }
        if status != StatusCode::OK {
            return Err(AttemptError::Failed(FetchErrorKind::Status(status.as_u16())));
        }

        response
            .text()
            .await
            .map_err(|e| match FetchErrorKind::from(&e) {
                FetchErrorKind::Timeout => AttemptError::Failed(FetchErrorKind::Timeout),
                _ => AttemptError::Failed(FetchErrorKind::Body),
            })
    }
}

impl PageFetch for Fetcher {
    fn fetch(&self, url: &str) -> impl Future<Output = FetchOutcome> + Send {
        self.fetch_with_retry(url)
    }
}
