//! Request pacing and retry timing
//!
//! This module handles:
//! - The retry delay policy shared by every retryable failure
//! - Fixed-delay pacing between listing page requests
//!
//! Both are built on `tokio::time`, so tests drive them with a paused clock.

use crate::config::CrawlerConfig;
use std::time::Duration;
use tokio::time::{sleep_until, Instant};

/// Retry bookkeeping for a single URL
///
/// One linear policy covers every retryable cause: the delay after failed
/// attempt `n` is `base_backoff * n`. A rate-limited attempt waits at least
/// `rate_limit_cooldown`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts per URL
    pub max_retries: u32,

    /// Unit of the linear backoff
    pub base_backoff: Duration,

    /// Floor for the delay after an HTTP 429
    pub rate_limit_cooldown: Duration,
}

impl RetryPolicy {
    pub fn from_config(config: &CrawlerConfig) -> Self {
        Self {
            max_retries: config.max_retries,
            base_backoff: config.base_backoff(),
            rate_limit_cooldown: config.rate_limit_cooldown(),
        }
    }

    /// Delay to wait after failed attempt number `attempt` (1-based)
    ///
    /// # Arguments
    ///
    /// * `attempt` - The attempt that just failed
    /// * `rate_limited` - Whether it was answered with HTTP 429
    pub fn delay_after(&self, attempt: u32, rate_limited: bool) -> Duration {
        let linear = self.base_backoff.saturating_mul(attempt);
        if rate_limited {
            linear.max(self.rate_limit_cooldown)
        } else {
            linear
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&CrawlerConfig::default())
    }
}

/// Fixed-delay scheduler for consecutive requests of one category
///
/// The first call to [`wait`](Self::wait) returns immediately; each later
/// call returns no earlier than `interval` after the previous one returned.
#[derive(Debug)]
pub struct Pacer {
    interval: Duration,
    last: Option<Instant>,
}

impl Pacer {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last: None,
        }
    }

    /// Waits until the next request may be sent
    pub async fn wait(&mut self) {
        if let Some(last) = self.last {
            sleep_until(last + self.interval).await;
        }
        self.last = Some(Instant::now());
    }
}
