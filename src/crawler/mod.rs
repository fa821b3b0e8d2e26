//! Crawler module for listing harvesting
//!
//! This module contains the core crawling logic, including:
//! - HTTP fetching with retry logic
//! - Pagination and stop conditions
//! - Request pacing
//! - Listing deduplication
//! - Per-category orchestration

mod coordinator;
mod dedup;
mod fetcher;
mod frontier;
mod scheduler;

pub use coordinator::{CrawlContext, CrawlReport, Orchestrator};
pub use dedup::{Admission, Deduplicator};
pub use fetcher::{
    build_http_client, FetchErrorKind, FetchOutcome, Fetcher, PageFetch, DEFAULT_USER_AGENT,
};
pub use frontier::{Frontier, StopReason};
pub use scheduler::{Pacer, RetryPolicy};

use crate::config::{CategoryConfig, Config};
use crate::extract::Extractor;
use crate::output::Sink;
use crate::HarvestError;
use futures::future::join_all;
use std::sync::Arc;

/// Run-level choices made on the command line
#[derive(Debug, Clone, Default)]
pub struct HarvestOptions {
    /// Only crawl these listing types; empty means all configured categories
    pub only: Vec<String>,
    /// Crawl categories one after another instead of concurrently
    pub sequential: bool,
}

impl HarvestOptions {
    /// True when `category` should be crawled
    pub fn selects(&self, category: &CategoryConfig) -> bool {
        self.only.is_empty()
            || self
                .only
                .iter()
                .any(|name| name.eq_ignore_ascii_case(&category.listing_type))
    }
}

/// Runs every selected category of a configuration
///
/// Categories share one HTTP client, one extractor and one sink, but each
/// owns its own deduplicator and state. Category crawls never fail; only
/// setup errors are returned.
///
/// # Arguments
///
/// * `config` - The validated configuration
/// * `sink` - Destination of checkpoint and final flushes
/// * `options` - Category filter and scheduling
///
/// # Returns
///
/// * `Ok(Vec<CrawlReport>)` - One report per crawled category, in config order
/// * `Err(HarvestError)` - Failed to build the client or the extractor
pub async fn harvest(
    config: &Config,
    sink: Arc<dyn Sink>,
    options: &HarvestOptions,
) -> Result<Vec<CrawlReport>, HarvestError> {
    let client = build_http_client(&config.crawler, config.site.user_agent.as_deref())?;
    let fetcher = Arc::new(Fetcher::new(client, RetryPolicy::from_config(&config.crawler)));
    let extractor = Arc::new(Extractor::from_config(config)?);

    let context = CrawlContext {
        source: config.site.name.clone(),
        settings: config.crawler.clone(),
        fetcher,
        extractor,
        sink,
    };

    run_categories(&config.categories, context, options).await
}

/// Runs the selected categories against an already assembled context
pub async fn run_categories<F: PageFetch>(
    categories: &[CategoryConfig],
    context: CrawlContext<F>,
    options: &HarvestOptions,
) -> Result<Vec<CrawlReport>, HarvestError> {
    let selected: Vec<CategoryConfig> = categories
        .iter()
        .filter(|category| options.selects(category))
        .cloned()
        .collect();

    if selected.is_empty() {
        tracing::warn!(only = ?options.only, "No category selected");
        return Ok(Vec::new());
    }

    tracing::info!(
        categories = selected.len(),
        sequential = options.sequential,
        "Starting harvest"
    );

    let orchestrators = selected
        .into_iter()
        .map(|category| Orchestrator::new(category, context.clone()));

    let reports = if options.sequential {
        let mut reports = Vec::new();
        for orchestrator in orchestrators {
            reports.push(orchestrator.run().await);
        }
        reports
    } else {
        join_all(orchestrators.map(Orchestrator::run)).await
    };

    Ok(reports)
}
