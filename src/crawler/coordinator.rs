//! Category crawl orchestration
//!
//! One [`Orchestrator`] drives one listing category through a small state
//! machine:
//!
//! ```text
//! Paginating -> DispatchingBatch -> Merging -> (Checkpointing) -> Paginating | Done
//! ```
//!
//! The orchestrator owns its per-category state exclusively. Detail pages of a
//! batch are fetched concurrently, but their records are merged into the
//! state only after the whole batch has completed.

use crate::config::{CategoryConfig, CrawlerConfig};
use crate::crawler::dedup::{Admission, Deduplicator};
use crate::crawler::fetcher::{FetchOutcome, PageFetch};
use crate::crawler::frontier::{Frontier, StopReason};
use crate::crawler::scheduler::Pacer;
use crate::extract::Extractor;
use crate::output::Sink;
use crate::record::{ListingSummary, PageRequest, PropertyRecord};
use futures::stream::{self, StreamExt};
use std::fmt;
use std::sync::Arc;

/// Collaborators shared by every category crawl of a run
pub struct CrawlContext<F> {
    /// Provenance written into every record
    pub source: String,
    pub settings: CrawlerConfig,
    pub fetcher: Arc<F>,
    pub extractor: Arc<Extractor>,
    pub sink: Arc<dyn Sink>,
}

impl<F> Clone for CrawlContext<F> {
    fn clone(&self) -> Self {
        Self {
            source: self.source.clone(),
            settings: self.settings.clone(),
            fetcher: Arc::clone(&self.fetcher),
            extractor: Arc::clone(&self.extractor),
            sink: Arc::clone(&self.sink),
        }
    }
}

/// Mutable per-category state
#[derive(Debug)]
struct CrawlState {
    seen: Deduplicator,
    accumulated: Vec<PropertyRecord>,
    page_index: u32,
    target: usize,
}

impl CrawlState {
    fn new(seen: Deduplicator, target: usize) -> Self {
        Self {
            seen,
            accumulated: Vec::new(),
            page_index: 0,
            target,
        }
    }

    fn remaining(&self) -> usize {
        self.target.saturating_sub(self.accumulated.len())
    }
}

/// Orchestrator states; each carries what the next step needs
enum Phase {
    Paginating,
    DispatchingBatch {
        page: u32,
        found: usize,
        summaries: Vec<ListingSummary>,
    },
    Merging {
        page: u32,
        found: usize,
        records: Vec<PropertyRecord>,
    },
    Checkpointing {
        page: u32,
        found: usize,
    },
    Done(StopReason),
}

impl Phase {
    fn name(&self) -> &'static str {
        match self {
            Phase::Paginating => "paginating",
            Phase::DispatchingBatch { .. } => "dispatching",
            Phase::Merging { .. } => "merging",
            Phase::Checkpointing { .. } => "checkpointing",
            Phase::Done(_) => "done",
        }
    }
}

/// Outcome of one category crawl
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawlReport {
    pub listing_type: String,
    /// Records written by the final flush
    pub records: usize,
    pub pages_fetched: u32,
    pub pages_failed: u32,
    pub details_dispatched: usize,
    /// Detail fetches that failed and produced card-only records
    pub details_degraded: usize,
    pub skipped_empty_url: usize,
    pub skipped_duplicate: usize,
    pub skipped_foreign: usize,
    pub checkpoints: usize,
    pub sink_failures: usize,
    pub stop_reason: StopReason,
}

impl CrawlReport {
    fn new(listing_type: &str) -> Self {
        Self {
            listing_type: listing_type.to_string(),
            records: 0,
            pages_fetched: 0,
            pages_failed: 0,
            details_dispatched: 0,
            details_degraded: 0,
            skipped_empty_url: 0,
            skipped_duplicate: 0,
            skipped_foreign: 0,
            checkpoints: 0,
            sink_failures: 0,
            stop_reason: StopReason::TargetReached,
        }
    }
}

impl fmt::Display for CrawlReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {} records from {} pages ({} failed), {} details ({} degraded), \
             skipped {} without URL / {} duplicate / {} foreign, stopped: {}",
            self.listing_type,
            self.records,
            self.pages_fetched,
            self.pages_failed,
            self.details_dispatched,
            self.details_degraded,
            self.skipped_empty_url,
            self.skipped_duplicate,
            self.skipped_foreign,
            self.stop_reason
        )
    }
}

/// Drives one category from page 1 to its stop condition
pub struct Orchestrator<F> {
    category: CategoryConfig,
    context: CrawlContext<F>,
}

impl<F: PageFetch> Orchestrator<F> {
    pub fn new(category: CategoryConfig, context: CrawlContext<F>) -> Self {
        Self { category, context }
    }

    /// Runs the category crawl to completion
    ///
    /// Never fails: page, detail and sink failures are logged, counted in
    /// the report and the crawl carries on.
    pub async fn run(self) -> CrawlReport {
        let category = self.category.listing_type.as_str();
        let settings = &self.context.settings;

        let mut state = CrawlState::new(
            Deduplicator::new(self.context.extractor.scope().clone()),
            self.category.target,
        );
        let mut frontier = Frontier::for_category(&self.category, settings.min_items_per_page);
        let mut pacer = Pacer::new(settings.page_delay());
        let mut report = CrawlReport::new(category);

        tracing::info!(category, target = state.target, url = %self.category.url, "Starting category crawl");

        let mut phase = Phase::Paginating;
        let stop_reason = loop {
            tracing::trace!(category, phase = phase.name(), "Phase");

            phase = match phase {
                Phase::Paginating => {
                    if state.remaining() == 0 {
                        Phase::Done(StopReason::TargetReached)
                    } else {
                        match frontier.next_request() {
                            Some(request) => {
                                state.page_index = request.page_index;
                                pacer.wait().await;
                                let summaries = self.fetch_listing_page(&request, &mut report).await;
                                Phase::DispatchingBatch {
                                    page: request.page_index,
                                    found: summaries.len(),
                                    summaries,
                                }
                            }
                            None => Phase::Done(frontier.stop_reason().unwrap_or(
                                StopReason::PageLimit {
                                    pages: state.page_index,
                                },
                            )),
                        }
                    }
                }

                Phase::DispatchingBatch {
                    page,
                    found,
                    summaries,
                } => {
                    let batch = self.admit(summaries, &mut state, &mut report);
                    report.details_dispatched += batch.len();
                    let records = self.fetch_details(batch, &mut report).await;
                    Phase::Merging {
                        page,
                        found,
                        records,
                    }
                }

                Phase::Merging {
                    page,
                    found,
                    records,
                } => {
                    let before = state.accumulated.len();
                    state.accumulated.extend(records);
                    let after = state.accumulated.len();

                    tracing::info!(category, page, found, accumulated = after, "Page merged");

                    if crosses_checkpoint(before, after, settings.checkpoint_every) {
                        Phase::Checkpointing { page, found }
                    } else {
                        self.after_page(&mut frontier, &state, page, found)
                    }
                }

                Phase::Checkpointing { page, found } => {
                    let count = state.accumulated.len();
                    let label = format!("{}_checkpoint_{}", category, count);
                    tracing::info!(category, records = count, %label, "Checkpoint");
                    self.flush(&state.accumulated, &label, &mut report);
                    report.checkpoints += 1;
                    self.after_page(&mut frontier, &state, page, found)
                }

                Phase::Done(reason) => break reason,
            };
        };

        state.accumulated.truncate(state.target);
        let label = format!("{}_final", category);
        self.flush(&state.accumulated, &label, &mut report);

        report.records = state.accumulated.len();
        report.stop_reason = stop_reason;
        tracing::info!(category, records = report.records, reason = %stop_reason, "Category crawl finished");
        report
    }

    /// Fetches and extracts one listing page; failure counts as zero items
    async fn fetch_listing_page(
        &self,
        request: &PageRequest,
        report: &mut CrawlReport,
    ) -> Vec<ListingSummary> {
        let category = self.category.listing_type.as_str();
        report.pages_fetched += 1;

        match self.context.fetcher.fetch(&request.url).await {
            FetchOutcome::Success { body, .. } => self.context.extractor.extract_listing_summaries(&body),
            FetchOutcome::RateLimited => {
                report.pages_failed += 1;
                tracing::warn!(category, page = request.page_index, url = %request.url, "Listing page rate limited");
                Vec::new()
            }
            FetchOutcome::Failed(kind) => {
                report.pages_failed += 1;
                tracing::warn!(category, page = request.page_index, url = %request.url, error = %kind, "Listing page failed");
                Vec::new()
            }
        }
    }

    /// Filters summaries through the deduplicator, up to the remaining target
    fn admit(
        &self,
        summaries: Vec<ListingSummary>,
        state: &mut CrawlState,
        report: &mut CrawlReport,
    ) -> Vec<ListingSummary> {
        let remaining = state.remaining();
        let mut batch = Vec::with_capacity(summaries.len().min(remaining));

        for summary in summaries {
            if batch.len() >= remaining {
                break;
            }
            match state.seen.admit(&summary.listing_url) {
                Admission::Admitted => batch.push(summary),
                Admission::EmptyUrl => {
                    report.skipped_empty_url += 1;
                    tracing::debug!(title = %summary.title, "Dropping listing without URL");
                }
                Admission::Duplicate => {
                    report.skipped_duplicate += 1;
                    tracing::trace!(url = %summary.listing_url, "Dropping duplicate listing");
                }
                Admission::ForeignDomain => {
                    report.skipped_foreign += 1;
                    tracing::debug!(url = %summary.listing_url, "Dropping listing on foreign domain");
                }
            }
        }
        batch
    }

    /// Fetches detail pages with bounded concurrency, in completion order
    async fn fetch_details(
        &self,
        batch: Vec<ListingSummary>,
        report: &mut CrawlReport,
    ) -> Vec<PropertyRecord> {
        let limit = self.context.settings.max_concurrent_details.max(1) as usize;

        let results: Vec<(PropertyRecord, bool)> = stream::iter(batch)
            .map(|summary| self.fetch_detail(summary))
            .buffer_unordered(limit)
            .collect()
            .await;

        results
            .into_iter()
            .map(|(record, degraded)| {
                if degraded {
                    report.details_degraded += 1;
                }
                record
            })
            .collect()
    }

    /// One merged record; a failed detail fetch degrades to the card alone
    async fn fetch_detail(&self, summary: ListingSummary) -> (PropertyRecord, bool) {
        let source = self.context.source.as_str();
        let listing_type = self.category.listing_type.as_str();

        match self.context.fetcher.fetch(&summary.listing_url).await {
            FetchOutcome::Success { body, .. } => {
                let detail = self.context.extractor.extract_detail(&body);
                (PropertyRecord::merge(summary, detail, source, listing_type), false)
            }
            outcome => {
                let cause = match outcome {
                    FetchOutcome::Failed(kind) => kind.to_string(),
                    _ => "rate limited".to_string(),
                };
                tracing::warn!(url = %summary.listing_url, %cause, "Detail fetch failed, keeping card data");
                (PropertyRecord::from_summary(summary, source, listing_type), true)
            }
        }
    }

    fn after_page(
        &self,
        frontier: &mut Frontier,
        state: &CrawlState,
        page: u32,
        found: usize,
    ) -> Phase {
        match frontier.observe(page, found, state.accumulated.len(), state.target) {
            Some(reason) => Phase::Done(reason),
            None => Phase::Paginating,
        }
    }

    fn flush(&self, records: &[PropertyRecord], label: &str, report: &mut CrawlReport) {
        if let Err(e) = self.context.sink.flush(records, label) {
            report.sink_failures += 1;
            tracing::error!(%label, error = %e, "Flush failed");
        }
    }
}

/// True when growing from `before` to `after` passes a multiple of `every`
fn crosses_checkpoint(before: usize, after: usize, every: usize) -> bool {
    every > 0 && before / every < after / every
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crawler::fetcher::FetchErrorKind;
    use crate::extract::test_support::extractor;
    use crate::output::SinkResult;
    use crate::record::UNKNOWN;
    use std::collections::{HashMap, HashSet};
    use std::future::Future;
    use std::sync::Mutex;

    const BASE: &str = "https://jiji.ng/flats";

    /// In-memory fetcher: listing pages by URL, every other URL is a detail page
    #[derive(Default)]
    struct FakeFetcher {
        listing_pages: HashMap<String, String>,
        failing: HashSet<String>,
        requests: Mutex<Vec<String>>,
    }

    impl FakeFetcher {
        fn with_pages(pages: Vec<String>) -> Self {
            let listing_pages = pages
                .into_iter()
                .enumerate()
                .map(|(i, body)| (Frontier::page_url(BASE, i as u32 + 1), body))
                .collect();
            Self {
                listing_pages,
                ..Self::default()
            }
        }

        fn requests(&self) -> Vec<String> {
            self.requests.lock().unwrap().clone()
        }

        fn detail_requests(&self) -> usize {
            self.requests()
                .iter()
                .filter(|url| !url.starts_with(BASE))
                .count()
        }
    }

    impl PageFetch for FakeFetcher {
        fn fetch(&self, url: &str) -> impl Future<Output = FetchOutcome> + Send {
            self.requests.lock().unwrap().push(url.to_string());

            let outcome = if self.failing.contains(url) {
                FetchOutcome::Failed(FetchErrorKind::Status(500))
            } else if url.starts_with(BASE) {
                match self.listing_pages.get(url) {
                    Some(body) => FetchOutcome::Success {
                        body: body.clone(),
                        status: 200,
                    },
                    None => FetchOutcome::Failed(FetchErrorKind::Status(404)),
                }
            } else {
                FetchOutcome::Success {
                    body: DETAIL_PAGE.to_string(),
                    status: 200,
                }
            };
            async move { outcome }
        }
    }

    const DETAIL_PAGE: &str = r#"<html><body>
        <h1>Detail title</h1>
        <script>{"phone":"08031234567"}</script>
    </body></html>"#;

    fn listing_page(hrefs: &[&str]) -> String {
        let cards: String = hrefs
            .iter()
            .enumerate()
            .map(|(i, href)| {
                let anchor = if href.is_empty() {
                    String::new()
                } else {
                    format!(r#"<a href="{}">view</a>"#, href)
                };
                format!(
                    r#"<div class="masonry-item">{}
                        <div class="b-list-advert-base__data__title">Flat {}</div>
                        <div class="b-list-advert-base__data__price">₦ 1,000,000</div>
                    </div>"#,
                    anchor, i
                )
            })
            .collect();
        format!(
            r#"<html><body><div class="masonry-wall b-list-advert__gallery">{}</div></body></html>"#,
            cards
        )
    }

    fn empty_page() -> String {
        "<html><body><p>No adverts found</p></body></html>".to_string()
    }

    #[derive(Default)]
    struct RecordingSink {
        flushes: Mutex<Vec<(String, usize)>>,
    }

    impl Sink for RecordingSink {
        fn name(&self) -> &str {
            "recording"
        }

        fn flush(&self, records: &[PropertyRecord], label: &str) -> SinkResult<()> {
            self.flushes
                .lock()
                .unwrap()
                .push((label.to_string(), records.len()));
            Ok(())
        }
    }

    fn settings() -> CrawlerConfig {
        CrawlerConfig {
            page_delay_ms: 0,
            max_concurrent_details: 2,
            ..CrawlerConfig::default()
        }
    }

    fn category(target: usize) -> CategoryConfig {
        CategoryConfig {
            listing_type: "sale".to_string(),
            url: BASE.to_string(),
            target,
            max_pages: None,
        }
    }

    async fn run(
        fetcher: Arc<FakeFetcher>,
        settings: CrawlerConfig,
        target: usize,
    ) -> (CrawlReport, Arc<RecordingSink>) {
        let sink = Arc::new(RecordingSink::default());
        let context = CrawlContext {
            source: "Jiji".to_string(),
            settings,
            fetcher,
            extractor: Arc::new(extractor()),
            sink: sink.clone(),
        };
        let report = Orchestrator::new(category(target), context).run().await;
        (report, sink)
    }

    #[tokio::test(start_paused = true)]
    async fn test_target_caps_records_and_dispatch() {
        let fetcher = Arc::new(FakeFetcher::with_pages(vec![
            listing_page(&["/a.html", "/b.html", "/c.html"]),
            listing_page(&["/d.html", "/e.html", "/f.html"]),
            listing_page(&["/g.html", "/h.html", "/i.html"]),
        ]));

        let (report, sink) = run(fetcher.clone(), settings(), 5).await;

        assert_eq!(report.records, 5);
        assert_eq!(report.stop_reason, StopReason::TargetReached);
        assert_eq!(report.pages_fetched, 2);
        assert_eq!(fetcher.detail_requests(), 5);
        assert!(!fetcher.requests().contains(&"https://jiji.ng/f.html".to_string()));
        assert_eq!(
            sink.flushes.lock().unwrap().last(),
            Some(&("sale_final".to_string(), 5))
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_item_page_stops_crawl() {
        let fetcher = Arc::new(FakeFetcher::with_pages(vec![
            listing_page(&["/a.html", "/b.html", "/c.html"]),
            empty_page(),
            listing_page(&["/d.html"]),
        ]));

        let (report, _) = run(fetcher.clone(), settings(), 100).await;

        assert_eq!(report.records, 3);
        assert_eq!(report.stop_reason, StopReason::NoItems { page: 2 });
        assert!(!fetcher
            .requests()
            .contains(&Frontier::page_url(BASE, 3)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_default_settings_paginate_until_empty_page() {
        let fetcher = Arc::new(FakeFetcher::with_pages(vec![
            listing_page(&["/a.html", "", "/b.html"]),
            empty_page(),
        ]));

        let (report, sink) = run(fetcher.clone(), CrawlerConfig::default(), 10).await;

        assert_eq!(report.records, 2);
        assert_eq!(report.stop_reason, StopReason::NoItems { page: 2 });
        assert_eq!(report.pages_fetched, 2);
        assert!(fetcher.requests().contains(&Frontier::page_url(BASE, 2)));
        assert_eq!(
            sink.flushes.lock().unwrap().last(),
            Some(&("sale_final".to_string(), 2))
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_configured_minimum_stops_on_short_page() {
        let fetcher = Arc::new(FakeFetcher::with_pages(vec![
            listing_page(&["/a.html", "/b.html", "/c.html"]),
            listing_page(&["/d.html"]),
        ]));
        let settings = CrawlerConfig {
            min_items_per_page: 5,
            ..settings()
        };

        let (report, _) = run(fetcher.clone(), settings, 10).await;

        assert_eq!(report.records, 3);
        assert_eq!(report.stop_reason, StopReason::ShortPage { page: 1, items: 3 });
        assert!(!fetcher.requests().contains(&Frontier::page_url(BASE, 2)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_duplicates_fetched_once() {
        let fetcher = Arc::new(FakeFetcher::with_pages(vec![
            listing_page(&["/a.html", "/b.html", "/a.html"]),
            listing_page(&["https://jiji.ng/b.html", "/c.html"]),
            empty_page(),
        ]));

        let (report, _) = run(fetcher.clone(), settings(), 100).await;

        assert_eq!(report.records, 3);
        assert_eq!(report.skipped_duplicate, 2);
        assert_eq!(fetcher.detail_requests(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_unusable_cards_never_dispatched() {
        let fetcher = Arc::new(FakeFetcher::with_pages(vec![
            listing_page(&["/a.html", "", "https://propertypro.ng/listing/9"]),
            empty_page(),
        ]));

        let (report, _) = run(fetcher.clone(), settings(), 10).await;

        assert_eq!(report.records, 1);
        assert_eq!(report.skipped_empty_url, 1);
        assert_eq!(report.skipped_foreign, 1);
        assert_eq!(fetcher.detail_requests(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_detail_keeps_card_record() {
        let mut fake = FakeFetcher::with_pages(vec![
            listing_page(&["/a.html", "/b.html"]),
            empty_page(),
        ]);
        fake.failing.insert("https://jiji.ng/b.html".to_string());
        let fetcher = Arc::new(fake);

        let sink = Arc::new(RecordingSink::default());
        let context = CrawlContext {
            source: "Jiji".to_string(),
            settings: settings(),
            fetcher,
            extractor: Arc::new(extractor()),
            sink,
        };
        let report = Orchestrator::new(category(10), context).run().await;

        assert_eq!(report.records, 2);
        assert_eq!(report.details_degraded, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_listing_page_counts_as_empty() {
        let mut fake = FakeFetcher::with_pages(vec![listing_page(&["/a.html"])]);
        fake.failing.insert(Frontier::page_url(BASE, 1));

        let (report, sink) = run(Arc::new(fake), settings(), 10).await;

        assert_eq!(report.records, 0);
        assert_eq!(report.pages_failed, 1);
        assert_eq!(report.stop_reason, StopReason::NoItems { page: 1 });
        assert_eq!(
            *sink.flushes.lock().unwrap(),
            vec![("sale_final".to_string(), 0)]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_checkpoint_labels() {
        let fetcher = Arc::new(FakeFetcher::with_pages(vec![
            listing_page(&["/a.html", "/b.html", "/c.html"]),
            listing_page(&["/d.html", "/e.html", "/f.html"]),
            listing_page(&["/g.html"]),
            empty_page(),
        ]));
        let settings = CrawlerConfig {
            checkpoint_every: 2,
            ..settings()
        };

        let (report, sink) = run(fetcher, settings, 100).await;

        assert_eq!(report.checkpoints, 2);
        assert_eq!(
            *sink.flushes.lock().unwrap(),
            vec![
                ("sale_checkpoint_3".to_string(), 3),
                ("sale_checkpoint_6".to_string(), 6),
                ("sale_final".to_string(), 7),
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_records_merge_card_and_detail() {
        let fetcher = Arc::new(FakeFetcher::with_pages(vec![
            listing_page(&["/a.html"]),
            empty_page(),
        ]));
        let sink = Arc::new(RecordingSink::default());
        let context = CrawlContext {
            source: "Jiji".to_string(),
            settings: settings(),
            fetcher,
            extractor: Arc::new(extractor()),
            sink,
        };

        let orchestrator = Orchestrator::new(category(10), context.clone());
        let record = orchestrator
            .fetch_detail(ListingSummary {
                title: "Flat 0".to_string(),
                price: "1000000".to_string(),
                listing_url: "https://jiji.ng/a.html".to_string(),
                ..ListingSummary::default()
            })
            .await
            .0;

        assert_eq!(record.title, "Detail title");
        assert_eq!(record.price, "1000000");
        assert_eq!(record.contact, "+2348031234567");
        assert_eq!(record.source, "Jiji");
        assert_eq!(record.listing_type, "sale");
        assert_eq!(record.size_sqm, UNKNOWN);
    }

    #[test]
    fn test_crosses_checkpoint() {
        assert!(crosses_checkpoint(1999, 2000, 2000));
        assert!(crosses_checkpoint(1990, 2010, 2000));
        assert!(!crosses_checkpoint(2000, 2010, 2000));
        assert!(!crosses_checkpoint(0, 10, 0));
    }
}
