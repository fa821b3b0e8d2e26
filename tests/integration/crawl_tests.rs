//! Integration tests for the harvester
//!
//! These tests use wiremock to create mock HTTP servers and test the
//! fetcher's retry behavior and the full harvest cycle end-to-end.

use estate_harvest::config::{load_config_with_hash, CrawlerConfig};
use estate_harvest::crawler::{
    build_http_client, harvest, FetchErrorKind, FetchOutcome, Fetcher, HarvestOptions,
    RetryPolicy, StopReason,
};
use estate_harvest::output::{build_sinks, load_statistics, open_database, RunStatus, Sink};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Fetcher with millisecond delays so retries finish quickly
fn fast_fetcher(max_retries: u32) -> Fetcher {
    let config = CrawlerConfig {
        request_timeout_secs: 5,
        ..CrawlerConfig::default()
    };
    let client = build_http_client(&config, None).expect("Failed to build client");
    Fetcher::new(
        client,
        RetryPolicy {
            max_retries,
            base_backoff: Duration::from_millis(5),
            rate_limit_cooldown: Duration::from_millis(10),
        },
    )
}

fn html(body: &str) -> ResponseTemplate {
    ResponseTemplate::new(200)
        .set_body_string(body)
        .insert_header("content-type", "text/html")
}

async fn request_count(server: &MockServer) -> usize {
    server
        .received_requests()
        .await
        .map(|requests| requests.len())
        .unwrap_or_default()
}

#[tokio::test]
async fn test_rate_limit_then_success() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/flats"))
        .respond_with(ResponseTemplate::new(429))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/flats"))
        .respond_with(html("<html><body>ok</body></html>"))
        .mount(&server)
        .await;

    let outcome = fast_fetcher(3)
        .fetch_with_retry(&format!("{}/flats", server.uri()))
        .await;

    assert_eq!(
        outcome,
        FetchOutcome::Success {
            body: "<html><body>ok</body></html>".to_string(),
            status: 200
        }
    );
    assert_eq!(request_count(&server).await, 2);
}

#[tokio::test]
async fn test_server_error_then_success() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .up_to_n_times(2)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .respond_with(html("<html>third time lucky</html>"))
        .mount(&server)
        .await;

    let outcome = fast_fetcher(3)
        .fetch_with_retry(&format!("{}/listing/1.html", server.uri()))
        .await;

    assert_eq!(
        outcome.into_body().as_deref(),
        Some("<html>third time lucky</html>")
    );
    assert_eq!(request_count(&server).await, 3);
}

#[tokio::test]
async fn test_exhausted_retries_report_last_status() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let outcome = fast_fetcher(3)
        .fetch_with_retry(&format!("{}/listing/1.html", server.uri()))
        .await;

    assert_eq!(outcome, FetchOutcome::Failed(FetchErrorKind::Status(500)));
    assert_eq!(request_count(&server).await, 3);
}

#[tokio::test]
async fn test_persistent_rate_limit() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(429))
        .mount(&server)
        .await;

    let outcome = fast_fetcher(2)
        .fetch_with_retry(&format!("{}/flats", server.uri()))
        .await;

    assert_eq!(outcome, FetchOutcome::RateLimited);
    assert_eq!(request_count(&server).await, 2);
}

#[tokio::test]
async fn test_connection_refused_is_failure() {
    // Nothing listens on the discard port
    let outcome = fast_fetcher(1)
        .fetch_with_retry("http://127.0.0.1:9/flats")
        .await;

    assert!(matches!(outcome, FetchOutcome::Failed(_)));
}

const LISTING_PAGE: &str = r#"<html><body>
<div class="masonry-wall b-list-advert__gallery">
  <div class="masonry-item">
    <a href="/listing/a.html">
      <div class="b-list-advert-base__data__title">3 Bedroom Flat</div>
      <div class="b-list-advert-base__data__price">₦ 45,000,000</div>
      <span class="b-list-advert__region__text">Lekki</span>
    </a>
  </div>
  <div class="masonry-item">
    <a href="/listing/b.html">
      <div class="b-list-advert-base__data__title">Plot of Land</div>
      <div class="b-list-advert-base__data__price">₦ 12,000,000</div>
      <span class="b-list-advert__region__text">Ibeju Lekki</span>
    </a>
  </div>
  <div class="masonry-item">
    <div class="b-list-advert-base__data__title">Card without a link</div>
  </div>
</div>
</body></html>"#;

const EMPTY_PAGE: &str = "<html><body><p>No adverts found</p></body></html>";

const DETAIL_PAGE: &str = r#"<html><body>
<div class="b-advert-title-inner">3 Bedroom Flat in Lekki</div>
<div class="b-alt-advert-price-wrapper">₦ 45,000,000</div>
<div class="b-advert-info-statistics--region">Lekki Phase 1, Lagos</div>
<div class="qa-advert-description">Spacious flat with a swimming pool</div>
<div class="b-advert-icon-attributes-container">3 Beds 2 Baths Furnished</div>
<img src="https://pictures.jijistatic.net/a1.jpg">
<img src="https://pictures.jijistatic.net/a2.jpg">
<img src="https://pictures.jijistatic.net/logo.png">
<script>window.__STATE__ = {"advert":{"phone":"08031234567"}}</script>
</body></html>"#;

/// Mounts a two-page category where one detail page always fails
async fn mount_site(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/flats"))
        .and(query_param("page", "1"))
        .respond_with(html(LISTING_PAGE))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/flats"))
        .and(query_param("page", "2"))
        .respond_with(html(EMPTY_PAGE))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/listing/a.html"))
        .respond_with(html(DETAIL_PAGE))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/listing/b.html"))
        .respond_with(ResponseTemplate::new(503))
        .mount(server)
        .await;
}

fn write_config(dir: &Path, root_url: &str) -> std::path::PathBuf {
    let config = format!(
        r#"
[crawler]
max-concurrent-details = 2
max-retries = 2
base-backoff-ms = 5
rate-limit-cooldown-ms = 10
request-timeout-secs = 5
page-delay-ms = 10
checkpoint-every = 1
max-images = 5

[site]
name = "Jiji"
root-url = "{root}"
media-host = "jijistatic"
generic-regions = ["Lagos", "Nigeria"]

[output]
directory = "{dir}/out"
formats = ["json", "csv", "sqlite"]
database-path = "{dir}/listings.db"

[[category]]
listing-type = "sale"
url = "{root}/flats"
target = 10
"#,
        root = root_url,
        dir = dir.display()
    );
    let path = dir.join("harvest.toml");
    std::fs::write(&path, config).expect("Failed to write config");
    path
}

/// Finds the snapshot written under `label` with the given extension
fn snapshot(dir: &Path, label: &str, extension: &str) -> std::path::PathBuf {
    std::fs::read_dir(dir)
        .expect("Failed to read output directory")
        .map(|entry| entry.expect("Failed to read entry").path())
        .find(|path| {
            let name = path.file_name().and_then(|n| n.to_str()).unwrap_or_default();
            name.starts_with(&format!("{}_", label)) && name.ends_with(extension)
        })
        .unwrap_or_else(|| panic!("No {} snapshot for {}", extension, label))
}

#[tokio::test]
async fn test_full_harvest_single_category() {
    let server = MockServer::start().await;
    mount_site(&server).await;

    let dir = TempDir::new().expect("Failed to create temp dir");
    let config_path = write_config(dir.path(), &server.uri());
    let (config, hash) = load_config_with_hash(&config_path).expect("Failed to load config");

    let sinks = Arc::new(build_sinks(&config, &hash).expect("Failed to build sinks"));
    let reports = harvest(&config, sinks.clone(), &HarvestOptions::default())
        .await
        .expect("Harvest failed");
    sinks
        .finalize(RunStatus::Completed)
        .expect("Failed to finalize");

    // One category, stopped by the empty second page
    assert_eq!(reports.len(), 1);
    let report = &reports[0];
    assert_eq!(report.listing_type, "sale");
    assert_eq!(report.records, 2);
    assert_eq!(report.stop_reason, StopReason::NoItems { page: 2 });
    assert_eq!(report.pages_fetched, 2);
    assert_eq!(report.details_dispatched, 2);
    assert_eq!(report.details_degraded, 1);
    assert_eq!(report.skipped_empty_url, 1);
    assert_eq!(report.checkpoints, 1);
    assert_eq!(report.sink_failures, 0);

    // Final JSON snapshot
    let out = dir.path().join("out");
    let content = std::fs::read_to_string(snapshot(&out, "sale_final", ".json"))
        .expect("Failed to read snapshot");
    let records: serde_json::Value = serde_json::from_str(&content).expect("Invalid JSON");
    let records = records.as_array().expect("Snapshot is not an array");
    assert_eq!(records.len(), 2);

    let by_url = |suffix: &str| {
        records
            .iter()
            .find(|r| {
                r["listing_url"]
                    .as_str()
                    .is_some_and(|url| url.ends_with(suffix))
            })
            .unwrap_or_else(|| panic!("Missing record {}", suffix))
    };

    let flat = by_url("/listing/a.html");
    assert_eq!(flat["source"], "Jiji");
    assert_eq!(flat["listing_type"], "sale");
    assert_eq!(flat["title"], "3 Bedroom Flat in Lekki");
    assert_eq!(flat["location"], "Lekki Phase 1");
    assert_eq!(flat["bedrooms"], "3");
    assert_eq!(flat["bathrooms"], "2");
    assert_eq!(flat["furnishing_status"], "Furnished");
    assert_eq!(flat["contact"], "+2348031234567");
    assert_eq!(flat["property_type"], "Flat");
    assert_eq!(flat["image_links"].as_array().map(Vec::len), Some(2));

    // Detail page failed: the card data survives, detail fields are sentinels
    let land = by_url("/listing/b.html");
    assert_eq!(land["title"], "Plot of Land");
    assert_eq!(land["location"], "Ibeju Lekki");
    assert_eq!(land["contact"], "Unknown");
    assert_eq!(land["bedrooms"], "Unknown");
    assert_eq!(land["property_type"], "Land");

    // Checkpoint and CSV snapshots exist alongside
    snapshot(&out, "sale_checkpoint_2", ".json");
    snapshot(&out, "sale_final", ".csv");

    // SQLite run was recorded and completed
    let conn = open_database(&dir.path().join("listings.db")).expect("Failed to open DB");
    let stats = load_statistics(&conn).expect("Failed to load statistics");
    assert_eq!(stats.total_listings, 2);
    assert_eq!(stats.without_contact, 1);
    assert_eq!(stats.total_runs, 1);
    assert_eq!(
        stats.latest_run.map(|(_, status)| status).as_deref(),
        Some("completed")
    );
}

#[tokio::test]
async fn test_category_filter_skips_unselected() {
    let server = MockServer::start().await;
    mount_site(&server).await;

    let dir = TempDir::new().expect("Failed to create temp dir");
    let config_path = write_config(dir.path(), &server.uri());
    let (config, hash) = load_config_with_hash(&config_path).expect("Failed to load config");
    let sinks = Arc::new(build_sinks(&config, &hash).expect("Failed to build sinks"));

    let options = HarvestOptions {
        only: vec!["rent".to_string()],
        sequential: true,
    };
    let reports = harvest(&config, sinks, &options)
        .await
        .expect("Harvest failed");

    assert!(reports.is_empty());
    assert_eq!(request_count(&server).await, 0);
}
