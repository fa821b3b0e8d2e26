use serde::Deserialize;
use std::time::Duration;

/// Main configuration structure for Estate-Harvest
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub crawler: CrawlerConfig,
    pub site: SiteConfig,
    #[serde(default)]
    pub selectors: SelectorConfig,
    pub output: OutputConfig,
    #[serde(default, rename = "category")]
    pub categories: Vec<CategoryConfig>,
}

/// Crawler behavior configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CrawlerConfig {
    /// Maximum number of detail pages fetched concurrently within a batch
    #[serde(rename = "max-concurrent-details")]
    pub max_concurrent_details: u32,

    /// Attempts per URL before the fetch is reported as failed
    #[serde(rename = "max-retries")]
    pub max_retries: u32,

    /// Base of the linear retry backoff (milliseconds)
    #[serde(rename = "base-backoff-ms")]
    pub base_backoff_ms: u64,

    /// Minimum wait after an HTTP 429 (milliseconds)
    #[serde(rename = "rate-limit-cooldown-ms")]
    pub rate_limit_cooldown_ms: u64,

    /// Connect/read timeout for a single request (seconds)
    #[serde(rename = "request-timeout-secs")]
    pub request_timeout_secs: u64,

    /// Delay between two listing page requests of one category (milliseconds)
    #[serde(rename = "page-delay-ms")]
    pub page_delay_ms: u64,

    /// A listing page with fewer items than this is treated as the last page (0 disables)
    #[serde(rename = "min-items-per-page")]
    pub min_items_per_page: usize,

    /// Accumulated record count multiple that triggers a checkpoint flush
    #[serde(rename = "checkpoint-every")]
    pub checkpoint_every: usize,

    /// Maximum number of image links kept per listing
    #[serde(rename = "max-images")]
    pub max_images: usize,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            max_concurrent_details: 4,
            max_retries: 3,
            base_backoff_ms: 2000,
            rate_limit_cooldown_ms: 15_000,
            request_timeout_secs: 15,
            page_delay_ms: 2000,
            min_items_per_page: 0,
            checkpoint_every: 2000,
            max_images: 10,
        }
    }
}

impl CrawlerConfig {
    pub fn base_backoff(&self) -> Duration {
        Duration::from_millis(self.base_backoff_ms)
    }

    pub fn rate_limit_cooldown(&self) -> Duration {
        Duration::from_millis(self.rate_limit_cooldown_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn page_delay(&self) -> Duration {
        Duration::from_millis(self.page_delay_ms)
    }
}

/// The listing site being harvested
#[derive(Debug, Clone, Deserialize)]
pub struct SiteConfig {
    /// Provenance name written into every record
    pub name: String,

    /// Site root used to resolve `/`-relative links
    #[serde(rename = "root-url")]
    pub root_url: String,

    /// Extra domain patterns (e.g. "*.example.com") whose listings are accepted
    #[serde(default, rename = "allowed-domains")]
    pub allowed_domains: Vec<String>,

    /// Substring an image URL must contain to be kept
    #[serde(default, rename = "media-host")]
    pub media_host: String,

    /// International dialing code used to canonicalize phone numbers
    #[serde(default = "default_country_code", rename = "country-code")]
    pub country_code: String,

    /// Region names too generic to count as a listing location
    #[serde(default, rename = "generic-regions")]
    pub generic_regions: Vec<String>,

    /// Overrides the default browser User-Agent
    #[serde(default, rename = "user-agent")]
    pub user_agent: Option<String>,
}

fn default_country_code() -> String {
    "234".to_string()
}

/// Ordered CSS selector fallbacks, most specific first
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SelectorConfig {
    #[serde(rename = "listing-container")]
    pub listing_container: Vec<String>,
    #[serde(rename = "listing-item")]
    pub listing_item: Vec<String>,
    #[serde(rename = "item-title")]
    pub item_title: Vec<String>,
    #[serde(rename = "item-price")]
    pub item_price: Vec<String>,
    #[serde(rename = "item-description")]
    pub item_description: Vec<String>,
    #[serde(rename = "item-location")]
    pub item_location: Vec<String>,
    #[serde(rename = "item-size")]
    pub item_size: Vec<String>,
    #[serde(rename = "item-link")]
    pub item_link: Vec<String>,
    #[serde(rename = "item-agent")]
    pub item_agent: Vec<String>,
    #[serde(rename = "item-date")]
    pub item_date: Vec<String>,
    #[serde(rename = "detail-title")]
    pub detail_title: Vec<String>,
    #[serde(rename = "detail-price")]
    pub detail_price: Vec<String>,
    #[serde(rename = "detail-location")]
    pub detail_location: Vec<String>,
    #[serde(rename = "detail-description")]
    pub detail_description: Vec<String>,
    #[serde(rename = "detail-attributes")]
    pub detail_attributes: Vec<String>,
    #[serde(rename = "detail-agent")]
    pub detail_agent: Vec<String>,
    #[serde(rename = "detail-updated")]
    pub detail_updated: Vec<String>,
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

impl Default for SelectorConfig {
    fn default() -> Self {
        Self {
            listing_container: strings(&[
                "div.masonry-wall.b-list-advert__gallery",
                "div[class*='b-list-advert__gallery']",
                "div[class*='listings']",
                "body",
            ]),
            listing_item: strings(&[
                "div.masonry-item",
                "div.property-listing-content",
                "div[class*='advert-list-item']",
                "div[class*='listing-item']",
            ]),
            item_title: strings(&[
                "div.b-list-advert-base__data__title",
                "div.pl-title h3",
                "[class*='title']",
            ]),
            item_price: strings(&[
                "div.b-list-advert-base__data__price",
                "div.pl-price h3",
                "[class*='price']",
            ]),
            item_description: strings(&[
                "div.b-list-advert-base__description",
                "[class*='description']",
            ]),
            item_location: strings(&[
                "span.b-list-advert__region__text",
                "div.pl-title p",
                "[class*='region']",
                "[class*='location']",
            ]),
            item_size: strings(&["div.b-list-advert-base__item-attr", "[class*='attr']"]),
            item_link: strings(&["a[href]"]),
            item_agent: strings(&["div.flex-grow-1.ms-2"]),
            item_date: strings(&["p.date-added"]),
            detail_title: strings(&["div.b-advert-title-inner", "[class*='advert-title']"]),
            detail_price: strings(&[
                "div.b-alt-advert-price-wrapper",
                "span.qa-advert-price",
                "[class*='advert-price']",
            ]),
            detail_location: strings(&[
                "div.b-advert-info-statistics--region",
                "[class*='advert-info-statistics'][class*='region']",
                "[class*='region']",
            ]),
            detail_description: strings(&[
                "div.qa-advert-description",
                "[class*='advert-description']",
                "[class*='description']",
            ]),
            detail_attributes: strings(&[
                "div.b-advert-icon-attributes-container",
                "[class*='icon-attribute']",
                "div.property-details",
            ]),
            detail_agent: strings(&[
                "[class*='seller']",
                "[class*='agent']",
                "[class*='contact']",
            ]),
            detail_updated: strings(&["[class*='date-added']", "[class*='updated']"]),
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Directory receiving CSV/JSON snapshots
    pub directory: String,

    /// Enabled sink formats
    #[serde(default = "default_formats")]
    pub formats: Vec<OutputFormat>,

    /// Path to the SQLite database file
    #[serde(default = "default_database_path", rename = "database-path")]
    pub database_path: String,
}

fn default_formats() -> Vec<OutputFormat> {
    vec![OutputFormat::Csv, OutputFormat::Json]
}

fn default_database_path() -> String {
    "listings.db".to_string()
}

/// A persisted snapshot format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Csv,
    Json,
    Sqlite,
}

/// One listing category (e.g. "sale" or "rent") crawled by its own orchestrator
#[derive(Debug, Clone, Deserialize)]
pub struct CategoryConfig {
    /// Provenance label written into every record
    #[serde(rename = "listing-type")]
    pub listing_type: String,

    /// Listing base URL; pages are requested as `<url>?page=<n>`
    pub url: String,

    /// Number of records to collect before stopping
    pub target: usize,

    /// Optional hard cap on the number of listing pages requested
    #[serde(default, rename = "max-pages")]
    pub max_pages: Option<u32>,
}
