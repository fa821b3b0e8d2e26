//! Record extraction from fetched page bodies
//!
//! This module turns HTML into records:
//! - Listing pages into [`ListingSummary`] values, one per card
//! - Detail pages into a single [`DetailRecord`]
//! - Raw bodies into a canonical contact number
//!
//! Extraction is pure (no I/O) and never fails outward: a missing field
//! becomes a sentinel, an unusable card is skipped, and an unusable page
//! yields an empty result.

mod contact;
mod detail;
mod listing;
mod strategy;

pub use contact::ContactExtractor;
pub use listing::SkipReason;
pub use strategy::{element_text, visible_text, FieldChain, Strategy};

use crate::config::{Config, SelectorConfig, SiteConfig};
use crate::record::{DetailRecord, ListingSummary};
use crate::url::SiteScope;
use crate::ConfigError;
use scraper::{Html, Selector};
use strategy::{compile_selector, compile_selectors};

/// Compiled listing-card strategies
#[derive(Debug, Clone)]
struct ListingFields {
    container: Vec<Selector>,
    item: Vec<Selector>,
    title: FieldChain,
    price: FieldChain,
    description: FieldChain,
    location: FieldChain,
    size: FieldChain,
    link: FieldChain,
    agent: FieldChain,
    date: FieldChain,
}

/// Compiled detail-page strategies
#[derive(Debug, Clone)]
struct DetailFields {
    title: FieldChain,
    price: FieldChain,
    location: FieldChain,
    description: FieldChain,
    attributes: FieldChain,
    agent_blocks: Vec<Selector>,
    updated: FieldChain,
    images: Selector,
    preview_image: FieldChain,
}

/// Site-aware extractor built once from configuration and shared by every
/// category crawl
#[derive(Debug, Clone)]
pub struct Extractor {
    scope: SiteScope,
    listing: ListingFields,
    detail: DetailFields,
    contact: ContactExtractor,
    media_host: String,
    generic_regions: Vec<String>,
    max_images: usize,
}

impl Extractor {
    /// Builds an extractor from a full configuration
    pub fn from_config(config: &Config) -> Result<Self, ConfigError> {
        Self::new(&config.site, &config.selectors, config.crawler.max_images)
    }

    /// Compiles every selector list; an invalid selector is a configuration error
    pub fn new(
        site: &SiteConfig,
        selectors: &SelectorConfig,
        max_images: usize,
    ) -> Result<Self, ConfigError> {
        let listing = ListingFields {
            container: compile_selectors("listing-container", &selectors.listing_container)?,
            item: compile_selectors("listing-item", &selectors.listing_item)?,
            title: FieldChain::text("item-title", &selectors.item_title)?,
            price: FieldChain::text("item-price", &selectors.item_price)?,
            description: FieldChain::text("item-description", &selectors.item_description)?,
            location: FieldChain::text("item-location", &selectors.item_location)?,
            size: FieldChain::text("item-size", &selectors.item_size)?,
            link: FieldChain::attr("item-link", &selectors.item_link, "href")?
                .then(Strategy::OwnAttr("href".to_string())),
            agent: FieldChain::text("item-agent", &selectors.item_agent)?,
            date: FieldChain::text("item-date", &selectors.item_date)?,
        };

        let detail = DetailFields {
            title: FieldChain::text("detail-title", &selectors.detail_title)?
                .then(Strategy::Text(compile_selector("detail-title", "h1")?)),
            price: FieldChain::text("detail-price", &selectors.detail_price)?,
            location: FieldChain::text("detail-location", &selectors.detail_location)?,
            description: FieldChain::text("detail-description", &selectors.detail_description)?,
            attributes: FieldChain::text("detail-attributes", &selectors.detail_attributes)?,
            agent_blocks: compile_selectors("detail-agent", &selectors.detail_agent)?,
            updated: FieldChain::text("detail-updated", &selectors.detail_updated)?,
            images: compile_selector("images", "img")?,
            preview_image: FieldChain::attr(
                "preview-image",
                &[
                    "meta[property='og:image']".to_string(),
                    "meta[name='twitter:image']".to_string(),
                ],
                "content",
            )?,
        };

        Ok(Self {
            scope: SiteScope::from_site(site)?,
            listing,
            detail,
            contact: ContactExtractor::new(&site.country_code)?,
            media_host: site.media_host.to_lowercase(),
            generic_regions: site
                .generic_regions
                .iter()
                .map(|r| r.trim().to_lowercase())
                .collect(),
            max_images,
        })
    }

    /// The site scope used to resolve and filter listing URLs
    pub fn scope(&self) -> &SiteScope {
        &self.scope
    }

    /// Extracts every listing card from a search-results page
    pub fn extract_listing_summaries(&self, body: &str) -> Vec<ListingSummary> {
        match parse_document(body) {
            Some(document) => self.listing_summaries_from(&document),
            None => Vec::new(),
        }
    }

    /// Extracts the record of an individual listing page
    pub fn extract_detail(&self, body: &str) -> DetailRecord {
        match parse_document(body) {
            Some(document) => self.detail_from(body, &document),
            None => DetailRecord::default(),
        }
    }

    /// Canonical seller phone number recovered from a raw page body
    pub fn extract_contact(&self, raw_body: &str) -> String {
        self.contact.extract(raw_body)
    }
}

/// Parses a body into a document; blank bodies have nothing to parse
fn parse_document(body: &str) -> Option<Html> {
    if body.trim().is_empty() {
        return None;
    }
    Some(Html::parse_document(body))
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;

    pub fn site() -> SiteConfig {
        SiteConfig {
            name: "Jiji".to_string(),
            root_url: "https://jiji.ng".to_string(),
            allowed_domains: vec![],
            media_host: "jijistatic".to_string(),
            country_code: "234".to_string(),
            generic_regions: vec![
                "Lagos".to_string(),
                "Lagos State".to_string(),
                "Nigeria".to_string(),
            ],
            user_agent: None,
        }
    }

    pub fn extractor() -> Extractor {
        Extractor::new(&site(), &SelectorConfig::default(), 3).unwrap()
    }
}
