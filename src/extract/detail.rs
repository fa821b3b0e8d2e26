use super::strategy::{element_text, visible_text};
use super::Extractor;
use crate::normalize::{
    extract_size_sqm, find_relative_date, normalize_location, normalize_property_features,
    normalize_update_info, parse_count, parse_listing_price, price_per_sqm, UpdateValue,
};
use crate::record::{DetailRecord, PropertyType, UNKNOWN};
use crate::url::normalize_image_src;
use regex::Regex;
use scraper::{ElementRef, Html};
use std::collections::HashSet;
use std::sync::LazyLock;

static BEDROOMS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\d+\s*-?\s*bed").expect("valid bedroom pattern"));

static BATHROOMS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\d+\s*-?\s*bath").expect("valid bathroom pattern"));

static CAPITALIZED_RUN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b[A-Z][a-zA-Z'.-]*(?:\s+[A-Z][a-zA-Z'.-]*)*").expect("valid name pattern")
});

/// Block labels that precede the seller's name and are never part of it
const LABEL_WORDS: &[&str] = &[
    "Agent", "Call", "Chat", "Contact", "Details", "Listed", "Message", "Phone", "Posted",
    "Seller", "Show", "Verified", "View", "By",
];

/// Image sources containing these tokens are site chrome, not listing photos
const IMAGE_EXCLUDES: &[&str] = &["logo", "avatar"];

impl Extractor {
    pub(super) fn detail_from(&self, body: &str, document: &Html) -> DetailRecord {
        let root = document.root_element();
        let fields = &self.detail;

        let page_text = visible_text(root);
        let attributes = fields.attributes.first_in(root);

        let title = fields.title.first_in(root).unwrap_or_else(|| UNKNOWN.to_string());
        let price = fields
            .price
            .first_in(root)
            .map(|raw| parse_listing_price(&raw))
            .unwrap_or_else(|| UNKNOWN.to_string());
        let size_sqm = attributes
            .as_deref()
            .and_then(extract_size_sqm)
            .or_else(|| extract_size_sqm(&page_text))
            .unwrap_or_else(|| UNKNOWN.to_string());
        let property_description = fields
            .description
            .first_in(root)
            .unwrap_or_else(|| UNKNOWN.to_string());

        let features = attributes
            .as_deref()
            .map(normalize_property_features)
            .unwrap_or_default();
        let room_count = |key: &str, pattern: &Regex| {
            features
                .get(key)
                .map(|count| count.to_string())
                .or_else(|| attributes.as_deref().and_then(|text| first_count(pattern, text)))
                .or_else(|| first_count(pattern, &page_text))
                .unwrap_or_else(|| UNKNOWN.to_string())
        };
        let bedrooms = room_count("bedrooms", &BEDROOMS);
        let bathrooms = room_count("bathrooms", &BATHROOMS);

        let furnishing_status = attributes
            .as_deref()
            .and_then(furnishing)
            .or_else(|| furnishing(&page_text))
            .unwrap_or(UNKNOWN)
            .to_string();

        let property_type =
            PropertyType::from_text(&format!("{} {}", title, property_description));

        DetailRecord {
            price_per_sqm: price_per_sqm(&price, &size_sqm),
            location: self.specific_location(root),
            agent_name: self.agent_name(root),
            contact: self.contact.extract_with_tree(body, root),
            image_links: self.image_links(root),
            listing_date: self.listing_date(root, &page_text),
            title,
            price,
            size_sqm,
            bedrooms,
            bathrooms,
            furnishing_status,
            property_description,
            property_type,
        }
    }

    /// Location with generic regions removed; a bare city/state is unknown
    fn specific_location(&self, root: ElementRef<'_>) -> String {
        let Some(raw) = self.detail.location.first_in(root) else {
            return UNKNOWN.to_string();
        };

        let specific: Vec<&str> = raw
            .split(',')
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .filter(|part| !self.generic_regions.contains(&part.to_lowercase()))
            .collect();

        normalize_location(&specific.join(", ")).unwrap_or_else(|| UNKNOWN.to_string())
    }

    /// First capitalized-word run under a seller/agent/contact block
    fn agent_name(&self, root: ElementRef<'_>) -> String {
        self.detail
            .agent_blocks
            .iter()
            .flat_map(|selector| root.select(selector))
            .filter_map(element_text)
            .find_map(|text| {
                CAPITALIZED_RUN.find_iter(&text).find_map(|run| {
                    let name: Vec<&str> = run
                        .as_str()
                        .split_whitespace()
                        .filter(|word| !LABEL_WORDS.contains(word))
                        .collect();
                    (!name.is_empty()).then(|| name.join(" "))
                })
            })
            .unwrap_or_else(|| UNKNOWN.to_string())
    }

    /// Listing photos on the media host, de-duplicated and capped
    fn image_links(&self, root: ElementRef<'_>) -> Vec<String> {
        let mut seen = HashSet::new();
        let mut links = Vec::new();

        for img in root.select(&self.detail.images) {
            let candidates = ["src", "data-src"]
                .iter()
                .filter_map(|attr| img.value().attr(*attr))
                .map(normalize_image_src);

            for src in candidates {
                let lower = src.to_lowercase();
                if src.is_empty()
                    || !lower.contains(&self.media_host)
                    || IMAGE_EXCLUDES.iter().any(|token| lower.contains(token))
                {
                    continue;
                }
                if seen.insert(src.clone()) {
                    links.push(src);
                }
            }

            if links.len() >= self.max_images {
                break;
            }
        }
        links.truncate(self.max_images);

        if links.is_empty() {
            if let Some(preview) = self.detail.preview_image.first_in(root) {
                links.push(normalize_image_src(&preview));
            }
        }
        links
    }

    /// Relative-time phrase from the page text, else the added/updated date
    fn listing_date(&self, root: ElementRef<'_>, page_text: &str) -> String {
        if let Some(relative) = find_relative_date(page_text) {
            return relative;
        }

        let Some(info) = self.detail.updated.first_in(root) else {
            return UNKNOWN.to_string();
        };
        let dates = normalize_update_info(&info);
        ["added", "updated"]
            .iter()
            .find_map(|label| match dates.get(*label) {
                Some(UpdateValue::Date(date)) => Some(date.format("%Y-%m-%d").to_string()),
                _ => None,
            })
            .unwrap_or_else(|| UNKNOWN.to_string())
    }
}

/// Count of the first room phrase `pattern` finds in `text`
fn first_count(pattern: &Regex, text: &str) -> Option<String> {
    pattern
        .find(text)
        .and_then(|phrase| parse_count(phrase.as_str()))
        .map(|count| count.to_string())
}

fn furnishing(text: &str) -> Option<&'static str> {
    let lower = text.to_lowercase();
    if lower.contains("semi-furnished") || lower.contains("semi furnished") {
        Some("Semi-Furnished")
    } else if lower.contains("unfurnished") {
        Some("Unfurnished")
    } else if lower.contains("furnished") {
        Some("Furnished")
    } else {
        None
    }
}
