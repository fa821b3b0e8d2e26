//! Listing records and their merge policy
//!
//! Every textual field uses a sentinel instead of `Option`: [`UNKNOWN`] when a
//! value could not be extracted, [`NEGOTIABLE`] for prices without a figure.

mod property_type;

pub use property_type::PropertyType;

use crate::normalize::price_per_sqm;
use serde::Serialize;

/// Sentinel for a field that could not be extracted
pub const UNKNOWN: &str = "Unknown";

/// Sentinel for a price that is withheld or open to negotiation
pub const NEGOTIABLE: &str = "Negotiable";

/// Returns true when a field holds the extraction-gap sentinel (or nothing)
pub fn is_unknown(value: &str) -> bool {
    value.is_empty() || value == UNKNOWN
}

/// One page request produced by the frontier
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest {
    pub url: String,
    pub page_index: u32,
}

/// The abbreviated record shown on a search-results page
#[derive(Debug, Clone, PartialEq)]
pub struct ListingSummary {
    pub title: String,
    /// Cleaned digit string or [`NEGOTIABLE`]
    pub price: String,
    pub description: String,
    pub location: String,
    pub size_sqm: String,
    /// Canonical identifier; empty when the card had no usable anchor
    pub listing_url: String,
    /// Agent name printed on the card, when the site shows one
    pub agent_hint: Option<String>,
    /// Date text printed on the card, when the site shows one
    pub date_hint: Option<String>,
}

impl Default for ListingSummary {
    fn default() -> Self {
        Self {
            title: UNKNOWN.to_string(),
            price: UNKNOWN.to_string(),
            description: UNKNOWN.to_string(),
            location: UNKNOWN.to_string(),
            size_sqm: UNKNOWN.to_string(),
            listing_url: String::new(),
            agent_hint: None,
            date_hint: None,
        }
    }
}

/// The full record read from an individual listing page
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DetailRecord {
    pub title: String,
    pub price: String,
    pub size_sqm: String,
    pub bedrooms: String,
    pub bathrooms: String,
    pub furnishing_status: String,
    pub location: String,
    pub agent_name: String,
    pub contact: String,
    pub image_links: Vec<String>,
    pub property_description: String,
    pub property_type: PropertyType,
    pub listing_date: String,
    pub price_per_sqm: String,
}

impl Default for DetailRecord {
    fn default() -> Self {
        Self {
            title: UNKNOWN.to_string(),
            price: UNKNOWN.to_string(),
            size_sqm: UNKNOWN.to_string(),
            bedrooms: UNKNOWN.to_string(),
            bathrooms: UNKNOWN.to_string(),
            furnishing_status: UNKNOWN.to_string(),
            location: UNKNOWN.to_string(),
            agent_name: UNKNOWN.to_string(),
            contact: UNKNOWN.to_string(),
            image_links: Vec::new(),
            property_description: UNKNOWN.to_string(),
            property_type: PropertyType::Unknown,
            listing_date: UNKNOWN.to_string(),
            price_per_sqm: UNKNOWN.to_string(),
        }
    }
}

/// A listing summary merged with its detail record, plus provenance
///
/// This is the unit written to every sink.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PropertyRecord {
    pub source: String,
    pub listing_type: String,
    pub listing_url: String,
    pub title: String,
    pub price: String,
    pub description: String,
    pub location: String,
    pub size_sqm: String,
    pub bedrooms: String,
    pub bathrooms: String,
    pub furnishing_status: String,
    pub agent_name: String,
    pub contact: String,
    pub image_links: Vec<String>,
    pub property_description: String,
    pub property_type: PropertyType,
    pub listing_date: String,
    pub price_per_sqm: String,
}

/// Detail value unless it is the sentinel, then the card value
fn prefer_detail(detail: String, card: String) -> String {
    if is_unknown(&detail) {
        card
    } else {
        detail
    }
}

impl PropertyRecord {
    /// Merges a listing card with its detail page
    ///
    /// Detail values override card values for every field both carry; a
    /// detail sentinel falls back to the card. An unknown property type is
    /// classified from the card text. `price_per_sqm` is derived from the
    /// merged price and size.
    pub fn merge(
        summary: ListingSummary,
        detail: DetailRecord,
        source: &str,
        listing_type: &str,
    ) -> Self {
        let price = prefer_detail(detail.price, summary.price);
        let size_sqm = prefer_detail(detail.size_sqm, summary.size_sqm);
        let price_per_sqm = price_per_sqm(&price, &size_sqm);

        let agent_name = match summary.agent_hint {
            Some(hint) => prefer_detail(detail.agent_name, hint),
            None => detail.agent_name,
        };
        let listing_date = match summary.date_hint {
            Some(hint) => prefer_detail(detail.listing_date, hint),
            None => detail.listing_date,
        };
        let property_type = match detail.property_type {
            PropertyType::Unknown => {
                PropertyType::from_text(&format!("{} {}", summary.title, summary.description))
            }
            known => known,
        };

        Self {
            source: source.to_string(),
            listing_type: listing_type.to_string(),
            listing_url: summary.listing_url,
            title: prefer_detail(detail.title, summary.title),
            price,
            description: summary.description,
            location: prefer_detail(detail.location, summary.location),
            size_sqm,
            bedrooms: detail.bedrooms,
            bathrooms: detail.bathrooms,
            furnishing_status: detail.furnishing_status,
            agent_name,
            contact: detail.contact,
            image_links: detail.image_links,
            property_description: detail.property_description,
            property_type,
            listing_date,
            price_per_sqm,
        }
    }

    /// A record for a listing whose detail page could not be used
    pub fn from_summary(summary: ListingSummary, source: &str, listing_type: &str) -> Self {
        Self::merge(summary, DetailRecord::default(), source, listing_type)
    }
}
