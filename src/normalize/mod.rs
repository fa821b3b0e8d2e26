//! Value normalization helpers
//!
//! Pure conversions from raw extracted strings into typed or canonical
//! values. None of these functions fail: unparseable input degrades to
//! `None`, a sentinel, or the original text.

mod dates;
mod phone;
mod price;

pub use dates::{find_relative_date, normalize_update_info, UpdateValue};
pub use phone::normalize_phone;
pub use price::{clean_price, extract_size_sqm, parse_listing_price, price_per_sqm};

use regex::Regex;
use std::collections::BTreeMap;
use std::sync::LazyLock;

static FIRST_INTEGER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d+").expect("valid integer pattern"));

static FEATURE_PAIR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+)\s*([A-Za-z]+)").expect("valid feature pattern"));

/// Collapses runs of whitespace and trims; empty input yields `None`
///
/// `"  Spacious 4 Bedroom  "` becomes `"Spacious 4 Bedroom"`.
pub fn normalize_text(text: &str) -> Option<String> {
    let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.is_empty() {
        None
    } else {
        Some(collapsed)
    }
}

/// Trims and title-cases a location: `"lekki phase 1, lagos"` becomes
/// `"Lekki Phase 1, Lagos"`
pub fn normalize_location(location: &str) -> Option<String> {
    normalize_text(location).map(|s| title_case(&s))
}

/// Uppercases every letter that follows a non-letter, lowercases the rest
pub fn title_case(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut previous_is_letter = false;
    for c in text.chars() {
        if c.is_alphabetic() {
            if previous_is_letter {
                out.extend(c.to_lowercase());
            } else {
                out.extend(c.to_uppercase());
            }
            previous_is_letter = true;
        } else {
            out.push(c);
            previous_is_letter = false;
        }
    }
    out
}

/// First integer in a bedroom/bathroom string: `"3 Bedrooms"` is `Some(3)`
pub fn parse_count(text: &str) -> Option<u32> {
    FIRST_INTEGER
        .find(text)
        .and_then(|m| m.as_str().parse().ok())
}

/// Maps a compound feature string to canonical feature counts
///
/// `"3 Beds 4 Baths 5 flats 7 kitchen"` yields
/// `{bathrooms: 4, bedrooms: 3, flats: 5, kitchens: 7}`. Unrecognized words
/// are kept under their singular lowercase form.
pub fn normalize_property_features(text: &str) -> BTreeMap<String, u32> {
    let mut features = BTreeMap::new();

    for caps in FEATURE_PAIR.captures_iter(text) {
        let Ok(count) = caps[1].parse::<u32>() else {
            continue;
        };
        let word = caps[2].to_lowercase();
        let key = word.trim_end_matches('s');
        let canonical = match key {
            "bed" => "bedrooms",
            "bath" => "bathrooms",
            "flat" => "flats",
            "kitchen" => "kitchens",
            other => other,
        };
        features.insert(canonical.to_string(), count);
    }

    features
}
