use crate::record::{NEGOTIABLE, UNKNOWN};
use regex::Regex;
use std::sync::LazyLock;

/// Whole words that mean the price is withheld
static NEGOTIABLE_MARKER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:negotiable|call|ask|p\.o\.a)\b").expect("valid negotiable pattern")
});

static PRICE_AMOUNT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(\d+(?:\.\d+)?)\s*(k|m|b|bn|thousand|million|billion)?\b")
        .expect("valid price pattern")
});

static AREA: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(\d[\d,]*(?:\.\d+)?)\s*(?:sqm|sq\.?\s?m\b|m²)").expect("valid area pattern")
});

/// Cleans a displayed price into a digit string or [`NEGOTIABLE`]
///
/// Currency symbols and thousands separators are dropped. A k/m/b suffix
/// scales the amount before it is re-stringified.
///
/// ```
/// use estate_harvest::normalize::parse_listing_price;
///
/// assert_eq!(parse_listing_price("₦2,500,000"), "2500000");
/// assert_eq!(parse_listing_price("1.5m"), "1500000");
/// assert_eq!(parse_listing_price("Call for price"), "Negotiable");
/// ```
pub fn parse_listing_price(raw: &str) -> String {
    if NEGOTIABLE_MARKER.is_match(raw) {
        return NEGOTIABLE.to_string();
    }

    let cleaned = raw.to_lowercase().replace(',', "");
    let Some(caps) = PRICE_AMOUNT.captures(&cleaned) else {
        return NEGOTIABLE.to_string();
    };

    let amount = &caps[1];
    let multiplier = match caps.get(2).map(|m| m.as_str()) {
        Some("k") | Some("thousand") => 1e3,
        Some("m") | Some("million") => 1e6,
        Some("b") | Some("bn") | Some("billion") => 1e9,
        _ => {
            let whole = amount.split('.').next().unwrap_or(amount);
            return whole.to_string();
        }
    };

    match amount.parse::<f64>() {
        Ok(value) => format!("{}", (value * multiplier).round() as u64),
        Err(_) => NEGOTIABLE.to_string(),
    }
}

/// Currency string to number: every character but digits and `.` is dropped
///
/// `"₦2,500,000"` is `Some(2500000.0)`; text without a parseable number is `None`.
pub fn clean_price(price: &str) -> Option<f64> {
    let numeric: String = price
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.')
        .collect();
    numeric.parse().ok()
}

/// Finds a quantity directly followed by an area unit anywhere in `text`
pub fn extract_size_sqm(text: &str) -> Option<String> {
    AREA.captures(text).map(|caps| caps[1].replace(',', ""))
}

fn is_digit_string(value: &str) -> bool {
    !value.is_empty() && value.chars().all(|c| c.is_ascii_digit())
}

/// Derives price per square metre, rounded to two decimals
///
/// Both inputs must be pure digit strings; anything else (including a zero
/// size) yields [`UNKNOWN`].
pub fn price_per_sqm(price: &str, size: &str) -> String {
    if !is_digit_string(price) || !is_digit_string(size) {
        return UNKNOWN.to_string();
    }

    let (Ok(price), Ok(size)) = (price.parse::<f64>(), size.parse::<f64>()) else {
        return UNKNOWN.to_string();
    };
    if size == 0.0 {
        return UNKNOWN.to_string();
    }

    let value = (price / size * 100.0).round() / 100.0;
    if value.fract() == 0.0 {
        format!("{:.1}", value)
    } else {
        format!("{}", value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_price_strips_currency_and_separators() {
        assert_eq!(parse_listing_price("₦2,500,000"), "2500000");
        assert_eq!(parse_listing_price("NGN 750,000 / year"), "750000");
    }

    #[test]
    fn test_price_negotiable_markers() {
        assert_eq!(parse_listing_price("Call for price"), NEGOTIABLE);
        assert_eq!(parse_listing_price("Price is NEGOTIABLE"), NEGOTIABLE);
        assert_eq!(parse_listing_price("Ask seller"), NEGOTIABLE);
        assert_eq!(parse_listing_price("P.O.A"), NEGOTIABLE);
    }

    #[test]
    fn test_price_markers_inside_words_ignored() {
        assert_eq!(parse_listing_price("₦ 45,000,000 Basket"), "45000000");
        assert_eq!(parse_listing_price("Recall ₦ 2,000,000"), "2000000");
        assert_eq!(parse_listing_price("Tasked at 3m"), "3000000");
    }

    #[test]
    fn test_price_without_digits_is_negotiable() {
        assert_eq!(parse_listing_price("₦ --"), NEGOTIABLE);
    }

    #[test]
    fn test_price_suffix_multipliers() {
        assert_eq!(parse_listing_price("1.5m"), "1500000");
        assert_eq!(parse_listing_price("₦ 850K"), "850000");
        assert_eq!(parse_listing_price("₦2.25B"), "2250000000");
        assert_eq!(parse_listing_price("3 million"), "3000000");
    }

    #[test]
    fn test_clean_price() {
        assert_eq!(clean_price("₦2,500,000"), Some(2_500_000.0));
        assert_eq!(clean_price("Negotiable"), None);
        assert_eq!(clean_price(""), None);
    }

    #[test]
    fn test_extract_size_inline() {
        assert_eq!(
            extract_size_sqm("Detached duplex, 450 sqm, C of O"),
            Some("450".to_string())
        );
        assert_eq!(extract_size_sqm("Plot: 1,200 m²"), Some("1200".to_string()));
        assert_eq!(extract_size_sqm("600 SQM land"), Some("600".to_string()));
        assert_eq!(extract_size_sqm("4 bedrooms"), None);
    }

    #[test]
    fn test_price_per_sqm() {
        assert_eq!(price_per_sqm("5000000", "250"), "20000.0");
        assert_eq!(price_per_sqm("1000", "3"), "333.33");
        assert_eq!(price_per_sqm("5000000", UNKNOWN), UNKNOWN);
        assert_eq!(price_per_sqm(NEGOTIABLE, "250"), UNKNOWN);
        assert_eq!(price_per_sqm("5000000", "0"), UNKNOWN);
    }
}
