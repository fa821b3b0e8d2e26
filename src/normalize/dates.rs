use chrono::NaiveDate;
use regex::Regex;
use std::collections::BTreeMap;
use std::sync::LazyLock;

static RELATIVE_TIME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(?:\d+|an?)\s+(?:second|sec|minute|min|hour|hr|day|week|month|year)s?\s+ago\b|\bjust now\b|\byesterday\b",
    )
    .expect("valid relative time pattern")
});

/// A labelled date from an "Updated X, Added Y" line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateValue {
    Date(NaiveDate),
    /// The text as found, when it is not a `%d %b %Y` date
    Text(String),
}

/// First relative-time phrase in `text` ("3 days ago", "just now", "yesterday")
pub fn find_relative_date(text: &str) -> Option<String> {
    RELATIVE_TIME.find(text).map(|m| m.as_str().to_string())
}

/// Splits `"Updated 02 Nov 2025, Added 25 Jun 2025"` into labelled dates
///
/// Labels are lowercased with colons removed. Values that do not parse as
/// `02 Nov 2025` are kept verbatim as [`UpdateValue::Text`].
pub fn normalize_update_info(text: &str) -> BTreeMap<String, UpdateValue> {
    let mut data = BTreeMap::new();

    for part in text.split(',') {
        let part = part.trim();
        if part.is_empty() {
            continue;
        }

        let (key, value) = part.split_once(char::is_whitespace).unwrap_or((part, ""));
        let label = key.to_lowercase().replace(':', "");
        let value = value.trim();

        let parsed = match NaiveDate::parse_from_str(value, "%d %b %Y") {
            Ok(date) => UpdateValue::Date(date),
            Err(_) => UpdateValue::Text(value.to_string()),
        };
        data.insert(label, parsed);
    }

    data
}
