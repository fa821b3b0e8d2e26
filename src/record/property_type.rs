use regex::Regex;
use serde::{Serialize, Serializer};
use std::fmt;
use std::sync::LazyLock;

/// Enumerated property category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PropertyType {
    Duplex,
    Bungalow,
    MiniFlat,
    Flat,
    Apartment,
    SelfContain,
    Land,
    Mansion,
    Terrace,
    Unknown,
}

/// Keyword table in match order; "mini flat" precedes "flat"
static KEYWORDS: LazyLock<Vec<(Regex, PropertyType)>> = LazyLock::new(|| {
    [
        ("duplex", PropertyType::Duplex),
        ("bungalow", PropertyType::Bungalow),
        (r"mini[\s-]?flat", PropertyType::MiniFlat),
        ("flat", PropertyType::Flat),
        ("apartment", PropertyType::Apartment),
        (r"self[\s-]?contain(?:ed)?", PropertyType::SelfContain),
        ("land", PropertyType::Land),
        ("mansion", PropertyType::Mansion),
        ("terrace", PropertyType::Terrace),
    ]
    .into_iter()
    .filter_map(|(pattern, kind)| {
        Regex::new(&format!(r"(?i)\b{}s?\b", pattern))
            .ok()
            .map(|re| (re, kind))
    })
    .collect()
});

impl PropertyType {
    /// First keyword (in table order) found as a whole word in `text`
    pub fn from_text(text: &str) -> Self {
        KEYWORDS
            .iter()
            .find(|(re, _)| re.is_match(text))
            .map(|(_, kind)| *kind)
            .unwrap_or(PropertyType::Unknown)
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Duplex => "Duplex",
            Self::Bungalow => "Bungalow",
            Self::MiniFlat => "Mini Flat",
            Self::Flat => "Flat",
            Self::Apartment => "Apartment",
            Self::SelfContain => "Self Contain",
            Self::Land => "Land",
            Self::Mansion => "Mansion",
            Self::Terrace => "Terrace",
            Self::Unknown => "Unknown",
        }
    }
}

impl fmt::Display for PropertyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl Serialize for PropertyType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.label())
    }
}
