//! Phone number recovery from embedded page state
//!
//! Listing pages often leave the phone number out of the visible markup and
//! ship it inside inline client-side state instead, so the raw body is
//! searched before the parsed tree.

use crate::extract::strategy::FieldChain;
use crate::normalize::normalize_phone;
use crate::record::UNKNOWN;
use crate::ConfigError;
use regex::Regex;
use scraper::{ElementRef, Html};

/// State keys known to carry the seller's number, in priority order
const STATE_KEYS: &[&str] = &[
    "phone",
    "phoneNumber",
    "phone_number",
    "sellerPhone",
    "user_phone",
    "mobile",
];

#[derive(Debug, Clone)]
pub struct ContactExtractor {
    embedded: Vec<Regex>,
    tel_link: FieldChain,
    country_code: String,
}

impl ContactExtractor {
    pub fn new(country_code: &str) -> Result<Self, ConfigError> {
        let embedded = STATE_KEYS
            .iter()
            .map(|key| {
                let pattern = format!(
                    r#"(?i)["']?\b{key}["']?\s*[:=]\s*["']?(\+?{cc}\d{{10}}|0\d{{10}})\b"#,
                    key = key,
                    cc = country_code
                );
                Regex::new(&pattern).map_err(|e| {
                    ConfigError::Validation(format!("contact pattern for '{}': {}", key, e))
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let tel_link = FieldChain::attr("contact", &["a[href^='tel:']".to_string()], "href")?;

        Ok(Self {
            embedded,
            tel_link,
            country_code: country_code.to_string(),
        })
    }

    /// Canonical phone number from a raw page body, or [`UNKNOWN`]
    pub fn extract(&self, raw_body: &str) -> String {
        let document = Html::parse_document(raw_body);
        self.extract_with_tree(raw_body, document.root_element())
    }

    /// Same as [`extract`](Self::extract) for a body that is already parsed
    pub fn extract_with_tree(&self, raw_body: &str, root: ElementRef<'_>) -> String {
        self.from_embedded_state(raw_body)
            .or_else(|| self.from_tel_link(root))
            .unwrap_or_else(|| UNKNOWN.to_string())
    }

    fn from_embedded_state(&self, raw_body: &str) -> Option<String> {
        self.embedded.iter().find_map(|pattern| {
            let caps = pattern.captures(raw_body)?;
            normalize_phone(&caps[1], &self.country_code)
        })
    }

    fn from_tel_link(&self, root: ElementRef<'_>) -> Option<String> {
        let href = self.tel_link.first_in(root)?;
        normalize_phone(href.trim_start_matches("tel:"), &self.country_code)
    }
}
