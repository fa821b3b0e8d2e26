//! URL handling module for Estate-Harvest
//!
//! This module provides domain extraction, wildcard matching, listing href
//! resolution and the site scope used to reject listings hosted elsewhere.

mod domain;
mod resolve;

use crate::config::SiteConfig;
use crate::ConfigError;
use url::Url;

// Re-export main functions
pub use domain::{extract_domain, matches_wildcard, strip_www};
pub use resolve::{normalize_image_src, resolve_listing_href};

/// The set of domains a listing URL may belong to
///
/// The root URL's own domain is always in scope (with or without `www.`),
/// plus any configured wildcard patterns.
#[derive(Debug, Clone)]
pub struct SiteScope {
    root: Url,
    root_domain: String,
    patterns: Vec<String>,
}

impl SiteScope {
    /// Builds the scope from the site configuration
    pub fn from_site(site: &SiteConfig) -> Result<Self, ConfigError> {
        let root = Url::parse(&site.root_url)
            .map_err(|e| ConfigError::InvalidUrl(format!("{}: {}", site.root_url, e)))?;
        Self::new(root, site.allowed_domains.clone())
    }

    pub fn new(root: Url, patterns: Vec<String>) -> Result<Self, ConfigError> {
        let root_domain = extract_domain(&root)
            .ok_or_else(|| ConfigError::InvalidUrl(format!("{} has no host", root)))?;

        Ok(Self {
            root_domain: strip_www(&root_domain).to_string(),
            root,
            patterns: patterns.iter().map(|p| p.to_lowercase()).collect(),
        })
    }

    /// The site root used for resolving relative links
    pub fn root(&self) -> &Url {
        &self.root
    }

    /// Returns true if `url` parses and its host belongs to the site
    pub fn contains(&self, url: &str) -> bool {
        let Ok(parsed) = Url::parse(url) else {
            return false;
        };
        let Some(domain) = extract_domain(&parsed) else {
            return false;
        };

        if strip_www(&domain) == self.root_domain {
            return true;
        }

        self.patterns
            .iter()
            .any(|pattern| matches_wildcard(pattern, &domain))
    }
}
