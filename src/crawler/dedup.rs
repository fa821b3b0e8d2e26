use crate::url::SiteScope;
use std::collections::HashSet;

/// Deduplicator verdict for one listing URL
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    /// New and in scope; the URL is now recorded as seen
    Admitted,
    EmptyUrl,
    Duplicate,
    ForeignDomain,
}

/// Per-category set of listing URLs already dispatched
#[derive(Debug, Clone)]
pub struct Deduplicator {
    seen: HashSet<String>,
    scope: SiteScope,
}

impl Deduplicator {
    pub fn new(scope: SiteScope) -> Self {
        Self {
            seen: HashSet::new(),
            scope,
        }
    }

    /// Checks a listing URL and records it when admitted
    ///
    /// Insertion happens here, at dispatch time, so two cards with the same
    /// URL in one batch are never both fetched.
    pub fn admit(&mut self, url: &str) -> Admission {
        if url.trim().is_empty() {
            return Admission::EmptyUrl;
        }
        if self.seen.contains(url) {
            return Admission::Duplicate;
        }
        if !self.scope.contains(url) {
            return Admission::ForeignDomain;
        }

        self.seen.insert(url.to_string());
        Admission::Admitted
    }

    pub fn contains(&self, url: &str) -> bool {
        self.seen.contains(url)
    }

    pub fn len(&self) -> usize {
        self.seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }
}
