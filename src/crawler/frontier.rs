//! Page sequence and pagination termination for one category

use crate::config::CategoryConfig;
use crate::record::PageRequest;
use std::fmt;

/// Why a category crawl stopped paginating
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// The accumulated record count reached the category target
    TargetReached,
    /// A listing page yielded no items (or could not be fetched)
    NoItems { page: u32 },
    /// A listing page yielded fewer items than a full page carries
    ShortPage { page: u32, items: usize },
    /// The configured page cap was reached
    PageLimit { pages: u32 },
}

impl StopReason {
    /// True when the site ran out of listings, as opposed to a configured limit
    pub fn is_exhaustion(&self) -> bool {
        matches!(self, StopReason::NoItems { .. } | StopReason::ShortPage { .. })
    }
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StopReason::TargetReached => f.write_str("target reached"),
            StopReason::NoItems { page } => write!(f, "page {} had no listings", page),
            StopReason::ShortPage { page, items } => {
                write!(f, "page {} had only {} listings", page, items)
            }
            StopReason::PageLimit { pages } => write!(f, "page limit of {} reached", pages),
        }
    }
}

/// Emits `base?page=<n>` requests from page 1 and decides when to stop
#[derive(Debug, Clone)]
pub struct Frontier {
    base: String,
    next_page: u32,
    max_pages: Option<u32>,
    min_items_per_page: usize,
    stopped: Option<StopReason>,
}

impl Frontier {
    pub fn new(base: impl Into<String>, min_items_per_page: usize, max_pages: Option<u32>) -> Self {
        Self {
            base: base.into(),
            next_page: 1,
            max_pages,
            min_items_per_page,
            stopped: None,
        }
    }

    pub fn for_category(category: &CategoryConfig, min_items_per_page: usize) -> Self {
        Self::new(category.url.clone(), min_items_per_page, category.max_pages)
    }

    /// URL of page `page` under `base`
    ///
    /// ```
    /// use estate_harvest::crawler::Frontier;
    ///
    /// assert_eq!(
    ///     Frontier::page_url("https://jiji.ng/houses-apartments-for-sale", 3),
    ///     "https://jiji.ng/houses-apartments-for-sale?page=3"
    /// );
    /// assert_eq!(
    ///     Frontier::page_url("https://example.com/search?type=rent", 2),
    ///     "https://example.com/search?type=rent&page=2"
    /// );
    /// ```
    pub fn page_url(base: &str, page: u32) -> String {
        let separator = if base.contains('?') { '&' } else { '?' };
        format!("{}{}page={}", base, separator, page)
    }

    /// The next page to request, or `None` once pagination has stopped
    pub fn next_request(&mut self) -> Option<PageRequest> {
        if self.stopped.is_some() {
            return None;
        }

        if let Some(max) = self.max_pages {
            if self.next_page > max {
                self.stopped = Some(StopReason::PageLimit { pages: max });
                return None;
            }
        }

        let page_index = self.next_page;
        self.next_page += 1;
        Some(PageRequest {
            url: Self::page_url(&self.base, page_index),
            page_index,
        })
    }

    /// Applies the termination policy after a page has been processed
    ///
    /// # Arguments
    ///
    /// * `page` - Index of the page just processed
    /// * `items` - Listing items the page yielded
    /// * `accumulated` - Records collected so far
    /// * `target` - Records wanted for the category
    ///
    /// # Returns
    ///
    /// The stop reason once pagination should end; later calls to
    /// [`next_request`](Self::next_request) return `None`.
    pub fn observe(
        &mut self,
        page: u32,
        items: usize,
        accumulated: usize,
        target: usize,
    ) -> Option<StopReason> {
        let stop = if accumulated >= target {
            Some(StopReason::TargetReached)
        } else if items == 0 {
            Some(StopReason::NoItems { page })
        } else if items < self.min_items_per_page {
            Some(StopReason::ShortPage { page, items })
        } else {
            None
        };

        if stop.is_some() {
            self.stopped = stop;
        }
        stop
    }

    /// The recorded stop reason, if pagination has ended
    pub fn stop_reason(&self) -> Option<StopReason> {
        self.stopped
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASE: &str = "https://jiji.ng/houses-apartments-for-sale";

    #[test]
    fn test_pages_increment_from_one() {
        let mut frontier = Frontier::new(BASE, 5, None);

        let first = frontier.next_request().unwrap();
        assert_eq!(first.page_index, 1);
        assert_eq!(first.url, format!("{}?page=1", BASE));

        frontier.observe(1, 20, 20, 100);
        let second = frontier.next_request().unwrap();
        assert_eq!(second.page_index, 2);
        assert_eq!(second.url, format!("{}?page=2", BASE));
    }

    #[test]
    fn test_zero_items_stops() {
        let mut frontier = Frontier::new(BASE, 5, None);
        frontier.next_request();

        assert_eq!(
            frontier.observe(1, 0, 0, 100),
            Some(StopReason::NoItems { page: 1 })
        );
        assert!(frontier.next_request().is_none());
        assert_eq!(frontier.stop_reason(), Some(StopReason::NoItems { page: 1 }));
    }

    #[test]
    fn test_short_page_stops() {
        let mut frontier = Frontier::new(BASE, 5, None);
        frontier.next_request();

        let stop = frontier.observe(1, 3, 3, 100);
        assert_eq!(stop, Some(StopReason::ShortPage { page: 1, items: 3 }));
        assert!(stop.unwrap().is_exhaustion());
        assert!(frontier.next_request().is_none());
    }

    #[test]
    fn test_target_reached_stops() {
        let mut frontier = Frontier::new(BASE, 5, None);
        frontier.next_request();

        let stop = frontier.observe(1, 20, 20, 20);
        assert_eq!(stop, Some(StopReason::TargetReached));
        assert!(!stop.unwrap().is_exhaustion());
    }

    #[test]
    fn test_page_limit() {
        let mut frontier = Frontier::new(BASE, 1, Some(2));

        assert!(frontier.next_request().is_some());
        frontier.observe(1, 10, 10, 100);
        assert!(frontier.next_request().is_some());
        frontier.observe(2, 10, 20, 100);

        assert!(frontier.next_request().is_none());
        assert_eq!(
            frontier.stop_reason(),
            Some(StopReason::PageLimit { pages: 2 })
        );
    }
}
