use super::strategy::element_text;
use super::Extractor;
use crate::normalize::{extract_size_sqm, normalize_location, parse_listing_price};
use crate::record::{ListingSummary, UNKNOWN};
use crate::url::resolve_listing_href;
use scraper::{ElementRef, Html};
use std::fmt;

/// Why a listing card produced no summary
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// The node has neither text nor an anchor
    EmptyNode,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::EmptyNode => f.write_str("empty node"),
        }
    }
}

impl Extractor {
    pub(super) fn listing_summaries_from(&self, document: &Html) -> Vec<ListingSummary> {
        let Some(items) = self.find_items(document) else {
            tracing::debug!("No listing container with items found");
            return Vec::new();
        };

        let mut summaries = Vec::with_capacity(items.len());
        for (index, item) in items.into_iter().enumerate() {
            match self.extract_item(item) {
                Ok(summary) => summaries.push(summary),
                Err(reason) => {
                    tracing::trace!(index, %reason, "Skipping listing card");
                }
            }
        }
        summaries
    }

    /// Item nodes of the first container/item selector pair that yields any
    fn find_items<'a>(&self, document: &'a Html) -> Option<Vec<ElementRef<'a>>> {
        for container_selector in &self.listing.container {
            let Some(container) = document.select(container_selector).next() else {
                continue;
            };

            for item_selector in &self.listing.item {
                let items: Vec<_> = container.select(item_selector).collect();
                if !items.is_empty() {
                    return Some(items);
                }
            }
        }
        None
    }

    /// Reads one card; every field is independent and defaults to the sentinel
    pub(super) fn extract_item(&self, item: ElementRef<'_>) -> Result<ListingSummary, SkipReason> {
        let fields = &self.listing;

        let listing_url = fields
            .link
            .first_in(item)
            .map(|href| resolve_listing_href(&href, self.scope.root()))
            .unwrap_or_default();

        let Some(item_text) = element_text(item) else {
            if listing_url.is_empty() {
                return Err(SkipReason::EmptyNode);
            }
            return Ok(ListingSummary {
                listing_url,
                ..ListingSummary::default()
            });
        };

        let title = fields.title.first_in(item);
        let price = fields.price.first_in(item);
        let size_sqm = fields
            .size
            .first_in(item)
            .and_then(|text| extract_size_sqm(&text))
            .or_else(|| extract_size_sqm(&item_text));

        Ok(ListingSummary {
            title: title.unwrap_or_else(|| UNKNOWN.to_string()),
            price: price
                .map(|raw| parse_listing_price(&raw))
                .unwrap_or_else(|| UNKNOWN.to_string()),
            description: fields
                .description
                .first_in(item)
                .unwrap_or_else(|| UNKNOWN.to_string()),
            location: fields
                .location
                .first_in(item)
                .and_then(|raw| normalize_location(&raw))
                .unwrap_or_else(|| UNKNOWN.to_string()),
            size_sqm: size_sqm.unwrap_or_else(|| UNKNOWN.to_string()),
            listing_url,
            agent_hint: fields.agent.first_in(item),
            date_hint: fields.date.first_in(item),
        })
    }
}
