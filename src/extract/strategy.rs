//! Ordered field-extraction strategies
//!
//! Each field is read through a [`FieldChain`]: an ordered list of
//! [`Strategy`] values tried in turn. The first strategy that produces a
//! non-empty value wins; an exhausted chain is an extraction gap.

use crate::normalize::normalize_text;
use crate::ConfigError;
use scraper::{ElementRef, Selector};

/// One way of reading a field from a scope element
#[derive(Debug, Clone)]
pub enum Strategy {
    /// Text content of the first descendant matching the selector
    Text(Selector),
    /// Attribute of the first descendant matching the selector that carries it
    Attr(Selector, String),
    /// Attribute of the scope element itself
    OwnAttr(String),
}

impl Strategy {
    fn apply(&self, scope: ElementRef<'_>) -> Option<String> {
        match self {
            Strategy::Text(selector) => scope
                .select(selector)
                .find_map(|element| element_text(element)),
            Strategy::Attr(selector, attr) => scope
                .select(selector)
                .find_map(|element| element.value().attr(attr))
                .and_then(normalize_text),
            Strategy::OwnAttr(attr) => scope.value().attr(attr).and_then(normalize_text),
        }
    }
}

/// Ordered fallbacks for a single field
#[derive(Debug, Clone)]
pub struct FieldChain {
    field: &'static str,
    strategies: Vec<Strategy>,
}

impl FieldChain {
    /// Chain reading element text for each selector, in order
    pub fn text(field: &'static str, selectors: &[String]) -> Result<Self, ConfigError> {
        let strategies = compile_selectors(field, selectors)?
            .into_iter()
            .map(Strategy::Text)
            .collect();
        Ok(Self { field, strategies })
    }

    /// Chain reading `attr` from the first element matching each selector
    pub fn attr(
        field: &'static str,
        selectors: &[String],
        attr: &str,
    ) -> Result<Self, ConfigError> {
        let strategies = compile_selectors(field, selectors)?
            .into_iter()
            .map(|selector| Strategy::Attr(selector, attr.to_string()))
            .collect();
        Ok(Self { field, strategies })
    }

    /// Appends a lower-priority fallback
    pub fn then(mut self, strategy: Strategy) -> Self {
        self.strategies.push(strategy);
        self
    }

    /// First non-empty value produced by the chain within `scope`
    pub fn first_in(&self, scope: ElementRef<'_>) -> Option<String> {
        let found = self.strategies.iter().find_map(|s| s.apply(scope));
        if found.is_none() {
            tracing::trace!(field = self.field, "No strategy matched");
        }
        found
    }
}

/// Compiles selector strings, reporting the first invalid one
pub fn compile_selectors(
    field: &'static str,
    selectors: &[String],
) -> Result<Vec<Selector>, ConfigError> {
    selectors
        .iter()
        .map(|s| compile_selector(field, s))
        .collect()
}

pub fn compile_selector(field: &'static str, selector: &str) -> Result<Selector, ConfigError> {
    Selector::parse(selector).map_err(|_| ConfigError::InvalidSelector {
        field: field.to_string(),
        selector: selector.to_string(),
    })
}

/// Whitespace-collapsed text of an element, `None` when blank
pub fn element_text(element: ElementRef<'_>) -> Option<String> {
    normalize_text(&element.text().collect::<Vec<_>>().join(" "))
}

/// Text of every node under `element` except script/style content
pub fn visible_text(element: ElementRef<'_>) -> String {
    element
        .descendants()
        .filter_map(|node| {
            let text = node.value().as_text()?;
            let parent = node.parent().and_then(ElementRef::wrap)?;
            match parent.value().name() {
                "script" | "style" | "noscript" | "template" => None,
                _ => Some(&**text),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
