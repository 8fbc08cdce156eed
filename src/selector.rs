//! Ordered CSS selector rules
//!
//! Every DOM-based extractor describes a field as a list of rules and takes
//! the first one that yields a non-empty value.

use scraper::{ElementRef, Html, Selector};
use serde::{Deserialize, Serialize};

/// Attribute candidates for a rule: a single name or an ordered list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Attribute {
    One(String),
    Many(Vec<String>),
}

impl Attribute {
    pub fn names(&self) -> &[String] {
        match self {
            Attribute::One(name) => std::slice::from_ref(name),
            Attribute::Many(names) => names,
        }
    }
}

/// One `{ selector, attribute? }` entry. Without an attribute the element's
/// text content is used.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectorRule {
    pub selector: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attribute: Option<Attribute>,
}

impl SelectorRule {
    pub fn text(selector: &str) -> Self {
        Self {
            selector: selector.to_string(),
            attribute: None,
        }
    }

    pub fn attr(selector: &str, attribute: &str) -> Self {
        Self {
            selector: selector.to_string(),
            attribute: Some(Attribute::One(attribute.to_string())),
        }
    }

    pub fn attrs(selector: &str, attributes: &[&str]) -> Self {
        Self {
            selector: selector.to_string(),
            attribute: Some(Attribute::Many(
                attributes.iter().map(|a| a.to_string()).collect(),
            )),
        }
    }

    fn read(&self, element: &ElementRef) -> Option<String> {
        match &self.attribute {
            Some(attribute) => attribute
                .names()
                .iter()
                .filter_map(|name| element.value().attr(name))
                .map(str::trim)
                .find(|v| !v.is_empty())
                .map(String::from),
            None => {
                let text = element.text().collect::<String>();
                let trimmed = text.trim();
                (!trimmed.is_empty()).then(|| trimmed.to_string())
            }
        }
    }
}

/// Return the first non-empty, trimmed value produced by `rules`, in order.
///
/// A rule whose selector matches nothing (or does not parse) is skipped.
/// Matched elements are tried in document order.
pub fn find_by_selectors(document: &Html, rules: &[SelectorRule]) -> Option<String> {
    rules.iter().find_map(|rule| {
        let selector = parse_selector(&rule.selector)?;
        document
            .select(&selector)
            .find_map(|element| rule.read(&element))
    })
}

/// Parse a selector, logging and returning `None` when it is invalid.
pub(crate) fn parse_selector(selector: &str) -> Option<Selector> {
    match Selector::parse(selector) {
        Ok(s) => Some(s),
        Err(e) => {
            log::warn!("Skipping invalid CSS selector '{}': {}", selector, e);
            None
        }
    }
}
