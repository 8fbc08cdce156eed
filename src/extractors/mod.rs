//! Product extractors
//!
//! Each module reads one kind of markup and returns a partial [`Product`].
//! Extractors never fail: markup they cannot use simply leaves fields absent.

mod jsonld_extractor;
mod microdata_extractor;
mod opengraph_extractor;
mod site_extractor;

pub use jsonld_extractor::*;
pub use microdata_extractor::*;
pub use opengraph_extractor::*;
pub use site_extractor::*;

use scraper::Html;
use serde_json::Value;

use crate::normalize::normalize_text;
use crate::product::Product;

/// The parsed page shared read-only by every extractor in one call.
pub struct Page<'a> {
    pub document: &'a Html,
    /// Hostname of the page URL, used to absolutize relative links
    pub hostname: &'a str,
}

/// One extraction strategy.
pub trait Extractor {
    fn name(&self) -> &'static str;

    fn extract(&self, page: &Page) -> Product;
}

/// Brand name from a string, a `{ "name": ... }` object, or an array of either.
pub(crate) fn brand_name(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => normalize_text(s),
        Value::Object(obj) => obj.get("name").and_then(brand_name),
        Value::Array(items) => items.iter().find_map(brand_name),
        _ => None,
    }
}

/// First string in a value that may be a string, a JSON-LD `{"@value": ...}`
/// literal, or an array of either.
pub(crate) fn first_str(value: &Value) -> Option<&str> {
    match value {
        Value::String(s) => Some(s),
        Value::Object(obj) => obj.get("@value").and_then(first_str),
        Value::Array(items) => items.iter().find_map(first_str),
        _ => None,
    }
}
