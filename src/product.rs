//! Product record produced by the extractors
//!
//! Every extractor returns a partial `Product`; the merge step folds them
//! into the final record handed back to the caller.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Product image. The URL is the identity key when merging.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Image {
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
}

impl Image {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            width: None,
            height: None,
        }
    }

    pub fn with_size(mut self, width: Option<u32>, height: Option<u32>) -> Self {
        self.width = width;
        self.height = height;
        self
    }
}

/// Normalized product record
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Product {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brand: Option<String>,
    /// Always `>= 0` when present
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
    /// Uppercase ISO-4217 code
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub images: Vec<Image>,
    /// Source-specific leftover fields
    #[serde(default)]
    pub metadata: Map<String, Value>,
}

/// A partial product exactly as one extractor produced it.
pub type ExtractionResult = Product;

impl Product {
    /// True when no field carries any data.
    pub fn is_empty(&self) -> bool {
        self.url.is_none()
            && self.name.is_none()
            && self.brand.is_none()
            && self.price.is_none()
            && self.currency.is_none()
            && self.description.is_none()
            && self.images.is_empty()
            && self.metadata.is_empty()
    }

    /// Insert a metadata entry, skipping absent values.
    pub(crate) fn set_meta(&mut self, key: &str, value: Option<impl Into<Value>>) {
        if let Some(v) = value {
            self.metadata.insert(key.to_string(), v.into());
        }
    }
}
