//! Product extraction for e-commerce pages
//!
//! Reads a normalized product record out of raw page HTML by combining:
//! - JSON-LD (with @graph support)
//! - Microdata (schema.org)
//! - OpenGraph / Twitter Card meta tags
//! - Per-site CSS selector tables (Amazon built in)
//!
//! Results are merged by precedence in that order. Use [`get_product`] for
//! the built-in tables or [`ProductScraper`] to register your own. A C ABI
//! is exposed in [`ffi`].

pub mod currency;
pub mod error;
pub mod extractors;
pub mod ffi;
pub mod json_repair;
pub mod merge;
pub mod normalize;
pub mod pipeline;
pub mod product;
pub mod selector;
pub mod sites;

pub use error::ProductError;
pub use merge::merge_products;
pub use pipeline::{get_product, ProductScraper};
pub use product::{ExtractionResult, Image, Product};
pub use selector::{find_by_selectors, Attribute, SelectorRule};
pub use sites::SiteSelectors;
