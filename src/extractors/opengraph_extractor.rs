//! OpenGraph / Twitter Card meta tag product extraction
//!
//! Falls back through og:*, twitter:* and plain <title>/<meta> tags for each
//! field. The canonical URL and favicon end up in metadata.

use std::sync::LazyLock;

use scraper::Html;

use super::{Extractor, Page};
use crate::normalize::{
    normalize_text, parse_currency, parse_num_str, parse_price_str, parse_url,
};
use crate::product::{Image, Product};
use crate::selector::{find_by_selectors, SelectorRule};

static TITLE: LazyLock<Vec<SelectorRule>> = LazyLock::new(|| {
    vec![
        SelectorRule::attr(r#"meta[property="og:title"]"#, "content"),
        SelectorRule::attr(r#"meta[name="twitter:title"]"#, "content"),
        SelectorRule::text("title"),
    ]
});

static DESCRIPTION: LazyLock<Vec<SelectorRule>> = LazyLock::new(|| {
    vec![
        SelectorRule::attr(r#"meta[property="og:description"]"#, "content"),
        SelectorRule::attr(r#"meta[name="twitter:description"]"#, "content"),
        SelectorRule::attr(r#"meta[property="description"]"#, "content"),
        SelectorRule::attr(r#"meta[name="description"]"#, "content"),
    ]
});

static IMAGE: LazyLock<Vec<SelectorRule>> = LazyLock::new(|| {
    vec![
        SelectorRule::attr(r#"meta[property="og:image:secure_url"]"#, "content"),
        SelectorRule::attr(r#"meta[property="og:image:url"]"#, "content"),
        SelectorRule::attr(r#"meta[property="og:image"]"#, "content"),
        SelectorRule::attr(r#"meta[name="twitter:image"]"#, "content"),
        SelectorRule::attr(r#"meta[property="twitter:image"]"#, "content"),
    ]
});

static IMAGE_WIDTH: LazyLock<Vec<SelectorRule>> = LazyLock::new(|| {
    vec![SelectorRule::attr(r#"meta[property="og:image:width"]"#, "content")]
});

static IMAGE_HEIGHT: LazyLock<Vec<SelectorRule>> = LazyLock::new(|| {
    vec![SelectorRule::attr(r#"meta[property="og:image:height"]"#, "content")]
});

static PRICE: LazyLock<Vec<SelectorRule>> = LazyLock::new(|| {
    vec![
        SelectorRule::attr(r#"meta[property="product:price:amount"]"#, "content"),
        SelectorRule::attr(r#"meta[property="product:sale_price:amount"]"#, "content"),
        SelectorRule::attr(r#"meta[property="og:product:price:amount"]"#, "content"),
        SelectorRule::attr(r#"meta[property="og:price:amount"]"#, "content"),
    ]
});

static CURRENCY: LazyLock<Vec<SelectorRule>> = LazyLock::new(|| {
    vec![
        SelectorRule::attr(r#"meta[property="product:price:currency"]"#, "content"),
        SelectorRule::attr(r#"meta[property="product:sale_price:currency"]"#, "content"),
        SelectorRule::attr(r#"meta[property="og:price:currency"]"#, "content"),
    ]
});

static CANONICAL_URL: LazyLock<Vec<SelectorRule>> = LazyLock::new(|| {
    vec![
        SelectorRule::attr(r#"meta[property="og:url"]"#, "content"),
        SelectorRule::attr(r#"link[rel="canonical"]"#, "href"),
    ]
});

static BRAND: LazyLock<Vec<SelectorRule>> = LazyLock::new(|| {
    vec![
        SelectorRule::attr(r#"meta[property="og:brand"]"#, "content"),
        SelectorRule::attr(r#"meta[property="product:brand"]"#, "content"),
    ]
});

static FAVICON: LazyLock<Vec<SelectorRule>> = LazyLock::new(|| {
    vec![
        SelectorRule::attr(r#"link[rel*="icon"]"#, "href"),
        SelectorRule::attr(r#"meta[name*="msapplication"]"#, "content"),
    ]
});

pub struct OpenGraphExtractor;

impl Extractor for OpenGraphExtractor {
    fn name(&self) -> &'static str {
        "opengraph"
    }

    fn extract(&self, page: &Page) -> Product {
        extract_opengraph(page.document, page.hostname)
    }
}

/// Extract a product from OpenGraph, Twitter Card and generic meta tags.
pub fn extract_opengraph(document: &Html, hostname: &str) -> Product {
    let find = |rules: &[SelectorRule]| find_by_selectors(document, rules);
    let dimension = |rules: &[SelectorRule]| {
        find(rules)
            .and_then(|v| parse_num_str(&v, '.'))
            .filter(|n| *n >= 0.0 && *n <= f64::from(u32::MAX))
            .map(|n| n.round() as u32)
    };

    let image = find(IMAGE.as_slice())
        .and_then(|v| parse_url(&v, hostname))
        .map(|url| {
            Image::new(url).with_size(
                dimension(IMAGE_WIDTH.as_slice()),
                dimension(IMAGE_HEIGHT.as_slice()),
            )
        });

    let mut product = Product {
        name: find(TITLE.as_slice()).and_then(|v| normalize_text(&v)),
        brand: find(BRAND.as_slice()).and_then(|v| normalize_text(&v)),
        price: find(PRICE.as_slice()).and_then(|v| parse_price_str(&v, '.')),
        currency: find(CURRENCY.as_slice()).and_then(|v| parse_currency(&v)),
        description: find(DESCRIPTION.as_slice()),
        images: image.into_iter().collect(),
        ..Default::default()
    };

    product.set_meta(
        "url",
        find(CANONICAL_URL.as_slice()).and_then(|v| parse_url(&v, hostname)),
    );
    product.set_meta(
        "favicon",
        find(FAVICON.as_slice()).and_then(|v| parse_url(&v, hostname)),
    );

    product
}
