//! JSON-LD product extraction
//!
//! Reads every <script type="application/ld+json"> block, repairing broken
//! JSON on the way. Supports @graph arrays and top-level arrays; each block
//! contributes its first product-like node. Nodes from later blocks sharing
//! the @id are merged; a node with a different @id is ignored.

use scraper::Html;
use serde_json::{Map, Value};

use super::{brand_name, first_str, Extractor, Page};
use crate::json_repair::parse_json;
use crate::normalize::{
    normalize_text, parse_currency_value, parse_dimension, parse_price, parse_url,
    parse_url_value,
};
use crate::product::{Image, Product};
use crate::selector::parse_selector;

const JSONLD_SELECTOR: &str = r#"script[type="application/ld+json"]"#;

/// `@type` values (case-insensitive substrings) treated as a product.
const PRODUCT_TYPES: [&str; 4] = ["PRODUCT", "CAR", "HOTEL", "BOOK"];

pub struct JsonLdExtractor;

impl Extractor for JsonLdExtractor {
    fn name(&self) -> &'static str {
        "jsonld"
    }

    fn extract(&self, page: &Page) -> Product {
        extract_jsonld(page.document, page.hostname)
    }
}

/// Extract a product from the JSON-LD blocks of `document`.
pub fn extract_jsonld(document: &Html, hostname: &str) -> Product {
    let Some(selector) = parse_selector(JSONLD_SELECTOR) else {
        return Product::default();
    };

    let mut node: Map<String, Value> = Map::new();

    for element in document.select(&selector) {
        let content = element.text().collect::<String>();
        if content.trim().is_empty() {
            continue;
        }

        let Some(json) = parse_json(&content) else {
            log::debug!("Skipping unparseable JSON-LD block on {}", hostname);
            continue;
        };

        let Some(candidate) = first_product_node(&json) else {
            continue;
        };

        let same_item = match identity(&node) {
            None => true,
            Some(id) => identity(candidate) == Some(id),
        };
        if same_item {
            for (key, value) in candidate {
                node.insert(key.clone(), value.clone());
            }
        }
    }

    product_from_node(node, hostname)
}

// One block contributes at most one node: the first product-like entry.
fn first_product_node(value: &Value) -> Option<&Map<String, Value>> {
    match value {
        Value::Array(items) => items.iter().find_map(first_product_node),
        Value::Object(obj) => match obj.get("@graph") {
            Some(graph) => first_product_node(graph),
            None => is_product_type(obj).then_some(obj),
        },
        _ => None,
    }
}

fn is_product_type(obj: &Map<String, Value>) -> bool {
    let matches = |t: &str| {
        let upper = t.to_uppercase();
        PRODUCT_TYPES.iter().any(|p| upper.contains(p))
    };

    match obj.get("@type") {
        Some(Value::String(t)) => matches(t),
        Some(Value::Array(types)) => types.iter().filter_map(Value::as_str).any(matches),
        _ => false,
    }
}

// An empty or null @id does not identify anything.
fn identity(obj: &Map<String, Value>) -> Option<&Value> {
    obj.get("@id").filter(|id| match id {
        Value::Null => false,
        Value::String(s) => !s.is_empty(),
        _ => true,
    })
}

fn product_from_node(mut node: Map<String, Value>, hostname: &str) -> Product {
    let name = take_text(&mut node, "name").and_then(|n| normalize_text(&n));
    let description = take_text(&mut node, "description")
        .map(|d| d.trim().to_string())
        .filter(|d| !d.is_empty());
    let brand = node.remove("brand").as_ref().and_then(brand_name);
    let image = node
        .remove("image")
        .as_ref()
        .and_then(|v| primary_image(v, hostname));
    let url = parse_url_value(node.remove("url").as_ref(), hostname);

    let offer = node.get("offers").and_then(first_entry);
    let price = offer.and_then(offer_price);
    let currency = offer.and_then(offer_currency);

    let mut product = Product {
        name,
        brand,
        price,
        currency,
        description,
        images: image.into_iter().collect(),
        metadata: node,
        ..Default::default()
    };
    product.set_meta("url", url);
    product
}

// Removes `key` only when it yields text; other shapes stay in metadata.
fn take_text(node: &mut Map<String, Value>, key: &str) -> Option<String> {
    let text = node.get(key).and_then(first_str).map(String::from)?;
    node.remove(key);
    Some(text)
}

fn first_entry(value: &Value) -> Option<&Value> {
    match value {
        Value::Array(items) => items.first(),
        Value::Object(_) => Some(value),
        _ => None,
    }
}

fn offer_price(offer: &Value) -> Option<f64> {
    let spec = offer.get("priceSpecification").and_then(first_entry);
    [
        offer.get("price"),
        offer.get("highPrice"),
        spec.and_then(|s| s.get("price")),
    ]
    .into_iter()
    .find_map(|candidate| parse_price(candidate, '.'))
}

fn offer_currency(offer: &Value) -> Option<String> {
    let spec = offer.get("priceSpecification").and_then(first_entry);
    parse_currency_value(offer.get("priceCurrency"))
        .or_else(|| parse_currency_value(spec.and_then(|s| s.get("priceCurrency"))))
}

/// First usable image: a URL string, an ImageObject, or an array of either.
fn primary_image(value: &Value, hostname: &str) -> Option<Image> {
    match value {
        Value::String(s) => parse_url(s, hostname).map(Image::new),
        Value::Array(items) => items.iter().find_map(|item| primary_image(item, hostname)),
        Value::Object(obj) => {
            let url = parse_url_value(obj.get("url"), hostname)
                .or_else(|| parse_url_value(obj.get("contentUrl"), hostname))?;
            Some(Image::new(url).with_size(
                parse_dimension(obj.get("width")),
                parse_dimension(obj.get("height")),
            ))
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn extract(html: &str) -> Product {
        extract_jsonld(&Html::parse_document(html), "example.com")
    }

    #[test]
    fn test_extract_simple_jsonld() {
        let html = r#"
        <html>
        <head>
            <script type="application/ld+json">
            {
                "@context": "https://schema.org/",
                "@type": "Product",
                "name": "Test Product JSON-LD",
                "description": "Product JSON-LD description",
                "image": "https://example.com/image.jpg",
                "brand": { "name": "Test Brand" },
                "offers": { "price": "89.99", "priceCurrency": "CAD" }
            }
            </script>
        </head>
        </html>
        "#;

        let product = extract(html);
        assert_eq!(product.name.as_deref(), Some("Test Product JSON-LD"));
        assert_eq!(product.description.as_deref(), Some("Product JSON-LD description"));
        assert_eq!(product.brand.as_deref(), Some("Test Brand"));
        assert_eq!(product.price, Some(89.99));
        assert_eq!(product.currency.as_deref(), Some("CAD"));
        assert_eq!(product.images, vec![Image::new("https://example.com/image.jpg")]);
        assert_eq!(
            Value::Object(product.metadata),
            json!({
                "@context": "https://schema.org/",
                "@type": "Product",
                "offers": { "price": "89.99", "priceCurrency": "CAD" }
            })
        );
    }

    #[test]
    fn test_extract_graph_jsonld() {
        let html = r#"
        <script type="application/ld+json">
        {
            "@context": "https://schema.org",
            "@graph": [
                {"@type": "Organization", "name": "Org 1"},
                {"@type": ["Thing", "Book"], "name": "A Book", "url": "/books/1"}
            ]
        }
        </script>
        "#;

        let product = extract(html);
        assert_eq!(product.name.as_deref(), Some("A Book"));
        assert_eq!(product.metadata["url"], json!("https://example.com/books/1"));
    }

    #[test]
    fn test_repairs_broken_block_and_skips_garbage() {
        let html = r#"
        <script type="application/ld+json">this is not json {{{</script>
        <script type="application/ld+json">
        {
            '@type': 'Product',
            'name': 'Repaired',
            'offers': [{'price': '12.50', 'priceCurrency': 'usd',},],
        }
        </script>
        "#;

        let product = extract(html);
        assert_eq!(product.name.as_deref(), Some("Repaired"));
        assert_eq!(product.price, Some(12.5));
        assert_eq!(product.currency.as_deref(), Some("USD"));
    }

    #[test]
    fn test_same_id_merges_different_id_ignored() {
        let html = r##"
        <script type="application/ld+json">
        {"@type": "Product", "@id": "#p1", "name": "First", "sku": "A1"}
        </script>
        <script type="application/ld+json">
        {"@type": "Product", "@id": "#p1", "color": "Red", "name": "First Again"}
        </script>
        <script type="application/ld+json">
        {"@type": "Product", "@id": "#p2", "name": "Other", "mpn": "X"}
        </script>
        "##;

        let product = extract(html);
        assert_eq!(product.name.as_deref(), Some("First Again"));
        assert_eq!(product.metadata["sku"], json!("A1"));
        assert_eq!(product.metadata["color"], json!("Red"));
        assert!(!product.metadata.contains_key("mpn"));
    }

    #[test]
    fn test_price_fallbacks() {
        let html = r#"
        <script type="application/ld+json">
        {"@type": "Product", "offers": {"@type": "AggregateOffer", "highPrice": 30, "lowPrice": 10,
            "priceSpecification": {"priceCurrency": "EUR"}}}
        </script>
        "#;
        let product = extract(html);
        assert_eq!(product.price, Some(30.0));
        assert_eq!(product.currency.as_deref(), Some("EUR"));

        let html = r#"
        <script type="application/ld+json">
        {"@type": "Product", "offers": {"priceSpecification": [{"price": "7,00", "priceCurrency": "$"}]}}
        </script>
        "#;
        let product = extract(html);
        assert_eq!(product.price, Some(700.0));
        assert_eq!(product.currency, None);
    }

    #[test]
    fn test_image_object_and_relative_url() {
        let html = r#"
        <script type="application/ld+json">
        {"@type": "Product", "image": [
            "data:image/png;base64,AAAA",
            {"@type": "ImageObject", "url": "/img/main.jpg", "width": "800", "height": 600}
        ]}
        </script>
        "#;

        let product = extract(html);
        assert_eq!(
            product.images,
            vec![Image::new("https://example.com/img/main.jpg").with_size(Some(800), Some(600))]
        );
    }

    #[test]
    fn test_no_product_yields_empty() {
        let html = r#"
        <script type="application/ld+json">{"@type": "BreadcrumbList", "name": "Crumbs"}</script>
        <script type="application/ld+json"></script>
        "#;
        assert!(extract(html).is_empty());
        assert!(extract("<html><body>No data</body></html>").is_empty());
    }

    #[test]
    fn test_first_product_node_per_block() {
        let html = r#"
        <script type="application/ld+json">
        {"@graph": [
            {"@type": "WebPage", "name": "Shop"},
            {"@type": "Product", "name": "Main Item", "offers": {"price": "10", "priceCurrency": "USD"}},
            {"@type": "Product", "name": "Related Item", "offers": {"price": "99", "priceCurrency": "EUR"}}
        ]}
        </script>
        "#;

        let product = extract(html);
        assert_eq!(product.name.as_deref(), Some("Main Item"));
        assert_eq!(product.price, Some(10.0));
        assert_eq!(product.currency.as_deref(), Some("USD"));

        let html = r#"
        <script type="application/ld+json">
        [{"@type": "Product", "name": "Listed First"}, {"@type": "Product", "name": "Listed Second"}]
        </script>
        "#;
        assert_eq!(extract(html).name.as_deref(), Some("Listed First"));
    }

    #[test]
    fn test_non_string_name_shapes() {
        let html = r#"
        <script type="application/ld+json">
        {"@type": "Product", "name": [{"@language": "en", "@value": "Claw Hammer"}, {"@language": "fr", "@value": "Marteau"}]}
        </script>
        "#;
        assert_eq!(extract(html).name.as_deref(), Some("Claw Hammer"));

        let html = r#"
        <script type="application/ld+json">
        {"@type": "Product", "name": {"en": "Claw Hammer"}}
        </script>
        "#;
        let product = extract(html);
        assert_eq!(product.name, None);
        assert_eq!(product.metadata["name"], json!({"en": "Claw Hammer"}));
    }
}
