//! Microdata (schema.org HTML attributes) product extraction
//!
//! Reads the first element whose itemtype names a Product, collecting the
//! itemprop values that belong to that scope. Price and currency come from
//! the Offer scope inside it, whether or not that scope is an itemprop.
//! Reference: https://html.spec.whatwg.org/multipage/microdata.html

use scraper::{ElementRef, Html};
use serde_json::{Map, Value};

use super::{brand_name, first_str, Extractor, Page};
use crate::normalize::{
    first_srcset_url, normalize_text, parse_currency, parse_price_str, parse_url,
};
use crate::product::{Image, Product};
use crate::selector::parse_selector;

const PRODUCT_SCOPE_SELECTOR: &str = r#"[itemtype*="Product"]"#;
const OFFER_SCOPE_SELECTOR: &str = r#"[itemtype*="ffer"]"#;

/// Attributes tried, in order, for an `itemprop="image"` element.
const IMAGE_ATTRIBUTES: [&str; 5] = ["data-src", "href", "src", "content", "srcset"];

pub struct MicrodataExtractor;

impl Extractor for MicrodataExtractor {
    fn name(&self) -> &'static str {
        "microdata"
    }

    fn extract(&self, page: &Page) -> Product {
        extract_microdata(page.document, page.hostname)
    }
}

/// Extract a product from the first Product-typed microdata scope.
pub fn extract_microdata(document: &Html, hostname: &str) -> Product {
    let Some(selector) = parse_selector(PRODUCT_SCOPE_SELECTOR) else {
        return Product::default();
    };
    let Some(scope) = document.select(&selector).next() else {
        return Product::default();
    };

    let item = extract_item(&scope);
    let offer = find_offer(&item)
        .cloned()
        .or_else(|| descendant_offer(&scope));
    product_from_item(item, offer, hostname)
}

fn extract_item(element: &ElementRef) -> Map<String, Value> {
    let mut item: Map<String, Value> = Map::new();

    if let Some(itemtype) = element.value().attr("itemtype") {
        // "https://schema.org/Product" -> "Product"
        let type_name = itemtype.trim().rsplit('/').next().unwrap_or(itemtype);
        item.insert("@type".to_string(), Value::String(type_name.to_string()));
    }

    if let Some(itemid) = element.value().attr("itemid") {
        item.insert("@id".to_string(), Value::String(itemid.to_string()));
    }

    let Some(prop_selector) = parse_selector("[itemprop]") else {
        return item;
    };

    for prop_element in element.select(&prop_selector) {
        if prop_element.id() == element.id() || belongs_to_nested_scope(&prop_element, element) {
            continue;
        }

        let Some(prop_names) = prop_element.value().attr("itemprop") else {
            continue;
        };

        for prop_name in prop_names.split_whitespace() {
            let prop_value = if prop_element.value().attr("itemscope").is_some() {
                Value::Object(extract_item(&prop_element))
            } else {
                match scalar_value(&prop_element, prop_name) {
                    Some(v) => Value::String(v),
                    None => continue,
                }
            };

            // Repeated property: collect into an array
            match item.get_mut(prop_name) {
                Some(Value::Array(arr)) => arr.push(prop_value),
                Some(existing) => {
                    let old = existing.take();
                    *existing = Value::Array(vec![old, prop_value]);
                }
                None => {
                    item.insert(prop_name.to_string(), prop_value);
                }
            }
        }
    }

    item
}

// True when another itemscope sits between `prop` and `scope`.
fn belongs_to_nested_scope(prop: &ElementRef, scope: &ElementRef) -> bool {
    let mut current = prop.parent();

    while let Some(node) = current {
        if node.id() == scope.id() {
            return false;
        }
        if let Some(el) = node.value().as_element() {
            if el.attr("itemscope").is_some() {
                return true;
            }
        }
        current = node.parent();
    }

    false
}

fn scalar_value(element: &ElementRef, prop_name: &str) -> Option<String> {
    let el = element.value();
    let non_empty = |v: &str| {
        let v = v.trim();
        (!v.is_empty()).then(|| v.to_string())
    };

    let text = || non_empty(&element.text().collect::<String>());

    match prop_name {
        // Only these attributes can carry an image URL
        "image" => {
            return IMAGE_ATTRIBUTES
                .iter()
                .filter_map(|attr| el.attr(attr))
                .find_map(non_empty)
                .map(|v| first_srcset_url(&v).to_string());
        }
        "name" | "description" => {
            return el.attr("content").and_then(non_empty).or_else(text);
        }
        _ => {}
    }

    if let Some(v) = el.attr("content").and_then(non_empty) {
        return Some(v);
    }

    let by_tag = match el.name() {
        "link" | "a" | "area" => el.attr("href"),
        "img" | "audio" | "video" | "source" | "iframe" | "embed" => el.attr("src"),
        "object" => el.attr("data"),
        "time" => el.attr("datetime"),
        "data" | "meter" => el.attr("value"),
        _ => None,
    };
    if let Some(v) = by_tag.and_then(non_empty) {
        return Some(v);
    }

    text()
}

fn product_from_item(
    mut item: Map<String, Value>,
    offer: Option<Map<String, Value>>,
    hostname: &str,
) -> Product {
    let name = item
        .remove("name")
        .as_ref()
        .and_then(first_str)
        .and_then(normalize_text);
    let description = item
        .remove("description")
        .as_ref()
        .and_then(first_str)
        .map(str::trim)
        .filter(|d| !d.is_empty())
        .map(String::from);
    let brand = item.remove("brand").as_ref().and_then(brand_name);
    let image = item
        .remove("image")
        .as_ref()
        .and_then(first_str)
        .and_then(|url| parse_url(url, hostname))
        .map(Image::new);

    let offer = offer.as_ref();
    let price = offer
        .and_then(|o| o.get("price"))
        .and_then(first_str)
        .and_then(|p| parse_price_str(p, '.'));
    let currency = offer
        .and_then(|o| o.get("priceCurrency"))
        .and_then(first_str)
        .and_then(parse_currency);

    Product {
        name,
        brand,
        price,
        currency,
        description,
        images: image.into_iter().collect(),
        metadata: item,
        ..Default::default()
    }
}

fn find_offer(item: &Map<String, Value>) -> Option<&Map<String, Value>> {
    fn is_offer(value: &Value) -> Option<&Map<String, Value>> {
        match value {
            Value::Object(obj) => obj
                .get("@type")
                .and_then(Value::as_str)
                .is_some_and(|t| t.contains("ffer"))
                .then_some(obj),
            Value::Array(items) => items.iter().find_map(is_offer),
            _ => None,
        }
    }

    item.values().find_map(is_offer)
}

// An Offer scope nested without an itemprop linking it to the product.
fn descendant_offer(scope: &ElementRef) -> Option<Map<String, Value>> {
    let selector = parse_selector(OFFER_SCOPE_SELECTOR)?;
    scope
        .select(&selector)
        .find(|offer| offer.id() != scope.id())
        .map(|offer| extract_item(&offer))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn extract(html: &str) -> Product {
        extract_microdata(&Html::parse_document(html), "example.com")
    }

    #[test]
    fn test_extract_simple_microdata() {
        let html = r#"
        <div itemscope itemtype="https://schema.org/Product">
            <span itemprop="name">  Test
                Product </span>
            <meta itemprop="description" content="A fine product">
            <meta itemprop="gtin13" content="1234567890123">
            <img itemprop="image" src="/images/p.jpg" data-src="/images/p-large.jpg">
            <div itemprop="offers" itemscope itemtype="https://schema.org/Offer">
                <meta itemprop="priceCurrency" content="usd">
                <span itemprop="price" content="19.99">$19.99</span>
            </div>
        </div>
        "#;

        let product = extract(html);
        assert_eq!(product.name.as_deref(), Some("Test Product"));
        assert_eq!(product.description.as_deref(), Some("A fine product"));
        assert_eq!(product.price, Some(19.99));
        assert_eq!(product.currency.as_deref(), Some("USD"));
        assert_eq!(
            product.images,
            vec![Image::new("https://example.com/images/p-large.jpg")]
        );
        assert_eq!(product.metadata["gtin13"], json!("1234567890123"));
        assert_eq!(product.metadata["@type"], json!("Product"));
    }

    #[test]
    fn test_nested_scope_props_do_not_leak() {
        let html = r#"
        <div itemscope itemtype="https://schema.org/Product">
            <div itemprop="brand" itemscope itemtype="https://schema.org/Brand">
                <span itemprop="name">ACME</span>
            </div>
            <h1 itemprop="name">Rocket Skates</h1>
            <div itemprop="offers" itemscope itemtype="https://schema.org/Offer">
                <span itemprop="name">Offer name</span>
                <span itemprop="price">1 299,00</span>
            </div>
        </div>
        "#;

        let product = extract(html);
        assert_eq!(product.name.as_deref(), Some("Rocket Skates"));
        assert_eq!(product.brand.as_deref(), Some("ACME"));
        // default decimal separator is '.', so the comma is dropped
        assert_eq!(product.price, Some(129900.0));
        assert_eq!(product.currency, None);
    }

    #[test]
    fn test_image_srcset_fallback() {
        let html = r#"
        <div itemscope itemtype="http://schema.org/Product">
            <img itemprop="image" srcset="//cdn/p-1x.jpg 1x, //cdn/p-2x.jpg 2x">
        </div>
        "#;

        let product = extract(html);
        assert_eq!(product.images, vec![Image::new("https://example.com/cdn/p-1x.jpg")]);
    }

    #[test]
    fn test_repeated_properties_collect_into_array() {
        let html = r#"
        <div itemscope itemtype="https://schema.org/Product">
            <span itemprop="color">Red</span>
            <span itemprop="color">Blue</span>
        </div>
        "#;

        let product = extract(html);
        assert_eq!(product.metadata["color"], json!(["Red", "Blue"]));
    }

    #[test]
    fn test_no_product_scope() {
        let html = r#"
        <div itemscope itemtype="https://schema.org/Person">
            <span itemprop="name">Jane</span>
        </div>
        "#;
        assert!(extract(html).is_empty());
    }

    #[test]
    fn test_name_and_description_read_content_then_text() {
        let html = r#"
        <div itemscope itemtype="https://schema.org/Product">
            <a itemprop="name" href="/products/widget">Blue Widget</a>
            <a itemprop="description" href="/products/widget#details">Sturdy and blue</a>
            <a itemprop="url" href="/products/widget">Permalink</a>
        </div>
        "#;

        let product = extract(html);
        assert_eq!(product.name.as_deref(), Some("Blue Widget"));
        assert_eq!(product.description.as_deref(), Some("Sturdy and blue"));
        assert_eq!(product.metadata["url"], json!("/products/widget"));
    }

    #[test]
    fn test_image_text_is_not_a_url() {
        let html = r#"
        <div itemscope itemtype="https://schema.org/Product">
            <span itemprop="name">Widget</span>
            <span itemprop="image">Front view</span>
        </div>
        "#;

        let product = extract(html);
        assert!(product.images.is_empty());
        assert!(!product.metadata.contains_key("image"));
    }

    #[test]
    fn test_offer_scope_without_itemprop() {
        let html = r#"
        <div itemtype="https://schema.org/Product">
            <h1 itemprop="name">Garden Hose</h1>
            <div itemscope itemtype="https://schema.org/Offer">
                <span itemprop="price" content="24.95">$24.95</span>
                <meta itemprop="priceCurrency" content="USD">
            </div>
        </div>
        "#;

        let product = extract(html);
        assert_eq!(product.name.as_deref(), Some("Garden Hose"));
        assert_eq!(product.price, Some(24.95));
        assert_eq!(product.currency.as_deref(), Some("USD"));
        assert!(!product.metadata.contains_key("price"));
    }
}
