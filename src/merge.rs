//! Precedence merge of partial products
//!
//! Inputs arrive in a fixed order, highest precedence first. Scalars and
//! metadata keys keep the first value seen; images are unioned by URL.

use serde_json::Value;

use crate::product::{Image, Product};

/// Fold `results` into one product. Earlier results take precedence.
pub fn merge_products(results: &[Product]) -> Product {
    let mut merged = Product::default();

    for result in results {
        fill(&mut merged.url, &result.url);
        fill(&mut merged.name, &result.name);
        fill(&mut merged.brand, &result.brand);
        fill(&mut merged.description, &result.description);
        fill(&mut merged.currency, &result.currency);
        if merged.price.is_none() {
            merged.price = result.price;
        }

        // Keys already present win unless they hold nothing
        for (key, value) in &result.metadata {
            match merged.metadata.get(key) {
                Some(existing) if !is_blank(existing) => {}
                _ => {
                    merged.metadata.insert(key.clone(), value.clone());
                }
            }
        }

        merge_images(&mut merged.images, &result.images);
    }

    merged
}

fn fill(target: &mut Option<String>, source: &Option<String>) {
    if target.as_deref().map_or(true, |s| s.trim().is_empty()) {
        target.clone_from(source);
    }
}

/// True for values [`strip_empty`] would remove entirely.
fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        Value::Array(items) => items.iter().all(is_blank),
        Value::Object(map) => map.values().all(is_blank),
        Value::Bool(_) | Value::Number(_) => false,
    }
}

/// Union `incoming` into `images` by URL, keeping first-appearance order.
/// Known dimensions are only filled in, never replaced.
pub fn merge_images(images: &mut Vec<Image>, incoming: &[Image]) {
    for image in incoming {
        match images.iter_mut().find(|i| i.url == image.url) {
            Some(existing) => {
                existing.width = existing.width.or(image.width);
                existing.height = existing.height.or(image.height);
            }
            None => images.push(image.clone()),
        }
    }
}

/// Collapse null and blank values to "absent" across the whole product.
pub fn strip_empty(product: &mut Product) {
    for field in [
        &mut product.url,
        &mut product.name,
        &mut product.brand,
        &mut product.description,
        &mut product.currency,
    ] {
        if field.as_deref().is_some_and(|s| s.trim().is_empty()) {
            *field = None;
        }
    }
    if product.price.is_some_and(|p| !p.is_finite() || p < 0.0) {
        product.price = None;
    }

    product.images.retain(|i| !i.url.trim().is_empty());
    product.metadata.retain(|_, value| !prune(value));
}

// Strips empty children in place; true when `value` itself ends up empty.
fn prune(value: &mut Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        Value::Array(items) => {
            items.retain_mut(|item| !prune(item));
            items.is_empty()
        }
        Value::Object(map) => {
            map.retain(|_, v| !prune(v));
            map.is_empty()
        }
        Value::Bool(_) | Value::Number(_) => false,
    }
}
