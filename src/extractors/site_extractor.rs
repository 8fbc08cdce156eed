//! Site-specific extraction driven by a [`SiteSelectors`] table

use scraper::Html;

use super::{Extractor, Page};
use crate::normalize::{
    first_srcset_url, normalize_text, parse_currency, parse_price_str, parse_url,
};
use crate::product::{Image, Product};
use crate::selector::{find_by_selectors, SelectorRule};
use crate::sites::SiteSelectors;

/// Runs the table picked for the page's host, or contributes nothing when
/// no table applies.
pub struct SiteExtractor<'a> {
    site: Option<&'a SiteSelectors>,
}

impl<'a> SiteExtractor<'a> {
    pub fn new(site: Option<&'a SiteSelectors>) -> Self {
        Self { site }
    }
}

impl Extractor for SiteExtractor<'_> {
    fn name(&self) -> &'static str {
        "site"
    }

    fn extract(&self, page: &Page) -> Product {
        match self.site {
            Some(site) => extract_site(page.document, page.hostname, site),
            None => Product::default(),
        }
    }
}

/// Extract a product using the rules of one site table.
pub fn extract_site(document: &Html, hostname: &str, site: &SiteSelectors) -> Product {
    let find = |rules: &[SelectorRule]| find_by_selectors(document, rules);

    let image = find(site.image.as_slice())
        .and_then(|v| parse_url(first_srcset_url(&v), hostname))
        .map(Image::new);

    let mut product = Product {
        name: find(site.name.as_slice()).and_then(|v| normalize_text(&v)),
        brand: find(site.brand.as_slice()).and_then(|v| normalize_text(&v)),
        price: find(site.price.as_slice())
            .and_then(|v| parse_price_str(&v, site.decimal_separator)),
        currency: find(site.currency.as_slice()).and_then(|v| parse_currency(&v)),
        description: find(site.description.as_slice()),
        images: image.into_iter().collect(),
        ..Default::default()
    };

    for (key, rules) in &site.metadata {
        product.set_meta(key, find(rules.as_slice()));
    }

    product
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sites::amazon;
    use serde_json::json;

    const AMAZON_PAGE: &str = r#"
    <html>
    <body>
        <form>
            <input type="hidden" id="productTitle" name="productTitle"
                value="Tarcury WW2 F4U Corsair Fighter Bomber Building Bricks">
            <input type="hidden" id="priceValue" name="priceValue" value="29.99">
            <input type="hidden" id="currencyOfPreference" value="CAD">
            <input type="hidden" id="productCategory" value="gl_toy">
        </form>
        <a id="bylineInfo" href="/stores/Tarcury">  Tarcury </a>
        <div id="imgTagWrapperId">
            <img id="landingImage" src="https://m.media-amazon.com/images/I/61rbW2eIt3L._AC_SX679_.jpg">
        </div>
    </body>
    </html>
    "#;

    #[test]
    fn test_amazon_table() {
        let document = Html::parse_document(AMAZON_PAGE);
        let product = extract_site(&document, "www.amazon.ca", &amazon());

        assert_eq!(
            product.name.as_deref(),
            Some("Tarcury WW2 F4U Corsair Fighter Bomber Building Bricks")
        );
        assert_eq!(product.brand.as_deref(), Some("Tarcury"));
        assert_eq!(product.price, Some(29.99));
        assert_eq!(product.currency.as_deref(), Some("CAD"));
        assert_eq!(
            product.images,
            vec![Image::new(
                "https://m.media-amazon.com/images/I/61rbW2eIt3L._AC_SX679_.jpg"
            )]
        );
        assert_eq!(product.metadata["category"], json!("gl_toy"));
    }

    #[test]
    fn test_amazon_table_on_empty_page() {
        let document = Html::parse_document("<html><body><p>Robot check</p></body></html>");
        let product = extract_site(&document, "www.amazon.com", &amazon());
        assert!(product.is_empty());
    }

    #[test]
    fn test_decimal_separator_and_srcset() {
        let mut site = SiteSelectors::new(&["shop.example"]);
        site.price = vec![SelectorRule::text(".price")];
        site.image = vec![SelectorRule::attr("img.main", "srcset")];
        site.decimal_separator = ',';

        let document = Html::parse_document(
            r#"<span class="price">1.299,50 €</span><img class="main" srcset="/a.jpg 1x, /b.jpg 2x">"#,
        );
        let product = extract_site(&document, "shop.example", &site);

        assert_eq!(product.price, Some(1299.5));
        assert_eq!(product.images, vec![Image::new("https://shop.example/a.jpg")]);
    }

    #[test]
    fn test_no_table_contributes_nothing() {
        let document = Html::parse_document(AMAZON_PAGE);
        let page = Page {
            document: &document,
            hostname: "www.example.com",
        };
        assert!(SiteExtractor::new(None).extract(&page).is_empty());
    }
}
