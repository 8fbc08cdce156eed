//! Runs every extractor over one page and merges the results

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::LazyLock;

use log::{debug, warn};
use scraper::Html;
use url::Url;

use crate::error::{panic_message, ProductError};
use crate::extractors::{
    Extractor, JsonLdExtractor, MicrodataExtractor, OpenGraphExtractor, Page, SiteExtractor,
};
use crate::merge::{merge_products, strip_empty};
use crate::product::Product;
use crate::sites::{builtin_sites, find_site, SiteSelectors};

static DEFAULT_SCRAPER: LazyLock<ProductScraper> = LazyLock::new(ProductScraper::default);

/// Extract a product from `html` using the built-in site tables.
pub fn get_product(url: &str, html: &str) -> Result<Product, ProductError> {
    DEFAULT_SCRAPER.scrape(url, html)
}

/// Extractor pipeline plus the registry of site-specific tables.
#[derive(Debug, Clone)]
pub struct ProductScraper {
    sites: Vec<SiteSelectors>,
}

impl Default for ProductScraper {
    fn default() -> Self {
        Self {
            sites: builtin_sites(),
        }
    }
}

impl ProductScraper {
    /// A scraper with no site tables at all.
    pub fn new() -> Self {
        Self { sites: Vec::new() }
    }

    /// Register a table. Tables added later are checked first.
    pub fn with_site(mut self, site: SiteSelectors) -> Self {
        self.sites.insert(0, site);
        self
    }

    pub fn sites(&self) -> &[SiteSelectors] {
        &self.sites
    }

    /// Table that applies to `hostname`, if any.
    pub fn site_for(&self, hostname: &str) -> Option<&SiteSelectors> {
        find_site(&self.sites, hostname)
    }

    /// Extract and merge a product. Either a product or an error is
    /// returned, never both; panics are converted into
    /// [`ProductError::Panicked`].
    pub fn scrape(&self, url: &str, html: &str) -> Result<Product, ProductError> {
        catch_unwind(AssertUnwindSafe(|| self.scrape_page(url, html)))
            .unwrap_or_else(|payload| Err(ProductError::from_panic(payload)))
    }

    fn scrape_page(&self, url: &str, html: &str) -> Result<Product, ProductError> {
        let parsed = Url::parse(url).map_err(|source| ProductError::InvalidUrl {
            url: url.to_string(),
            source,
        })?;
        let hostname = parsed.host_str().ok_or_else(|| ProductError::MissingHost {
            url: url.to_string(),
        })?;

        let document = Html::parse_document(html);
        let page = Page {
            document: &document,
            hostname,
        };

        let site = SiteExtractor::new(self.site_for(hostname));
        let extractors: [&dyn Extractor; 4] =
            [&JsonLdExtractor, &MicrodataExtractor, &OpenGraphExtractor, &site];

        let results: Vec<Product> = extractors
            .iter()
            .map(|extractor| run_contained(*extractor, &page))
            .collect();

        let mut product = merge_products(&results);
        strip_empty(&mut product);
        product.url = Some(url.to_string());

        Ok(product)
    }
}

// A panicking extractor contributes an empty product.
fn run_contained(extractor: &dyn Extractor, page: &Page) -> Product {
    match catch_unwind(AssertUnwindSafe(|| extractor.extract(page))) {
        Ok(product) => {
            if !product.is_empty() {
                debug!("{} extractor found product data", extractor.name());
            }
            product
        }
        Err(payload) => {
            warn!(
                "{} extractor panicked: {}",
                extractor.name(),
                panic_message(payload.as_ref())
            );
            Product::default()
        }
    }
}
