//! Per-site selector tables
//!
//! Some marketplaces ship generic markup that is missing or wrong. For those
//! hosts a hand-written table of CSS selector rules is used instead.
//! Update a table when the site changes its HTML structure.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::selector::SelectorRule;

/// Selector rules for one site, matched by hostname substring.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SiteSelectors {
    /// Hostname substrings this table applies to, e.g. `"amazon"`
    pub hosts: Vec<String>,
    #[serde(default)]
    pub name: Vec<SelectorRule>,
    #[serde(default)]
    pub brand: Vec<SelectorRule>,
    #[serde(default)]
    pub description: Vec<SelectorRule>,
    #[serde(default)]
    pub price: Vec<SelectorRule>,
    #[serde(default)]
    pub currency: Vec<SelectorRule>,
    #[serde(default)]
    pub image: Vec<SelectorRule>,
    /// Extra named fields, stored under the same key in metadata
    #[serde(default)]
    pub metadata: BTreeMap<String, Vec<SelectorRule>>,
    /// Decimal separator used by this site's prices
    #[serde(default = "default_decimal_separator")]
    pub decimal_separator: char,
}

fn default_decimal_separator() -> char {
    '.'
}

impl SiteSelectors {
    pub fn new(hosts: &[&str]) -> Self {
        Self {
            hosts: hosts.iter().map(|h| h.to_string()).collect(),
            name: Vec::new(),
            brand: Vec::new(),
            description: Vec::new(),
            price: Vec::new(),
            currency: Vec::new(),
            image: Vec::new(),
            metadata: BTreeMap::new(),
            decimal_separator: default_decimal_separator(),
        }
    }

    /// Whether this table applies to `hostname` (case-insensitive substring).
    pub fn matches(&self, hostname: &str) -> bool {
        let hostname = hostname.to_ascii_lowercase();
        self.hosts
            .iter()
            .filter(|h| !h.is_empty())
            .any(|h| hostname.contains(&h.to_ascii_lowercase()))
    }
}

/// First table in `sites` that applies to `hostname`.
pub fn find_site<'a>(sites: &'a [SiteSelectors], hostname: &str) -> Option<&'a SiteSelectors> {
    sites.iter().find(|site| site.matches(hostname))
}

/// Tables shipped with the crate.
pub fn builtin_sites() -> Vec<SiteSelectors> {
    vec![amazon()]
}

/// Amazon product pages. Title, price and currency are read from the hidden
/// form inputs first, which are more stable than the visible markup.
pub fn amazon() -> SiteSelectors {
    let mut site = SiteSelectors::new(&["amazon"]);

    site.name = vec![
        SelectorRule::attr("#productTitle", "value"),
        SelectorRule::attr(r#"[name="productTitle"]"#, "value"),
        SelectorRule::text("#productTitle"),
    ];
    site.brand = vec![SelectorRule::text("#bylineInfo")];
    site.price = vec![
        SelectorRule::attr("#priceValue", "value"),
        SelectorRule::attr(r#"[name="priceValue"]"#, "value"),
        SelectorRule::text("#corePrice_feature_div .a-price .a-offscreen"),
        SelectorRule::text(".a-price .a-offscreen"),
    ];
    site.currency = vec![
        SelectorRule::attr("#currencyOfPreference", "value"),
        SelectorRule::attr(r#"[name="currencyOfPreference"]"#, "value"),
    ];
    site.image = vec![
        SelectorRule::attrs("img#landingImage", &["data-old-hires", "src"]),
        SelectorRule::attr("#imgTagWrapperId img", "src"),
        SelectorRule::attr(r#"[name="productImageUrl"]"#, "value"),
    ];
    site.metadata.insert(
        "category".to_string(),
        vec![SelectorRule::attr("#productCategory", "value")],
    );

    site
}
