//! Value normalizers shared by all extractors
//!
//! Each parser returns `None` for anything it cannot make sense of; a bad
//! price never becomes `0` and a bad URL is never stored.

use serde_json::Value;
use url::Url;

use crate::currency::is_known_currency;

/// Parse a number out of free-form text such as `"$1,299.00"` or `"12,99 €"`.
///
/// Every character except digits, `-` and `decimal_sep` is dropped, the first
/// `decimal_sep` becomes `.`, and the longest numeric prefix is parsed.
pub fn parse_num_str(value: &str, decimal_sep: char) -> Option<f64> {
    let mut cleaned: String = value
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '-' || *c == decimal_sep)
        .collect();
    if decimal_sep != '.' {
        if let Some(pos) = cleaned.find(decimal_sep) {
            cleaned.replace_range(pos..pos + decimal_sep.len_utf8(), ".");
        }
    }

    numeric_prefix(&cleaned)?
        .parse::<f64>()
        .ok()
        .filter(|n| n.is_finite())
}

/// Parse a JSON value as a number: numbers pass through, strings go through
/// [`parse_num_str`], anything else is absent.
pub fn parse_num(value: Option<&Value>, decimal_sep: char) -> Option<f64> {
    match value? {
        Value::Number(n) => n.as_f64().filter(|n| n.is_finite()),
        Value::String(s) => parse_num_str(s, decimal_sep),
        _ => None,
    }
}

/// A price is a number that is not negative.
pub fn parse_price(value: Option<&Value>, decimal_sep: char) -> Option<f64> {
    parse_num(value, decimal_sep).filter(|n| *n >= 0.0)
}

pub fn parse_price_str(value: &str, decimal_sep: char) -> Option<f64> {
    parse_num_str(value, decimal_sep).filter(|n| *n >= 0.0)
}

// Longest `-?digits(.digits)?` prefix, requiring at least one digit.
fn numeric_prefix(s: &str) -> Option<&str> {
    let bytes = s.as_bytes();
    let mut end = 0;
    let mut digits = 0;

    if bytes.first() == Some(&b'-') {
        end = 1;
    }
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
        digits += 1;
    }
    if end < bytes.len() && bytes[end] == b'.' {
        let mut frac_end = end + 1;
        let mut frac_digits = 0;
        while frac_end < bytes.len() && bytes[frac_end].is_ascii_digit() {
            frac_end += 1;
            frac_digits += 1;
        }
        if frac_digits > 0 {
            end = frac_end;
            digits += frac_digits;
        }
    }

    (digits > 0).then(|| &s[..end])
}

/// Validate a currency code against the ISO 4217 table, returning it uppercased.
pub fn parse_currency(value: &str) -> Option<String> {
    let value = value.trim();
    let len = value.chars().count();
    if !(1..=5).contains(&len) {
        return None;
    }

    let code = value.to_ascii_uppercase();
    is_known_currency(&code).then_some(code)
}

/// [`parse_currency`] for JSON values; non-strings are absent.
pub fn parse_currency_value(value: Option<&Value>) -> Option<String> {
    value.and_then(Value::as_str).and_then(parse_currency)
}

/// Resolve `value` to an absolute `https` URL on `hostname` when it is relative.
///
/// - `data:` URIs and the `"[object object]"` sentinel are rejected
/// - a value starting with the hostname gets an `https://` prefix
/// - a value without a scheme has leading `#` and `/` stripped and is placed
///   under `https://{hostname}/`
/// - anything else is used as-is
///
/// The result must parse as an absolute http(s) URL with a host.
pub fn parse_url(value: &str, hostname: &str) -> Option<String> {
    let value = value.trim();
    if value.is_empty()
        || value.get(..5).is_some_and(|p| p.eq_ignore_ascii_case("data:"))
        || value.eq_ignore_ascii_case("[object object]")
    {
        return None;
    }

    let candidate = if !hostname.is_empty() && value.starts_with(hostname) {
        format!("https://{value}")
    } else if has_scheme(value) {
        value.to_string()
    } else {
        let rest = value.trim_start_matches(['#', '/']);
        format!("https://{hostname}/{rest}")
    };

    let url = Url::parse(&candidate).ok()?;
    if !matches!(url.scheme(), "http" | "https") || url.host_str().is_none() {
        return None;
    }
    Some(url.to_string())
}

/// [`parse_url`] for JSON values; non-strings are absent.
pub fn parse_url_value(value: Option<&Value>, hostname: &str) -> Option<String> {
    value
        .and_then(Value::as_str)
        .and_then(|v| parse_url(v, hostname))
}

fn has_scheme(value: &str) -> bool {
    match value.find("://") {
        Some(pos) if pos > 0 => {
            let scheme = &value[..pos];
            scheme.starts_with(|c: char| c.is_ascii_alphabetic())
                && scheme
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
        }
        _ => false,
    }
}

/// First candidate URL of a `srcset` value (`"a.jpg 1x, b.jpg 2x"` -> `"a.jpg"`).
/// Plain URLs come back unchanged.
pub fn first_srcset_url(value: &str) -> &str {
    let value = value.trim();
    if !value.contains(char::is_whitespace) {
        return value;
    }
    value
        .split(", ")
        .next()
        .and_then(|candidate| candidate.split_whitespace().next())
        .unwrap_or(value)
}

/// Trim and collapse internal whitespace runs to one space. Blank text is absent.
pub fn normalize_text(text: &str) -> Option<String> {
    let normalized = text.split_whitespace().collect::<Vec<_>>().join(" ");
    (!normalized.is_empty()).then_some(normalized)
}

/// Image dimension from a JSON number or numeric string.
pub fn parse_dimension(value: Option<&Value>) -> Option<u32> {
    parse_num(value, '.')
        .filter(|n| *n >= 0.0 && *n <= f64::from(u32::MAX))
        .map(|n| n.round() as u32)
}
