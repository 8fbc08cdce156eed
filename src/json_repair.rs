//! Tolerant JSON decoding for embedded JSON-LD
//!
//! Stage one ([`repair_json`]) rewrites common breakage found in page markup
//! into valid JSON text. Stage two ([`parse_json`]) decodes strictly, trying
//! the raw text first and the repaired text second.

use serde_json::Value;

/// Decode `raw`, repairing it first if strict decoding fails.
pub fn parse_json(raw: &str) -> Option<Value> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }

    if let Ok(value) = serde_json::from_str(trimmed) {
        return Some(value);
    }

    let repaired = repair_json(trimmed);
    match serde_json::from_str(&repaired) {
        Ok(value) => Some(value),
        Err(e) => {
            log::debug!("JSON still invalid after repair: {}", e);
            None
        }
    }
}

/// Rewrite almost-JSON into JSON text.
///
/// Handles single-quoted strings, trailing commas, raw control characters
/// inside strings, `//` and `/* */` comments, HTML comment or CDATA
/// wrappers, unquoted keys, Python/JS constants (`True`, `None`,
/// `undefined`, `NaN`) and brackets left open at the end of the input.
/// The output is not guaranteed to be valid JSON.
pub fn repair_json(raw: &str) -> String {
    let chars: Vec<char> = strip_wrappers(raw).chars().collect();
    let mut out = String::with_capacity(chars.len() + 16);
    let mut closers: Vec<char> = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        match c {
            '"' | '\'' => i = copy_string(&chars, i, &mut out),
            '/' if chars.get(i + 1) == Some(&'/') => {
                while i < chars.len() && chars[i] != '\n' {
                    i += 1;
                }
            }
            '/' if chars.get(i + 1) == Some(&'*') => {
                i += 2;
                while i < chars.len() && !(chars[i] == '*' && chars.get(i + 1) == Some(&'/')) {
                    i += 1;
                }
                i += 2;
            }
            '{' => {
                closers.push('}');
                out.push(c);
                i += 1;
            }
            '[' => {
                closers.push(']');
                out.push(c);
                i += 1;
            }
            '}' | ']' => {
                // Close anything left open inside this container; a closer
                // with no opener is dropped.
                if let Some(pos) = closers.iter().rposition(|&x| x == c) {
                    while closers.len() > pos {
                        strip_trailing_comma(&mut out);
                        if let Some(closer) = closers.pop() {
                            out.push(closer);
                        }
                    }
                }
                i += 1;
            }
            ' ' | '\t' | '\n' | '\r' => {
                out.push(c);
                i += 1;
            }
            c if c.is_control() || c.is_whitespace() || c == '\u{feff}' => {
                out.push(' ');
                i += 1;
            }
            c if is_ident_start(c) && !follows_number(&chars, i) => {
                let start = i;
                while i < chars.len() && is_ident_part(chars[i]) {
                    i += 1;
                }
                let ident: String = chars[start..i].iter().collect();
                push_identifier(&ident, next_significant(&chars, i) == Some(':'), &mut out);
            }
            _ => {
                out.push(c);
                i += 1;
            }
        }
    }

    while let Some(closer) = closers.pop() {
        strip_trailing_comma(&mut out);
        out.push(closer);
    }
    strip_trailing_comma(&mut out);
    out
}

fn strip_wrappers(raw: &str) -> &str {
    let mut s = raw.trim().trim_start_matches('\u{feff}').trim();
    for prefix in ["<!--", "<![CDATA["] {
        if let Some(rest) = s.strip_prefix(prefix) {
            s = rest.trim_start();
        }
    }
    for suffix in ["-->", "]]>"] {
        if let Some(rest) = s.strip_suffix(suffix) {
            s = rest.trim_end();
        }
    }
    s.trim_end_matches(';').trim_end()
}

/// Copy a single- or double-quoted string starting at `start` as a valid
/// double-quoted JSON string. Returns the index after the closing quote.
fn copy_string(chars: &[char], start: usize, out: &mut String) -> usize {
    let quote = chars[start];
    let mut i = start + 1;
    out.push('"');

    while i < chars.len() {
        let c = chars[i];
        match c {
            '\\' => match chars.get(i + 1) {
                Some('\'') => {
                    out.push('\'');
                    i += 2;
                }
                Some('u') if is_unicode_escape(chars, i + 2) => {
                    out.push_str("\\u");
                    i += 2;
                }
                Some(&n) if matches!(n, '"' | '\\' | '/' | 'b' | 'f' | 'n' | 'r' | 't') => {
                    out.push('\\');
                    out.push(n);
                    i += 2;
                }
                // Unknown escape: keep the backslash as a literal
                _ => {
                    out.push_str("\\\\");
                    i += 1;
                }
            },
            c if c == quote => {
                out.push('"');
                return i + 1;
            }
            '"' => {
                out.push_str("\\\"");
                i += 1;
            }
            '\n' => {
                out.push_str("\\n");
                i += 1;
            }
            '\r' => {
                out.push_str("\\r");
                i += 1;
            }
            '\t' => {
                out.push_str("\\t");
                i += 1;
            }
            c if (c as u32) < 0x20 => i += 1,
            _ => {
                out.push(c);
                i += 1;
            }
        }
    }

    // Unterminated string
    out.push('"');
    chars.len()
}

fn is_unicode_escape(chars: &[char], from: usize) -> bool {
    chars.len() >= from + 4 && chars[from..from + 4].iter().all(|c| c.is_ascii_hexdigit())
}

fn push_identifier(ident: &str, is_key: bool, out: &mut String) {
    if is_key {
        out.push('"');
        out.push_str(ident);
        out.push('"');
        return;
    }

    match ident {
        "true" | "false" | "null" => out.push_str(ident),
        "True" => out.push_str("true"),
        "False" => out.push_str("false"),
        "None" | "undefined" | "NaN" | "Infinity" => out.push_str("null"),
        _ => {
            out.push('"');
            out.push_str(ident);
            out.push('"');
        }
    }
}

fn is_ident_start(c: char) -> bool {
    c.is_alphabetic() || c == '_' || c == '$'
}

fn is_ident_part(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '$'
}

// `1e5` and friends: letters glued to a number belong to it.
fn follows_number(chars: &[char], i: usize) -> bool {
    i > 0 && (chars[i - 1].is_ascii_digit() || chars[i - 1] == '.')
}

fn next_significant(chars: &[char], from: usize) -> Option<char> {
    chars[from..].iter().copied().find(|c| !c.is_whitespace())
}

fn strip_trailing_comma(out: &mut String) {
    let trimmed_len = out.trim_end().len();
    if out[..trimmed_len].ends_with(',') {
        out.truncate(trimmed_len - 1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn repaired(raw: &str) -> Value {
        serde_json::from_str(&repair_json(raw)).unwrap()
    }

    #[test]
    fn test_valid_json_unchanged() {
        let raw = r#"{"@type": "Product", "name": "Lamp", "offers": [{"price": 1.5e2}]}"#;
        assert_eq!(repaired(raw), serde_json::from_str::<Value>(raw).unwrap());
    }

    #[test]
    fn test_trailing_commas() {
        assert_eq!(
            repaired(r#"{"a": [1, 2, 3,], "b": {"c": 1,},}"#),
            json!({"a": [1, 2, 3], "b": {"c": 1}})
        );
    }

    #[test]
    fn test_single_quotes() {
        assert_eq!(
            repaired(r#"{'name': 'The "Best" Lamp', 'it\'s': 'ok'}"#),
            json!({"name": "The \"Best\" Lamp", "it's": "ok"})
        );
    }

    #[test]
    fn test_control_characters_in_strings() {
        let raw = "{\"description\": \"line one\nline two\twith tab\u{1}\"}";
        assert_eq!(
            repaired(raw),
            json!({"description": "line one\nline two\twith tab"})
        );
    }

    #[test]
    fn test_comments_and_wrappers() {
        let raw = "//<![CDATA[\n{\"name\": \"Lamp\" /* inline */, // trailing\n \"sku\": \"A1\"}\n//]]>";
        assert_eq!(repaired(raw), json!({"name": "Lamp", "sku": "A1"}));

        let raw = "<!-- {\"name\": \"Lamp\"} -->";
        assert_eq!(repaired(raw), json!({"name": "Lamp"}));
    }

    #[test]
    fn test_unquoted_keys_and_constants() {
        assert_eq!(
            repaired("{name: 'Lamp', inStock: True, color: None, size: undefined}"),
            json!({"name": "Lamp", "inStock": true, "color": null, "size": null})
        );
    }

    #[test]
    fn test_truncated_input_is_closed() {
        assert_eq!(
            repaired(r#"{"name": "Lamp", "offers": [{"price": "10""#),
            json!({"name": "Lamp", "offers": [{"price": "10"}]})
        );
    }

    #[test]
    fn test_invalid_escape_kept_literal() {
        assert_eq!(repaired(r#"{"path": "C:\dir"}"#), json!({"path": "C:\\dir"}));
    }

    #[test]
    fn test_parse_json_stages() {
        assert_eq!(parse_json(r#" {"a": 1} "#), Some(json!({"a": 1})));
        assert_eq!(parse_json("{'a': 1,}"), Some(json!({"a": 1})));
        assert_eq!(parse_json(""), None);
        assert_eq!(parse_json("not json at all <div>"), None);
    }
}
