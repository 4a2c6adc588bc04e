//! Declarative field extraction: a table of [`FieldRule`]s is applied to a
//! parsed page (or a single card element) and yields raw string values.
//! Normalization into typed values happens separately in
//! [`crate::scrapers::normalize`].

use std::collections::HashMap;

use regex::Regex;
use scraper::{ElementRef, Selector};

use crate::scrapers::error::ScrapeError;

/// What to read from a CSS-selected node.
#[derive(Debug, Clone, Copy)]
pub enum Capture {
    Text,
    Attr(&'static str),
}

/// Where a field's value lives.
///
/// CIAN renders most development metadata inside inline JSON payloads, so
/// alongside plain CSS lookups the table supports regex probes over the
/// element's text and over its raw HTML. `any` patterns are tried in order;
/// the first match with a non-empty capture group wins.
#[derive(Debug, Clone, Copy)]
pub enum Lookup {
    Css {
        selector: &'static str,
        capture: Capture,
        /// Optional post-filter; capture group 1 is taken from the node value.
        pattern: Option<&'static str>,
    },
    Text {
        any: &'static [&'static str],
    },
    Payload {
        any: &'static [&'static str],
    },
}

#[derive(Debug, Clone, Copy)]
pub struct FieldRule {
    pub name: &'static str,
    pub lookup: Lookup,
    pub required: bool,
}

/// Raw extraction output: field name → string. Absent optional fields are
/// simply not present in the map.
#[derive(Debug, Default)]
pub struct RawFields(HashMap<&'static str, String>);

impl RawFields {
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    pub fn required(&self, name: &'static str) -> Result<&str, ScrapeError> {
        self.get(name).ok_or(ScrapeError::MissingField { field: name })
    }
}

/// Apply `rules` to `root` in order. Several rules may share a name to form
/// a fallback chain; the first one that produces a value wins. A required
/// name with no value fails the extraction.
pub fn extract(root: ElementRef<'_>, rules: &[FieldRule]) -> Result<RawFields, ScrapeError> {
    let mut fields: HashMap<&'static str, String> = HashMap::new();

    // Computed once per element, shared by every Text/Payload rule.
    let mut text_cache: Option<String> = None;
    let mut html_cache: Option<String> = None;

    for rule in rules {
        if fields.contains_key(rule.name) {
            continue;
        }
        let value = match &rule.lookup {
            Lookup::Css {
                selector,
                capture,
                pattern,
            } => lookup_css(root, selector, *capture, *pattern),
            Lookup::Text { any } => {
                let text = text_cache
                    .get_or_insert_with(|| flatten_text(root))
                    .as_str();
                first_capture(any, text)
            }
            Lookup::Payload { any } => {
                let html = html_cache.get_or_insert_with(|| root.html()).as_str();
                first_capture(any, html)
            }
        };
        if let Some(v) = value {
            fields.insert(rule.name, v);
        }
    }

    for rule in rules {
        if rule.required && !fields.contains_key(rule.name) {
            return Err(ScrapeError::MissingField { field: rule.name });
        }
    }

    Ok(RawFields(fields))
}

fn lookup_css(
    root: ElementRef<'_>,
    selector: &str,
    capture: Capture,
    pattern: Option<&str>,
) -> Option<String> {
    let sel = Selector::parse(selector).unwrap();
    let node = root.select(&sel).next()?;
    let raw = match capture {
        Capture::Text => flatten_text(node),
        Capture::Attr(attr) => node.value().attr(attr)?.to_string(),
    };
    match pattern {
        Some(p) => capture_group(p, &raw),
        None => non_empty(raw.trim().to_string()),
    }
}

fn first_capture(patterns: &[&str], haystack: &str) -> Option<String> {
    patterns.iter().find_map(|p| capture_group(p, haystack))
}

fn capture_group(pattern: &str, haystack: &str) -> Option<String> {
    let re = Regex::new(pattern).unwrap();
    let caps = re.captures(haystack)?;
    non_empty(caps.get(1)?.as_str().trim().to_string())
}

/// Visible text of the element, NBSP-normalized, tokens joined by spaces.
fn flatten_text(el: ElementRef<'_>) -> String {
    el.text()
        .map(|t| t.replace('\u{a0}', " "))
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

fn non_empty(s: String) -> Option<String> {
    if s.is_empty() {
        None
    } else {
        Some(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scraper::Html;

    const PAGE: &str = r#"
        <html><body>
          <div class="street-address">ул. Шекспира, 10</div>
          <a class="offer" href="/sale/flat/12345/">2-комн. кв., 54&nbsp;м², 5/24&nbsp;эт.</a>
          <script>{"minPrice":"5100000.00","displayName":"Бристоль"}</script>
        </body></html>
    "#;

    fn doc() -> Html {
        Html::parse_document(PAGE)
    }

    #[test]
    fn css_text_lookup() {
        let doc = doc();
        let rules = [FieldRule {
            name: "address",
            lookup: Lookup::Css {
                selector: ".street-address",
                capture: Capture::Text,
                pattern: None,
            },
            required: true,
        }];
        let raw = extract(doc.root_element(), &rules).unwrap();
        assert_eq!(raw.get("address"), Some("ул. Шекспира, 10"));
    }

    #[test]
    fn css_attr_with_pattern() {
        let doc = doc();
        let rules = [FieldRule {
            name: "id",
            lookup: Lookup::Css {
                selector: r#"a[href*="/flat/"]"#,
                capture: Capture::Attr("href"),
                pattern: Some(r"/flat/(\d+)"),
            },
            required: true,
        }];
        let raw = extract(doc.root_element(), &rules).unwrap();
        assert_eq!(raw.get("id"), Some("12345"));
    }

    #[test]
    fn text_lookup_sees_nbsp_as_space() {
        let doc = doc();
        let rules = [FieldRule {
            name: "area",
            lookup: Lookup::Text {
                any: &[r"(\d+[,.]?\d*)\s*м²"],
            },
            required: true,
        }];
        let raw = extract(doc.root_element(), &rules).unwrap();
        assert_eq!(raw.get("area"), Some("54"));
    }

    #[test]
    fn payload_lookup_probes_alternatives_in_order() {
        let doc = doc();
        let rules = [FieldRule {
            name: "price_min",
            lookup: Lookup::Payload {
                any: &[r#""fromDeveloperMinPrice":(\d+)"#, r#""minPrice":"([\d.]+)""#],
            },
            required: true,
        }];
        let raw = extract(doc.root_element(), &rules).unwrap();
        assert_eq!(raw.get("price_min"), Some("5100000.00"));
    }

    #[test]
    fn missing_required_field_errors_with_name() {
        let doc = doc();
        let rules = [FieldRule {
            name: "developer",
            lookup: Lookup::Css {
                selector: ".developer-name",
                capture: Capture::Text,
                pattern: None,
            },
            required: true,
        }];
        let err = extract(doc.root_element(), &rules).unwrap_err();
        match err {
            ScrapeError::MissingField { field } => assert_eq!(field, "developer"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn missing_optional_field_is_just_absent() {
        let doc = doc();
        let rules = [FieldRule {
            name: "developer",
            lookup: Lookup::Css {
                selector: ".developer-name",
                capture: Capture::Text,
                pattern: None,
            },
            required: false,
        }];
        let raw = extract(doc.root_element(), &rules).unwrap();
        assert_eq!(raw.get("developer"), None);
    }

    #[test]
    fn fallback_chain_takes_first_hit() {
        let doc = doc();
        let rules = [
            FieldRule {
                name: "name",
                lookup: Lookup::Css {
                    selector: ".jk-title",
                    capture: Capture::Text,
                    pattern: None,
                },
                required: false,
            },
            FieldRule {
                name: "name",
                lookup: Lookup::Payload {
                    any: &[r#""displayName":"([^"]+)""#],
                },
                required: true,
            },
        ];
        let raw = extract(doc.root_element(), &rules).unwrap();
        assert_eq!(raw.get("name"), Some("Бристоль"));
    }
}
