//! Unit-card aggregation: find every flat card on the catalog page and turn
//! each one into a [`Flat`], in document order.

use std::collections::HashSet;

use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use tracing::{debug, info, warn};

use crate::models::{Flat, Jk};
use crate::scrapers::error::ScrapeError;
use crate::scrapers::extract::{extract, Capture, FieldRule, Lookup};
use crate::scrapers::normalize;

const NO_OFFERS_MARKER: &str = "Нет подходящих объявлений";

const CARD_SELECTOR: &str = r#"[data-name="LinkArea"]"#;
const CARD_SELECTOR_FALLBACK: &str = r#"article[data-name="CardComponent"]"#;

const FLAT_RULES: &[FieldRule] = &[
    FieldRule {
        name: "url",
        lookup: Lookup::Css {
            selector: r#"a[href*="/flat/"]"#,
            capture: Capture::Attr("href"),
            pattern: None,
        },
        required: true,
    },
    FieldRule {
        name: "id",
        lookup: Lookup::Css {
            selector: r#"a[href*="/flat/"]"#,
            capture: Capture::Attr("href"),
            pattern: Some(r"/flat/(\d+)"),
        },
        required: true,
    },
    FieldRule {
        name: "rooms",
        lookup: Lookup::Text {
            any: &[r"(\d+)-комн", r"(?i)(студия)"],
        },
        required: false,
    },
    FieldRule {
        name: "area",
        lookup: Lookup::Text {
            any: &[r"(\d+[,.]?\d*)\s*м²"],
        },
        required: true,
    },
    FieldRule {
        name: "floor",
        lookup: Lookup::Text {
            any: &[r"(\d+)\s*/\s*\d+\s*эт", r"(\d+)\s*из\s*\d+\s*эт"],
        },
        required: false,
    },
    FieldRule {
        name: "floors_total",
        lookup: Lookup::Text {
            any: &[r"\d+\s*/\s*(\d+)\s*эт", r"\d+\s*из\s*(\d+)\s*эт"],
        },
        required: false,
    },
    FieldRule {
        name: "price",
        lookup: Lookup::Text {
            any: &[r"([\d\s]+\d)\s*₽"],
        },
        required: false,
    },
    FieldRule {
        name: "price",
        lookup: Lookup::Css {
            selector: r#"[data-mark="MainPrice"]"#,
            capture: Capture::Text,
            pattern: Some(r"([\d\s]+\d)"),
        },
        required: true,
    },
    FieldRule {
        name: "address",
        lookup: Lookup::Css {
            selector: r#"[data-name="AddressItem"]"#,
            capture: Capture::Text,
            pattern: None,
        },
        required: false,
    },
    FieldRule {
        name: "status",
        lookup: Lookup::Text {
            any: &[r"(?i)(дом сдан)", r"(?i)(строится)"],
        },
        required: false,
    },
];

/// What to do when a single card fails extraction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CardPolicy {
    /// Log, drop the card, keep the pass alive. Default.
    Skip,
    /// Fail the whole pass.
    Abort,
}

/// Collect every flat on the catalog page. Returns the flats in document
/// order plus the number of cards dropped under [`CardPolicy::Skip`].
pub fn collect(html: &str, jk: &Jk, policy: CardPolicy) -> Result<(Vec<Flat>, usize), ScrapeError> {
    if html.contains(NO_OFFERS_MARKER) {
        warn!("catalog page reports no matching offers");
        return Ok((Vec::new(), 0));
    }

    let doc = Html::parse_document(html);
    let primary = Selector::parse(CARD_SELECTOR).unwrap();
    let fallback = Selector::parse(CARD_SELECTOR_FALLBACK).unwrap();

    let mut cards: Vec<ElementRef<'_>> = doc.select(&primary).collect();
    if cards.is_empty() {
        cards = doc.select(&fallback).collect();
    }
    info!(cards = cards.len(), "cards found");

    let own_ids = own_flat_ids(html, &jk.id);

    let mut flats = Vec::new();
    let mut skipped = 0;
    for card in cards {
        match build_flat(card, jk) {
            Ok(flat) => {
                if !own_ids.is_empty() && !own_ids.contains(&flat.id) {
                    debug!(id = %flat.id, "card belongs to another development");
                    continue;
                }
                flats.push(flat);
            }
            Err(e) => match policy {
                CardPolicy::Skip => {
                    warn!(error = %e, "card failed extraction, skipping");
                    skipped += 1;
                }
                CardPolicy::Abort => return Err(e),
            },
        }
    }

    Ok((flats, skipped))
}

/// Offer ids the page attributes to this development. CIAN card payloads
/// carry a cianId/parentId pair; an empty result means the mapping was not
/// present and no filtering should happen.
fn own_flat_ids(html: &str, jk_id: &str) -> HashSet<String> {
    let re = Regex::new(r#""cianId":(\d+)[^}]*?"parentId":(\d+)"#).unwrap();
    re.captures_iter(html)
        .filter(|caps| &caps[2] == jk_id)
        .map(|caps| caps[1].to_string())
        .collect()
}

fn build_flat(card: ElementRef<'_>, jk: &Jk) -> Result<Flat, ScrapeError> {
    let raw = extract(card, FLAT_RULES)?;

    let price = normalize::int_field("price", raw.required("price")?)?;
    let area = normalize::float_field("area", raw.required("area")?)?;

    let address = raw
        .get("address")
        .map(str::to_string)
        .or_else(|| jk.address.clone());
    let house_status = raw
        .get("status")
        .map(normalize::house_status)
        .or_else(|| jk.status.clone());

    Ok(Flat {
        id: raw.required("id")?.to_string(),
        url: absolute_url(raw.required("url")?),
        rooms: raw.get("rooms").map(normalize::rooms).unwrap_or(0),
        area,
        floor: normalize::opt_int("floor", raw.get("floor")),
        floors_total: normalize::opt_int("floors_total", raw.get("floors_total")),
        price,
        price_per_m2: Flat::price_per_m2(price, area),
        address,
        year_built: jk.year_built,
        house_status,
    })
}

fn absolute_url(href: &str) -> String {
    if href.starts_with('/') {
        format!("https://www.cian.ru{href}")
    } else {
        href.to_string()
    }
}
