// Full-pass tests against canned HTML fixtures, no live browser.

use jk_parser::config::Config;
use jk_parser::models::{Flat, ParseResult};
use jk_parser::scrapers::flats::CardPolicy;
use jk_parser::scrapers::{CianJkScraper, PageSource, ScrapeError};

/// Serves canned pages in fetch order and records the requested URLs.
struct FixtureSource {
    pages: Vec<Result<String, ScrapeError>>,
    requested: Vec<String>,
}

impl FixtureSource {
    fn new(pages: Vec<Result<String, ScrapeError>>) -> Self {
        Self {
            pages,
            requested: Vec::new(),
        }
    }
}

impl PageSource for FixtureSource {
    fn fetch(&mut self, url: &str) -> Result<String, ScrapeError> {
        self.requested.push(url.to_string());
        if self.pages.is_empty() {
            panic!("unexpected fetch of {url}");
        }
        self.pages.remove(0)
    }
}

const JK_PAYLOAD: &str = r#"
    "newobject":[4321],
    "displayName":"ЖК «Бристоль»",
    "buildingStatusInfo":{"id":2,"name":"Строится"},
    "builders":[{"id":77,"name":"ГК Пример"}],
    "fromDeveloperMinPrice":4100000,
    "fromDeveloperMaxPrice":12500000,
    "minPriceForMeterFromDeveloperValue":180000,
    "priceForMeterFromDeveloperDisplay":"от 210 500 ₽/м²",
    "completionYear":2026,
    "newbuildingClass":"Комфорт",
    "materials":["монолит"],
    "floor":{"minFloors":9,"maxFloors":24},
    "shortSpecifications":[
        {"title":"Корпуса","value":"4"},
        {"title":"Отделка","value":"Чистовая"},
        {"title":"Потолки","value":"2,7 м"}
    ],
    "parking":[{"type":"underground","title":"Подземная"}]
"#;

fn jk_page() -> String {
    format!(
        r#"<html><body>
             <div class="street-address">ул. Шекспира, 1</div>
             <script>window._cianConfig = {{{JK_PAYLOAD}}};</script>
           </body></html>"#
    )
}

fn jk_page_without_prices() -> String {
    jk_page()
        .replace(r#""fromDeveloperMinPrice":4100000,"#, "")
        .replace(r#""fromDeveloperMaxPrice":12500000,"#, "")
}

fn card(id: u64, title: &str, price: &str) -> String {
    format!(
        r#"<div data-name="LinkArea">
             <a href="/sale/flat/{id}/">{title}</a>
             <span data-mark="MainPrice">{price}</span>
           </div>"#
    )
}

fn catalog_page(cards: &[String]) -> String {
    format!("<html><body>{}</body></html>", cards.join("\n"))
}

fn scraper() -> CianJkScraper {
    CianJkScraper::new(Config::default())
}

#[test]
fn full_pass_builds_complete_snapshot() {
    let catalog = catalog_page(&[
        card(101, "2-комн. кв., 54,3 м², 5/24 эт., дом сдан", "8 100 000 ₽"),
        card(102, "Студия, 24 м², 2/9 эт.", "4 100 000 ₽"),
    ]);
    let mut source = FixtureSource::new(vec![Ok(jk_page()), Ok(catalog)]);

    let result = scraper().parse_with(&mut source).unwrap();

    // development metadata
    assert_eq!(result.jk.id, "4321");
    assert_eq!(result.jk.name, "ЖК «Бристоль»");
    assert_eq!(result.jk.status.as_deref(), Some("Строится"));
    assert_eq!(result.jk.address.as_deref(), Some("ул. Шекспира, 1"));
    assert_eq!(result.jk.developer.as_deref(), Some("ГК Пример"));
    assert_eq!(result.jk.price_min, 4_100_000);
    assert_eq!(result.jk.price_max, 12_500_000);
    assert_eq!(result.jk.price_per_m2_min, Some(180_000));
    assert_eq!(result.jk.price_per_m2_max, Some(210_500));
    assert_eq!(result.jk.building_class.as_deref(), Some("Комфорт"));
    assert_eq!(result.jk.building_type.as_deref(), Some("Монолит"));
    assert_eq!(result.jk.floors.as_deref(), Some("9-24"));
    assert_eq!(result.jk.buildings_count, Some(4));
    assert_eq!(result.jk.ceiling_height, Some(2.7));
    assert_eq!(result.jk.finishing.as_deref(), Some("Чистовая"));
    assert_eq!(result.jk.parking.as_deref(), Some("Подземная"));
    assert_eq!(result.jk.year_built, Some(2026));

    // flats, in document order
    assert_eq!(result.flats_count, result.flats.len());
    assert_eq!(result.flats_count, 2);
    assert_eq!(result.flats[0].id, "101");
    assert_eq!(result.flats[1].id, "102");
    assert_eq!(result.flats[1].rooms, 0);

    // derived price is consistent with the rounding rule
    for flat in &result.flats {
        assert_eq!(flat.price_per_m2, Flat::price_per_m2(flat.price, flat.area));
    }

    // the catalog request carried the extracted development id
    assert_eq!(source.requested.len(), 2);
    assert!(source.requested[1].contains("newobject%5B0%5D=4321"));
}

#[test]
fn zero_cards_is_a_valid_pass() {
    let mut source = FixtureSource::new(vec![Ok(jk_page()), Ok(catalog_page(&[]))]);
    let result = scraper().parse_with(&mut source).unwrap();
    assert!(result.flats.is_empty());
    assert_eq!(result.flats_count, 0);
}

#[test]
fn missing_development_prices_fail_the_pass() {
    let mut source = FixtureSource::new(vec![Ok(jk_page_without_prices())]);
    let err = scraper().parse_with(&mut source).unwrap_err();
    assert!(matches!(
        err,
        ScrapeError::MissingField { field: "price_min" }
    ));
    // the catalog page was never requested
    assert_eq!(source.requested.len(), 1);
}

#[test]
fn navigation_failure_propagates() {
    let mut source = FixtureSource::new(vec![Err(ScrapeError::navigation(
        "https://zhk-bristol-i.cian.ru/",
        "timed out after 1ms",
    ))]);
    let err = scraper().parse_with(&mut source).unwrap_err();
    assert!(matches!(err, ScrapeError::Navigation { .. }));
}

#[test]
fn abort_policy_fails_the_pass_on_a_broken_card() {
    let broken =
        r#"<div data-name="LinkArea"><a href="/sale/flat/5/">1-комн. кв., 36 м²</a></div>"#;
    let catalog = catalog_page(&[broken.to_string()]);
    let mut source = FixtureSource::new(vec![Ok(jk_page()), Ok(catalog)]);

    let strict = CianJkScraper::new(Config::default()).with_policy(CardPolicy::Abort);
    let err = strict.parse_with(&mut source).unwrap_err();
    assert!(matches!(err, ScrapeError::MissingField { field: "price" }));
}

#[test]
fn snapshot_round_trips_through_json() {
    let catalog = catalog_page(&[card(101, "2-комн. кв., 54,3 м², 5/24 эт.", "8 100 000 ₽")]);
    let mut source = FixtureSource::new(vec![Ok(jk_page()), Ok(catalog)]);
    let result = scraper().parse_with(&mut source).unwrap();

    let json = serde_json::to_string_pretty(&result).unwrap();
    let back: ParseResult = serde_json::from_str(&json).unwrap();
    assert_eq!(back, result);

    // emitted shape uses the agreed field names
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert!(value.get("jk").is_some());
    assert!(value.get("flats").is_some());
    assert_eq!(value["flats_count"], 1);
    assert!(value.get("parsed_at").is_some());
}
