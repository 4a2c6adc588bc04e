//! One full parse pass: development (ЖК) metadata off the landing page,
//! then the flat catalog built from the development id.

use scraper::Html;
use tracing::{info, warn};

use crate::config::Config;
use crate::models::{Jk, ParseResult};
use crate::scrapers::browser::BrowserSession;
use crate::scrapers::error::ScrapeError;
use crate::scrapers::extract::{extract, Capture, FieldRule, Lookup};
use crate::scrapers::flats::{self, CardPolicy};
use crate::scrapers::normalize;
use crate::scrapers::traits::PageSource;

/// Development fields mostly live in inline JSON payloads on the landing
/// page; the id is probed with every shape CIAN has been seen to use.
const JK_RULES: &[FieldRule] = &[
    FieldRule {
        name: "newobject_id",
        lookup: Lookup::Payload {
            any: &[
                r"newobject%5B0%5D=(\d+)",
                r#""newobject":\[(\d+)\]"#,
                r#"newobject_id["']?:\s*(\d+)"#,
                r#""id":(\d+).*?"type":"newobject""#,
            ],
        },
        required: true,
    },
    FieldRule {
        name: "name",
        lookup: Lookup::Payload {
            any: &[r#""displayName":"([^"]+)""#],
        },
        required: true,
    },
    FieldRule {
        name: "status",
        lookup: Lookup::Payload {
            any: &[r#""buildingStatusInfo":\{[^}]*"name":"([^"]+)""#],
        },
        required: false,
    },
    FieldRule {
        name: "address",
        lookup: Lookup::Css {
            selector: ".street-address",
            capture: Capture::Text,
            pattern: None,
        },
        required: false,
    },
    FieldRule {
        name: "developer",
        lookup: Lookup::Payload {
            any: &[r#""builders":\[\{"[^}]*"name":"([^"]+)""#],
        },
        required: false,
    },
    FieldRule {
        name: "price_min",
        lookup: Lookup::Payload {
            any: &[
                r#""fromDeveloperMinPrice":(\d+)"#,
                r#""minPrice":"([\d.]+)""#,
            ],
        },
        required: true,
    },
    FieldRule {
        name: "price_max",
        lookup: Lookup::Payload {
            any: &[
                r#""fromDeveloperMaxPrice":(\d+)"#,
                r#""maxPrice":"([\d.]+)""#,
            ],
        },
        required: true,
    },
    FieldRule {
        name: "price_per_m2_min",
        lookup: Lookup::Payload {
            any: &[r#""minPriceForMeterFromDeveloperValue":(\d+)"#],
        },
        required: false,
    },
    FieldRule {
        name: "price_per_m2_max",
        lookup: Lookup::Payload {
            any: &[r#""priceForMeterFromDeveloperDisplay":"[^"]*?(\d[\d\s]*\d)\s*₽"#],
        },
        required: false,
    },
    FieldRule {
        name: "year_built",
        lookup: Lookup::Payload {
            any: &[r#""completionYear":(\d{4})"#],
        },
        required: false,
    },
    FieldRule {
        name: "building_class",
        lookup: Lookup::Payload {
            any: &[r#""newbuildingClass":"([^"]+)""#],
        },
        required: false,
    },
    FieldRule {
        name: "building_type",
        lookup: Lookup::Payload {
            any: &[r#""materials":\["([^"]+)""#],
        },
        required: false,
    },
    FieldRule {
        name: "floors_min",
        lookup: Lookup::Payload {
            any: &[r#""floor":\{"minFloors":(\d+)"#],
        },
        required: false,
    },
    FieldRule {
        name: "floors_max",
        lookup: Lookup::Payload {
            any: &[r#""minFloors":\d+,"maxFloors":(\d+)"#],
        },
        required: false,
    },
    FieldRule {
        name: "buildings_count",
        lookup: Lookup::Payload {
            any: &[r#""title":"Корпуса","value":"(\d+)""#],
        },
        required: false,
    },
    FieldRule {
        name: "finishing",
        lookup: Lookup::Payload {
            any: &[r#""title":"Отделка","value":"([^"]+)""#],
        },
        required: false,
    },
    FieldRule {
        name: "ceiling_height",
        lookup: Lookup::Payload {
            any: &[r#""title":"Потолки","value":"([^"]+)""#],
        },
        required: false,
    },
    FieldRule {
        name: "parking",
        lookup: Lookup::Payload {
            any: &[r#""parking":\[\{"[^}]*"title":"([^"]+)""#],
        },
        required: false,
    },
];

/// Scraper for one CIAN development page and its flat catalog.
pub struct CianJkScraper {
    config: Config,
    policy: CardPolicy,
}

impl CianJkScraper {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            policy: CardPolicy::Skip,
        }
    }

    pub fn with_policy(mut self, policy: CardPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Run one full pass with a live browser. The browser is scoped to
    /// this call and dropped on every exit path.
    pub fn parse(&self) -> Result<ParseResult, ScrapeError> {
        let mut session = BrowserSession::launch(&self.config)?;
        self.parse_with(&mut session)
    }

    /// Pass logic against any page source; tests feed HTML fixtures here.
    pub fn parse_with(&self, source: &mut dyn PageSource) -> Result<ParseResult, ScrapeError> {
        info!(url = %self.config.jk_url, "parse pass started");

        let jk_html = source.fetch(&self.config.jk_url)?;
        let jk = self.build_jk(&jk_html)?;
        info!(id = %jk.id, name = %jk.name, "development metadata extracted");

        let flats_html = source.fetch(&catalog_url(&jk.id))?;
        let (flats, skipped) = flats::collect(&flats_html, &jk, self.policy)?;
        if skipped > 0 {
            warn!(skipped, "cards dropped during aggregation");
        }

        let result = ParseResult::new(jk, flats);
        info!(flats = result.flats_count, "parse pass complete");
        Ok(result)
    }

    fn build_jk(&self, html: &str) -> Result<Jk, ScrapeError> {
        let doc = Html::parse_document(html);
        let raw = extract(doc.root_element(), JK_RULES)?;

        let floors = match (raw.get("floors_min"), raw.get("floors_max")) {
            (Some(min), Some(max)) if min != max => Some(format!("{min}-{max}")),
            (Some(min), _) => Some(min.to_string()),
            _ => None,
        };

        Ok(Jk {
            id: raw.required("newobject_id")?.to_string(),
            name: normalize::decode_payload(raw.required("name")?),
            url: self.config.jk_url.clone(),
            status: raw.get("status").map(normalize::house_status),
            address: raw.get("address").map(str::to_string),
            developer: raw.get("developer").map(str::to_string),
            price_min: normalize::int_field("price_min", raw.required("price_min")?)?,
            price_max: normalize::int_field("price_max", raw.required("price_max")?)?,
            price_per_m2_min: normalize::opt_int("price_per_m2_min", raw.get("price_per_m2_min")),
            price_per_m2_max: normalize::opt_int("price_per_m2_max", raw.get("price_per_m2_max")),
            building_class: raw.get("building_class").map(str::to_string),
            building_type: raw.get("building_type").map(capitalize),
            floors,
            buildings_count: normalize::opt_int("buildings_count", raw.get("buildings_count")),
            ceiling_height: normalize::opt_float("ceiling_height", raw.get("ceiling_height")),
            finishing: raw.get("finishing").map(str::to_string),
            parking: raw.get("parking").map(str::to_string),
            year_built: normalize::opt_int("year_built", raw.get("year_built")),
        })
    }
}

/// Catalog of every developer offer in the development, single page.
fn catalog_url(newobject_id: &str) -> String {
    format!(
        "https://www.cian.ru/cat.php\
         ?deal_type=sale&engine_version=2&offer_type=flat\
         &from_developer=1&newobject%5B0%5D={newobject_id}"
    )
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) => c.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalog_url_embeds_development_id() {
        let url = catalog_url("12345");
        assert!(url.contains("newobject%5B0%5D=12345"));
        assert!(url.starts_with("https://www.cian.ru/cat.php?"));
    }

    #[test]
    fn capitalize_handles_cyrillic() {
        assert_eq!(capitalize("монолит"), "Монолит");
        assert_eq!(capitalize(""), "");
    }
}
