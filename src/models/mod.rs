use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Development (ЖК) metadata, one record per parse pass.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Jk {
    pub id: String,
    pub name: String,
    pub url: String,
    pub status: Option<String>,
    pub address: Option<String>,
    pub developer: Option<String>,
    pub price_min: i64,
    pub price_max: i64,
    pub price_per_m2_min: Option<i64>,
    pub price_per_m2_max: Option<i64>,
    pub building_class: Option<String>,
    pub building_type: Option<String>,
    /// Floor span as shown on the page, e.g. "9-24".
    pub floors: Option<String>,
    pub buildings_count: Option<i64>,
    pub ceiling_height: Option<f64>,
    pub finishing: Option<String>,
    pub parking: Option<String>,
    pub year_built: Option<i64>,
}

/// A single flat offer belonging to the development.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Flat {
    pub id: String,
    pub url: String,
    /// 0 means studio.
    pub rooms: i64,
    /// Living area in square meters.
    pub area: f64,
    pub floor: Option<i64>,
    pub floors_total: Option<i64>,
    pub price: i64,
    pub price_per_m2: i64,
    pub address: Option<String>,
    pub year_built: Option<i64>,
    pub house_status: Option<String>,
}

impl Flat {
    /// Price per square meter, rounded half-up. Zero area yields zero
    /// rather than a division error.
    pub fn price_per_m2(price: i64, area: f64) -> i64 {
        if area > 0.0 {
            (price as f64 / area).round() as i64
        } else {
            0
        }
    }
}

/// The sole artifact of a pass: one development, its flats, and a timestamp.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ParseResult {
    pub jk: Jk,
    pub flats: Vec<Flat>,
    pub flats_count: usize,
    pub parsed_at: DateTime<Utc>,
}

impl ParseResult {
    pub fn new(jk: Jk, flats: Vec<Flat>) -> Self {
        Self {
            flats_count: flats.len(),
            jk,
            flats,
            parsed_at: Utc::now(),
        }
    }
}
