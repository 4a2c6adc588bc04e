//! Pure string → typed-value conversions for extracted fields.
//!
//! Numbers on CIAN arrive with NBSP thousands separators, currency signs
//! and unit suffixes ("5 100 000 ₽", "2,7 м"); statuses arrive in free
//! form. Required fields fail loudly; optional ones degrade to `None`.

use tracing::warn;

use crate::scrapers::error::ScrapeError;

/// Parse a required integer field. Decimal commas are accepted and the
/// fractional part is truncated ("5100000.00" → 5100000).
pub fn int_field(field: &'static str, raw: &str) -> Result<i64, ScrapeError> {
    float_field(field, raw).map(|v| v as i64)
}

/// Parse a required float field, normalizing the decimal comma.
pub fn float_field(field: &'static str, raw: &str) -> Result<f64, ScrapeError> {
    let cleaned: String = raw
        .replace(',', ".")
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.')
        .collect();
    cleaned
        .parse()
        .map_err(|_| ScrapeError::Normalization {
            field,
            value: raw.to_string(),
        })
}

/// Optional integer: absent or unparseable input becomes `None`.
pub fn opt_int(field: &'static str, raw: Option<&str>) -> Option<i64> {
    raw.and_then(|v| match int_field(field, v) {
        Ok(n) => Some(n),
        Err(_) => {
            warn!(field, value = v, "unparseable optional field, dropping");
            None
        }
    })
}

/// Optional float: absent or unparseable input becomes `None`.
pub fn opt_float(field: &'static str, raw: Option<&str>) -> Option<f64> {
    raw.and_then(|v| match float_field(field, v) {
        Ok(n) => Some(n),
        Err(_) => {
            warn!(field, value = v, "unparseable optional field, dropping");
            None
        }
    })
}

/// Room count from a card title. "Студия" counts as 0.
pub fn rooms(raw: &str) -> i64 {
    if raw.to_lowercase().contains("студия") {
        return 0;
    }
    raw.chars()
        .skip_while(|c| !c.is_ascii_digit())
        .take_while(|c| c.is_ascii_digit())
        .collect::<String>()
        .parse()
        .unwrap_or(0)
}

/// House status lookup table. Unrecognized text passes through as-is and
/// is flagged in the log.
pub fn house_status(raw: &str) -> String {
    let lower = raw.trim().to_lowercase();
    if lower.contains("сдан") {
        "Сдан".to_string()
    } else if lower.contains("строит") {
        "Строится".to_string()
    } else {
        warn!(status = raw, "unrecognized house status, passing through");
        raw.trim().to_string()
    }
}

/// Undo the JSON escaping CIAN payloads use for urls and guillemets.
pub fn decode_payload(raw: &str) -> String {
    raw.replace("\\u002F", "/")
        .replace("\\u00ab", "«")
        .replace("\\u00bb", "»")
}
