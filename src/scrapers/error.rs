use thiserror::Error;

/// Everything that can sink a parse pass (or a single card).
#[derive(Debug, Error)]
pub enum ScrapeError {
    /// Browser could not be launched or configured.
    #[error("browser error: {0}")]
    Browser(String),

    /// Page failed to load within the configured timeout.
    #[error("navigation to {url} failed: {reason}")]
    Navigation { url: String, reason: String },

    /// A required field's node or payload value was not found.
    #[error("required field missing: {field}")]
    MissingField { field: &'static str },

    /// A required field was found but its value could not be parsed.
    #[error("field {field}: cannot parse {value:?}")]
    Normalization { field: &'static str, value: String },
}

impl ScrapeError {
    pub fn navigation(url: impl Into<String>, reason: impl ToString) -> Self {
        Self::Navigation {
            url: url.into(),
            reason: reason.to_string(),
        }
    }
}
