use crate::scrapers::error::ScrapeError;

/// Page-fetch boundary of the pipeline. The live implementation drives a
/// headless browser; tests substitute canned HTML fixtures.
pub trait PageSource {
    /// Navigate to `url` and return the rendered document HTML.
    fn fetch(&mut self, url: &str) -> Result<String, ScrapeError>;
}
