use std::ffi::OsStr;
use std::sync::Arc;
use std::time::Duration;

use headless_chrome::{Browser, LaunchOptions, Tab};
use tracing::{debug, info};

use crate::config::Config;
use crate::scrapers::error::ScrapeError;
use crate::scrapers::traits::PageSource;

/// One headless Chrome instance scoped to a single parse pass. Dropping
/// the session terminates the browser process, so it is released on every
/// exit path.
pub struct BrowserSession {
    // Held alive for the tab's lifetime.
    _browser: Browser,
    tab: Arc<Tab>,
}

impl BrowserSession {
    pub fn launch(config: &Config) -> Result<Self, ScrapeError> {
        info!(headless = config.headless, "launching browser");

        let options = LaunchOptions::default_builder()
            .headless(config.headless)
            .window_size(Some((1400, 900)))
            .args(vec![OsStr::new("--disable-blink-features=AutomationControlled")])
            .build()
            .map_err(|e| ScrapeError::Browser(e.to_string()))?;

        let browser = Browser::new(options).map_err(|e| ScrapeError::Browser(e.to_string()))?;
        let tab = browser
            .new_tab()
            .map_err(|e| ScrapeError::Browser(e.to_string()))?;

        tab.set_default_timeout(Duration::from_millis(config.timeout_ms));
        tab.set_user_agent(&config.user_agent, None, None)
            .map_err(|e| ScrapeError::Browser(e.to_string()))?;

        Ok(Self {
            _browser: browser,
            tab,
        })
    }
}

impl PageSource for BrowserSession {
    fn fetch(&mut self, url: &str) -> Result<String, ScrapeError> {
        info!(url, "navigating");

        self.tab
            .navigate_to(url)
            .map_err(|e| ScrapeError::navigation(url, e))?;
        self.tab
            .wait_until_navigated()
            .map_err(|e| ScrapeError::navigation(url, e))?;

        let result = self
            .tab
            .evaluate("document.documentElement.outerHTML", false)
            .map_err(|e| ScrapeError::navigation(url, e))?;

        let html = result
            .value
            .as_ref()
            .and_then(|v| v.as_str())
            .map(str::to_string)
            .ok_or_else(|| ScrapeError::navigation(url, "empty document"))?;

        debug!(url, bytes = html.len(), "page loaded");
        Ok(html)
    }
}
