use std::env;

const DEFAULT_JK_URL: &str = "https://zhk-bristol-i.cian.ru/";

const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
     AppleWebKit/537.36 (KHTML, like Gecko) \
     Chrome/120.0.0.0 Safari/537.36";

/// Runtime configuration, read once at startup and immutable afterwards.
#[derive(Debug, Clone)]
pub struct Config {
    /// Development (ЖК) landing page to scrape.
    pub jk_url: String,
    pub headless: bool,
    /// Per-navigation timeout in milliseconds.
    pub timeout_ms: u64,
    pub loop_enabled: bool,
    /// Pause between passes in loop mode, seconds.
    pub loop_interval_secs: u64,
    pub user_agent: String,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        Ok(Self {
            jk_url: env::var("JK_URL").unwrap_or_else(|_| DEFAULT_JK_URL.to_string()),
            headless: parse_bool(env::var("HEADLESS").ok(), true),
            timeout_ms: parse_num(env::var("TIMEOUT").ok(), "TIMEOUT", 60_000)?,
            loop_enabled: parse_bool(env::var("LOOP_ENABLED").ok(), false),
            loop_interval_secs: parse_num(env::var("LOOP_INTERVAL").ok(), "LOOP_INTERVAL", 3_600)?,
            user_agent: env::var("USER_AGENT").unwrap_or_else(|_| DEFAULT_USER_AGENT.to_string()),
        })
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            jk_url: DEFAULT_JK_URL.to_string(),
            headless: true,
            timeout_ms: 60_000,
            loop_enabled: false,
            loop_interval_secs: 3_600,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

fn parse_bool(value: Option<String>, default: bool) -> bool {
    match value {
        Some(v) => matches!(v.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes"),
        None => default,
    }
}

fn parse_num(value: Option<String>, name: &str, default: u64) -> anyhow::Result<u64> {
    match value {
        Some(v) => v
            .trim()
            .parse()
            .map_err(|e| anyhow::anyhow!("invalid {name}: {e}")),
        None => Ok(default),
    }
}
