use jk_parser::config::Config;
use jk_parser::runner;
use jk_parser::scrapers::CianJkScraper;

use tokio::sync::watch;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = Config::from_env()?;
    let scraper = CianJkScraper::new(config.clone());

    // Ctrl-C flips the shutdown flag; the loop drains at the next sleep
    // boundary, after the in-flight pass has released its browser.
    let (tx, rx) = watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            let _ = tx.send(true);
        }
    });

    runner::run(&config, rx, || scraper.parse()).await
}
