//! Pass scheduling: one-shot by default, fixed-interval loop when enabled.

use std::time::Duration;

use tokio::sync::watch;
use tracing::{error, info};

use crate::config::Config;
use crate::models::ParseResult;
use crate::scrapers::error::ScrapeError;

/// Drive `pass` according to the configuration.
///
/// Non-loop mode runs exactly one pass, emits its snapshot and returns the
/// pass error, if any, to the caller. Loop mode emits or logs each outcome
/// and sleeps `loop_interval` between passes; a failed pass never stops the
/// loop. `shutdown` is checked after every pass and interrupts the sleep,
/// which keeps loop tests finite.
pub async fn run<F>(
    config: &Config,
    mut shutdown: watch::Receiver<bool>,
    mut pass: F,
) -> anyhow::Result<()>
where
    F: FnMut() -> Result<ParseResult, ScrapeError>,
{
    if !config.loop_enabled {
        let result = pass()?;
        emit(&result)?;
        return Ok(());
    }

    info!(interval_secs = config.loop_interval_secs, "loop mode");
    loop {
        match pass() {
            Ok(result) => {
                info!(flats = result.flats_count, "pass succeeded");
                if let Err(e) = emit(&result) {
                    error!(error = %e, "failed to emit snapshot");
                }
            }
            Err(e) => error!(error = %e, "pass failed"),
        }

        if *shutdown.borrow() {
            break;
        }
        tokio::select! {
            _ = tokio::time::sleep(Duration::from_secs(config.loop_interval_secs)) => {}
            changed = shutdown.changed() => {
                if changed.is_err() || *shutdown.borrow() {
                    break;
                }
            }
        }
    }

    info!("loop stopped");
    Ok(())
}

fn emit(result: &ParseResult) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(result)?);
    Ok(())
}
