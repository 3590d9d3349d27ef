use anyhow::Result;
use chrono::Local;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::select;
use tokio::sync::Notify;
use tokio::time::{interval, Duration, MissedTickBehavior};
use tracing::{debug, error, info};

use crate::public::PublicRenderer;
use crate::weather;

/// How often the temperature banner changes
pub const TEMPERATURE_EVERY: Duration = Duration::from_secs(300);

/// Timing and output of the auto-refresh loop
#[derive(Debug, Clone)]
pub struct RefreshOptions {
    pub every: Duration,
    pub temperature_every: Duration,
    /// Page file rewritten after each pass
    pub output: PathBuf,
}

/// Keep the public page fresh until `shutdown` is notified.
///
/// The list is reloaded on every tick of `options.every` (the first tick is
/// immediate) and whenever `visible` is notified, the stand-in for the tab
/// regaining focus. Returns the number of loads performed.
pub async fn run_auto_refresh(
    renderer: &mut PublicRenderer,
    options: RefreshOptions,
    visible: Arc<Notify>,
    shutdown: Arc<Notify>,
) -> Result<u64> {
    let mut reload = interval(options.every);
    reload.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut temperature = interval(options.temperature_every);
    temperature.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let mut loads = 0u64;
    info!(every = ?options.every, output = %options.output.display(), "auto refresh started");

    loop {
        select! {
            _ = reload.tick() => {
                debug!("refresh: timer tick");
            }
            _ = visible.notified() => {
                info!("refresh: page visible again, reloading");
            }
            _ = temperature.tick() => {
                let banner = weather::sample_temperature(&mut rand::thread_rng());
                if let Err(e) = renderer.update_temperature(&banner) {
                    error!(error = %e, "failed to update temperature");
                }
                write_page(renderer, &options).await;
                continue;
            }
            _ = shutdown.notified() => {
                info!("refresh: shutdown requested, exiting loop");
                break;
            }
        }

        let outcome = renderer.load().await;
        loads += 1;
        debug!(?outcome, loads, "refresh: load finished");
        write_page(renderer, &options).await;
    }

    Ok(loads)
}

async fn write_page(renderer: &mut PublicRenderer, options: &RefreshOptions) {
    renderer.refresh_theme();
    if let Err(e) = renderer.update_clock(&Local::now()) {
        error!(error = %e, "failed to update clock");
    }
    if let Err(e) = renderer.document().write_to(&options.output).await {
        error!(error = %e, "failed to write page");
    }
}
