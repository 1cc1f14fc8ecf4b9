//! Watch command - poll on an interval and print the status line as it changes.

use std::time::Duration;

use anyhow::{Context, Result};
use clap::Args;
use cursorbar_core::UsageRenderer;
use cursorbar_store::{MIN_CHECK_INTERVAL_SECS, RefreshState, SettingsStore, UsageStore};
use tokio::time::MissedTickBehavior;
use tracing::{info, warn};

use super::controller_for;
use crate::output::{JsonFormatter, StatusLine};
use crate::{Cli, OutputFormat};

/// Arguments for the watch command.
#[derive(Args, Default)]
pub struct WatchArgs {
    /// Seconds between checks (defaults to the configured interval).
    #[arg(long, short)]
    pub interval: Option<u64>,
}

/// Interval to poll at: flag first, then settings, never below the minimum.
fn effective_interval(args: &WatchArgs, configured: Duration) -> Duration {
    match args.interval {
        Some(secs) if secs < MIN_CHECK_INTERVAL_SECS => {
            warn!(
                requested = secs,
                min = MIN_CHECK_INTERVAL_SECS,
                "Interval too short, using minimum"
            );
            Duration::from_secs(MIN_CHECK_INTERVAL_SECS)
        }
        Some(secs) => Duration::from_secs(secs),
        None => configured,
    }
}

/// Current line to show for the store's state.
async fn snapshot(store: &UsageStore, format: OutputFormat, pretty: bool) -> String {
    let record = store.record().await;
    let error = store.last_error().await;
    let fetching = store.state().await == RefreshState::Fetching;

    match format {
        OutputFormat::Text => match (record, error) {
            (_, Some(e)) => StatusLine.render_error(&e),
            (Some(r), None) => StatusLine.render(&r),
            (None, None) if fetching => StatusLine::loading(),
            (None, None) => String::new(),
        },
        OutputFormat::Json => {
            let json = JsonFormatter::new(pretty);
            match (record, error) {
                (_, Some(e)) => json.render_error(&e),
                (Some(r), None) => json.render(&r),
                (None, None) => String::new(),
            }
        }
    }
}

/// How often the settings file is checked for edits.
const SETTINGS_POLL_INTERVAL: Duration = Duration::from_secs(5);

/// Why one polling session ended.
enum SessionEnd {
    Interrupted,
    SettingsChanged,
}

/// Runs the watch command until Ctrl+C.
///
/// Edits to the settings file (for example from `cursorbar config` in
/// another terminal) restart polling with the new credentials and interval.
pub async fn run(args: &WatchArgs, cli: &Cli, store: &SettingsStore) -> Result<()> {
    let interrupted = async {
        tokio::signal::ctrl_c()
            .await
            .context("Failed to listen for Ctrl+C")
    };
    run_until(args, cli, store, interrupted).await.map(|_| ())
}

/// Polls until `shutdown` resolves and returns how many polling sessions
/// were started.
async fn run_until(
    args: &WatchArgs,
    cli: &Cli,
    store: &SettingsStore,
    shutdown: impl Future<Output = Result<()>>,
) -> Result<usize> {
    tokio::pin!(shutdown);
    let mut settings_changes = store.subscribe();
    let mut file_poll = tokio::time::interval(SETTINGS_POLL_INTERVAL);
    file_poll.set_missed_tick_behavior(MissedTickBehavior::Delay);
    file_poll.reset();

    let mut sessions = 0_usize;
    loop {
        sessions += 1;
        let settings = store.get().await;
        let interval = effective_interval(args, settings.refresh_interval());
        let controller = controller_for(cli, &settings);
        let usage = controller.store().clone();
        let mut changes = usage.subscribe();

        let handle = controller.start(interval);
        if !cli.quiet && cli.format == OutputFormat::Text {
            let prefix = if sessions > 1 { "Settings changed. " } else { "" };
            eprintln!(
                "{prefix}Checking every {}s, press Ctrl+C to stop",
                interval.as_secs()
            );
        }

        let mut last_line = String::new();
        let end = loop {
            tokio::select! {
                signal = &mut shutdown => {
                    signal?;
                    info!("Interrupted, stopping");
                    break SessionEnd::Interrupted;
                }
                _ = file_poll.tick() => {
                    store.reload().await;
                }
                changed = settings_changes.changed() => {
                    if changed.is_err() {
                        break SessionEnd::Interrupted;
                    }
                    break SessionEnd::SettingsChanged;
                }
                changed = changes.changed() => {
                    if changed.is_err() {
                        break SessionEnd::Interrupted;
                    }
                    let line = snapshot(&usage, cli.format, cli.pretty).await;
                    if !line.is_empty() && line != last_line {
                        println!("{line}");
                        last_line = line;
                    }
                }
            }
        };

        handle.stop().await;
        match end {
            SessionEnd::Interrupted => return Ok(sessions),
            SessionEnd::SettingsChanged => info!("Settings changed, restarting polling"),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
