// Lint configuration for this crate
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

//! `CursorBar` CLI - Cursor request quota monitoring from the command line.
//!
//! # Examples
//!
//! ```bash
//! # Check usage now (status line + tooltip)
//! cursorbar
//!
//! # JSON output
//! cursorbar --format json --pretty
//!
//! # Detail view as a standalone HTML page
//! cursorbar show --html --output usage.html
//!
//! # Poll until Ctrl+C
//! cursorbar watch --interval 300
//!
//! # Store the session cookie (fills in the user id when it can)
//! cursorbar config set-cookie 'WorkosCursorSessionToken=user_...%3A%3A...'
//! ```

mod commands;
mod output;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use cursorbar_fetch::FetchError;
use cursorbar_store::{LogLevel, SettingsStore, default_settings_path};
use tracing_subscriber::{EnvFilter, Registry, fmt, prelude::*, reload};

use commands::{check, config, show, watch};

// ============================================================================
// CLI Definition
// ============================================================================

/// `CursorBar` CLI - Cursor usage monitoring.
#[derive(Parser)]
#[command(name = "cursorbar")]
#[command(about = "Cursor premium/unlimited request usage monitor")]
#[command(long_about = r#"
CursorBar shows how much of your Cursor request quota you have used.

It reads the usage endpoint with your browser session cookie and falls back
to scraping the settings page when the endpoint is unavailable.

Examples:
  cursorbar                            # Check usage now
  cursorbar --format json              # JSON output
  cursorbar show --html -o usage.html  # Detail page
  cursorbar watch                      # Poll until Ctrl+C
  cursorbar config set-cookie '<cookie>'
"#)]
#[command(version)]
#[command(author = "CursorBar Contributors")]
pub struct Cli {
    /// Subcommand to run. If none, runs 'check' by default.
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Output format (text or json).
    #[arg(long, short = 'f', default_value = "text", global = true)]
    pub format: OutputFormat,

    /// Pretty-print JSON output.
    #[arg(long, global = true)]
    pub pretty: bool,

    /// Session cookie for this run (overrides the settings file).
    #[arg(long, global = true, env = "CURSORBAR_COOKIE", hide_env_values = true)]
    pub cookie: Option<String>,

    /// User id for this run (overrides the settings file).
    #[arg(long, global = true, env = "CURSORBAR_USER_ID")]
    pub user_id: Option<String>,

    /// Settings file to use instead of the default location.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Verbose output (show debug info).
    #[arg(long, short, global = true)]
    pub verbose: bool,

    /// Disable colored output.
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Quiet mode (minimal output).
    #[arg(long, short, global = true)]
    pub quiet: bool,
}

impl Cli {
    /// Settings file for this run.
    pub fn settings_path(&self) -> PathBuf {
        self.config.clone().unwrap_or_else(default_settings_path)
    }
}

/// CLI commands.
#[derive(Subcommand)]
pub enum Commands {
    /// Check usage now (default if no command specified).
    #[command(visible_alias = "c")]
    Check,

    /// Show the detailed usage view.
    #[command(visible_alias = "s")]
    Show(show::ShowArgs),

    /// Poll on an interval until interrupted.
    #[command(visible_alias = "w")]
    Watch(watch::WatchArgs),

    /// Manage configuration.
    Config(config::ConfigArgs),
}

/// Output format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Default)]
pub enum OutputFormat {
    /// Human-readable text with colors.
    #[default]
    Text,
    /// JSON output for scripting.
    Json,
}

/// CLI exit codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ExitCode {
    /// Success.
    Success = 0,
    /// General error.
    Error = 1,
    /// User id or cookie not configured.
    MissingCredentials = 2,
    /// Every strategy failed or the page held no usage data.
    NoUsageData = 3,
}

impl ExitCode {
    /// Picks the exit code for a failed command.
    pub fn for_error(err: &anyhow::Error) -> Self {
        match err.downcast_ref::<FetchError>() {
            Some(e) if e.is_missing_credentials() => ExitCode::MissingCredentials,
            Some(FetchError::AllStrategiesFailed { .. } | FetchError::NoUsageDataFound) => {
                ExitCode::NoUsageData
            }
            _ => ExitCode::Error,
        }
    }
}

// ============================================================================
// Logging Setup
// ============================================================================

fn log_filter(verbose: bool, level: LogLevel) -> EnvFilter {
    if verbose {
        return EnvFilter::new("cursorbar=debug,warn");
    }
    EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("cursorbar={level},error")))
}

/// Swaps the active filter once the settings file has been read.
type FilterHandle = reload::Handle<EnvFilter, Registry>;

/// Installs the subscriber at the default level.
///
/// Runs before the settings file is read so warnings raised while loading
/// it are not lost.
fn setup_logging(verbose: bool, quiet: bool) -> Option<FilterHandle> {
    if quiet {
        return None; // No logging in quiet mode
    }

    let (filter, handle) = reload::Layer::new(log_filter(verbose, LogLevel::default()));
    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_target(false)
                .without_time()
                .with_writer(std::io::stderr),
        )
        .init();
    Some(handle)
}

/// Applies the level configured in the settings file.
fn apply_log_level(handle: Option<&FilterHandle>, verbose: bool, level: LogLevel) {
    let Some(handle) = handle else {
        return;
    };
    if let Err(e) = handle.reload(log_filter(verbose, level)) {
        tracing::warn!(error = %e, "Could not apply configured log level");
    }
}

// ============================================================================
// Main Entry Point
// ============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let logging = setup_logging(cli.verbose, cli.quiet);
    let store = SettingsStore::load(cli.settings_path()).await?;
    apply_log_level(logging.as_ref(), cli.verbose, store.get().await.log_level);

    let result = match &cli.command {
        Some(Commands::Check) | None => check::run(&cli, &store).await,
        Some(Commands::Show(args)) => show::run(args, &cli, &store).await,
        Some(Commands::Watch(args)) => watch::run(args, &cli, &store).await,
        Some(Commands::Config(args)) => config::run(args, &cli, &store).await,
    };

    if let Err(e) = result {
        let code = ExitCode::for_error(&e);
        if !cli.quiet {
            eprintln!("Error: {e:#}");
            if let Some(hint) = e.downcast_ref::<FetchError>().and_then(commands::hint_for) {
                eprintln!("Hint: {hint}");
            }
        }
        std::process::exit(code as i32);
    }

    Ok(())
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use cursorbar_fetch::{FetchKind, StrategyFailure};

    #[test]
    fn test_default_command_is_check() {
        let cli = Cli::try_parse_from(["cursorbar"]).unwrap();
        assert!(cli.command.is_none());
        assert_eq!(cli.format, OutputFormat::Text);
    }

    #[test]
    fn test_global_overrides_after_subcommand() {
        let cli = Cli::try_parse_from([
            "cursorbar",
            "show",
            "--html",
            "--cookie",
            "a=b",
            "--user-id",
            "user_1",
            "--config",
            "/tmp/cb.json",
        ])
        .unwrap();

        assert_eq!(cli.cookie.as_deref(), Some("a=b"));
        assert_eq!(cli.user_id.as_deref(), Some("user_1"));
        assert_eq!(cli.settings_path(), PathBuf::from("/tmp/cb.json"));
        assert!(matches!(cli.command, Some(Commands::Show(ref a)) if a.html));
    }

    #[test]
    fn test_config_subcommands_parse() {
        let cli = Cli::try_parse_from(["cursorbar", "config", "set-interval", "600"]).unwrap();
        assert!(matches!(
            cli.command,
            Some(Commands::Config(config::ConfigArgs {
                action: config::ConfigAction::SetInterval { secs: 600 }
            }))
        ));
    }

    #[test]
    fn test_exit_codes() {
        let missing = anyhow::Error::new(FetchError::MissingCredentials("userId"));
        assert_eq!(ExitCode::for_error(&missing), ExitCode::MissingCredentials);

        let all_failed = anyhow::Error::new(FetchError::AllStrategiesFailed {
            failures: vec![StrategyFailure::new(
                "cursor.api",
                FetchKind::Api,
                FetchError::Timeout { secs: 10 },
            )],
        });
        assert_eq!(ExitCode::for_error(&all_failed), ExitCode::NoUsageData);

        let other = anyhow::anyhow!("disk full");
        assert_eq!(ExitCode::for_error(&other), ExitCode::Error);
        assert_eq!(ExitCode::Success as i32, 0);
    }

    #[test]
    fn test_configured_level_replaces_default() {
        if std::env::var_os("RUST_LOG").is_some() {
            return;
        }
        let (filter, handle) = reload::Layer::new(log_filter(false, LogLevel::default()));
        let _subscriber = Registry::default().with(filter);

        apply_log_level(Some(&handle), false, LogLevel::Debug);

        let active = handle.with_current(ToString::to_string).unwrap();
        assert!(active.contains("cursorbar=debug"), "{active}");
    }

    #[test]
    fn test_verbose_filter() {
        let filter = log_filter(true, LogLevel::Error);
        assert!(filter.to_string().contains("cursorbar=debug"));
    }
}
