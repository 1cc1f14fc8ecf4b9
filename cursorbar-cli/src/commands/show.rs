//! Show command - detailed usage view as text, HTML or JSON.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use cursorbar_core::UsageRenderer;
use cursorbar_store::SettingsStore;
use tracing::info;

use super::controller_for;
use crate::output::{HtmlRenderer, JsonFormatter, TextFormatter};
use crate::{Cli, OutputFormat};

/// Arguments for the show command.
#[derive(Args, Default)]
pub struct ShowArgs {
    /// Render a standalone HTML page instead of text.
    #[arg(long)]
    pub html: bool,

    /// Write the output to a file instead of stdout.
    #[arg(long, short)]
    pub output: Option<PathBuf>,

    /// Width of the text progress bars, in cells.
    #[arg(long, value_parser = clap::value_parser!(u16).range(1..=200))]
    pub bar_width: Option<u16>,
}

/// Picks the renderer for this invocation.
fn renderer(args: &ShowArgs, cli: &Cli) -> Box<dyn UsageRenderer> {
    if args.html {
        Box::new(HtmlRenderer)
    } else if cli.format == OutputFormat::Json {
        Box::new(JsonFormatter::new(cli.pretty))
    } else {
        // Colors only make sense on a terminal.
        let mut text = TextFormatter::new(!cli.no_color && args.output.is_none());
        if let Some(width) = args.bar_width {
            text = text.with_bar_width(usize::from(width));
        }
        Box::new(text)
    }
}

/// Runs the show command.
pub async fn run(args: &ShowArgs, cli: &Cli, store: &SettingsStore) -> Result<()> {
    let settings = store.get().await;
    let controller = controller_for(cli, &settings);
    let renderer = renderer(args, cli);

    let result = controller.refresh_now().await;
    let rendered = match &result {
        Ok(record) => renderer.render(record),
        Err(e) => renderer.render_error(&e.to_string()),
    };

    match &args.output {
        Some(path) => {
            tokio::fs::write(path, rendered)
                .await
                .with_context(|| format!("Failed to write {}", path.display()))?;
            info!(path = %path.display(), "Detail view written");
            if !cli.quiet {
                println!("Wrote {}", path.display());
            }
        }
        None => println!("{rendered}"),
    }

    result.map(|_| ()).map_err(Into::into)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use cursorbar_core::{FetchSource, UsageBucket, UsageRecord};

    fn sample() -> UsageRecord {
        UsageRecord::new(
            UsageBucket::new(1, 2),
            UsageBucket::new(0, 0),
            chrono::NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            chrono::Utc::now(),
            FetchSource::Api,
        )
    }

    #[test]
    fn test_html_flag_wins_over_json_format() {
        let cli = Cli::try_parse_from(["cursorbar", "--format", "json"]).unwrap();
        let args = ShowArgs {
            html: true,
            ..ShowArgs::default()
        };
        assert!(renderer(&args, &cli).render(&sample()).starts_with("<!DOCTYPE html>"));
    }

    #[test]
    fn test_json_format() {
        let cli = Cli::try_parse_from(["cursorbar", "--format", "json"]).unwrap();
        let out = renderer(&ShowArgs::default(), &cli).render(&sample());
        assert!(out.starts_with('{'));
    }

    #[test]
    fn test_file_output_has_no_colors() {
        let cli = Cli::try_parse_from(["cursorbar"]).unwrap();
        let args = ShowArgs {
            output: Some(PathBuf::from("usage.txt")),
            ..ShowArgs::default()
        };
        assert!(!renderer(&args, &cli).render(&sample()).contains('\x1b'));
    }

    #[test]
    fn test_bar_width_flag() {
        let cli = Cli::try_parse_from(["cursorbar", "--no-color"]).unwrap();
        let args = ShowArgs {
            bar_width: Some(4),
            ..ShowArgs::default()
        };
        let out = renderer(&args, &cli).render(&sample());
        assert!(out.contains("Premium    ██░░ 1/2 (50%)"));
    }
}
