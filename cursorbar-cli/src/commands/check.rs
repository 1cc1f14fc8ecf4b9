//! Check command - fetch usage once and print the status line.

use anyhow::Result;
use cursorbar_core::UsageRenderer;
use cursorbar_store::SettingsStore;
use tracing::info;

use super::controller_for;
use crate::output::{JsonFormatter, StatusLine};
use crate::{Cli, OutputFormat};

/// Runs the check command.
pub async fn run(cli: &Cli, store: &SettingsStore) -> Result<()> {
    let settings = store.get().await;
    let controller = controller_for(cli, &settings);

    info!("Checking Cursor usage");
    let result = controller.refresh_now().await;

    match (cli.format, result) {
        (OutputFormat::Text, Ok(record)) => {
            println!("{}", StatusLine.render(&record));
            if !cli.quiet {
                println!();
                println!("{}", StatusLine::tooltip(&record));
            }
            Ok(())
        }
        (OutputFormat::Text, Err(e)) => {
            let message = e.to_string();
            println!("{}", StatusLine.render_error(&message));
            if !cli.quiet {
                println!();
                println!("{}", StatusLine::error_tooltip(&message));
            }
            Err(e.into())
        }
        (OutputFormat::Json, Ok(record)) => {
            println!("{}", JsonFormatter::new(cli.pretty).render(&record));
            Ok(())
        }
        (OutputFormat::Json, Err(e)) => {
            println!("{}", JsonFormatter::new(cli.pretty).render_error(&e.to_string()));
            Err(e.into())
        }
    }
}
