//! Config command - inspect and edit the settings file.

use anyhow::Result;
use clap::{Args, Subcommand};
use cursorbar_core::SESSION_COOKIE_NAME;
use cursorbar_store::{Settings, SettingsStore, default_config_dir};
use serde::Serialize;
use tracing::warn;

use crate::output::JsonFormatter;
use crate::{Cli, OutputFormat};

/// Arguments for the config command.
#[derive(Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: ConfigAction,
}

/// Config actions.
#[derive(Subcommand)]
pub enum ConfigAction {
    /// Show the current settings (cookie masked).
    Show,
    /// Print where settings are stored.
    Path,
    /// Store the Cookie header of a logged-in cursor.com session.
    SetCookie {
        /// Full cookie string.
        cookie: String,
    },
    /// Store the Cursor user id (starts with "user_").
    SetUser {
        /// User id.
        user_id: String,
    },
    /// Set the polling interval in seconds.
    SetInterval {
        /// Seconds between checks.
        secs: u64,
    },
    /// Restore the default settings.
    Reset,
}

/// Settings as shown to the user.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SettingsView {
    user_id: String,
    cookie: String,
    check_interval: u64,
    log_level: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    base_url: Option<String>,
    path: String,
}

impl SettingsView {
    fn new(settings: &Settings, store: &SettingsStore) -> Self {
        Self {
            user_id: settings.user_id.clone(),
            cookie: settings.masked_cookie(),
            check_interval: settings.check_interval,
            log_level: settings.log_level.to_string(),
            base_url: settings.base_url.clone(),
            path: store.path().display().to_string(),
        }
    }

    fn to_text(&self) -> String {
        let or_unset = |s: &str| {
            if s.is_empty() {
                "(not set)".to_string()
            } else {
                s.to_string()
            }
        };

        let mut lines = vec![
            format!("Settings file:  {}", self.path),
            format!("User id:        {}", or_unset(&self.user_id)),
            format!("Cookie:         {}", or_unset(&self.cookie)),
            format!("Check interval: {}s", self.check_interval),
            format!("Log level:      {}", self.log_level),
        ];
        if let Some(base) = &self.base_url {
            lines.push(format!("Base URL:       {base}"));
        }
        lines.join("\n")
    }
}

/// Runs the config command.
pub async fn run(args: &ConfigArgs, cli: &Cli, store: &SettingsStore) -> Result<()> {
    let message = apply(&args.action, cli, store).await?;
    if !message.is_empty() && !(cli.quiet && is_mutation(&args.action)) {
        println!("{message}");
    }
    Ok(())
}

fn is_mutation(action: &ConfigAction) -> bool {
    !matches!(action, ConfigAction::Show | ConfigAction::Path)
}

/// Performs an action and returns what to print.
async fn apply(action: &ConfigAction, cli: &Cli, store: &SettingsStore) -> Result<String> {
    match action {
        ConfigAction::Show => {
            let view = SettingsView::new(&store.get().await, store);
            match cli.format {
                OutputFormat::Text => Ok(view.to_text()),
                OutputFormat::Json => JsonFormatter::new(cli.pretty).format(&view),
            }
        }
        ConfigAction::Path => Ok(format!(
            "Settings file: {}\nConfig dir:    {}",
            store.path().display(),
            default_config_dir().display()
        )),
        ConfigAction::SetCookie { cookie } => {
            let derived = store.set_cookie(cookie).await;
            store.save().await?;
            let mut message = match derived {
                Some(id) => format!("Cookie saved (user id {id} taken from the cookie)"),
                None => "Cookie saved".to_string(),
            };
            if !store.credentials().await.has_session_cookie() {
                warn!("Saved cookie has no {SESSION_COOKIE_NAME}");
                message = format!(
                    "{message}\nWarning: the cookie has no {SESSION_COOKIE_NAME}; \
                     requests will likely be rejected"
                );
            }
            Ok(message)
        }
        ConfigAction::SetUser { user_id } => {
            store.set_user_id(user_id).await;
            store.save().await?;
            Ok(format!("User id set to {}", user_id.trim()))
        }
        ConfigAction::SetInterval { secs } => {
            store.set_check_interval(*secs).await?;
            store.save().await?;
            Ok(format!("Check interval set to {secs}s"))
        }
        ConfigAction::Reset => {
            store.reset().await;
            store.save().await?;
            Ok("Settings reset to defaults".to_string())
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
