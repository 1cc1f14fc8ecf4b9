//! CLI command implementations.

pub mod check;
pub mod config;
pub mod show;
pub mod watch;

use std::sync::Arc;

use cursorbar_core::Credentials;
use cursorbar_fetch::{FetchError, FetchSettings};
use cursorbar_providers::CursorUsageFetcher;
use cursorbar_store::{RefreshController, Settings, UsageStore};
use tracing::debug;

use crate::Cli;

/// Credentials for this run: flags first, then the settings file.
pub fn credentials_for(cli: &Cli, settings: &Settings) -> Credentials {
    let user_id = cli.user_id.as_deref().unwrap_or(&settings.user_id);
    let cookie = cli.cookie.as_deref().unwrap_or(&settings.cookie_string);

    // A cookie given on the command line may carry its own user id.
    let derived = if user_id.trim().is_empty() {
        Credentials::user_id_from_cookie(cookie)
    } else {
        None
    };
    if derived.is_some() {
        debug!("Using user id embedded in the session cookie");
    }

    Credentials::new(derived.as_deref().unwrap_or(user_id), cookie)
}

/// Fetcher configured from the settings file.
pub fn fetcher_for(settings: &Settings) -> CursorUsageFetcher {
    let mut fetch_settings = FetchSettings::default();
    if let Some(base) = &settings.base_url {
        fetch_settings = fetch_settings.with_base_url(base.clone());
    }
    CursorUsageFetcher::with_settings(fetch_settings)
}

/// Polling controller wired to a fresh usage store.
pub fn controller_for(cli: &Cli, settings: &Settings) -> RefreshController<CursorUsageFetcher> {
    RefreshController::new(
        fetcher_for(settings),
        Arc::new(UsageStore::new()),
        credentials_for(cli, settings),
    )
}

/// Next step to suggest for a fetch failure.
pub fn hint_for(error: &FetchError) -> Option<&'static str> {
    match error {
        FetchError::MissingCredentials(_) => Some(
            "Run `cursorbar config set-cookie '<cookie>'` with the Cookie header from a \
             logged-in cursor.com tab (and `cursorbar config set-user <id>` if needed).",
        ),
        FetchError::UnexpectedStatus {
            status: 401 | 403, ..
        } => Some("The session cookie was rejected; copy a fresh one from the browser."),
        FetchError::AllStrategiesFailed { failures } => {
            let rejected = failures.iter().any(|f| {
                matches!(
                    *f.error,
                    FetchError::UnexpectedStatus {
                        status: 401 | 403,
                        ..
                    }
                )
            });
            if rejected {
                Some("The session cookie was rejected; copy a fresh one from the browser.")
            } else if error.is_no_usage_data() {
                Some("The settings page loaded but showed no usage; check that the cookie belongs to a logged-in session.")
            } else {
                Some("Run with --verbose to see each attempt, or retry in a moment.")
            }
        }
        FetchError::NoUsageDataFound => Some(
            "The settings page loaded but showed no usage; check that the cookie belongs to a logged-in session.",
        ),
        FetchError::Timeout { .. } | FetchError::Transport(_) => {
            Some("Check your network connection and retry.")
        }
        _ => None,
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use cursorbar_fetch::{FetchKind, StrategyFailure};

    fn cli(args: &[&str]) -> Cli {
        let mut full = vec!["cursorbar"];
        full.extend_from_slice(args);
        Cli::try_parse_from(full).unwrap()
    }

    fn settings(user_id: &str, cookie: &str) -> Settings {
        Settings {
            user_id: user_id.to_string(),
            cookie_string: cookie.to_string(),
            ..Settings::default()
        }
    }

    #[test]
    fn test_credentials_from_settings() {
        let creds = credentials_for(&cli(&[]), &settings("user_file", "file=1"));
        assert_eq!(creds.user_id(), "user_file");
        assert_eq!(creds.cookie(), "file=1");
    }

    #[test]
    fn test_flags_override_settings() {
        let creds = credentials_for(
            &cli(&["--user-id", "user_flag", "--cookie", "flag=1"]),
            &settings("user_file", "file=1"),
        );
        assert_eq!(creds.user_id(), "user_flag");
        assert_eq!(creds.cookie(), "flag=1");
    }

    #[test]
    fn test_user_id_derived_from_cookie() {
        let creds = credentials_for(
            &cli(&["--cookie", "WorkosCursorSessionToken=user_01AB%3A%3Ajwt"]),
            &settings("", ""),
        );
        assert_eq!(creds.user_id(), "user_01AB");
    }

    #[test]
    fn test_fetcher_uses_base_url() {
        let mut s = Settings::default();
        s.base_url = Some("http://127.0.0.1:8080".to_string());
        let fetcher = fetcher_for(&s);
        assert_eq!(fetcher.settings().base_url, "http://127.0.0.1:8080");
    }

    #[test]
    fn test_hints() {
        assert!(
            hint_for(&FetchError::MissingCredentials("cookieString"))
                .unwrap()
                .contains("set-cookie")
        );

        let rejected = FetchError::AllStrategiesFailed {
            failures: vec![StrategyFailure::new(
                "cursor.api",
                FetchKind::Api,
                FetchError::UnexpectedStatus {
                    status: 401,
                    url: "https://www.cursor.com/api/usage".to_string(),
                },
            )],
        };
        assert!(hint_for(&rejected).unwrap().contains("fresh"));

        let empty_page = FetchError::AllStrategiesFailed {
            failures: vec![
                StrategyFailure::new("cursor.api", FetchKind::Api, FetchError::Timeout { secs: 10 }),
                StrategyFailure::new(
                    "cursor.web",
                    FetchKind::WebDashboard,
                    FetchError::NoUsageDataFound,
                ),
            ],
        };
        assert!(hint_for(&empty_page).unwrap().contains("no usage"));

        assert!(hint_for(&FetchError::Parse("x".to_string())).is_none());
    }
}
