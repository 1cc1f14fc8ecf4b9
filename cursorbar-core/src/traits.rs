//! Trait definitions for `CursorBar`.
//!
//! These traits are the seams between acquisition, state and presentation.

use std::future::Future;

use crate::models::{Credentials, UsageRecord};

/// Anything that can turn credentials into a usage record.
///
/// Implementors are responsible for:
/// - Refusing to do network I/O when the credentials are incomplete
/// - Trying their acquisition strategies in order
/// - Normalizing whatever they obtain into a [`UsageRecord`]
///
/// The polling controller is generic over this trait, so tests can drive it
/// with a scripted source.
pub trait UsageSource: Send + Sync {
    /// Error produced when every strategy fails.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Acquires a fresh record.
    fn acquire(
        &self,
        credentials: &Credentials,
    ) -> impl Future<Output = Result<UsageRecord, Self::Error>> + Send;
}

/// Pure presentation of a record.
///
/// Renderers hold no state besides formatting options and never perform
/// I/O.
pub trait UsageRenderer {
    /// Renders a successful record.
    fn render(&self, record: &UsageRecord) -> String;

    /// Renders an acquisition failure.
    fn render_error(&self, message: &str) -> String;
}
