//! Main usage state store.
//!
//! Holds the latest [`UsageRecord`], the refresh state and the last error,
//! with change notifications for the renderers.
//!
//! Acquisitions may overlap. Each one takes a ticket from
//! [`UsageStore::begin_acquisition`] and hands it back to
//! [`UsageStore::complete`]; a completion whose ticket is older than the
//! newest one already applied is dropped, so the acquisition that started
//! last always wins.

use chrono::{DateTime, Utc};
use cursorbar_core::UsageRecord;
use std::fmt;
use std::sync::Arc;
use tokio::sync::{RwLock, watch};
use tracing::{debug, info, warn};

// ============================================================================
// Refresh State
// ============================================================================

/// Whether an acquisition is in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RefreshState {
    /// Nothing in flight.
    #[default]
    Idle,
    /// At least one acquisition in flight.
    Fetching,
}

impl fmt::Display for RefreshState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RefreshState::Idle => write!(f, "idle"),
            RefreshState::Fetching => write!(f, "fetching"),
        }
    }
}

/// Start-order token for one acquisition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct AcquisitionTicket(u64);

impl AcquisitionTicket {
    /// Position in start order, starting at 1.
    pub fn sequence(self) -> u64 {
        self.0
    }
}

// ============================================================================
// Inner State
// ============================================================================

#[derive(Default)]
struct UsageStoreInner {
    record: Option<UsageRecord>,
    last_error: Option<String>,
    last_ticket: u64,
    applied: Option<AcquisitionTicket>,
    in_flight: usize,
    last_refresh: Option<DateTime<Utc>>,
}

impl UsageStoreInner {
    fn state(&self) -> RefreshState {
        if self.in_flight > 0 {
            RefreshState::Fetching
        } else {
            RefreshState::Idle
        }
    }
}

// ============================================================================
// Usage Store
// ============================================================================

/// State container for the latest acquisition.
///
/// Observable via a watch channel carrying a version counter.
pub struct UsageStore {
    inner: Arc<RwLock<UsageStoreInner>>,
    notify: watch::Sender<u64>,
    version: Arc<RwLock<u64>>,
}

impl Default for UsageStore {
    fn default() -> Self {
        Self::new()
    }
}

impl UsageStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        let (notify, _) = watch::channel(0);
        Self {
            inner: Arc::new(RwLock::new(UsageStoreInner::default())),
            notify,
            version: Arc::new(RwLock::new(0)),
        }
    }

    // ========================================================================
    // Acquisition Lifecycle
    // ========================================================================

    /// Registers a new acquisition and returns its ticket.
    ///
    /// Tickets increase monotonically. The store is `Fetching` until every
    /// ticket handed out has been completed or abandoned.
    pub async fn begin_acquisition(&self) -> AcquisitionTicket {
        let ticket = {
            let mut inner = self.inner.write().await;
            inner.last_ticket += 1;
            inner.in_flight += 1;
            AcquisitionTicket(inner.last_ticket)
        };
        self.notify_change().await;
        debug!(ticket = ticket.0, "Acquisition started");
        ticket
    }

    /// Publishes the outcome of an acquisition.
    ///
    /// Returns `false` if the ticket is older than the newest applied one;
    /// the outcome is then discarded.
    pub async fn complete(
        &self,
        ticket: AcquisitionTicket,
        outcome: Result<UsageRecord, String>,
    ) -> bool {
        let applied = {
            let mut inner = self.inner.write().await;
            inner.in_flight = inner.in_flight.saturating_sub(1);

            if inner.applied.is_some_and(|newest| ticket < newest) {
                warn!(
                    ticket = ticket.0,
                    newest = inner.applied.map(AcquisitionTicket::sequence),
                    "Dropping stale acquisition result"
                );
                false
            } else {
                inner.applied = Some(ticket);
                inner.last_refresh = Some(Utc::now());
                match outcome {
                    Ok(record) => {
                        info!(
                            ticket = ticket.0,
                            source = %record.source(),
                            premium_pct = record.premium().percentage(),
                            "Usage record updated"
                        );
                        inner.record = Some(record);
                        inner.last_error = None;
                    }
                    Err(message) => {
                        warn!(ticket = ticket.0, error = %message, "Acquisition failed");
                        inner.last_error = Some(message);
                    }
                }
                true
            }
        };
        self.notify_change().await;
        applied
    }

    /// Releases a ticket whose acquisition was cancelled.
    pub async fn abandon(&self, ticket: AcquisitionTicket) {
        {
            let mut inner = self.inner.write().await;
            inner.in_flight = inner.in_flight.saturating_sub(1);
        }
        self.notify_change().await;
        debug!(ticket = ticket.0, "Acquisition abandoned");
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    /// The latest applied record, if any acquisition has succeeded.
    pub async fn record(&self) -> Option<UsageRecord> {
        self.inner.read().await.record.clone()
    }

    /// Error from the latest applied acquisition, cleared by a success.
    pub async fn last_error(&self) -> Option<String> {
        self.inner.read().await.last_error.clone()
    }

    /// Current refresh state.
    pub async fn state(&self) -> RefreshState {
        self.inner.read().await.state()
    }

    /// Returns true while any acquisition is in flight.
    pub async fn is_refreshing(&self) -> bool {
        self.state().await == RefreshState::Fetching
    }

    /// When the latest applied acquisition finished.
    pub async fn last_refresh(&self) -> Option<DateTime<Utc>> {
        self.inner.read().await.last_refresh
    }

    // ========================================================================
    // Observable
    // ========================================================================

    /// Subscribes to store changes.
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.notify.subscribe()
    }

    /// Notifies subscribers of a change.
    async fn notify_change(&self) {
        let mut version = self.version.write().await;
        *version += 1;
        let _ = self.notify.send(*version);
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use cursorbar_core::{FetchSource, UsageBucket};

    fn record(premium_used: u64) -> UsageRecord {
        UsageRecord::new(
            UsageBucket::new(premium_used, 500),
            UsageBucket::new(3, 0),
            NaiveDate::from_ymd_opt(2024, 5, 1).unwrap(),
            Utc::now(),
            FetchSource::Api,
        )
    }

    #[tokio::test]
    async fn test_new_store() {
        let store = UsageStore::new();
        assert!(store.record().await.is_none());
        assert!(store.last_error().await.is_none());
        assert_eq!(store.state().await, RefreshState::Idle);
        assert!(store.last_refresh().await.is_none());
    }

    #[tokio::test]
    async fn test_tickets_increase() {
        let store = UsageStore::new();
        let first = store.begin_acquisition().await;
        let second = store.begin_acquisition().await;
        assert!(second > first);
        assert_eq!(first.sequence(), 1);
        assert_eq!(second.sequence(), 2);
    }

    #[tokio::test]
    async fn test_fetching_until_all_complete() {
        let store = UsageStore::new();
        let a = store.begin_acquisition().await;
        let b = store.begin_acquisition().await;
        assert!(store.is_refreshing().await);

        store.complete(a, Ok(record(1))).await;
        assert_eq!(store.state().await, RefreshState::Fetching);

        store.complete(b, Ok(record(2))).await;
        assert_eq!(store.state().await, RefreshState::Idle);
    }

    #[tokio::test]
    async fn test_in_order_completion_applies_both() {
        let store = UsageStore::new();

        let a = store.begin_acquisition().await;
        assert!(store.complete(a, Ok(record(10))).await);
        let b = store.begin_acquisition().await;
        assert!(store.complete(b, Ok(record(20))).await);

        assert_eq!(store.record().await.unwrap().premium().used(), 20);
    }

    #[tokio::test]
    async fn test_out_of_order_completion_keeps_last_started() {
        let store = UsageStore::new();

        let older = store.begin_acquisition().await;
        let newer = store.begin_acquisition().await;

        assert!(store.complete(newer, Ok(record(20))).await);
        assert!(!store.complete(older, Ok(record(10))).await);

        assert_eq!(store.record().await.unwrap().premium().used(), 20);
        assert_eq!(store.state().await, RefreshState::Idle);
    }

    #[tokio::test]
    async fn test_stale_error_does_not_clobber_record() {
        let store = UsageStore::new();

        let older = store.begin_acquisition().await;
        let newer = store.begin_acquisition().await;

        store.complete(newer, Ok(record(20))).await;
        store.complete(older, Err("timeout".to_string())).await;

        assert!(store.last_error().await.is_none());
        assert!(store.record().await.is_some());
    }

    #[tokio::test]
    async fn test_error_then_success() {
        let store = UsageStore::new();

        let a = store.begin_acquisition().await;
        store.complete(a, Err("All strategies failed".to_string())).await;
        assert_eq!(
            store.last_error().await.as_deref(),
            Some("All strategies failed")
        );
        assert!(store.record().await.is_none());

        let b = store.begin_acquisition().await;
        store.complete(b, Ok(record(5))).await;
        assert!(store.last_error().await.is_none());
        assert!(store.record().await.is_some());
    }

    #[tokio::test]
    async fn test_error_keeps_previous_record() {
        let store = UsageStore::new();

        let a = store.begin_acquisition().await;
        store.complete(a, Ok(record(5))).await;
        let b = store.begin_acquisition().await;
        store.complete(b, Err("boom".to_string())).await;

        assert_eq!(store.record().await.unwrap().premium().used(), 5);
        assert_eq!(store.last_error().await.as_deref(), Some("boom"));
    }

    #[tokio::test]
    async fn test_abandon_returns_to_idle() {
        let store = UsageStore::new();
        let ticket = store.begin_acquisition().await;
        store.abandon(ticket).await;
        assert_eq!(store.state().await, RefreshState::Idle);
        assert!(store.record().await.is_none());
    }

    #[tokio::test]
    async fn test_subscribers_see_changes() {
        let store = UsageStore::new();
        let mut rx = store.subscribe();

        let ticket = store.begin_acquisition().await;
        assert!(rx.has_changed().unwrap());
        let _ = rx.borrow_and_update();

        store.complete(ticket, Ok(record(1))).await;
        assert!(rx.has_changed().unwrap());
    }
}
