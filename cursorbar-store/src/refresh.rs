//! Background refresh task.
//!
//! Drives a [`UsageSource`] on an interval and on demand, publishing every
//! outcome into a [`UsageStore`].

use cursorbar_core::{Credentials, UsageRecord, UsageSource};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, instrument};

use crate::usage_store::UsageStore;

// ============================================================================
// Refresh Controller
// ============================================================================

/// Polling controller.
///
/// Cheap to clone; clones share the source and the store.
pub struct RefreshController<S> {
    source: Arc<S>,
    store: Arc<UsageStore>,
    credentials: Arc<Credentials>,
}

impl<S> Clone for RefreshController<S> {
    fn clone(&self) -> Self {
        Self {
            source: Arc::clone(&self.source),
            store: Arc::clone(&self.store),
            credentials: Arc::clone(&self.credentials),
        }
    }
}

impl<S: UsageSource + 'static> RefreshController<S> {
    /// Creates a controller.
    pub fn new(source: S, store: Arc<UsageStore>, credentials: Credentials) -> Self {
        Self {
            source: Arc::new(source),
            store,
            credentials: Arc::new(credentials),
        }
    }

    /// The store results are published into.
    pub fn store(&self) -> &Arc<UsageStore> {
        &self.store
    }

    /// Runs one acquisition now and waits for it.
    ///
    /// The outcome is published to the store (subject to last-start-wins)
    /// and also returned to the caller.
    ///
    /// # Errors
    ///
    /// Returns the source's error when acquisition fails.
    #[instrument(skip(self))]
    pub async fn refresh_now(&self) -> Result<UsageRecord, S::Error> {
        let ticket = self.store.begin_acquisition().await;
        let result = self.source.acquire(&self.credentials).await;

        let published = result.as_ref().cloned().map_err(ToString::to_string);
        self.store.complete(ticket, published).await;

        result
    }

    /// Starts the polling loop.
    ///
    /// One acquisition runs immediately, then one per `interval`. Ticks
    /// missed while an acquisition is running are delayed, not bunched.
    pub fn start(&self, interval: Duration) -> RefreshHandle {
        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        let controller = self.clone();

        info!(interval_secs = interval.as_secs_f64(), "Starting refresh loop");
        let task = tokio::spawn(async move {
            controller.run(interval, shutdown_rx).await;
        });

        RefreshHandle {
            shutdown: Some(shutdown_tx),
            task: Some(task),
        }
    }

    async fn run(self, interval: Duration, mut shutdown: oneshot::Receiver<()>) {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;
                _ = &mut shutdown => break,
                _ = ticker.tick() => {}
            }

            let ticket = self.store.begin_acquisition().await;
            tokio::select! {
                biased;
                _ = &mut shutdown => {
                    self.store.abandon(ticket).await;
                    break;
                }
                result = self.source.acquire(&self.credentials) => {
                    let outcome = result.map_err(|e| e.to_string());
                    self.store.complete(ticket, outcome).await;
                }
            }
        }

        debug!("Refresh loop exited");
    }
}

// ============================================================================
// Refresh Handle
// ============================================================================

/// Owner of a running polling loop.
///
/// Dropping the handle asks the loop to exit without waiting for it;
/// [`RefreshHandle::stop`] does the same and waits. Either way an
/// acquisition in flight is cancelled and its ticket released.
pub struct RefreshHandle {
    shutdown: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<()>>,
}

impl RefreshHandle {
    /// Returns true once the loop has exited.
    pub fn is_finished(&self) -> bool {
        self.task.as_ref().is_none_or(JoinHandle::is_finished)
    }

    /// Cancels the loop and waits for it to exit.
    ///
    /// An acquisition in flight is cancelled and its ticket released.
    pub async fn stop(mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                debug!(error = %e, "Refresh task ended abnormally");
            }
        }
        info!("Refresh loop stopped");
    }
}

impl Drop for RefreshHandle {
    fn drop(&mut self) {
        // Aborting the task would skip `abandon` and leave the store Fetching.
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
