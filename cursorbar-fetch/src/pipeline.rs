//! Ordered execution of fetch strategies.
//!
//! Strategies run one at a time, highest priority first. The first success
//! wins; if every strategy fails the caller gets all of the reasons in the
//! order they happened.

use std::time::{Duration, Instant};
use tracing::{debug, info, instrument, warn};

use crate::context::FetchContext;
use crate::error::{FetchError, StrategyFailure};
use crate::strategy::{FetchKind, FetchResult, FetchStrategy};

// ============================================================================
// Fetch Attempt
// ============================================================================

/// What happened when one strategy ran.
#[derive(Debug, Clone)]
pub struct FetchAttempt {
    /// Strategy that ran.
    pub strategy_id: String,
    /// Its fetch mechanism.
    pub kind: FetchKind,
    /// Whether it produced a record.
    pub success: bool,
    /// Failure message, if it did not.
    pub error: Option<String>,
    /// Time spent in the strategy.
    pub duration: Duration,
}

impl FetchAttempt {
    fn new(strategy: &dyn FetchStrategy, error: Option<String>, duration: Duration) -> Self {
        Self {
            strategy_id: strategy.id().to_string(),
            kind: strategy.kind(),
            success: error.is_none(),
            error,
            duration,
        }
    }
}

// ============================================================================
// Fetch Outcome
// ============================================================================

/// Result of a pipeline run plus its attempt log.
#[derive(Debug)]
pub struct FetchOutcome {
    /// The winning result or the error that ended the run.
    pub result: Result<FetchResult, FetchError>,
    /// One entry per strategy considered, in run order.
    pub attempts: Vec<FetchAttempt>,
    /// Wall time of the whole run.
    pub duration: Duration,
}

impl FetchOutcome {
    /// Returns true if some strategy succeeded.
    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }

    /// Number of strategies considered.
    pub fn attempts_count(&self) -> usize {
        self.attempts.len()
    }

    /// Id of the strategy that succeeded.
    pub fn successful_strategy(&self) -> Option<&str> {
        self.result.as_ref().ok().map(|r| r.strategy_id.as_str())
    }

    /// Failure messages in run order.
    pub fn errors(&self) -> Vec<&str> {
        self.attempts
            .iter()
            .filter_map(|a| a.error.as_deref())
            .collect()
    }
}

/// How a single strategy run ends the loop, or doesn't.
enum Step {
    Done(FetchResult),
    Stop(FetchError),
    Next(StrategyFailure),
}

// ============================================================================
// Fetch Pipeline
// ============================================================================

/// Strategies in execution order.
#[derive(Default)]
pub struct FetchPipeline {
    strategies: Vec<Box<dyn FetchStrategy>>,
}

impl FetchPipeline {
    /// Creates an empty pipeline.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a pipeline and orders the strategies by priority.
    pub fn with_strategies(mut strategies: Vec<Box<dyn FetchStrategy>>) -> Self {
        // Stable sort: equal priorities keep the order given.
        strategies.sort_by_key(|s| std::cmp::Reverse(s.priority()));
        Self { strategies }
    }

    /// Number of strategies.
    pub fn len(&self) -> usize {
        self.strategies.len()
    }

    /// Returns true if there are no strategies.
    pub fn is_empty(&self) -> bool {
        self.strategies.is_empty()
    }

    /// Strategy ids in execution order.
    pub fn strategy_ids(&self) -> Vec<&str> {
        self.strategies.iter().map(|s| s.id()).collect()
    }

    /// Runs the strategies until one succeeds.
    ///
    /// Unavailable strategies are skipped but still logged as attempts and
    /// failures. A strategy that refuses fallback ends the run with its own
    /// error. Otherwise a full failure is
    /// [`FetchError::AllStrategiesFailed`] listing every failure in run
    /// order.
    #[instrument(skip(self, ctx), fields(strategies = self.strategies.len()))]
    pub async fn execute(&self, ctx: &FetchContext) -> FetchOutcome {
        let start = Instant::now();
        let mut attempts = Vec::with_capacity(self.strategies.len());
        let mut failures = Vec::new();

        if self.strategies.is_empty() {
            let err = FetchError::StrategyNotAvailable("No strategies configured".to_string());
            return Self::finish(Err(err), attempts, start);
        }

        info!(count = self.strategies.len(), "Executing fetch pipeline");

        for strategy in &self.strategies {
            match Self::run_one(strategy.as_ref(), ctx, &mut attempts).await {
                Step::Done(result) => return Self::finish(Ok(result), attempts, start),
                Step::Stop(err) => return Self::finish(Err(err), attempts, start),
                Step::Next(failure) => failures.push(failure),
            }
        }

        warn!(failures = failures.len(), "All strategies failed");
        Self::finish(
            Err(FetchError::AllStrategiesFailed { failures }),
            attempts,
            start,
        )
    }

    async fn run_one(
        strategy: &dyn FetchStrategy,
        ctx: &FetchContext,
        attempts: &mut Vec<FetchAttempt>,
    ) -> Step {
        let id = strategy.id();

        if !strategy.is_available(ctx).await {
            debug!(strategy = %id, "Strategy not available, skipping");
            attempts.push(FetchAttempt::new(
                strategy,
                Some("Not available".to_string()),
                Duration::ZERO,
            ));
            return Step::Next(StrategyFailure::new(
                id,
                strategy.kind(),
                FetchError::StrategyNotAvailable(id.to_string()),
            ));
        }

        debug!(strategy = %id, kind = %strategy.kind(), "Executing strategy");
        let began = Instant::now();
        let result = strategy.fetch(ctx).await;
        let elapsed = began.elapsed();

        match result {
            Ok(found) => {
                info!(strategy = %id, duration = ?elapsed, "Strategy succeeded");
                attempts.push(FetchAttempt::new(strategy, None, elapsed));
                Step::Done(found)
            }
            Err(error) => {
                warn!(strategy = %id, error = %error, duration = ?elapsed, "Strategy failed");
                attempts.push(FetchAttempt::new(strategy, Some(error.to_string()), elapsed));

                if strategy.should_fallback(&error) {
                    Step::Next(StrategyFailure::new(id, strategy.kind(), error))
                } else {
                    debug!(strategy = %id, "No fallback for this error");
                    Step::Stop(error)
                }
            }
        }
    }

    fn finish(
        result: Result<FetchResult, FetchError>,
        attempts: Vec<FetchAttempt>,
        start: Instant,
    ) -> FetchOutcome {
        FetchOutcome {
            result,
            attempts,
            duration: start.elapsed(),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
