//! Pipeline orchestrator.
//!
//! The Orchestrator is the state machine driving a requirement item
//! through its stages in order. It owns retry and timeout policy,
//! persists every transition through the item store, and guarantees that
//! at most one run is active per item. Different items run concurrently
//! in independent tokio tasks; the store is the only shared state.

use rp_protocol::requirement_models::{RequirementItem, Stage};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::stages::{ExecutorRegistry, StageOutcome};
use crate::store::{ItemStore, StoreError};

/// Retry behaviour for stage attempts.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Total attempts allowed per stage, including the first.
    pub max_attempts: u32,

    /// Delay before the second attempt; doubles per further attempt.
    pub base_delay: Duration,

    /// Upper bound on the backoff delay.
    pub max_delay: Duration,

    /// Timeout applied to each individual attempt.
    pub stage_timeout: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(30),
            stage_timeout: Duration::from_secs(120),
        }
    }
}

impl RetryPolicy {
    /// Backoff delay after the given failed attempt (1-based).
    pub fn backoff(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(16);
        let delay = self.base_delay.saturating_mul(1 << exponent);
        delay.min(self.max_delay)
    }
}

/// Errors surfaced by orchestrator scheduling.
#[derive(Error, Debug)]
pub enum EngineError {
    /// The item already has an active run.
    #[error("Requirement {0} is already being processed")]
    AlreadyRunning(Uuid),

    /// No executor was registered for the stage the item sits in.
    #[error("No executor registered for stage '{0}'")]
    MissingExecutor(Stage),

    /// Store access failed.
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Drives requirement items through the pipeline.
pub struct Orchestrator {
    store: Arc<dyn ItemStore>,
    registry: ExecutorRegistry,
    policy: RetryPolicy,

    /// Items with an active run. Guards the at-most-one-run invariant at
    /// the scheduling layer; the store's single-running-record invariant
    /// backs it at the persistence layer.
    in_flight: Mutex<HashSet<Uuid>>,
}

impl Orchestrator {
    pub fn new(store: Arc<dyn ItemStore>, registry: ExecutorRegistry, policy: RetryPolicy) -> Self {
        Self {
            store,
            registry,
            policy,
            in_flight: Mutex::new(HashSet::new()),
        }
    }

    /// Start processing an item in the background.
    ///
    /// Spawns a tokio task that runs the item to a terminal stage. Returns
    /// immediately; progress is observed through the store.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::AlreadyRunning`] if a run is already active
    /// for the item.
    pub async fn schedule(self: &Arc<Self>, id: Uuid) -> Result<(), EngineError> {
        {
            let mut in_flight = self.in_flight.lock().await;
            if !in_flight.insert(id) {
                return Err(EngineError::AlreadyRunning(id));
            }
        }

        let this = Arc::clone(self);
        tokio::spawn(async move {
            if let Err(e) = this.drive(id).await {
                error!(item_id = %id, error = %e, "pipeline run aborted");
            }
            this.in_flight.lock().await.remove(&id);
        });

        Ok(())
    }

    /// Run an item to a terminal stage and return its final state.
    ///
    /// This is the synchronous core used by [`schedule`]; tests call it
    /// directly to avoid sleeping on background tasks.
    ///
    /// [`schedule`]: Orchestrator::schedule
    pub async fn drive(&self, id: Uuid) -> Result<RequirementItem, EngineError> {
        loop {
            let item = self.store.get(id).await?;
            if item.stage.is_terminal() {
                return Ok(item);
            }
            self.run_stage(&item).await?;
        }
    }

    /// Re-schedule unfinished items after a restart.
    ///
    /// An item whose latest record is still `running` was interrupted
    /// mid-attempt; the dangling record is closed as failed before the
    /// stage is re-attempted, so the single-running invariant holds.
    /// Returns the number of items re-scheduled.
    pub async fn recover(self: &Arc<Self>) -> Result<usize, EngineError> {
        let items = self.store.list().await?;
        let mut resumed = 0;

        for item in items {
            if item.stage.is_terminal() {
                continue;
            }
            if item.running_record().is_some() {
                warn!(item_id = %item.id, stage = %item.stage, "closing interrupted attempt");
                self.store
                    .record_stage_failed(item.id, "attempt interrupted by shutdown", false)
                    .await?;
            }
            if self.schedule(item.id).await.is_ok() {
                resumed += 1;
            }
        }

        if resumed > 0 {
            info!(count = resumed, "recovered unfinished requirements");
        }
        Ok(resumed)
    }

    /// Run the item's current stage to a decision: advance or terminal.
    async fn run_stage(&self, item: &RequirementItem) -> Result<(), EngineError> {
        let stage = item.stage;
        let executor = self
            .registry
            .get(stage)
            .ok_or(EngineError::MissingExecutor(stage))?;

        loop {
            let item = self.store.record_stage_started(item.id).await?;
            let attempt = item
                .latest_record()
                .map(|record| record.attempt)
                .unwrap_or(1);
            info!(item_id = %item.id, stage = %stage, attempt, "stage attempt started");

            let outcome =
                match tokio::time::timeout(self.policy.stage_timeout, executor.run(&item)).await {
                    Ok(outcome) => outcome,
                    Err(_) => StageOutcome::retryable(format!(
                        "stage timed out after {:?}",
                        self.policy.stage_timeout
                    )),
                };

            match outcome {
                StageOutcome::Success { detail, artifacts } => {
                    let updated = self
                        .store
                        .record_stage_succeeded(item.id, detail, artifacts)
                        .await?;
                    info!(item_id = %item.id, stage = %stage, next = %updated.stage, "stage succeeded");
                    return Ok(());
                }
                StageOutcome::Retryable { reason } => {
                    let exhausted = attempt >= self.policy.max_attempts;
                    self.store
                        .record_stage_failed(item.id, &reason, exhausted)
                        .await?;
                    if exhausted {
                        warn!(item_id = %item.id, stage = %stage, attempt, reason = %reason,
                            "retry budget exhausted");
                        return Ok(());
                    }
                    let delay = self.policy.backoff(attempt);
                    warn!(item_id = %item.id, stage = %stage, attempt, reason = %reason,
                        delay_ms = delay.as_millis() as u64, "stage attempt failed, backing off");
                    tokio::time::sleep(delay).await;
                }
                StageOutcome::Fatal { reason } => {
                    self.store.record_stage_failed(item.id, &reason, true).await?;
                    error!(item_id = %item.id, stage = %stage, reason = %reason, "stage failed fatally");
                    return Ok(());
                }
            }
        }
    }
}
