//! Stage executors.
//!
//! Each pipeline stage is implemented by one [`StageExecutor`]. Executors
//! are stateless with respect to the pipeline: everything they need comes
//! from the item's submission payload, the detail payloads of earlier
//! stage records, and the accumulated artifacts. Their result is a
//! [`StageOutcome`], never an error; failures are data the orchestrator
//! turns into stage records.

pub mod design;
pub mod document;
pub mod generation;
pub mod mock;
pub mod validation;

pub use design::DesignExecutor;
pub use document::DocumentExecutor;
pub use generation::GenerationExecutor;
pub use mock::MockExecutor;
pub use validation::ValidationExecutor;

use async_trait::async_trait;
use rp_protocol::requirement_models::{RequirementItem, Stage};
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

/// Result of one attempt at a pipeline stage.
#[derive(Debug, Clone, PartialEq)]
pub enum StageOutcome {
    /// The stage finished. `detail` is attached to the stage record;
    /// `artifacts` are merged into the item (existing entries win).
    Success {
        detail: Value,
        artifacts: BTreeMap<String, String>,
    },

    /// Transient failure worth re-attempting with backoff.
    Retryable { reason: String },

    /// Non-recoverable failure; the item moves to the error stage.
    Fatal { reason: String },
}

impl StageOutcome {
    /// Success without artifacts.
    pub fn success(detail: Value) -> Self {
        StageOutcome::Success {
            detail,
            artifacts: BTreeMap::new(),
        }
    }

    /// Success carrying produced artifacts.
    pub fn success_with_artifacts(detail: Value, artifacts: BTreeMap<String, String>) -> Self {
        StageOutcome::Success { detail, artifacts }
    }

    /// Transient failure.
    pub fn retryable(reason: impl Into<String>) -> Self {
        StageOutcome::Retryable {
            reason: reason.into(),
        }
    }

    /// Non-recoverable failure.
    pub fn fatal(reason: impl Into<String>) -> Self {
        StageOutcome::Fatal {
            reason: reason.into(),
        }
    }
}

/// One pipeline stage implementation.
#[async_trait]
pub trait StageExecutor: Send + Sync {
    /// The pipeline stage this executor is responsible for.
    fn stage(&self) -> Stage;

    /// Run one attempt at the stage for the given item.
    async fn run(&self, item: &RequirementItem) -> StageOutcome;
}

/// Registry mapping executable stages to their executors.
///
/// The orchestrator looks executors up by the item's current stage; the
/// registry itself imposes no order; the stage enum does.
pub struct ExecutorRegistry {
    executors: HashMap<Stage, Arc<dyn StageExecutor>>,
}

impl ExecutorRegistry {
    /// Build a registry from the given executors, keyed by their stage.
    ///
    /// A later executor for the same stage replaces an earlier one.
    pub fn new(executors: Vec<Arc<dyn StageExecutor>>) -> Self {
        let executors = executors
            .into_iter()
            .map(|executor| (executor.stage(), executor))
            .collect();
        Self { executors }
    }

    /// Look up the executor for a stage.
    pub fn get(&self, stage: Stage) -> Option<Arc<dyn StageExecutor>> {
        self.executors.get(&stage).cloned()
    }

    /// Whether an executor is registered for the stage.
    pub fn has(&self, stage: Stage) -> bool {
        self.executors.contains_key(&stage)
    }
}
