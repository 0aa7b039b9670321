//! Mock stage executor for testing.

use async_trait::async_trait;
use rp_protocol::requirement_models::{RequirementItem, Stage};
use serde_json::json;
use std::collections::{BTreeMap, VecDeque};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;

use crate::stages::{StageExecutor, StageOutcome};

/// Scriptable executor for orchestrator tests.
///
/// Pops outcomes from an optional script, falling back to a default
/// outcome once the script is drained. Every invocation is counted.
pub struct MockExecutor {
    stage: Stage,
    script: Mutex<VecDeque<StageOutcome>>,
    default: StageOutcome,
    calls: AtomicU32,
}

impl MockExecutor {
    pub fn new(stage: Stage, default: StageOutcome) -> Self {
        Self {
            stage,
            script: Mutex::new(VecDeque::new()),
            default,
            calls: AtomicU32::new(0),
        }
    }

    /// Always succeeds with an empty detail payload.
    pub fn success(stage: Stage) -> Self {
        Self::new(stage, StageOutcome::success(json!({"mock": true})))
    }

    /// Succeeds and produces the given artifacts.
    pub fn success_with_artifacts(stage: Stage, artifacts: BTreeMap<String, String>) -> Self {
        Self::new(
            stage,
            StageOutcome::success_with_artifacts(json!({"mock": true}), artifacts),
        )
    }

    /// Always returns a retryable failure.
    pub fn retryable(stage: Stage) -> Self {
        Self::new(stage, StageOutcome::retryable("mock transient failure"))
    }

    /// Always returns a fatal failure.
    pub fn fatal(stage: Stage) -> Self {
        Self::new(stage, StageOutcome::fatal("mock fatal failure"))
    }

    /// Prepend scripted outcomes served before the default.
    pub fn with_script(self, outcomes: Vec<StageOutcome>) -> Self {
        {
            let mut script = self.script.lock().expect("script lock poisoned");
            script.extend(outcomes);
        }
        self
    }

    /// Number of run invocations observed.
    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl StageExecutor for MockExecutor {
    fn stage(&self) -> Stage {
        self.stage
    }

    async fn run(&self, _item: &RequirementItem) -> StageOutcome {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let scripted = {
            let mut script = self.script.lock().expect("script lock poisoned");
            script.pop_front()
        };
        scripted.unwrap_or_else(|| self.default.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::item::new_item;
    use rp_protocol::requirement_models::RequirementInput;

    fn item() -> RequirementItem {
        new_item(RequirementInput {
            business_need: "Add SSO login".to_string(),
            requirements: "Support SAML and OIDC identity providers".to_string(),
            business_impact: "Reduces onboarding friction".to_string(),
            delivery_date: "2025-01-01".to_string(),
            campaign_date: "2025-02-01".to_string(),
            definitions: vec![],
        })
    }

    #[tokio::test]
    async fn test_mock_executor_default_outcome() {
        let executor = MockExecutor::success(Stage::Validation);

        let outcome = executor.run(&item()).await;
        assert!(matches!(outcome, StageOutcome::Success { .. }));
        assert_eq!(executor.calls(), 1);
    }

    #[tokio::test]
    async fn test_mock_executor_script_runs_before_default() {
        let executor = MockExecutor::success(Stage::Generation).with_script(vec![
            StageOutcome::retryable("first"),
            StageOutcome::retryable("second"),
        ]);
        let item = item();

        assert!(matches!(executor.run(&item).await, StageOutcome::Retryable { reason } if reason == "first"));
        assert!(matches!(executor.run(&item).await, StageOutcome::Retryable { reason } if reason == "second"));
        assert!(matches!(executor.run(&item).await, StageOutcome::Success { .. }));
        assert_eq!(executor.calls(), 3);
    }
}
