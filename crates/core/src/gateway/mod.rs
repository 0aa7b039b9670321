//! Submission gateway.
//!
//! The single entry point for new requirements: validates the submitted
//! payload, creates the item, persists it, and hands it to the
//! orchestrator. Constraint violations never create an item.

use chrono::NaiveDate;
use rp_protocol::requirement_models::{RequirementInput, RequirementItem};
use std::sync::Arc;
use thiserror::Error;
use tracing::info;

use crate::engine::{EngineError, Orchestrator};
use crate::state::item::new_item;
use crate::store::{ItemStore, StoreError};

/// Errors surfaced by submission.
#[derive(Error, Debug)]
pub enum SubmitError {
    /// The payload violates a submission constraint. No item was created.
    #[error("Invalid {field}: {reason}")]
    InvalidInput { field: &'static str, reason: String },

    /// Persisting the item failed.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Scheduling the item failed.
    #[error(transparent)]
    Engine(#[from] EngineError),
}

/// Accepts new requirements and schedules their first stage.
pub struct SubmissionGateway {
    store: Arc<dyn ItemStore>,
    orchestrator: Arc<Orchestrator>,
}

impl SubmissionGateway {
    pub fn new(store: Arc<dyn ItemStore>, orchestrator: Arc<Orchestrator>) -> Self {
        Self {
            store,
            orchestrator,
        }
    }

    /// Validate and accept a submission.
    ///
    /// On success the item is durably created in the validation stage with
    /// an empty history and already scheduled on the orchestrator.
    pub async fn submit(&self, input: RequirementInput) -> Result<RequirementItem, SubmitError> {
        validate_input(&input)?;

        let item = new_item(input);
        self.store.create(item.clone()).await?;
        info!(item_id = %item.id, "requirement submitted");

        self.orchestrator.schedule(item.id).await?;
        Ok(item)
    }
}

/// Check the submission constraints.
///
/// Required text fields must be non-empty and both dates must be
/// well-formed calendar dates. No ordering between the dates is enforced
/// here; the validation stage surfaces ordering feedback.
pub fn validate_input(input: &RequirementInput) -> Result<(), SubmitError> {
    require_non_empty("businessNeed", &input.business_need)?;
    require_non_empty("requirements", &input.requirements)?;
    require_non_empty("businessImpact", &input.business_impact)?;
    require_date("deliveryDate", &input.delivery_date)?;
    require_date("campaignDate", &input.campaign_date)?;
    Ok(())
}

fn require_non_empty(field: &'static str, value: &str) -> Result<(), SubmitError> {
    if value.trim().is_empty() {
        return Err(SubmitError::InvalidInput {
            field,
            reason: "must not be empty".to_string(),
        });
    }
    Ok(())
}

fn require_date(field: &'static str, value: &str) -> Result<(), SubmitError> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map(|_| ())
        .map_err(|_| SubmitError::InvalidInput {
            field,
            reason: format!("'{}' is not a valid YYYY-MM-DD date", value),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::RetryPolicy;
    use crate::stages::{ExecutorRegistry, MockExecutor};
    use crate::store::MemoryStore;
    use rp_protocol::requirement_models::Stage;

    fn input() -> RequirementInput {
        RequirementInput {
            business_need: "Add SSO login".to_string(),
            requirements: "Support SAML and OIDC identity providers".to_string(),
            business_impact: "Reduces onboarding friction".to_string(),
            delivery_date: "2025-01-01".to_string(),
            campaign_date: "2025-02-01".to_string(),
            definitions: vec![],
        }
    }

    fn gateway() -> (SubmissionGateway, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        let registry = ExecutorRegistry::new(vec![
            Arc::new(MockExecutor::success(Stage::Validation)),
            Arc::new(MockExecutor::success(Stage::Generation)),
            Arc::new(MockExecutor::success(Stage::DocumentCreation)),
            Arc::new(MockExecutor::success(Stage::DesignDocument)),
        ]);
        let orchestrator = Arc::new(Orchestrator::new(
            store.clone(),
            registry,
            RetryPolicy::default(),
        ));
        (
            SubmissionGateway::new(store.clone(), orchestrator),
            store,
        )
    }

    #[tokio::test]
    async fn test_submit_creates_item_in_validation_stage() {
        let (gateway, store) = gateway();

        let item = gateway.submit(input()).await.unwrap();

        assert_eq!(item.stage, Stage::Validation);
        assert!(item.step_history.is_empty());
        let stored = store.get(item.id).await.unwrap();
        assert_eq!(stored.id, item.id);
    }

    #[tokio::test]
    async fn test_empty_business_need_is_rejected_without_item() {
        let (gateway, store) = gateway();
        let mut payload = input();
        payload.business_need = "".to_string();

        let result = gateway.submit(payload).await;

        assert!(matches!(
            result,
            Err(SubmitError::InvalidInput { field: "businessNeed", .. })
        ));
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_malformed_delivery_date_is_rejected() {
        let (gateway, store) = gateway();
        let mut payload = input();
        payload.delivery_date = "01/01/2025".to_string();

        let result = gateway.submit(payload).await;

        assert!(matches!(
            result,
            Err(SubmitError::InvalidInput { field: "deliveryDate", .. })
        ));
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_campaign_before_delivery_is_accepted() {
        let (gateway, _store) = gateway();
        let mut payload = input();
        payload.delivery_date = "2025-03-01".to_string();
        payload.campaign_date = "2025-02-01".to_string();

        let result = gateway.submit(payload).await;
        assert!(result.is_ok());
    }
}
