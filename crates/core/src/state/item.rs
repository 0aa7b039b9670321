//! Requirement item state machine.
//!
//! Pure transition functions over a [`RequirementItem`]. The pipeline
//! invariants live here:
//! - at most one stage record is `running` at any time,
//! - history is append-only and records are never mutated after
//!   `finished_at` is set,
//! - the stage only ever advances along the fixed pipeline order, with
//!   `error` as the sole failure terminal,
//! - artifact entries are never overwritten.
//!
//! The store calls these functions inside its single-item transactions, so
//! every persisted item satisfies the invariants.

use chrono::Utc;
use rp_protocol::requirement_models::{
    RequirementInput, RequirementItem, Stage, StageRecord, StageStatus,
};
use serde_json::Value;
use std::collections::BTreeMap;
use thiserror::Error;
use uuid::Uuid;

/// Errors raised by invalid state transitions.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransitionError {
    /// A stage attempt is already running for this item.
    #[error("A stage attempt is already running for this item")]
    AlreadyRunning,

    /// No running record exists to finish.
    #[error("No running stage attempt to finish")]
    NotRunning,

    /// The item is in a terminal stage and admits no further work.
    #[error("Item is already terminal in stage '{0}'")]
    Terminal(Stage),
}

/// Create a new item for a validated submission.
///
/// The item starts in the validation stage with an empty history and no
/// artifacts.
pub fn new_item(input: RequirementInput) -> RequirementItem {
    let now = Utc::now();
    RequirementItem {
        id: Uuid::new_v4(),
        input,
        stage: Stage::Validation,
        step_history: Vec::new(),
        artifacts: BTreeMap::new(),
        created_at: now,
        updated_at: now,
    }
}

/// Open a new attempt at the item's current stage.
///
/// Appends a `running` record and returns the 1-based attempt number.
///
/// # Errors
///
/// - [`TransitionError::Terminal`] if the item is already terminal
/// - [`TransitionError::AlreadyRunning`] if another attempt is in flight
pub fn begin_stage(item: &mut RequirementItem) -> Result<u32, TransitionError> {
    if item.stage.is_terminal() {
        return Err(TransitionError::Terminal(item.stage));
    }
    if item.running_record().is_some() {
        return Err(TransitionError::AlreadyRunning);
    }

    let attempt = item.attempts_at(item.stage) + 1;
    item.step_history.push(StageRecord {
        stage: item.stage,
        status: StageStatus::Running,
        attempt,
        started_at: Utc::now(),
        finished_at: None,
        detail: None,
        error: None,
    });
    item.updated_at = Utc::now();

    Ok(attempt)
}

/// Close the running attempt as succeeded and advance the stage.
///
/// The executor's detail payload is attached to the record, produced
/// artifacts are merged (existing entries win), and the item's stage moves
/// to the next stage in order, or `complete` after the last one.
///
/// # Errors
///
/// Returns [`TransitionError::NotRunning`] if no attempt is in flight.
pub fn succeed_stage(
    item: &mut RequirementItem,
    detail: Value,
    artifacts: BTreeMap<String, String>,
) -> Result<(), TransitionError> {
    let record = running_record_mut(item)?;
    record.status = StageStatus::Succeeded;
    record.finished_at = Some(Utc::now());
    record.detail = Some(detail);

    merge_artifacts(item, artifacts);
    item.stage = item.stage.next();
    item.updated_at = Utc::now();

    Ok(())
}

/// Close the running attempt as failed.
///
/// With `terminal = true` the item moves to the `error` stage; otherwise it
/// stays at its current stage, eligible for a re-attempt.
///
/// # Errors
///
/// Returns [`TransitionError::NotRunning`] if no attempt is in flight.
pub fn fail_stage(
    item: &mut RequirementItem,
    reason: &str,
    terminal: bool,
) -> Result<(), TransitionError> {
    let record = running_record_mut(item)?;
    record.status = StageStatus::Failed;
    record.finished_at = Some(Utc::now());
    record.error = Some(reason.to_string());

    if terminal {
        item.stage = Stage::Error;
    }
    item.updated_at = Utc::now();

    Ok(())
}

/// Merge newly produced artifacts into the item.
///
/// Entries already present are kept untouched, which makes retried stages
/// idempotent with respect to recorded external side effects.
pub fn merge_artifacts(item: &mut RequirementItem, artifacts: BTreeMap<String, String>) {
    for (key, value) in artifacts {
        item.artifacts.entry(key).or_insert(value);
    }
}

fn running_record_mut(item: &mut RequirementItem) -> Result<&mut StageRecord, TransitionError> {
    item.step_history
        .iter_mut()
        .find(|record| record.status == StageStatus::Running)
        .ok_or(TransitionError::NotRunning)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_input() -> RequirementInput {
        RequirementInput {
            business_need: "Add SSO login".to_string(),
            requirements: "Support SAML and OIDC identity providers".to_string(),
            business_impact: "Reduces onboarding friction".to_string(),
            delivery_date: "2025-01-01".to_string(),
            campaign_date: "2025-02-01".to_string(),
            definitions: vec![],
        }
    }

    #[test]
    fn test_new_item_starts_at_validation_with_empty_history() {
        let item = new_item(sample_input());

        assert_eq!(item.stage, Stage::Validation);
        assert!(item.step_history.is_empty());
        assert!(item.artifacts.is_empty());
        assert_eq!(item.created_at, item.updated_at);
    }

    #[test]
    fn test_begin_stage_appends_running_record() {
        let mut item = new_item(sample_input());

        let attempt = begin_stage(&mut item).unwrap();

        assert_eq!(attempt, 1);
        assert_eq!(item.step_history.len(), 1);
        let record = &item.step_history[0];
        assert_eq!(record.stage, Stage::Validation);
        assert_eq!(record.status, StageStatus::Running);
        assert!(record.finished_at.is_none());
    }

    #[test]
    fn test_begin_stage_rejects_second_running_attempt() {
        let mut item = new_item(sample_input());
        begin_stage(&mut item).unwrap();

        let result = begin_stage(&mut item);
        assert_eq!(result, Err(TransitionError::AlreadyRunning));
        assert_eq!(item.step_history.len(), 1);
    }

    #[test]
    fn test_begin_stage_rejects_terminal_item() {
        let mut item = new_item(sample_input());
        item.stage = Stage::Error;

        let result = begin_stage(&mut item);
        assert_eq!(result, Err(TransitionError::Terminal(Stage::Error)));
    }

    #[test]
    fn test_succeed_stage_advances_and_records_detail() {
        let mut item = new_item(sample_input());
        begin_stage(&mut item).unwrap();

        succeed_stage(&mut item, json!({"is_valid": true}), BTreeMap::new()).unwrap();

        assert_eq!(item.stage, Stage::Generation);
        let record = &item.step_history[0];
        assert_eq!(record.status, StageStatus::Succeeded);
        assert!(record.finished_at.is_some());
        assert_eq!(record.detail.as_ref().unwrap()["is_valid"], true);
    }

    #[test]
    fn test_succeed_stage_requires_running_record() {
        let mut item = new_item(sample_input());

        let result = succeed_stage(&mut item, json!({}), BTreeMap::new());
        assert_eq!(result, Err(TransitionError::NotRunning));
    }

    #[test]
    fn test_fail_stage_terminal_moves_to_error() {
        let mut item = new_item(sample_input());
        begin_stage(&mut item).unwrap();

        fail_stage(&mut item, "requirements text is empty", true).unwrap();

        assert_eq!(item.stage, Stage::Error);
        let record = &item.step_history[0];
        assert_eq!(record.status, StageStatus::Failed);
        assert_eq!(record.error.as_deref(), Some("requirements text is empty"));
    }

    #[test]
    fn test_fail_stage_transient_keeps_stage() {
        let mut item = new_item(sample_input());
        begin_stage(&mut item).unwrap();

        fail_stage(&mut item, "generator unavailable", false).unwrap();

        assert_eq!(item.stage, Stage::Validation);
        assert_eq!(item.step_history[0].status, StageStatus::Failed);
    }

    #[test]
    fn test_attempt_counter_increments_per_stage() {
        let mut item = new_item(sample_input());

        begin_stage(&mut item).unwrap();
        fail_stage(&mut item, "flaky", false).unwrap();
        let second = begin_stage(&mut item).unwrap();
        assert_eq!(second, 2);
        succeed_stage(&mut item, json!({}), BTreeMap::new()).unwrap();

        // Counter resets for the next stage.
        let next = begin_stage(&mut item).unwrap();
        assert_eq!(next, 1);
        assert_eq!(item.step_history.last().unwrap().stage, Stage::Generation);
    }

    #[test]
    fn test_merge_artifacts_never_overwrites() {
        let mut item = new_item(sample_input());
        item.artifacts
            .insert("google_doc".to_string(), "https://docs.example.com/original".to_string());

        merge_artifacts(
            &mut item,
            BTreeMap::from([
                ("google_doc".to_string(), "https://docs.example.com/duplicate".to_string()),
                ("jira_ticket".to_string(), "https://jira.example.com/PRD-1".to_string()),
            ]),
        );

        assert_eq!(item.artifacts["google_doc"], "https://docs.example.com/original");
        assert_eq!(item.artifacts["jira_ticket"], "https://jira.example.com/PRD-1");
    }

    #[test]
    fn test_history_is_append_only_across_full_run() {
        let mut item = new_item(sample_input());

        for _ in 0..4 {
            begin_stage(&mut item).unwrap();
            succeed_stage(&mut item, json!({}), BTreeMap::new()).unwrap();
        }

        assert_eq!(item.stage, Stage::Complete);
        let stages: Vec<Stage> = item.step_history.iter().map(|r| r.stage).collect();
        assert_eq!(
            stages,
            vec![
                Stage::Validation,
                Stage::Generation,
                Stage::DocumentCreation,
                Stage::DesignDocument,
            ]
        );
    }
}
