//! Read-only status projections.
//!
//! Pure functions mapping a stored item into the shapes polling clients
//! consume. Nothing here mutates state, so the projections are safe to
//! call arbitrarily often and concurrently.

use rp_protocol::api_models::{RequirementDetail, RequirementSummary, StatusResponse, StepView};
use rp_protocol::requirement_models::{RequirementItem, Stage, StageRecord};

/// Coarse status string for an item.
///
/// `pending` until the first attempt is recorded, then the current stage
/// name, ending in the literal `complete` or `error` the client stops
/// polling on.
pub fn status_string(item: &RequirementItem) -> String {
    if item.stage == Stage::Validation && item.step_history.is_empty() {
        return "pending".to_string();
    }
    item.stage.as_str().to_string()
}

/// Human-readable progress label for an item.
pub fn status_label(item: &RequirementItem) -> String {
    if item.stage == Stage::Validation && item.step_history.is_empty() {
        return "Queued for processing".to_string();
    }
    item.stage.label().to_string()
}

/// Project an item into the polled status shape.
pub fn project_status(item: &RequirementItem) -> StatusResponse {
    StatusResponse {
        id: item.id,
        status: status_string(item),
        status_label: status_label(item),
        current_node: item.stage.as_str().to_string(),
        steps: item.step_history.iter().map(step_view).collect(),
        links: item.artifacts.clone(),
        created_at: item.created_at,
        updated_at: item.updated_at,
    }
}

/// Project an item into the condensed list/creation shape.
pub fn project_summary(item: &RequirementItem) -> RequirementSummary {
    RequirementSummary {
        id: item.id,
        business_need: item.input.business_need.clone(),
        status: status_string(item),
        stage: item.stage,
        created_at: item.created_at,
        updated_at: item.updated_at,
    }
}

/// Project an item into the full detail shape.
pub fn project_detail(item: &RequirementItem) -> RequirementDetail {
    RequirementDetail {
        id: item.id,
        input: item.input.clone(),
        stage: item.stage,
        status: status_string(item),
        steps: item.step_history.iter().map(step_view).collect(),
        links: item.artifacts.clone(),
        created_at: item.created_at,
        updated_at: item.updated_at,
    }
}

fn step_view(record: &StageRecord) -> StepView {
    StepView {
        name: record.stage.as_str().to_string(),
        status: record.status,
        attempt: record.attempt,
        start_time: record.started_at,
        end_time: record.finished_at,
        details: record.detail.clone(),
        error: record.error.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::item::{begin_stage, fail_stage, new_item, succeed_stage};
    use rp_protocol::requirement_models::{RequirementInput, StageStatus, ARTIFACT_GOOGLE_DOC};
    use serde_json::json;
    use std::collections::BTreeMap;

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

    #[test]
    fn test_fresh_item_is_pending() {
        let item = new_item(input());

        assert_eq!(status_string(&item), "pending");
        assert_eq!(status_label(&item), "Queued for processing");

        let status = project_status(&item);
        assert_eq!(status.status, "pending");
        assert_eq!(status.current_node, "validation");
        assert!(status.steps.is_empty());
        assert!(status.links.is_empty());
    }

    #[test]
    fn test_in_progress_item_reports_stage_name() {
        let mut item = new_item(input());
        begin_stage(&mut item).unwrap();
        succeed_stage(&mut item, json!({"is_valid": true}), BTreeMap::new()).unwrap();

        assert_eq!(status_string(&item), "generation");

        let status = project_status(&item);
        assert_eq!(status.status, "generation");
        assert_eq!(status.status_label, "Drafting requirement text");
        assert_eq!(status.steps.len(), 1);
        assert_eq!(status.steps[0].name, "validation");
        assert_eq!(status.steps[0].status, StageStatus::Succeeded);
    }

    #[test]
    fn test_terminal_statuses_match_client_stop_condition() {
        let mut complete = new_item(input());
        for _ in 0..4 {
            begin_stage(&mut complete).unwrap();
            succeed_stage(&mut complete, json!({}), BTreeMap::new()).unwrap();
        }
        assert_eq!(status_string(&complete), "complete");

        let mut failed = new_item(input());
        begin_stage(&mut failed).unwrap();
        fail_stage(&mut failed, "unsalvageable", true).unwrap();
        assert_eq!(status_string(&failed), "error");
    }

    #[test]
    fn test_links_carry_accumulated_artifacts() {
        let mut item = new_item(input());
        begin_stage(&mut item).unwrap();
        succeed_stage(
            &mut item,
            json!({}),
            BTreeMap::from([(
                ARTIFACT_GOOGLE_DOC.to_string(),
                "https://docs.google.com/document/d/prd-1".to_string(),
            )]),
        )
        .unwrap();

        let status = project_status(&item);
        assert_eq!(
            status.links[ARTIFACT_GOOGLE_DOC],
            "https://docs.google.com/document/d/prd-1"
        );
    }

    #[test]
    fn test_detail_projection_echoes_input() {
        let item = new_item(input());
        let detail = project_detail(&item);

        assert_eq!(detail.input.business_need, "Add SSO login");
        assert_eq!(detail.stage, Stage::Validation);
        assert_eq!(detail.status, "pending");
    }
}
