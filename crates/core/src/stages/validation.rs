//! Validation stage: completeness and consistency checks.
//!
//! Pure checks over the submitted payload. Empty or unparseable core
//! fields are unsalvageable and fail fatally; thin-but-present text yields
//! a retryable outcome whose reason carries concrete suggestions. Date
//! ordering oddities are surfaced as feedback without failing the item.

use async_trait::async_trait;
use chrono::NaiveDate;
use rp_protocol::requirement_models::{RequirementItem, Stage};
use serde_json::json;

use crate::stages::{StageExecutor, StageOutcome};

/// Minimum length of the requirements text before it is considered thin.
const MIN_REQUIREMENTS_LEN: usize = 20;

/// Minimum length of the business-impact statement.
const MIN_IMPACT_LEN: usize = 10;

/// Validates the submitted requirement payload.
pub struct ValidationExecutor;

impl ValidationExecutor {
    pub fn new() -> Self {
        Self
    }
}

impl Default for ValidationExecutor {
    fn default() -> Self {
        Self::new()
    }
}

fn parse_date(value: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d").ok()
}

#[async_trait]
impl StageExecutor for ValidationExecutor {
    fn stage(&self) -> Stage {
        Stage::Validation
    }

    async fn run(&self, item: &RequirementItem) -> StageOutcome {
        let input = &item.input;

        if input.requirements.trim().is_empty() {
            return StageOutcome::fatal("requirements text is empty");
        }
        if input.business_need.trim().is_empty() {
            return StageOutcome::fatal("business need is empty");
        }

        let delivery = match parse_date(&input.delivery_date) {
            Some(date) => date,
            None => {
                return StageOutcome::fatal(format!(
                    "delivery date '{}' is not a valid YYYY-MM-DD date",
                    input.delivery_date
                ))
            }
        };
        let campaign = match parse_date(&input.campaign_date) {
            Some(date) => date,
            None => {
                return StageOutcome::fatal(format!(
                    "campaign date '{}' is not a valid YYYY-MM-DD date",
                    input.campaign_date
                ))
            }
        };

        let mut suggestions: Vec<String> = Vec::new();
        if input.requirements.trim().len() < MIN_REQUIREMENTS_LEN {
            suggestions.push(
                "expand the requirements: describe who needs what, where, when and why".to_string(),
            );
        }
        if input.business_impact.trim().len() < MIN_IMPACT_LEN {
            suggestions
                .push("quantify the business impact with a measurable outcome".to_string());
        }
        if !suggestions.is_empty() {
            return StageOutcome::retryable(format!(
                "submission needs more detail: {}",
                suggestions.join("; ")
            ));
        }

        let mut feedback: Vec<String> = Vec::new();
        if campaign < delivery {
            feedback.push(format!(
                "campaign date {} precedes delivery date {}; confirm the timeline",
                campaign, delivery
            ));
        }
        if input.definitions.is_empty() {
            feedback.push("no term definitions supplied; reviewers may ask for a glossary".to_string());
        }

        let score = 1.0 - 0.05 * feedback.len() as f64;
        StageOutcome::success(json!({
            "is_valid": true,
            "score": score,
            "feedback": feedback,
            "suggestions": [],
        }))
    }
}
