//! Generation stage: AI-assisted drafting of the PRD text.
//!
//! Delegates to the external text-generation collaborator and records the
//! returned draft in the stage detail, where the document-creation stage
//! picks it up. Collaborator availability problems are retryable; a draft
//! the pipeline cannot use is fatal.

use async_trait::async_trait;
use rp_protocol::requirement_models::{RequirementItem, Stage};
use serde_json::json;
use std::sync::Arc;

use crate::clients::{CollaboratorError, GenerationRequest, TextGenerator};
use crate::stages::{StageExecutor, StageOutcome};

/// Drafts the requirement text via the external text generator.
pub struct GenerationExecutor {
    generator: Arc<dyn TextGenerator>,
}

impl GenerationExecutor {
    pub fn new(generator: Arc<dyn TextGenerator>) -> Self {
        Self { generator }
    }
}

#[async_trait]
impl StageExecutor for GenerationExecutor {
    fn stage(&self) -> Stage {
        Stage::Generation
    }

    async fn run(&self, item: &RequirementItem) -> StageOutcome {
        let request = GenerationRequest::from_input(&item.input);

        let draft = match self.generator.generate(&request).await {
            Ok(draft) => draft,
            Err(CollaboratorError::Unavailable(reason)) => {
                return StageOutcome::retryable(format!("text generator unavailable: {}", reason))
            }
            Err(CollaboratorError::Rejected(reason)) => {
                return StageOutcome::fatal(format!("text generator rejected the request: {}", reason))
            }
        };

        if draft.body.trim().is_empty() {
            return StageOutcome::fatal("text generator returned an empty draft");
        }

        StageOutcome::success(json!({
            "title": draft.title,
            "body": draft.body,
            "impact_narrative": draft.impact_narrative,
        }))
    }
}
