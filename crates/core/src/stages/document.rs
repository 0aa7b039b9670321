//! Document-creation stage: primary document and tracking ticket.
//!
//! Creates the shareable PRD document and its tracking ticket from the
//! generated draft. The stage is idempotent per artifact key: a link
//! already recorded on the item is kept and its collaborator is not called
//! again, so a crash between creation and persistence cannot pile up
//! duplicates on a later attempt.

use async_trait::async_trait;
use rp_protocol::requirement_models::{
    RequirementItem, Stage, ARTIFACT_GOOGLE_DOC, ARTIFACT_JIRA_TICKET,
};
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::clients::{CollaboratorError, DocumentStore, NewDocument, NewTicket, TicketTracker};
use crate::stages::{StageExecutor, StageOutcome};

/// Creates the primary document and tracking ticket.
pub struct DocumentExecutor {
    documents: Arc<dyn DocumentStore>,
    tickets: Arc<dyn TicketTracker>,
}

impl DocumentExecutor {
    pub fn new(documents: Arc<dyn DocumentStore>, tickets: Arc<dyn TicketTracker>) -> Self {
        Self { documents, tickets }
    }
}

fn draft_field<'a>(draft: &'a Value, key: &str) -> Option<&'a str> {
    draft.get(key).and_then(Value::as_str)
}

#[async_trait]
impl StageExecutor for DocumentExecutor {
    fn stage(&self) -> Stage {
        Stage::DocumentCreation
    }

    async fn run(&self, item: &RequirementItem) -> StageOutcome {
        let draft = match item.stage_detail(Stage::Generation) {
            Some(draft) => draft,
            None => return StageOutcome::fatal("no generated draft available"),
        };
        let title = draft_field(draft, "title").unwrap_or(&item.input.business_need);
        let body = match draft_field(draft, "body") {
            Some(body) => body,
            None => return StageOutcome::fatal("generated draft has no body"),
        };

        let mut artifacts = BTreeMap::new();
        let mut skipped: Vec<&str> = Vec::new();

        if item.artifacts.contains_key(ARTIFACT_GOOGLE_DOC) {
            skipped.push(ARTIFACT_GOOGLE_DOC);
        } else {
            let document = NewDocument {
                title: title.to_string(),
                body: body.to_string(),
            };
            match self.documents.create_document(&document).await {
                Ok(url) => {
                    artifacts.insert(ARTIFACT_GOOGLE_DOC.to_string(), url);
                }
                Err(CollaboratorError::Unavailable(reason)) => {
                    return StageOutcome::retryable(format!("document store unavailable: {}", reason))
                }
                Err(CollaboratorError::Rejected(reason)) => {
                    return StageOutcome::fatal(format!("document store rejected the document: {}", reason))
                }
            }
        }

        if item.artifacts.contains_key(ARTIFACT_JIRA_TICKET) {
            skipped.push(ARTIFACT_JIRA_TICKET);
        } else {
            let description = match draft_field(draft, "impact_narrative") {
                Some(narrative) => format!("{}\n\n{}", item.input.requirements, narrative),
                None => item.input.requirements.clone(),
            };
            let ticket = NewTicket {
                summary: title.to_string(),
                description,
                due_date: item.input.delivery_date.clone(),
            };
            match self.tickets.create_ticket(&ticket).await {
                Ok(url) => {
                    artifacts.insert(ARTIFACT_JIRA_TICKET.to_string(), url);
                }
                Err(CollaboratorError::Unavailable(reason)) => {
                    return StageOutcome::retryable(format!("ticket tracker unavailable: {}", reason))
                }
                Err(CollaboratorError::Rejected(reason)) => {
                    return StageOutcome::fatal(format!("ticket tracker rejected the ticket: {}", reason))
                }
            }
        }

        let detail = json!({
            "created": artifacts.keys().collect::<Vec<_>>(),
            "skipped": skipped,
        });
        StageOutcome::success_with_artifacts(detail, artifacts)
    }
}
