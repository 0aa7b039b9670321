//! Design-document stage: technical design page on the wiki.
//!
//! Publishes a design page referencing the primary document created by the
//! previous stage. Like document creation, the stage skips publication
//! when a wiki link is already recorded on the item.

use async_trait::async_trait;
use rp_protocol::requirement_models::{
    RequirementItem, Stage, ARTIFACT_GOOGLE_DOC, ARTIFACT_WIKI_PAGE,
};
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::clients::{CollaboratorError, NewWikiPage, WikiPublisher};
use crate::stages::{StageExecutor, StageOutcome};

/// Publishes the technical design page.
pub struct DesignExecutor {
    wiki: Arc<dyn WikiPublisher>,
}

impl DesignExecutor {
    pub fn new(wiki: Arc<dyn WikiPublisher>) -> Self {
        Self { wiki }
    }
}

#[async_trait]
impl StageExecutor for DesignExecutor {
    fn stage(&self) -> Stage {
        Stage::DesignDocument
    }

    async fn run(&self, item: &RequirementItem) -> StageOutcome {
        if let Some(existing) = item.artifacts.get(ARTIFACT_WIKI_PAGE) {
            return StageOutcome::success(json!({
                "skipped": true,
                "wiki_page": existing,
            }));
        }

        let doc_url = match item.artifacts.get(ARTIFACT_GOOGLE_DOC) {
            Some(url) => url,
            None => return StageOutcome::fatal("primary document link missing"),
        };

        let title = item
            .stage_detail(Stage::Generation)
            .and_then(|draft| draft.get("title"))
            .and_then(Value::as_str)
            .unwrap_or(&item.input.business_need);

        let page = NewWikiPage {
            title: format!("Design: {}", title),
            content: format!(
                "# Design: {}\n\nPrimary document: {}\n\n## Requirements\n{}\n",
                title, doc_url, item.input.requirements
            ),
        };

        match self.wiki.publish(&page).await {
            Ok(url) => {
                let artifacts = BTreeMap::from([(ARTIFACT_WIKI_PAGE.to_string(), url.clone())]);
                StageOutcome::success_with_artifacts(json!({"wiki_page": url}), artifacts)
            }
            Err(CollaboratorError::Unavailable(reason)) => {
                StageOutcome::retryable(format!("wiki unavailable: {}", reason))
            }
            Err(CollaboratorError::Rejected(reason)) => {
                StageOutcome::fatal(format!("wiki rejected the page: {}", reason))
            }
        }
    }
}
