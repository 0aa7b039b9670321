//! Requirement item and stage-history models.
//!
//! This module defines the structures for tracking a submitted requirement
//! as it moves through the processing pipeline: the immutable submission
//! payload, the per-stage attempt log, and the item record itself.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use ts_rs::TS;
use uuid::Uuid;

/// Artifact key for the primary PRD document link.
pub const ARTIFACT_GOOGLE_DOC: &str = "google_doc";

/// Artifact key for the tracking ticket link.
pub const ARTIFACT_JIRA_TICKET: &str = "jira_ticket";

/// Artifact key for the technical design page link.
pub const ARTIFACT_WIKI_PAGE: &str = "wiki_page";

/// Pipeline stages in execution order.
///
/// A requirement progresses through the four working stages in a fixed
/// total order and ends in one of the two terminal stages:
///
/// Validation -> Generation -> DocumentCreation -> DesignDocument -> Complete
///
/// `Error` is reachable from any non-terminal stage and, like `Complete`,
/// admits no further transitions.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, TS)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    /// Completeness and consistency checks on the submitted payload.
    Validation,

    /// AI-assisted drafting of the requirement text and impact narrative.
    Generation,

    /// Creation of the primary document and tracking ticket.
    DocumentCreation,

    /// Publication of the technical design page.
    DesignDocument,

    /// All stages succeeded. Terminal.
    Complete,

    /// A stage failed fatally or exhausted its retry budget. Terminal.
    Error,
}

impl Stage {
    /// The stage that follows this one in pipeline order.
    ///
    /// Terminal stages return themselves; the pipeline never leaves them.
    pub fn next(self) -> Stage {
        match self {
            Stage::Validation => Stage::Generation,
            Stage::Generation => Stage::DocumentCreation,
            Stage::DocumentCreation => Stage::DesignDocument,
            Stage::DesignDocument => Stage::Complete,
            Stage::Complete => Stage::Complete,
            Stage::Error => Stage::Error,
        }
    }

    /// Whether this stage admits no further transitions.
    pub fn is_terminal(self) -> bool {
        matches!(self, Stage::Complete | Stage::Error)
    }

    /// Wire name of the stage, matching its serde representation.
    pub fn as_str(self) -> &'static str {
        match self {
            Stage::Validation => "validation",
            Stage::Generation => "generation",
            Stage::DocumentCreation => "document_creation",
            Stage::DesignDocument => "design_document",
            Stage::Complete => "complete",
            Stage::Error => "error",
        }
    }

    /// Human-readable progress label shown to polling clients.
    pub fn label(self) -> &'static str {
        match self {
            Stage::Validation => "Validating submission",
            Stage::Generation => "Drafting requirement text",
            Stage::DocumentCreation => "Creating documents",
            Stage::DesignDocument => "Publishing design document",
            Stage::Complete => "Complete",
            Stage::Error => "Failed",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome status of a single stage attempt.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, TS)]
#[serde(rename_all = "snake_case")]
pub enum StageStatus {
    /// The attempt is in flight. At most one record per item may be running.
    Running,

    /// The attempt finished successfully.
    Succeeded,

    /// The attempt failed (transiently or fatally).
    Failed,
}

/// One attempt at a pipeline stage.
///
/// Records are appended to an item's history when an attempt starts and
/// are never mutated again once `finished_at` is set.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, TS)]
pub struct StageRecord {
    /// The stage this attempt belongs to.
    pub stage: Stage,

    /// Current status of the attempt.
    pub status: StageStatus,

    /// 1-based attempt counter within the stage.
    pub attempt: u32,

    /// When the attempt started.
    pub started_at: DateTime<Utc>,

    /// When the attempt finished. `None` while the attempt is running.
    pub finished_at: Option<DateTime<Utc>>,

    /// Free-form diagnostic payload produced by the stage executor.
    #[ts(type = "any | null")]
    pub detail: Option<Value>,

    /// Failure message for failed attempts.
    pub error: Option<String>,
}

/// A glossary term supplied with the submission.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, TS)]
pub struct TermDefinition {
    pub attribute: String,
    pub definition: String,
}

/// The submitted requirement payload.
///
/// Field names follow the web client's camelCase wire shape. The payload
/// is immutable once submitted; stages read from it but never change it.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, TS)]
#[serde(rename_all = "camelCase")]
pub struct RequirementInput {
    /// What the business needs and why.
    pub business_need: String,

    /// Detailed requirement text.
    pub requirements: String,

    /// Expected business impact statement.
    pub business_impact: String,

    /// Target delivery date, `YYYY-MM-DD`.
    pub delivery_date: String,

    /// Target campaign date, `YYYY-MM-DD`. May precede the delivery date;
    /// the validation stage surfaces ordering feedback without failing.
    pub campaign_date: String,

    /// Optional glossary of domain terms.
    #[serde(default)]
    pub definitions: Vec<TermDefinition>,
}

/// One requirement moving through the pipeline.
///
/// Items are created by the submission gateway and mutated exclusively by
/// the orchestrator as stages execute. They are never deleted; terminal
/// items persist for audit and late polling.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, TS)]
pub struct RequirementItem {
    /// Unique identifier, assigned at creation.
    #[ts(type = "string")]
    pub id: Uuid,

    /// The original submission payload.
    pub input: RequirementInput,

    /// Current pipeline stage.
    pub stage: Stage,

    /// Append-only log of stage attempts, in execution order.
    pub step_history: Vec<StageRecord>,

    /// External links produced by succeeded stages, keyed by artifact name
    /// (`google_doc`, `jira_ticket`, `wiki_page`). Entries are never
    /// overwritten once present.
    pub artifacts: BTreeMap<String, String>,

    /// When the item was created.
    pub created_at: DateTime<Utc>,

    /// Advances on every persisted transition.
    pub updated_at: DateTime<Utc>,
}

impl RequirementItem {
    /// The most recently appended stage record, if any.
    pub fn latest_record(&self) -> Option<&StageRecord> {
        self.step_history.last()
    }

    /// The currently running stage record, if any.
    pub fn running_record(&self) -> Option<&StageRecord> {
        self.step_history
            .iter()
            .find(|record| record.status == StageStatus::Running)
    }

    /// Diagnostic detail of the most recent succeeded attempt at `stage`.
    ///
    /// Later stages use this to read upstream outputs (e.g. the generated
    /// draft) without any shared mutable state.
    pub fn stage_detail(&self, stage: Stage) -> Option<&Value> {
        self.step_history
            .iter()
            .rev()
            .find(|record| record.stage == stage && record.status == StageStatus::Succeeded)
            .and_then(|record| record.detail.as_ref())
    }

    /// Number of recorded attempts at `stage`.
    pub fn attempts_at(&self, stage: Stage) -> u32 {
        self.step_history
            .iter()
            .filter(|record| record.stage == stage)
            .count() as u32
    }
}
