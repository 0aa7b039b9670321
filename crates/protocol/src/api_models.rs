//! REST API request and response shapes.
//!
//! These are the wire types served to the polling web client. The
//! submission body reuses [`RequirementInput`]; everything the server
//! returns is defined here. Response fields are snake_case to match the
//! contract the client already consumes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use ts_rs::TS;
use uuid::Uuid;

use crate::requirement_models::{RequirementInput, Stage, StageStatus};

/// Condensed view of an item for list responses and creation receipts.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, TS)]
pub struct RequirementSummary {
    #[ts(type = "string")]
    pub id: Uuid,

    /// The submitted business need, used as the item's display title.
    pub business_need: String,

    /// Coarse status string: `pending`, a stage name, `complete` or `error`.
    pub status: String,

    /// Current pipeline stage.
    pub stage: Stage,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One entry of the `steps` array in status and detail responses.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, TS)]
pub struct StepView {
    /// Stage name (`validation`, `generation`, ...).
    pub name: String,

    /// Attempt status.
    pub status: StageStatus,

    /// 1-based attempt counter within the stage.
    pub attempt: u32,

    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,

    /// Diagnostic payload from the stage executor, when present.
    #[ts(type = "any | null")]
    pub details: Option<Value>,

    /// Failure message for failed attempts.
    pub error: Option<String>,
}

/// The polled status projection of one item.
///
/// Clients poll this shape every few seconds and stop once `status` is
/// `complete` or `error`. The `links` map carries the external document
/// references accumulated so far; keys appear only after the producing
/// stage has succeeded.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, TS)]
pub struct StatusResponse {
    #[ts(type = "string")]
    pub id: Uuid,

    /// Coarse status string: `pending`, a stage name, `complete` or `error`.
    pub status: String,

    /// Human-readable progress label.
    pub status_label: String,

    /// Name of the stage the item currently sits in.
    pub current_node: String,

    /// Full attempt history, in append order.
    pub steps: Vec<StepView>,

    /// External document links keyed by artifact name.
    pub links: BTreeMap<String, String>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Full detail projection of one item.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, TS)]
pub struct RequirementDetail {
    #[ts(type = "string")]
    pub id: Uuid,

    /// The original submission payload (camelCase fields).
    pub input: RequirementInput,

    pub stage: Stage,
    pub status: String,
    pub steps: Vec<StepView>,
    pub links: BTreeMap<String, String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Response body for a successful submission.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, TS)]
pub struct CreateRequirementResponse {
    pub success: bool,
    pub requirement: RequirementSummary,
}

/// Response body for the list endpoint.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, TS)]
pub struct RequirementListResponse {
    pub requirements: Vec<RequirementSummary>,
}
