//! External collaborator interfaces.
//!
//! The pipeline reaches its external systems (the text-generation
//! assistant, the document store, the ticket tracker and the wiki) only
//! through the narrow traits defined here. Their internals are out of
//! scope; the pipeline cares about success, failure class and the
//! returned reference.
//!
//! Failure classes map directly onto stage outcomes: [`Unavailable`]
//! failures are transient and worth retrying, [`Rejected`] failures are
//! permanent.
//!
//! [`Unavailable`]: CollaboratorError::Unavailable
//! [`Rejected`]: CollaboratorError::Rejected

pub mod http;
pub mod stub;

pub use http::{HttpDocumentStore, HttpTextGenerator, HttpTicketTracker, HttpWikiPublisher};
pub use stub::{StubDocumentStore, StubTextGenerator, StubTicketTracker, StubWikiPublisher};

use async_trait::async_trait;
use rp_protocol::requirement_models::{RequirementInput, TermDefinition};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors returned by external collaborators.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CollaboratorError {
    /// Transient failure: the collaborator could not be reached or answered
    /// with a server-side error.
    #[error("Collaborator unavailable: {0}")]
    Unavailable(String),

    /// Permanent failure: the collaborator understood the request and
    /// refused it, or returned an unusable response.
    #[error("Collaborator rejected the request: {0}")]
    Rejected(String),
}

/// Request sent to the text-generation collaborator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationRequest {
    pub business_need: String,
    pub requirements: String,
    pub business_impact: String,
    pub definitions: Vec<TermDefinition>,
}

impl GenerationRequest {
    /// Build a request from a submitted payload.
    pub fn from_input(input: &RequirementInput) -> Self {
        Self {
            business_need: input.business_need.clone(),
            requirements: input.requirements.clone(),
            business_impact: input.business_impact.clone(),
            definitions: input.definitions.clone(),
        }
    }
}

/// Draft returned by the text-generation collaborator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratedDraft {
    /// Document title derived from the business need.
    pub title: String,

    /// Full PRD body text.
    pub body: String,

    /// Narrative restatement of the business impact.
    pub impact_narrative: String,
}

/// Payload for creating the primary document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewDocument {
    pub title: String,
    pub body: String,
}

/// Payload for creating the tracking ticket.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewTicket {
    pub summary: String,
    pub description: String,
    pub due_date: String,
}

/// Payload for publishing the design page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewWikiPage {
    pub title: String,
    pub content: String,
}

/// The external natural-language assistant drafting requirement text.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, request: &GenerationRequest) -> Result<GeneratedDraft, CollaboratorError>;
}

/// The external document store holding the primary PRD document.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Create a document and return its shareable URL.
    async fn create_document(&self, document: &NewDocument) -> Result<String, CollaboratorError>;
}

/// The external ticket tracker.
#[async_trait]
pub trait TicketTracker: Send + Sync {
    /// Create a ticket and return its URL.
    async fn create_ticket(&self, ticket: &NewTicket) -> Result<String, CollaboratorError>;
}

/// The external wiki hosting design documents.
#[async_trait]
pub trait WikiPublisher: Send + Sync {
    /// Publish a page and return its URL.
    async fn publish(&self, page: &NewWikiPage) -> Result<String, CollaboratorError>;
}
