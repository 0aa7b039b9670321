//! HTTP-backed collaborator clients.
//!
//! Each client speaks a small JSON contract against a configured base URL:
//! one POST per operation, a JSON body, and a JSON response carrying the
//! produced reference. Transport errors and 5xx responses are classified
//! as [`CollaboratorError::Unavailable`]; other non-success statuses and
//! unparseable bodies as [`CollaboratorError::Rejected`].

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::clients::{
    CollaboratorError, DocumentStore, GeneratedDraft, GenerationRequest, NewDocument, NewTicket,
    NewWikiPage, TextGenerator, TicketTracker, WikiPublisher,
};

#[derive(Debug, Deserialize)]
struct ReferenceResponse {
    url: String,
}

async fn post_json<Req, Resp>(
    client: &reqwest::Client,
    url: String,
    body: &Req,
) -> Result<Resp, CollaboratorError>
where
    Req: Serialize + Sync,
    Resp: DeserializeOwned,
{
    let response = client
        .post(&url)
        .json(body)
        .send()
        .await
        .map_err(|e| CollaboratorError::Unavailable(format!("{}: {}", url, e)))?;

    let status = response.status();
    if status.is_server_error() {
        return Err(CollaboratorError::Unavailable(format!(
            "{} answered {}",
            url, status
        )));
    }
    if !status.is_success() {
        return Err(CollaboratorError::Rejected(format!(
            "{} answered {}",
            url, status
        )));
    }

    response
        .json::<Resp>()
        .await
        .map_err(|e| CollaboratorError::Rejected(format!("{} returned an unusable body: {}", url, e)))
}

/// Text-generation collaborator over HTTP.
///
/// Contract: `POST {base}/v1/generate` with a [`GenerationRequest`] body,
/// answering a [`GeneratedDraft`].
pub struct HttpTextGenerator {
    client: reqwest::Client,
    base_url: String,
}

impl HttpTextGenerator {
    pub fn new(base_url: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url,
        }
    }
}

#[async_trait]
impl TextGenerator for HttpTextGenerator {
    async fn generate(&self, request: &GenerationRequest) -> Result<GeneratedDraft, CollaboratorError> {
        post_json(&self.client, format!("{}/v1/generate", self.base_url), request).await
    }
}

/// Document-store collaborator over HTTP.
///
/// Contract: `POST {base}/v1/documents` answering `{"url": ...}`.
pub struct HttpDocumentStore {
    client: reqwest::Client,
    base_url: String,
}

impl HttpDocumentStore {
    pub fn new(base_url: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url,
        }
    }
}

#[async_trait]
impl DocumentStore for HttpDocumentStore {
    async fn create_document(&self, document: &NewDocument) -> Result<String, CollaboratorError> {
        let response: ReferenceResponse =
            post_json(&self.client, format!("{}/v1/documents", self.base_url), document).await?;
        Ok(response.url)
    }
}

/// Ticket-tracker collaborator over HTTP.
///
/// Contract: `POST {base}/v1/tickets` answering `{"url": ...}`.
pub struct HttpTicketTracker {
    client: reqwest::Client,
    base_url: String,
}

impl HttpTicketTracker {
    pub fn new(base_url: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url,
        }
    }
}

#[async_trait]
impl TicketTracker for HttpTicketTracker {
    async fn create_ticket(&self, ticket: &NewTicket) -> Result<String, CollaboratorError> {
        let response: ReferenceResponse =
            post_json(&self.client, format!("{}/v1/tickets", self.base_url), ticket).await?;
        Ok(response.url)
    }
}

/// Wiki collaborator over HTTP.
///
/// Contract: `POST {base}/v1/pages` answering `{"url": ...}`.
pub struct HttpWikiPublisher {
    client: reqwest::Client,
    base_url: String,
}

impl HttpWikiPublisher {
    pub fn new(base_url: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url,
        }
    }
}

#[async_trait]
impl WikiPublisher for HttpWikiPublisher {
    async fn publish(&self, page: &NewWikiPage) -> Result<String, CollaboratorError> {
        let response: ReferenceResponse =
            post_json(&self.client, format!("{}/v1/pages", self.base_url), page).await?;
        Ok(response.url)
    }
}
