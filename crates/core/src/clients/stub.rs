//! In-process collaborator stubs.
//!
//! Deterministic stand-ins used when no collaborator URL is configured and
//! throughout the test suites. Each stub counts its calls and can be
//! switched into a failing mode to exercise the retry and fatal paths.

use async_trait::async_trait;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::clients::{
    CollaboratorError, DocumentStore, GeneratedDraft, GenerationRequest, NewDocument, NewTicket,
    NewWikiPage, TextGenerator, TicketTracker, WikiPublisher,
};

/// Behaviour of a stub collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StubMode {
    Ok,
    Unavailable,
    Rejecting,
}

fn check(mode: StubMode, name: &str) -> Result<(), CollaboratorError> {
    match mode {
        StubMode::Ok => Ok(()),
        StubMode::Unavailable => Err(CollaboratorError::Unavailable(format!(
            "stub {} is offline",
            name
        ))),
        StubMode::Rejecting => Err(CollaboratorError::Rejected(format!(
            "stub {} refuses all requests",
            name
        ))),
    }
}

/// Deterministic text generator producing a templated PRD draft.
pub struct StubTextGenerator {
    mode: StubMode,
    calls: AtomicU64,
}

impl StubTextGenerator {
    pub fn new() -> Self {
        Self {
            mode: StubMode::Ok,
            calls: AtomicU64::new(0),
        }
    }

    pub fn unavailable() -> Self {
        Self {
            mode: StubMode::Unavailable,
            calls: AtomicU64::new(0),
        }
    }

    pub fn rejecting() -> Self {
        Self {
            mode: StubMode::Rejecting,
            calls: AtomicU64::new(0),
        }
    }

    /// Number of generate calls observed.
    pub fn calls(&self) -> u64 {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Default for StubTextGenerator {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TextGenerator for StubTextGenerator {
    async fn generate(&self, request: &GenerationRequest) -> Result<GeneratedDraft, CollaboratorError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        check(self.mode, "text generator")?;

        let mut body = format!(
            "# {}\n\n## Business Need\n{}\n\n## Requirements\n{}\n",
            request.business_need, request.business_need, request.requirements
        );
        if !request.definitions.is_empty() {
            body.push_str("\n## Definitions\n");
            for term in &request.definitions {
                body.push_str(&format!("- {}: {}\n", term.attribute, term.definition));
            }
        }

        Ok(GeneratedDraft {
            title: request.business_need.clone(),
            body,
            impact_narrative: format!("Expected impact: {}", request.business_impact),
        })
    }
}

/// Document store minting sequential shareable links.
pub struct StubDocumentStore {
    mode: StubMode,
    calls: AtomicU64,
}

impl StubDocumentStore {
    pub fn new() -> Self {
        Self {
            mode: StubMode::Ok,
            calls: AtomicU64::new(0),
        }
    }

    pub fn unavailable() -> Self {
        Self {
            mode: StubMode::Unavailable,
            calls: AtomicU64::new(0),
        }
    }

    /// Number of create calls observed.
    pub fn calls(&self) -> u64 {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Default for StubDocumentStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DocumentStore for StubDocumentStore {
    async fn create_document(&self, _document: &NewDocument) -> Result<String, CollaboratorError> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        check(self.mode, "document store")?;
        Ok(format!("https://docs.google.com/document/d/prd-{}", n))
    }
}

/// Ticket tracker minting sequential ticket links.
pub struct StubTicketTracker {
    mode: StubMode,
    calls: AtomicU64,
}

impl StubTicketTracker {
    pub fn new() -> Self {
        Self {
            mode: StubMode::Ok,
            calls: AtomicU64::new(0),
        }
    }

    pub fn unavailable() -> Self {
        Self {
            mode: StubMode::Unavailable,
            calls: AtomicU64::new(0),
        }
    }

    /// Number of create calls observed.
    pub fn calls(&self) -> u64 {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Default for StubTicketTracker {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TicketTracker for StubTicketTracker {
    async fn create_ticket(&self, _ticket: &NewTicket) -> Result<String, CollaboratorError> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        check(self.mode, "ticket tracker")?;
        Ok(format!("https://jira.example.com/browse/PRD-{}", n))
    }
}

/// Wiki publisher minting sequential page links.
pub struct StubWikiPublisher {
    mode: StubMode,
    calls: AtomicU64,
}

impl StubWikiPublisher {
    pub fn new() -> Self {
        Self {
            mode: StubMode::Ok,
            calls: AtomicU64::new(0),
        }
    }

    pub fn unavailable() -> Self {
        Self {
            mode: StubMode::Unavailable,
            calls: AtomicU64::new(0),
        }
    }

    /// Number of publish calls observed.
    pub fn calls(&self) -> u64 {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Default for StubWikiPublisher {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl WikiPublisher for StubWikiPublisher {
    async fn publish(&self, _page: &NewWikiPage) -> Result<String, CollaboratorError> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        check(self.mode, "wiki")?;
        Ok(format!("https://wiki.example.com/design/prd-{}", n))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rp_protocol::requirement_models::TermDefinition;

    fn sample_request() -> GenerationRequest {
        GenerationRequest {
            business_need: "Add SSO login".to_string(),
            requirements: "Support SAML and OIDC".to_string(),
            business_impact: "Fewer support tickets".to_string(),
            definitions: vec![TermDefinition {
                attribute: "SSO".to_string(),
                definition: "Single sign-on".to_string(),
            }],
        }
    }

    #[tokio::test]
    async fn test_stub_generator_produces_templated_draft() {
        let generator = StubTextGenerator::new();

        let draft = generator.generate(&sample_request()).await.unwrap();

        assert_eq!(draft.title, "Add SSO login");
        assert!(draft.body.contains("## Requirements"));
        assert!(draft.body.contains("SSO: Single sign-on"));
        assert!(draft.impact_narrative.contains("Fewer support tickets"));
        assert_eq!(generator.calls(), 1);
    }

    #[tokio::test]
    async fn test_unavailable_stub_fails_transiently() {
        let generator = StubTextGenerator::unavailable();

        let result = generator.generate(&sample_request()).await;
        assert!(matches!(result, Err(CollaboratorError::Unavailable(_))));
    }

    #[tokio::test]
    async fn test_rejecting_stub_fails_permanently() {
        let generator = StubTextGenerator::rejecting();

        let result = generator.generate(&sample_request()).await;
        assert!(matches!(result, Err(CollaboratorError::Rejected(_))));
    }

    #[tokio::test]
    async fn test_document_store_counts_calls_and_mints_links() {
        let store = StubDocumentStore::new();
        let document = NewDocument {
            title: "PRD".to_string(),
            body: "body".to_string(),
        };

        let first = store.create_document(&document).await.unwrap();
        let second = store.create_document(&document).await.unwrap();

        assert_eq!(first, "https://docs.google.com/document/d/prd-1");
        assert_eq!(second, "https://docs.google.com/document/d/prd-2");
        assert_eq!(store.calls(), 2);
    }
}
