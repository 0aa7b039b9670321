//! Configuration models for `reqpipe.toml`.
//!
//! All sections and fields are optional in the file; missing values fall
//! back to the defaults below, so an empty or absent file yields a fully
//! usable local-dev configuration.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::engine::RetryPolicy;

/// Unified service configuration loaded from `reqpipe.toml`.
///
/// # Example
///
/// ```toml
/// [server]
/// bind_addr = "127.0.0.1:8080"
///
/// [pipeline]
/// max_attempts = 3
/// retry_base_ms = 500
/// retry_max_ms = 30000
/// stage_timeout_secs = 120
///
/// [collaborators]
/// generator_url = "https://llm.internal.example.com"
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    /// HTTP server settings.
    pub server: ServerConfig,

    /// Retry and timeout policy for stage execution.
    pub pipeline: PipelineConfig,

    /// Base URLs of the external collaborators. An absent URL wires the
    /// in-process stub instead.
    pub collaborators: CollaboratorConfig,
}

/// HTTP server settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address the HTTP server listens on.
    pub bind_addr: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:8080".to_string(),
        }
    }
}

/// Retry and timeout policy for stage execution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Total attempts allowed per stage, including the first.
    pub max_attempts: u32,

    /// Delay before the second attempt, in milliseconds.
    pub retry_base_ms: u64,

    /// Upper bound on the backoff delay, in milliseconds.
    pub retry_max_ms: u64,

    /// Timeout per stage attempt, in seconds.
    pub stage_timeout_secs: u64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            retry_base_ms: 500,
            retry_max_ms: 30_000,
            stage_timeout_secs: 120,
        }
    }
}

impl PipelineConfig {
    /// Convert the configured values into the engine's retry policy.
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.max_attempts,
            base_delay: Duration::from_millis(self.retry_base_ms),
            max_delay: Duration::from_millis(self.retry_max_ms),
            stage_timeout: Duration::from_secs(self.stage_timeout_secs),
        }
    }
}

/// Base URLs of the external collaborators.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct CollaboratorConfig {
    /// Text-generation service.
    pub generator_url: Option<String>,

    /// Document store.
    pub document_url: Option<String>,

    /// Ticket tracker.
    pub tracker_url: Option<String>,

    /// Wiki hosting design pages.
    pub wiki_url: Option<String>,
}
