//! Configuration loading and management.
//!
//! This module provides functionality to load and validate the service
//! configuration from `reqpipe.toml`.

pub mod error;
pub mod loader;
pub mod models;

pub use error::{ConfigError, ConfigResult};
pub use loader::load_config;
pub use models::{AppConfig, CollaboratorConfig, PipelineConfig, ServerConfig};
