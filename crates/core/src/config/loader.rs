//! Configuration file loader for `reqpipe.toml`.
//!
//! Loads the service configuration from a TOML file. A missing file is
//! not an error, since the defaults describe a complete local-dev setup.
//! An unreadable or syntactically invalid file is.

use std::net::SocketAddr;
use std::path::Path;

use crate::config::error::{ConfigError, ConfigResult};
use crate::config::models::AppConfig;

/// Load the service configuration from the given path.
///
/// # Returns
///
/// The parsed configuration, or the default configuration when the file
/// does not exist.
///
/// # Errors
///
/// Returns `ConfigError` if:
/// - The file exists but cannot be read
/// - The file has invalid TOML syntax
/// - A value fails validation (unparseable bind address, zero attempts)
pub fn load_config(path: &Path) -> ConfigResult<AppConfig> {
    if !path.exists() {
        return Ok(AppConfig::default());
    }

    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::FileRead {
        path: path.to_path_buf(),
        source,
    })?;

    let config: AppConfig = toml::from_str(&content).map_err(|source| ConfigError::TomlParse {
        path: path.to_path_buf(),
        source,
    })?;

    validate(path, &config)?;
    Ok(config)
}

fn validate(path: &Path, config: &AppConfig) -> ConfigResult<()> {
    if config.pipeline.max_attempts == 0 {
        return Err(ConfigError::InvalidConfig {
            path: path.to_path_buf(),
            reason: "pipeline.max_attempts must be at least 1".to_string(),
        });
    }

    if config.server.bind_addr.parse::<SocketAddr>().is_err() {
        return Err(ConfigError::InvalidConfig {
            path: path.to_path_buf(),
            reason: format!(
                "server.bind_addr '{}' is not a valid socket address",
                config.server.bind_addr
            ),
        });
    }

    Ok(())
}
