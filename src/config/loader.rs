//! Configuration loading from disk.

use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::config::schema::ProxyConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("configuration validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Parse and validate configuration from TOML text.
pub fn parse_config(content: &str) -> Result<ProxyConfig, ConfigError> {
    let config: ProxyConfig = toml::from_str(content)?;
    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

/// Load and validate configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<ProxyConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    parse_config(&content)
}

/// Log a summary of the loaded configuration.
pub fn log_summary(config: &ProxyConfig) {
    tracing::info!(
        servers = config.servers.len(),
        upstreams = config.upstreams.len(),
        "Loaded configuration"
    );

    for server in &config.servers {
        tracing::info!(
            listen = %server.listen,
            server_name = server.server_name.as_deref().unwrap_or(""),
            locations = server.locations.len(),
            "Server block"
        );
        for location in &server.locations {
            tracing::info!(
                path = %location.path,
                proxy_pass = location.proxy_pass.as_deref().unwrap_or(""),
                root = location.root.as_deref().unwrap_or(""),
                "  Location"
            );
        }
    }

    for upstream in &config.upstreams {
        tracing::info!(name = %upstream.name, servers = ?upstream.servers, "Upstream");
    }
}
