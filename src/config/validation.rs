//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check referential integrity (locations reference existing upstreams)
//! - Detect conflicting servers and locations
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure except for the `root` directory existence check
//! - Upstreams without servers are accepted; requests to them answer 503

use std::collections::HashSet;
use std::path::Path;

use axum::http::HeaderName;
use thiserror::Error;

use crate::config::schema::{LocationConfig, ProxyConfig};

/// A single semantic problem in a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("no servers configured")]
    NoServers,

    #[error("server listen address cannot be empty")]
    EmptyListen,

    #[error("duplicate listen address: {0}")]
    DuplicateListen(String),

    #[error("duplicate server_name found: {0}")]
    DuplicateServerName(String),

    #[error("duplicate upstream name: {0}")]
    DuplicateUpstream(String),

    #[error("location path cannot be empty")]
    EmptyLocationPath,

    #[error("location path must start with '/': {0}")]
    RelativeLocationPath(String),

    #[error("duplicate location {path} in server {listen}")]
    DuplicateLocation { listen: String, path: String },

    #[error("location {0} cannot have both proxy_pass and root")]
    ProxyAndRoot(String),

    #[error("location {0} must have either proxy_pass or root")]
    NoHandler(String),

    #[error("upstream '{upstream}' not found for location '{path}'")]
    UnknownUpstream { upstream: String, path: String },

    #[error("root directory does not exist: {0}")]
    MissingRoot(String),

    #[error("invalid header name '{header}' in location {path}")]
    InvalidHeaderName { header: String, path: String },
}

/// Validate a parsed configuration, collecting every error found.
pub fn validate_config(config: &ProxyConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.servers.is_empty() {
        errors.push(ValidationError::NoServers);
    }

    let mut upstream_names = HashSet::new();
    for upstream in &config.upstreams {
        if !upstream_names.insert(upstream.name.as_str()) {
            errors.push(ValidationError::DuplicateUpstream(upstream.name.clone()));
        }
    }

    let mut listens = HashSet::new();
    let mut server_names = HashSet::new();
    for server in &config.servers {
        if server.listen.is_empty() {
            errors.push(ValidationError::EmptyListen);
        } else if !listens.insert(server.listen.as_str()) {
            errors.push(ValidationError::DuplicateListen(server.listen.clone()));
        }

        if let Some(name) = server.server_name.as_deref().filter(|n| !n.is_empty()) {
            if !server_names.insert(name) {
                errors.push(ValidationError::DuplicateServerName(name.to_string()));
            }
        }

        let mut paths = HashSet::new();
        for location in &server.locations {
            if !location.path.is_empty() && !paths.insert(location.path.as_str()) {
                errors.push(ValidationError::DuplicateLocation {
                    listen: server.listen.clone(),
                    path: location.path.clone(),
                });
            }
            validate_location(config, location, &mut errors);
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn validate_location(config: &ProxyConfig, location: &LocationConfig, errors: &mut Vec<ValidationError>) {
    let path = &location.path;
    if path.is_empty() {
        errors.push(ValidationError::EmptyLocationPath);
    } else if !path.starts_with('/') {
        errors.push(ValidationError::RelativeLocationPath(path.clone()));
    }

    match (location.proxy_target(), location.root_dir()) {
        (Some(_), Some(_)) => errors.push(ValidationError::ProxyAndRoot(path.clone())),
        (None, None) => errors.push(ValidationError::NoHandler(path.clone())),
        (Some(target), None) => {
            if location.direct_url().is_none() && config.upstream(target).is_none() {
                errors.push(ValidationError::UnknownUpstream {
                    upstream: target.to_string(),
                    path: path.clone(),
                });
            }
        }
        (None, Some(root)) => {
            if !Path::new(root).is_dir() {
                errors.push(ValidationError::MissingRoot(root.to_string()));
            }
        }
    }

    let header_names = location
        .proxy_set
        .keys()
        .chain(location.proxy_pass_headers.iter());
    for header in header_names {
        if HeaderName::from_bytes(header.as_bytes()).is_err() {
            errors.push(ValidationError::InvalidHeaderName {
                header: header.clone(),
                path: path.clone(),
            });
        }
    }
}
