//! Location lookup and dispatch.
//!
//! # Responsibilities
//! - Compile a server block's locations into a `LocationTable`
//! - Resolve a request path to a location, a redirect, or no match
//!
//! # Design Decisions
//! - Immutable after construction; reloads build a new table
//! - Locations kept sorted longest pattern first, so the first match wins
//! - O(n) scan per request (acceptable for typical location counts)
//! - Explicit NotFound rather than a silent default

use thiserror::Error;

use crate::config::{HealthCheckConfig, LocationConfig, ProxyConfig, ServerConfig};
use crate::health::HealthProbe;
use crate::http::static_files::StaticFiles;
use crate::proxy::{RoutingRule, RuleError};
use crate::routing::matcher::PathPattern;

/// Error compiling a location table.
#[derive(Debug, Error)]
pub enum RouteError {
    #[error("location {path}: unknown upstream '{upstream}'")]
    UnknownUpstream { upstream: String, path: String },

    #[error("location {0}: needs either proxy_pass or root")]
    NoHandler(String),

    #[error("location {path}: {source}")]
    Rule {
        path: String,
        #[source]
        source: RuleError,
    },
}

/// What a location does with a matched request.
pub enum Handler {
    Proxy(RoutingRule),
    Static(StaticFiles),
}

/// A compiled location.
pub struct Location {
    pattern: PathPattern,
    handler: Handler,
}

impl Location {
    pub fn new(pattern: PathPattern, handler: Handler) -> Self {
        Self { pattern, handler }
    }

    pub fn pattern(&self) -> &PathPattern {
        &self.pattern
    }

    pub fn handler(&self) -> &Handler {
        &self.handler
    }
}

/// Result of resolving a request path.
pub enum Resolution<'a> {
    Matched(&'a Location),
    /// Redirect to the subtree form of the requested path.
    Redirect(String),
    NotFound,
}

/// The locations of one server block.
pub struct LocationTable {
    locations: Vec<Location>,
}

impl LocationTable {
    pub fn new(mut locations: Vec<Location>) -> Self {
        locations.sort_by(|a, b| b.pattern.as_str().len().cmp(&a.pattern.as_str().len()));
        Self { locations }
    }

    /// Compile `server`'s locations. Upstream references resolve against `config`.
    pub fn build(server: &ServerConfig, config: &ProxyConfig, probe: &HealthProbe) -> Result<Self, RouteError> {
        let mut locations = Vec::with_capacity(server.locations.len());

        for location in &server.locations {
            let handler = build_handler(location, config, probe, &config.health_check)?;
            locations.push(Location::new(PathPattern::parse(&location.path), handler));
        }

        tracing::debug!(
            listen = %server.listen,
            locations = locations.len(),
            "Location table compiled"
        );

        Ok(Self::new(locations))
    }

    pub fn resolve(&self, path: &str) -> Resolution<'_> {
        if !path.ends_with('/') && !self.has_exact(path) {
            let subtree = format!("{path}/");
            if self.locations.iter().any(|l| l.pattern == PathPattern::Subtree(subtree.clone())) {
                return Resolution::Redirect(subtree);
            }
        }

        match self.locations.iter().find(|l| l.pattern.matches(path)) {
            Some(location) => Resolution::Matched(location),
            None => Resolution::NotFound,
        }
    }

    fn has_exact(&self, path: &str) -> bool {
        self.locations
            .iter()
            .any(|l| matches!(&l.pattern, PathPattern::Exact(p) if p == path))
    }

    /// Proxy rules, longest pattern first.
    pub fn rules(&self) -> impl Iterator<Item = &RoutingRule> {
        self.locations.iter().filter_map(|l| match &l.handler {
            Handler::Proxy(rule) => Some(rule),
            Handler::Static(_) => None,
        })
    }

    pub fn len(&self) -> usize {
        self.locations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locations.is_empty()
    }
}

fn build_handler(
    location: &LocationConfig,
    config: &ProxyConfig,
    probe: &HealthProbe,
    health: &HealthCheckConfig,
) -> Result<Handler, RouteError> {
    if let Some(root) = location.root_dir() {
        return Ok(Handler::Static(StaticFiles::new(root, location.index.as_deref())));
    }

    let Some(target) = location.proxy_target() else {
        return Err(RouteError::NoHandler(location.path.clone()));
    };

    let servers = match location.direct_url() {
        Some(url) => vec![url.to_string()],
        None => config
            .upstream(target)
            .map(|u| u.servers.clone())
            .ok_or_else(|| RouteError::UnknownUpstream {
                upstream: target.to_string(),
                path: location.path.clone(),
            })?,
    };

    if servers.is_empty() {
        tracing::warn!(
            location = %location.path,
            upstream = %target,
            "Upstream has no servers, requests will be answered with 503"
        );
    }

    let rule = RoutingRule::from_location(location, &servers, probe.clone(), health.clone()).map_err(|source| {
        RouteError::Rule {
            path: location.path.clone(),
            source,
        }
    })?;
    Ok(Handler::Proxy(rule))
}
