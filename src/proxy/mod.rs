//! Proxying subsystem.
//!
//! # Data Flow
//! ```text
//! Matched proxy location → RoutingRule
//!     → pool selects a backend (load_balancer)
//!     → rewrite.rs computes the upstream path
//!     → headers.rs derives client address, scheme, host; renders templates
//!     → forwarder.rs sends the request and relays the response
//!         or answers with a gateway error
//! ```
//!
//! # Design Decisions
//! - Rules are immutable once built; only pool health and rotation change
//! - Header names are parsed when the rule is built, not per request

pub mod client;
pub mod forwarder;
pub mod headers;
pub mod rewrite;

use axum::http::HeaderName;
use thiserror::Error;

use crate::config::{HealthCheckConfig, LocationConfig};
use crate::health::HealthProbe;
use crate::load_balancer::{BackendAddress, BackendPool};

pub use forwarder::RequestForwarder;
pub use headers::ClientConnection;

/// Error building a routing rule from configuration.
#[derive(Debug, Error)]
pub enum RuleError {
    #[error("invalid header name '{0}'")]
    InvalidHeaderName(String),
}

/// A proxy location: path prefix, backend pool and header policy.
pub struct RoutingRule {
    path_prefix: String,
    pool: BackendPool,
    header_templates: Vec<(HeaderName, String)>,
    pass_through: Vec<HeaderName>,
}

impl RoutingRule {
    pub fn new(path_prefix: impl Into<String>, pool: BackendPool) -> Self {
        Self {
            path_prefix: path_prefix.into(),
            pool,
            header_templates: Vec::new(),
            pass_through: Vec::new(),
        }
    }

    /// Set `name` on every outbound request to the rendered `template`.
    pub fn with_header_template(mut self, name: HeaderName, template: impl Into<String>) -> Self {
        self.header_templates.push((name, template.into()));
        self
    }

    /// Copy `name` from the inbound request when present and non-empty.
    pub fn with_pass_through(mut self, name: HeaderName) -> Self {
        self.pass_through.push(name);
        self
    }

    /// Build a rule for a proxy location whose pool holds `servers`.
    pub fn from_location(
        location: &LocationConfig,
        servers: &[String],
        probe: HealthProbe,
        health: HealthCheckConfig,
    ) -> Result<Self, RuleError> {
        let pool = BackendPool::new(servers.iter().map(BackendAddress::new), probe, health);
        let mut rule = Self::new(location.path.clone(), pool);

        for (name, template) in &location.proxy_set {
            rule = rule.with_header_template(parse_header_name(name)?, template.clone());
        }
        for name in &location.proxy_pass_headers {
            rule = rule.with_pass_through(parse_header_name(name)?);
        }

        Ok(rule)
    }

    pub fn path_prefix(&self) -> &str {
        &self.path_prefix
    }

    pub fn pool(&self) -> &BackendPool {
        &self.pool
    }

    pub fn header_templates(&self) -> &[(HeaderName, String)] {
        &self.header_templates
    }

    pub fn pass_through(&self) -> &[HeaderName] {
        &self.pass_through
    }
}

fn parse_header_name(name: &str) -> Result<HeaderName, RuleError> {
    HeaderName::from_bytes(name.as_bytes()).map_err(|_| RuleError::InvalidHeaderName(name.to_string()))
}
