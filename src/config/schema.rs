//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the proxy.
//! All types derive Serde traits for deserialization from config files.

use std::collections::BTreeMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Root configuration for the proxy.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ProxyConfig {
    /// Server blocks, one listener each.
    pub servers: Vec<ServerConfig>,

    /// Named upstream groups referenced by `proxy_pass`.
    pub upstreams: Vec<UpstreamConfig>,

    /// Health check settings.
    pub health_check: HealthCheckConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    /// Admin API settings.
    pub admin: AdminConfig,

    /// Shutdown behaviour.
    pub lifecycle: LifecycleConfig,
}

impl ProxyConfig {
    /// Look up an upstream group by name.
    pub fn upstream(&self, name: &str) -> Option<&UpstreamConfig> {
        self.upstreams.iter().find(|u| u.name == name)
    }
}

/// A server block: one listen address and its locations.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ServerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub listen: String,

    /// Informational server name, unique across server blocks.
    pub server_name: Option<String>,

    /// Locations served by this block.
    pub locations: Vec<LocationConfig>,
}

/// A location block. Either proxies (`proxy_pass`) or serves files (`root`).
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct LocationConfig {
    /// Path pattern. A trailing `/` makes it a prefix match.
    pub path: String,

    /// Upstream name, or a direct `http://` / `https://` URL.
    pub proxy_pass: Option<String>,

    /// Directory served for static locations.
    pub root: Option<String>,

    /// Index file for directory requests (default `index.html`).
    pub index: Option<String>,

    /// Header name → template. Tokens: `$remote_addr`, `$host`, `$scheme`.
    pub proxy_set: BTreeMap<String, String>,

    /// Inbound headers copied verbatim to the upstream when present.
    pub proxy_pass_headers: Vec<String>,
}

impl LocationConfig {
    /// `proxy_pass`, treating an empty value as unset.
    pub fn proxy_target(&self) -> Option<&str> {
        self.proxy_pass.as_deref().filter(|p| !p.is_empty())
    }

    /// `root`, treating an empty value as unset.
    pub fn root_dir(&self) -> Option<&str> {
        self.root.as_deref().filter(|r| !r.is_empty())
    }

    /// Returns the direct URL if `proxy_pass` is not an upstream reference.
    pub fn direct_url(&self) -> Option<&str> {
        self.proxy_target()
            .filter(|target| target.starts_with("http://") || target.starts_with("https://"))
    }
}

/// Named group of backend base URLs.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct UpstreamConfig {
    /// Name referenced from `proxy_pass`.
    pub name: String,

    /// Backend base URLs (e.g., "http://127.0.0.1:3000/v2").
    #[serde(default)]
    pub servers: Vec<String>,
}

/// Health check configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct HealthCheckConfig {
    /// Enable background health refreshes triggered by backend selection.
    pub enabled: bool,

    /// Age after which the health records of a pool are refreshed.
    pub refresh_interval_secs: u64,

    /// Timeout for each probe of a background refresh.
    pub probe_timeout_secs: u64,

    /// Timeout for each probe of an on-demand health report.
    pub report_timeout_secs: u64,
}

impl HealthCheckConfig {
    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_interval_secs)
    }

    pub fn probe_timeout(&self) -> Duration {
        Duration::from_secs(self.probe_timeout_secs)
    }

    pub fn report_timeout(&self) -> Duration {
        Duration::from_secs(self.report_timeout_secs)
    }
}

impl Default for HealthCheckConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            refresh_interval_secs: 30,
            probe_timeout_secs: 2,
            report_timeout_secs: 5,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error). `RUST_LOG` takes precedence.
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9090".to_string(),
        }
    }
}

/// Admin API configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AdminConfig {
    /// Enable admin API.
    pub enabled: bool,

    /// API key for authentication (Bearer token).
    pub api_key: String,

    /// Admin API bind address.
    pub bind_address: String,
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            // WARNING: This is a placeholder! Change this in production.
            api_key: "CHANGE_ME_IN_PRODUCTION".to_string(),
            bind_address: "127.0.0.1:8081".to_string(),
        }
    }
}

/// Lifecycle configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LifecycleConfig {
    /// Upper bound on draining in-flight requests after a shutdown signal.
    pub drain_timeout_secs: u64,
}

impl LifecycleConfig {
    pub fn drain_timeout(&self) -> Duration {
        Duration::from_secs(self.drain_timeout_secs)
    }
}

impl Default for LifecycleConfig {
    fn default() -> Self {
        Self {
            drain_timeout_secs: 30,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_full_document() {
        let raw = r#"
            [[servers]]
            listen = "127.0.0.1:8080"
            server_name = "example.com"

            [[servers.locations]]
            path = "/api/"
            proxy_pass = "backend"
            proxy_set = { "X-Client" = "$remote_addr" }
            proxy_pass_headers = ["Authorization"]

            [[servers.locations]]
            path = "/direct"
            proxy_pass = "http://127.0.0.1:4000/base"

            [[upstreams]]
            name = "backend"
            servers = ["http://127.0.0.1:3000", "http://127.0.0.1:3001/v2"]

            [health_check]
            refresh_interval_secs = 10
        "#;

        let config: ProxyConfig = toml::from_str(raw).unwrap();
        assert_eq!(config.servers.len(), 1);
        let server = &config.servers[0];
        assert_eq!(server.server_name.as_deref(), Some("example.com"));
        assert_eq!(server.locations[0].proxy_set["X-Client"], "$remote_addr");
        assert_eq!(server.locations[0].proxy_pass_headers, vec!["Authorization"]);
        assert_eq!(server.locations[0].direct_url(), None);
        assert_eq!(
            server.locations[1].direct_url(),
            Some("http://127.0.0.1:4000/base")
        );
        assert_eq!(config.upstream("backend").map(|u| u.servers.len()), Some(2));

        // Unspecified fields keep their defaults.
        assert_eq!(config.health_check.refresh_interval(), Duration::from_secs(10));
        assert_eq!(config.health_check.probe_timeout(), Duration::from_secs(2));
        assert_eq!(config.health_check.report_timeout(), Duration::from_secs(5));
        assert_eq!(config.lifecycle.drain_timeout(), Duration::from_secs(30));
    }

    #[test]
    fn empty_document_uses_defaults() {
        let config: ProxyConfig = toml::from_str("").unwrap();
        assert!(config.servers.is_empty());
        assert!(config.health_check.enabled);
        assert!(!config.admin.enabled);
    }
}
