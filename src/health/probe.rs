//! Single-backend liveness probe.

use std::time::Duration;

use axum::body::Body;
use axum::http::{header, Method, Request};
use tokio::time;

use crate::load_balancer::backend::BackendAddress;
use crate::proxy::client::{upstream_client, UpstreamClient};

const USER_AGENT: &str = "waypoint-health-check";

/// Issues `GET <backend base URL>` and reports whether the backend answered 2xx.
///
/// Cloning is cheap and shares the underlying connection pool.
#[derive(Clone)]
pub struct HealthProbe {
    client: UpstreamClient,
}

impl HealthProbe {
    pub fn new() -> Self {
        Self {
            client: upstream_client(),
        }
    }

    /// Probe `address`. Never fails: any error, timeout or non-2xx is `false`.
    pub async fn check(&self, address: &BackendAddress, timeout: Duration) -> bool {
        let request = match Request::builder()
            .method(Method::GET)
            .uri(address.as_str())
            .header(header::USER_AGENT, USER_AGENT)
            .body(Body::empty())
        {
            Ok(req) => req,
            Err(e) => {
                tracing::debug!(backend = %address, error = %e, "Health check failed: invalid address");
                return false;
            }
        };

        match time::timeout(timeout, self.client.request(request)).await {
            Ok(Ok(response)) => {
                let success = response.status().is_success();
                if !success {
                    tracing::debug!(backend = %address, status = %response.status(), "Health check failed: non-success status");
                }
                success
            }
            Ok(Err(e)) => {
                tracing::debug!(backend = %address, error = %e, "Health check failed: connection error");
                false
            }
            Err(_) => {
                tracing::debug!(backend = %address, timeout = ?timeout, "Health check failed: timeout");
                false
            }
        }
    }
}

impl Default for HealthProbe {
    fn default() -> Self {
        Self::new()
    }
}
