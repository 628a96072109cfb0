//! Request forwarding.
//!
//! # Responsibilities
//! - Select a backend for a routing rule
//! - Build the outbound request as an ordered sequence of steps
//! - Relay the upstream response or a fixed gateway error
//!
//! # Design Decisions
//! - No retries and no re-selection after a transport failure
//! - No timeout on the forwarded request; the upstream decides how long it takes
//! - Response bodies are streamed, never buffered

use std::time::Instant;

use axum::body::Body;
use axum::http::{HeaderMap, HeaderValue, Request};
use axum::response::{IntoResponse, Response};
use url::{Position, Url};

use crate::http::response::GatewayError;
use crate::observability::metrics;
use crate::proxy::client::{upstream_client, UpstreamClient};
use crate::proxy::headers::{
    append_forwarded_for, strip_hop_by_hop, ClientConnection, ForwardingContext, X_FORWARDED_HOST,
    X_FORWARDED_PROTO, X_REAL_IP,
};
use crate::proxy::rewrite::rewrite_path;
use crate::proxy::RoutingRule;

/// Forwards requests to backends. Cloning shares the connection pool.
#[derive(Clone)]
pub struct RequestForwarder {
    client: UpstreamClient,
}

impl RequestForwarder {
    pub fn new() -> Self {
        Self {
            client: upstream_client(),
        }
    }

    /// Route `request` through `rule`: select a backend, then forward.
    pub async fn proxy(&self, rule: &RoutingRule, request: Request<Body>, conn: ClientConnection) -> Response {
        let start_time = Instant::now();
        let method = request.method().to_string();

        let Some(target) = rule.pool().select() else {
            tracing::warn!(location = %rule.path_prefix(), "No upstream servers configured");
            metrics::record_request(&method, GatewayError::NoUpstream.status().as_u16(), "none", start_time);
            return GatewayError::NoUpstream.into_response();
        };

        let response = match target.to_url() {
            Ok(url) => self.forward(request, &conn, &url, rule).await,
            Err(e) => {
                tracing::error!(backend = %target, error = %e, "Failed to parse upstream server URL");
                GatewayError::InvalidUpstream.into_response()
            }
        };

        metrics::record_request(&method, response.status().as_u16(), target.as_str(), start_time);
        response
    }

    /// Forward `inbound` to `target` and relay the result.
    pub async fn forward(
        &self,
        inbound: Request<Body>,
        conn: &ClientConnection,
        target: &Url,
        rule: &RoutingRule,
    ) -> Response {
        let outbound = match build_outbound(inbound, conn, target, rule) {
            Ok(req) => req,
            Err(e) => {
                tracing::error!(backend = %target, error = %e, "Failed to build upstream request");
                return GatewayError::InvalidUpstream.into_response();
            }
        };

        tracing::debug!(
            backend = %target,
            method = %outbound.method(),
            uri = %outbound.uri(),
            "Forwarding request"
        );

        match self.client.request(outbound).await {
            Ok(response) => {
                let (mut parts, body) = response.into_parts();
                strip_hop_by_hop(&mut parts.headers);
                Response::from_parts(parts, Body::new(body))
            }
            Err(e) => {
                tracing::warn!(backend = %target, error = %e, "Upstream error");
                GatewayError::Upstream.into_response()
            }
        }
    }
}

impl Default for RequestForwarder {
    fn default() -> Self {
        Self::new()
    }
}

/// Build the request sent to `target`.
///
/// Steps, in order: target URI with rewritten path,
/// `X-Forwarded-Host`/`X-Forwarded-Proto`/`X-Real-IP`, header templates,
/// pass-through headers, hop-by-hop removal, `X-Forwarded-For` append.
/// Hop-by-hop headers never survive, even when a template or pass-through
/// names one.
pub fn build_outbound(
    inbound: Request<Body>,
    conn: &ClientConnection,
    target: &Url,
    rule: &RoutingRule,
) -> Result<Request<Body>, axum::http::Error> {
    let (parts, body) = inbound.into_parts();
    let inbound_headers = parts.headers;
    let ctx = ForwardingContext::from_request(&inbound_headers, &parts.uri, conn);

    let path = rewrite_path(parts.uri.path(), rule.path_prefix(), target.path());
    let uri = outbound_uri(target, &path, parts.uri.query());

    let mut headers = inbound_headers.clone();

    headers.insert(X_FORWARDED_HOST, HeaderValue::from_str(&ctx.host)?);
    headers.insert(X_FORWARDED_PROTO, HeaderValue::from_str(&ctx.scheme)?);
    headers.insert(X_REAL_IP, HeaderValue::from_str(&ctx.client_addr)?);

    for (name, template) in rule.header_templates() {
        match HeaderValue::from_str(&ctx.render(template)) {
            Ok(value) => {
                headers.insert(name.clone(), value);
            }
            Err(_) => {
                tracing::warn!(header = %name, "Rendered header value is not valid, skipping");
            }
        }
    }

    copy_pass_through(&inbound_headers, &mut headers, rule);
    strip_hop_by_hop(&mut headers);
    append_forwarded_for(&mut headers, conn);

    let mut outbound = Request::builder().method(parts.method).uri(uri).body(body)?;
    *outbound.headers_mut() = headers;
    Ok(outbound)
}

fn copy_pass_through(inbound: &HeaderMap, outbound: &mut HeaderMap, rule: &RoutingRule) {
    for name in rule.pass_through() {
        if let Some(value) = inbound.get(name).filter(|v| !v.is_empty()) {
            outbound.insert(name.clone(), value.clone());
        }
    }
}

/// `scheme://authority/path[?query]` for the target. A query on the target
/// URL comes first, joined to the request's with `&`.
fn outbound_uri(target: &Url, path: &str, request_query: Option<&str>) -> String {
    let authority = &target[Position::BeforeHost..Position::AfterPort];
    let mut uri = format!("{}://{}{}", target.scheme(), authority, path);

    let target_query = target.query().filter(|q| !q.is_empty());
    let request_query = request_query.filter(|q| !q.is_empty());
    match (target_query, request_query) {
        (Some(t), Some(r)) => {
            uri.push('?');
            uri.push_str(t);
            uri.push('&');
            uri.push_str(r);
        }
        (Some(q), None) | (None, Some(q)) => {
            uri.push('?');
            uri.push_str(q);
        }
        (None, None) => {}
    }
    uri
}
