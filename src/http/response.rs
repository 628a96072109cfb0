//! Response handling and transformation.
//!
//! # Responsibilities
//! - Map proxy failures to fixed gateway responses
//! - Render plain-text error bodies consistently
//!
//! # Design Decisions
//! - Error bodies never carry upstream or transport detail; that goes to logs
//! - Upstream responses themselves are relayed untouched (minus hop-by-hop
//!   headers), including upstream 5xx

use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use thiserror::Error;

/// Failures produced by the proxy itself rather than by the upstream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum GatewayError {
    /// The routing rule has no backends.
    #[error("No upstream servers available")]
    NoUpstream,

    /// The selected backend address is not a usable URL.
    #[error("Error parsing upstream server URL")]
    InvalidUpstream,

    /// The backend could not be reached (refused, DNS, reset, ...).
    #[error("Error contacting upstream server")]
    Upstream,
}

impl GatewayError {
    pub fn status(&self) -> StatusCode {
        match self {
            GatewayError::NoUpstream => StatusCode::SERVICE_UNAVAILABLE,
            GatewayError::InvalidUpstream => StatusCode::INTERNAL_SERVER_ERROR,
            GatewayError::Upstream => StatusCode::BAD_GATEWAY,
        }
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        plain_error(self.status(), &self.to_string())
    }
}

/// A `text/plain` error response whose body is `message` plus a newline.
pub fn plain_error(status: StatusCode, message: &str) -> Response {
    (
        status,
        [
            (header::CONTENT_TYPE, HeaderValue::from_static("text/plain; charset=utf-8")),
            (header::X_CONTENT_TYPE_OPTIONS, HeaderValue::from_static("nosniff")),
        ],
        format!("{message}\n"),
    )
        .into_response()
}

/// The response for requests no location matches.
pub fn not_found() -> Response {
    plain_error(StatusCode::NOT_FOUND, "404 page not found")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn gateway_errors_map_to_fixed_responses() {
        let cases = [
            (GatewayError::NoUpstream, 503, "No upstream servers available\n"),
            (GatewayError::InvalidUpstream, 500, "Error parsing upstream server URL\n"),
            (GatewayError::Upstream, 502, "Error contacting upstream server\n"),
        ];

        for (error, status, body) in cases {
            let response = error.into_response();
            assert_eq!(response.status().as_u16(), status);
            assert_eq!(
                response.headers()[header::CONTENT_TYPE],
                "text/plain; charset=utf-8"
            );
            let bytes = axum::body::to_bytes(response.into_body(), 1024).await.unwrap();
            assert_eq!(bytes, body.as_bytes());
        }
    }
}
