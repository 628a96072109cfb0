//! Forwarding headers.
//!
//! # Responsibilities
//! - Determine the originating client address and scheme
//! - Render `proxy_set` header templates
//! - Strip hop-by-hop headers in both directions
//! - Append the socket peer to `X-Forwarded-For`

use std::net::SocketAddr;

use axum::http::{header, HeaderMap, HeaderName, HeaderValue, Uri};

pub const X_FORWARDED_FOR: HeaderName = HeaderName::from_static("x-forwarded-for");
pub const X_FORWARDED_HOST: HeaderName = HeaderName::from_static("x-forwarded-host");
pub const X_FORWARDED_PROTO: HeaderName = HeaderName::from_static("x-forwarded-proto");
pub const X_REAL_IP: HeaderName = HeaderName::from_static("x-real-ip");

/// Headers meaningful only for a single transport hop.
static HOP_BY_HOP: [HeaderName; 9] = [
    header::CONNECTION,
    HeaderName::from_static("keep-alive"),
    HeaderName::from_static("proxy-connection"),
    header::PROXY_AUTHENTICATE,
    header::PROXY_AUTHORIZATION,
    header::TE,
    header::TRAILER,
    header::TRANSFER_ENCODING,
    header::UPGRADE,
];

/// Transport facts about the inbound connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClientConnection {
    /// Socket peer address.
    pub peer: SocketAddr,
    /// Whether the inbound connection was TLS.
    pub encrypted: bool,
}

impl ClientConnection {
    pub fn plain(peer: SocketAddr) -> Self {
        Self { peer, encrypted: false }
    }
}

/// Values substituted into header templates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForwardingContext {
    pub client_addr: String,
    pub host: String,
    pub scheme: String,
}

impl ForwardingContext {
    /// Derive the context from the inbound request.
    pub fn from_request(headers: &HeaderMap, uri: &Uri, conn: &ClientConnection) -> Self {
        Self {
            client_addr: client_addr(headers, conn),
            host: inbound_host(headers, uri),
            scheme: effective_scheme(headers, conn),
        }
    }

    /// Replace `$remote_addr`, `$host` and `$scheme`, in that order.
    pub fn render(&self, template: &str) -> String {
        template
            .replace("$remote_addr", &self.client_addr)
            .replace("$host", &self.host)
            .replace("$scheme", &self.scheme)
    }
}

fn header_str<'a>(headers: &'a HeaderMap, name: &HeaderName) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
}

/// First `X-Forwarded-For` hop, else `X-Real-IP`, else the socket peer IP.
pub fn client_addr(headers: &HeaderMap, conn: &ClientConnection) -> String {
    if let Some(forwarded) = header_str(headers, &X_FORWARDED_FOR) {
        let first = forwarded.split(',').next().unwrap_or_default();
        return first.trim().to_string();
    }

    if let Some(real_ip) = header_str(headers, &X_REAL_IP) {
        return real_ip.to_string();
    }

    conn.peer.ip().to_string()
}

/// `X-Forwarded-Proto` if present, else derived from the connection.
pub fn effective_scheme(headers: &HeaderMap, conn: &ClientConnection) -> String {
    if let Some(proto) = header_str(headers, &X_FORWARDED_PROTO) {
        return proto.to_string();
    }

    let scheme = if conn.encrypted { "https" } else { "http" };
    scheme.to_string()
}

/// The `Host` header, or the URI authority for requests that carry none (HTTP/2).
pub fn inbound_host(headers: &HeaderMap, uri: &Uri) -> String {
    header_str(headers, &header::HOST)
        .map(str::to_string)
        .or_else(|| uri.authority().map(|a| a.to_string()))
        .unwrap_or_default()
}

/// Remove hop-by-hop headers, including any listed in `Connection`.
pub fn strip_hop_by_hop(headers: &mut HeaderMap) {
    let listed: Vec<HeaderName> = headers
        .get_all(header::CONNECTION)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(','))
        .filter_map(|name| HeaderName::from_bytes(name.trim().as_bytes()).ok())
        .collect();

    for name in listed.iter().chain(HOP_BY_HOP.iter()) {
        headers.remove(name);
    }
}

/// Append the socket peer IP to the `X-Forwarded-For` chain.
pub fn append_forwarded_for(headers: &mut HeaderMap, conn: &ClientConnection) {
    let peer = conn.peer.ip().to_string();
    let prior: Vec<&str> = headers
        .get_all(&X_FORWARDED_FOR)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .collect();

    let chain = if prior.is_empty() {
        peer
    } else {
        format!("{}, {}", prior.join(", "), peer)
    };

    if let Ok(value) = HeaderValue::from_str(&chain) {
        headers.insert(X_FORWARDED_FOR, value);
    }
}
