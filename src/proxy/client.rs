//! Upstream HTTP client.
//!
//! # Design Decisions
//! - One connector for `http://` and `https://` backends; the backend URL's
//!   scheme decides whether TLS is used
//! - Server certificates are verified against the webpki root set
//! - TLS uses the ring provider, installed as the process default if none is

use axum::body::Body;
use hyper_rustls::{HttpsConnector, HttpsConnectorBuilder};
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::TokioExecutor,
};

/// Client shared by the forwarder and the health probe.
pub type UpstreamClient = Client<HttpsConnector<HttpConnector>, Body>;

pub fn upstream_client() -> UpstreamClient {
    // Err means a provider is already installed.
    let _ = rustls::crypto::ring::default_provider().install_default();

    let connector = HttpsConnectorBuilder::new()
        .with_webpki_roots()
        .https_or_http()
        .enable_http1()
        .build();

    Client::builder(TokioExecutor::new()).build(connector)
}
