//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum Router for one server block
//! - Wire up middleware (request ID, tracing)
//! - Bind server to listener
//! - Dispatch requests through the location table
//! - Hand proxy locations to the forwarder, static ones to the file server
//!
//! # Design Decisions
//! - The location table sits behind `ArcSwap`; a reload swaps it while
//!   in-flight requests finish on the table they started with
//! - Every path goes through one fallback handler; the location table,
//!   not axum's router, decides what matches

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use arc_swap::ArcSwap;
use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::{header, HeaderValue, Request, StatusCode},
    response::{IntoResponse, Response},
    Router,
};
use tokio::net::TcpListener;
use tower_http::{
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};

use crate::config::{ProxyConfig, ServerConfig};
use crate::health::HealthProbe;
use crate::http::request::{request_id, MakeRequestUuid, X_REQUEST_ID};
use crate::http::response::{not_found, plain_error};
use crate::proxy::{ClientConnection, RequestForwarder};
use crate::routing::{Handler, LocationTable, Resolution, RouteError};

/// Application state injected into handlers.
#[derive(Clone)]
pub struct ServerState {
    pub table: Arc<ArcSwap<LocationTable>>,
    pub forwarder: RequestForwarder,
}

/// HTTP server for one `[[servers]]` block.
pub struct HttpServer {
    listen: String,
    table: Arc<ArcSwap<LocationTable>>,
    forwarder: RequestForwarder,
}

impl HttpServer {
    pub fn new(listen: impl Into<String>, table: LocationTable, forwarder: RequestForwarder) -> Self {
        Self {
            listen: listen.into(),
            table: Arc::new(ArcSwap::from_pointee(table)),
            forwarder,
        }
    }

    /// Compile `server`'s locations and wrap them in a server.
    pub fn from_config(
        server: &ServerConfig,
        config: &ProxyConfig,
        probe: &HealthProbe,
        forwarder: RequestForwarder,
    ) -> Result<Self, RouteError> {
        let table = LocationTable::build(server, config, probe)?;
        Ok(Self::new(server.listen.clone(), table, forwarder))
    }

    /// The configured listen address.
    pub fn listen(&self) -> &str {
        &self.listen
    }

    /// Shared handle to the live location table.
    pub fn table(&self) -> Arc<ArcSwap<LocationTable>> {
        self.table.clone()
    }

    /// Build the Axum router with all middleware layers.
    pub fn router(&self) -> Router {
        let state = ServerState {
            table: self.table.clone(),
            forwarder: self.forwarder.clone(),
        };

        Router::new()
            .fallback(dispatch)
            .with_state(state)
            .layer(PropagateRequestIdLayer::new(X_REQUEST_ID))
            .layer(TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
                tracing::info_span!(
                    "request",
                    method = %request.method(),
                    uri = %request.uri(),
                    request_id = %request_id(request).unwrap_or("-"),
                )
            }))
            .layer(SetRequestIdLayer::new(X_REQUEST_ID, MakeRequestUuid))
    }

    /// Serve on `listener` until `shutdown` resolves, then drain in-flight requests.
    pub async fn run<F>(self, listener: TcpListener, shutdown: F) -> Result<(), std::io::Error>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, listen = %self.listen, "HTTP server starting");

        let app = self.router().into_make_service_with_connect_info::<SocketAddr>();

        axum::serve(listener, app).with_graceful_shutdown(shutdown).await?;

        tracing::info!(address = %addr, "HTTP server stopped");
        Ok(())
    }
}

/// Resolve the request path and hand the request to the matched location.
async fn dispatch(
    State(state): State<ServerState>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    request: Request<Body>,
) -> Response {
    let table = state.table.load_full();
    let path = request.uri().path().to_string();

    match table.resolve(&path) {
        Resolution::Matched(location) => match location.handler() {
            Handler::Proxy(rule) => {
                state
                    .forwarder
                    .proxy(rule, request, ClientConnection::plain(peer))
                    .await
            }
            Handler::Static(files) => files.serve(request).await,
        },
        Resolution::Redirect(target) => redirect(target, request.uri().query()),
        Resolution::NotFound => {
            tracing::debug!(path = %path, "No location matched");
            not_found()
        }
    }
}

/// 301 to `path`, keeping the query.
fn redirect(mut path: String, query: Option<&str>) -> Response {
    if let Some(query) = query {
        path.push('?');
        path.push_str(query);
    }

    match HeaderValue::from_str(&path) {
        Ok(location) => (StatusCode::MOVED_PERMANENTLY, [(header::LOCATION, location)]).into_response(),
        Err(_) => plain_error(StatusCode::BAD_REQUEST, "400 bad request"),
    }
}
