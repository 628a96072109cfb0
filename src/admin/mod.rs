//! Admin API.
//!
//! Read-only view of the running proxy, served on its own listener and
//! guarded by a bearer token.

pub mod auth;
pub mod handlers;

use std::sync::Arc;

use arc_swap::ArcSwap;
use axum::{middleware, routing::get, Router};

use crate::routing::LocationTable;

use self::auth::admin_auth_middleware;
use self::handlers::*;

/// A running server's listen address and live location table.
#[derive(Clone)]
pub struct ServerHandle {
    pub listen: String,
    pub table: Arc<ArcSwap<LocationTable>>,
}

#[derive(Clone)]
pub struct AdminState {
    pub api_key: Arc<str>,
    pub servers: Arc<Vec<ServerHandle>>,
}

impl AdminState {
    pub fn new(api_key: &str, servers: Vec<ServerHandle>) -> Self {
        Self {
            api_key: Arc::from(api_key),
            servers: Arc::new(servers),
        }
    }
}

pub fn setup_admin_router(state: AdminState) -> Router {
    Router::new()
        .route("/admin/status", get(get_status))
        .route("/admin/backends", get(get_backends))
        .route("/admin/health", get(get_health))
        .layer(middleware::from_fn_with_state(state.clone(), admin_auth_middleware))
        .with_state(state)
}
