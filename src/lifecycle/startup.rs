//! Startup orchestration.
//!
//! # Responsibilities
//! - Initialize subsystems in dependency order
//! - Bind every server's listener and begin accepting traffic
//! - Start background tasks (admin API, config watcher)
//! - Apply reloaded configuration to running servers
//! - Drain on shutdown, bounded by the drain timeout
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - All listeners are bound before any of them serves
//! - A reload swaps location tables; listen addresses need a restart

use std::collections::HashSet;
use std::net::SocketAddr;
use std::path::Path;

use futures_util::future::join_all;
use thiserror::Error;
use tokio::net::TcpListener;

use crate::admin::{setup_admin_router, AdminState, ServerHandle};
use crate::config::{loader::log_summary, watcher::ConfigWatcher, ProxyConfig};
use crate::health::HealthProbe;
use crate::http::HttpServer;
use crate::lifecycle::{signals, Shutdown};
use crate::observability::metrics;
use crate::proxy::RequestForwarder;
use crate::routing::{LocationTable, RouteError};

#[derive(Debug, Error)]
pub enum StartupError {
    #[error(transparent)]
    Route(#[from] RouteError),

    #[error("failed to bind {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid metrics address '{0}'")]
    MetricsAddress(String),

    #[error("failed to start metrics exporter: {0}")]
    Metrics(#[from] metrics_exporter_prometheus::BuildError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Run the proxy until SIGINT/SIGTERM. `config_path` is watched for reloads.
pub async fn run(config: ProxyConfig, config_path: &Path) -> Result<(), StartupError> {
    log_summary(&config);

    if config.observability.metrics_enabled {
        let addr: SocketAddr = config
            .observability
            .metrics_address
            .parse()
            .map_err(|_| StartupError::MetricsAddress(config.observability.metrics_address.clone()))?;
        metrics::init_metrics(addr)?;
    }

    let probe = HealthProbe::new();
    let forwarder = RequestForwarder::new();

    let mut servers = Vec::with_capacity(config.servers.len());
    for server in &config.servers {
        servers.push(HttpServer::from_config(server, &config, &probe, forwarder.clone())?);
    }

    let mut listeners = Vec::with_capacity(servers.len());
    for server in &servers {
        let listener = TcpListener::bind(server.listen())
            .await
            .map_err(|source| StartupError::Bind {
                address: server.listen().to_string(),
                source,
            })?;
        listeners.push(listener);
    }

    let handles: Vec<ServerHandle> = servers
        .iter()
        .map(|server| ServerHandle {
            listen: server.listen().to_string(),
            table: server.table(),
        })
        .collect();

    let shutdown = Shutdown::new();

    if config.admin.enabled {
        start_admin(&config, handles.clone(), &shutdown).await?;
    }

    let (watcher, mut reloads) = ConfigWatcher::new(config_path);
    let _watcher = match watcher.run() {
        Ok(watcher) => Some(watcher),
        Err(e) => {
            tracing::warn!(error = %e, "Config watcher unavailable, hot reload disabled");
            None
        }
    };

    let reload_probe = probe.clone();
    let reload_handles = handles.clone();
    let mut reload_current = config.clone();
    tokio::spawn(async move {
        while let Some(new_config) = reloads.recv().await {
            if apply_reload(&reload_handles, &reload_current, &new_config, &reload_probe) {
                reload_current = new_config;
            }
        }
    });

    let mut tasks = Vec::with_capacity(servers.len());
    for (server, listener) in servers.into_iter().zip(listeners) {
        tasks.push(tokio::spawn(server.run(listener, shutdown.signalled())));
    }

    tracing::info!(servers = tasks.len(), "Proxy started");

    signals::wait_for_signal().await?;
    shutdown.trigger();

    let drain_timeout = config.lifecycle.drain_timeout();
    match tokio::time::timeout(drain_timeout, join_all(tasks)).await {
        Ok(results) => {
            for result in results {
                match result {
                    Ok(Ok(())) => {}
                    Ok(Err(e)) => tracing::error!(error = %e, "Server exited with error"),
                    Err(e) => tracing::error!(error = %e, "Server task failed"),
                }
            }
        }
        Err(_) => {
            tracing::warn!(timeout = ?drain_timeout, "Drain timeout elapsed, exiting with requests in flight");
        }
    }

    tracing::info!("Shutdown complete");
    Ok(())
}

async fn start_admin(
    config: &ProxyConfig,
    handles: Vec<ServerHandle>,
    shutdown: &Shutdown,
) -> Result<(), StartupError> {
    if config.admin.api_key.is_empty() {
        tracing::warn!("Admin API enabled without api_key, every request will be rejected");
    }

    let address = config.admin.bind_address.clone();
    let listener = TcpListener::bind(&address)
        .await
        .map_err(|source| StartupError::Bind {
            address: address.clone(),
            source,
        })?;

    let app = setup_admin_router(AdminState::new(&config.admin.api_key, handles));
    let signalled = shutdown.signalled();
    tokio::spawn(async move {
        tracing::info!(address = %address, "Admin API listening");
        if let Err(e) = axum::serve(listener, app).with_graceful_shutdown(signalled).await {
            tracing::error!(error = %e, "Admin API failed");
        }
    });

    Ok(())
}

/// Rebuild and swap the location table of every running server in `new`.
///
/// A table that fails to build keeps the old one in place. Servers added to
/// or removed from the file are logged; they take effect on restart.
/// Returns false if any running server kept its old table, so `current`
/// stays the last config that was fully applied.
pub fn apply_reload(handles: &[ServerHandle], current: &ProxyConfig, new: &ProxyConfig, probe: &HealthProbe) -> bool {
    let running: HashSet<&str> = handles.iter().map(|h| h.listen.as_str()).collect();
    let mut applied = true;

    for server in &new.servers {
        let Some(handle) = handles.iter().find(|h| h.listen == server.listen) else {
            tracing::warn!(listen = %server.listen, "New server block requires a restart");
            continue;
        };

        match LocationTable::build(server, new, probe) {
            Ok(table) => {
                handle.table.store(std::sync::Arc::new(table));
                tracing::info!(listen = %server.listen, locations = server.locations.len(), "Locations reloaded");
            }
            Err(e) => {
                tracing::error!(listen = %server.listen, error = %e, "Failed to rebuild locations, keeping current table");
                applied = false;
            }
        }
    }

    for server in &current.servers {
        if running.contains(server.listen.as_str()) && !new.servers.iter().any(|s| s.listen == server.listen) {
            tracing::warn!(listen = %server.listen, "Removed server block keeps serving until restart");
        }
    }

    applied
}
