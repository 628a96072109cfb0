//! Active health checking.
//!
//! # Responsibilities
//! - Decide when a pool's health records are stale
//! - Refresh them in the background without blocking selection
//! - Produce an on-demand report for operators
//!
//! # Design Decisions
//! - The refresh is claimed (timestamp written) before any probe runs, so
//!   concurrent callers within one window trigger at most one refresh
//! - Refresh probes are spawned and forgotten: last write wins, and readers
//!   may observe stale records until the probes land
//! - Report probes run concurrently but the caller awaits all of them

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Instant;

use futures_util::future::join_all;

use crate::config::HealthCheckConfig;
use crate::health::probe::HealthProbe;
use crate::health::state::HealthTable;
use crate::load_balancer::backend::BackendAddress;

/// Drives probes for one pool.
pub struct HealthChecker {
    probe: HealthProbe,
    config: HealthCheckConfig,
    last_refresh: Mutex<Option<Instant>>,
}

impl HealthChecker {
    pub fn new(probe: HealthProbe, config: HealthCheckConfig) -> Self {
        Self {
            probe,
            config,
            last_refresh: Mutex::new(None),
        }
    }

    pub fn config(&self) -> &HealthCheckConfig {
        &self.config
    }

    /// Instant of the last claimed refresh, if any.
    pub fn last_refresh(&self) -> Option<Instant> {
        *self.last_refresh.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Record a refresh as of now if the records are stale.
    ///
    /// Returns true for exactly one caller per staleness window. A pool that was
    /// never refreshed is stale.
    pub fn claim_refresh(&self) -> bool {
        if !self.config.enabled {
            return false;
        }

        let mut last = self.last_refresh.lock().unwrap_or_else(PoisonError::into_inner);
        let stale = match *last {
            None => true,
            Some(at) => at.elapsed() > self.config.refresh_interval(),
        };
        if stale {
            *last = Some(Instant::now());
        }
        stale
    }

    /// Claim and, if stale, spawn a background refresh. Never waits for probes.
    pub fn refresh_if_stale(&self, addresses: &Arc<[BackendAddress]>, table: &Arc<HealthTable>) {
        if self.claim_refresh() {
            self.spawn_refresh(addresses, table);
        }
    }

    /// Probe every address in its own task and write each result to `table`.
    pub fn spawn_refresh(&self, addresses: &Arc<[BackendAddress]>, table: &Arc<HealthTable>) {
        let runtime = match tokio::runtime::Handle::try_current() {
            Ok(handle) => handle,
            Err(_) => {
                tracing::warn!("Health refresh requested outside a Tokio runtime, skipping");
                return;
            }
        };

        tracing::debug!(backends = addresses.len(), "Refreshing backend health");

        let timeout = self.config.probe_timeout();
        for address in addresses.iter().cloned() {
            let probe = self.probe.clone();
            let table = Arc::clone(table);
            runtime.spawn(async move {
                let healthy = probe.check(&address, timeout).await;
                table.record(&address, healthy);
            });
        }
    }

    /// Probe every address with the report timeout and return the results in
    /// address order. Results are also written to `table`.
    pub async fn report(&self, addresses: &[BackendAddress], table: &HealthTable) -> Vec<(BackendAddress, bool)> {
        let timeout = self.config.report_timeout();
        let checks = addresses.iter().map(|address| async move {
            let healthy = self.probe.check(address, timeout).await;
            (address.clone(), healthy)
        });

        let results = join_all(checks).await;
        for (address, healthy) in &results {
            table.record(address, *healthy);
        }
        results
    }
}
