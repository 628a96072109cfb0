//! Backend health records.
//!
//! # States
//! - Healthy: backend is preferred by selection
//! - Unhealthy: backend is skipped while another healthy one exists
//!
//! # Design Decisions
//! - One boolean per address, written by the most recent probe only
//! - No hysteresis: a single probe flips the record
//! - Entries are seeded healthy and never removed
//! - Sharded map: a write for one address does not block reads of others

use dashmap::DashMap;

use crate::load_balancer::backend::BackendAddress;
use crate::observability::metrics;

/// Health records for the addresses of one pool.
#[derive(Debug, Default)]
pub struct HealthTable {
    records: DashMap<BackendAddress, bool>,
}

impl HealthTable {
    /// Create a table with every address marked healthy.
    pub fn seeded<'a>(addresses: impl IntoIterator<Item = &'a BackendAddress>) -> Self {
        let records = DashMap::new();
        for address in addresses {
            records.insert(address.clone(), true);
        }
        Self { records }
    }

    /// Last known state of `address`. Unknown addresses are reported unhealthy.
    pub fn is_healthy(&self, address: &BackendAddress) -> bool {
        self.records.get(address).map(|r| *r).unwrap_or(false)
    }

    /// Overwrite the record of a configured address.
    ///
    /// Returns the previous state, or `None` if the address is not part of the
    /// table (the write is ignored).
    pub fn record(&self, address: &BackendAddress, healthy: bool) -> Option<bool> {
        let previous = {
            let mut entry = self.records.get_mut(address)?;
            std::mem::replace(entry.value_mut(), healthy)
        };

        if previous != healthy {
            if healthy {
                tracing::info!(backend = %address, "Backend marked healthy");
            } else {
                tracing::warn!(backend = %address, "Backend marked unhealthy");
            }
        }
        metrics::record_backend_health(address.as_str(), healthy);

        Some(previous)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
