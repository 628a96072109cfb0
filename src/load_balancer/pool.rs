//! Backend pool management.
//!
//! # Responsibilities
//! - Own the backend addresses of one routing rule
//! - Track per-address health
//! - Select the next backend: round-robin, skipping unhealthy backends,
//!   degrading to plain round-robin when every backend is unhealthy

use std::sync::Arc;

use crate::config::HealthCheckConfig;
use crate::health::{HealthChecker, HealthProbe, HealthTable};
use crate::load_balancer::{backend::BackendAddress, round_robin::RoundRobin};

/// Backends of one routing rule, with their health and rotation state.
///
/// Built once per rule and shared by reference with every request task.
pub struct BackendPool {
    addresses: Arc<[BackendAddress]>,
    rotation: RoundRobin,
    health: Arc<HealthTable>,
    checker: HealthChecker,
}

impl BackendPool {
    /// Create a pool. Every address starts healthy.
    pub fn new(
        addresses: impl IntoIterator<Item = BackendAddress>,
        probe: HealthProbe,
        config: HealthCheckConfig,
    ) -> Self {
        let addresses: Arc<[BackendAddress]> = addresses.into_iter().collect();
        let health = Arc::new(HealthTable::seeded(addresses.iter()));
        Self {
            addresses,
            rotation: RoundRobin::new(),
            health,
            checker: HealthChecker::new(probe, config),
        }
    }

    /// Select the next backend.
    ///
    /// Triggers a background health refresh when the records are stale, without
    /// waiting for it. Advances the rotation cursor exactly once. Returns `None`
    /// only for an empty pool.
    pub fn select(&self) -> Option<BackendAddress> {
        if self.addresses.is_empty() {
            return None;
        }

        self.checker.refresh_if_stale(&self.addresses, &self.health);

        let pick = self
            .rotation
            .next_index(self.addresses.len(), |i| self.health.is_healthy(&self.addresses[i]))?;
        let address = self.addresses[pick.index].clone();

        if pick.fallback {
            tracing::debug!(backend = %address, "No healthy backends, falling back to round-robin");
        }
        Some(address)
    }

    pub fn addresses(&self) -> &[BackendAddress] {
        &self.addresses
    }

    pub fn len(&self) -> usize {
        self.addresses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.addresses.is_empty()
    }

    /// Current rotation cursor.
    pub fn cursor(&self) -> u64 {
        self.rotation.position()
    }

    pub fn is_healthy(&self, address: &BackendAddress) -> bool {
        self.health.is_healthy(address)
    }

    /// Overwrite the health record of a configured address.
    pub fn record_health(&self, address: &BackendAddress, healthy: bool) {
        self.health.record(address, healthy);
    }

    /// Cached health records, in address order.
    pub fn health_snapshot(&self) -> Vec<(BackendAddress, bool)> {
        self.addresses
            .iter()
            .map(|address| (address.clone(), self.health.is_healthy(address)))
            .collect()
    }

    /// Probe every backend now and return the fresh results, in address order.
    pub async fn health_report(&self) -> Vec<(BackendAddress, bool)> {
        self.checker.report(&self.addresses, &self.health).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pool_of(n: usize) -> BackendPool {
        let addresses = (0..n).map(|i| BackendAddress::new(format!("http://127.0.0.1:{}", 9000 + i)));
        let config = HealthCheckConfig {
            enabled: false,
            ..Default::default()
        };
        BackendPool::new(addresses, HealthProbe::new(), config)
    }

    #[test]
    fn rotation_visits_each_backend_once_in_order() {
        let pool = pool_of(3);
        let expected = pool.addresses().to_vec();

        let first: Vec<_> = (0..3).map(|_| pool.select().unwrap()).collect();
        assert_eq!(first, expected);

        // Starting mid-rotation keeps address order.
        pool.select().unwrap();
        let next: Vec<_> = (0..3).map(|_| pool.select().unwrap()).collect();
        assert_eq!(next, vec![expected[1].clone(), expected[2].clone(), expected[0].clone()]);
    }

    #[test]
    fn unhealthy_backend_never_selected() {
        let pool = pool_of(3);
        let dead = pool.addresses()[1].clone();
        pool.record_health(&dead, false);

        for _ in 0..30 {
            assert_ne!(pool.select().unwrap(), dead);
        }
    }

    #[test]
    fn all_unhealthy_degrades_to_round_robin() {
        let pool = pool_of(3);
        for address in pool.addresses().to_vec() {
            pool.record_health(&address, false);
        }

        let picks: Vec<_> = (0..3).map(|_| pool.select().unwrap()).collect();
        assert_eq!(picks, pool.addresses().to_vec());
    }

    #[test]
    fn cursor_advances_once_per_select() {
        let pool = pool_of(4);
        pool.record_health(&pool.addresses()[0].clone(), false);
        pool.record_health(&pool.addresses()[1].clone(), false);

        for expected in 1..=10 {
            pool.select().unwrap();
            assert_eq!(pool.cursor(), expected);
        }
    }

    #[test]
    fn empty_pool_selects_nothing() {
        let pool = pool_of(0);
        assert!(pool.is_empty());
        assert_eq!(pool.select(), None);
        assert_eq!(pool.cursor(), 0);
    }

    #[test]
    fn snapshot_reflects_records() {
        let pool = pool_of(2);
        let second = pool.addresses()[1].clone();
        pool.record_health(&second, false);

        let snapshot = pool.health_snapshot();
        assert!(snapshot[0].1);
        assert_eq!(snapshot[1], (second, false));
    }
}
