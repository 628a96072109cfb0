use axum::{extract::State, Json};
use serde::Serialize;

use crate::admin::AdminState;
use crate::load_balancer::BackendAddress;
use crate::proxy::RoutingRule;

#[derive(Serialize)]
pub struct SystemStatus {
    pub version: &'static str,
    pub status: &'static str,
}

#[derive(Serialize)]
pub struct BackendStatus {
    pub address: String,
    pub healthy: bool,
}

/// Health of one proxy location's pool.
#[derive(Serialize)]
pub struct LocationHealth {
    pub listen: String,
    pub location: String,
    pub backends: Vec<BackendStatus>,
}

impl LocationHealth {
    fn new(listen: &str, rule: &RoutingRule, records: Vec<(BackendAddress, bool)>) -> Self {
        Self {
            listen: listen.to_string(),
            location: rule.path_prefix().to_string(),
            backends: records
                .into_iter()
                .map(|(address, healthy)| BackendStatus {
                    address: address.to_string(),
                    healthy,
                })
                .collect(),
        }
    }
}

pub async fn get_status() -> Json<SystemStatus> {
    Json(SystemStatus {
        version: env!("CARGO_PKG_VERSION"),
        status: "operational",
    })
}

/// Cached health records, no probing.
pub async fn get_backends(State(state): State<AdminState>) -> Json<Vec<LocationHealth>> {
    let mut locations = Vec::new();

    for server in state.servers.iter() {
        let table = server.table.load_full();
        for rule in table.rules() {
            locations.push(LocationHealth::new(&server.listen, rule, rule.pool().health_snapshot()));
        }
    }

    Json(locations)
}

/// Probes every backend now and returns the fresh results.
pub async fn get_health(State(state): State<AdminState>) -> Json<Vec<LocationHealth>> {
    let mut locations = Vec::new();

    for server in state.servers.iter() {
        let table = server.table.load_full();
        for rule in table.rules() {
            let report = rule.pool().health_report().await;
            locations.push(LocationHealth::new(&server.listen, rule, report));
        }
    }

    Json(locations)
}
