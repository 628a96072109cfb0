//! Health-aware selection and the admin health endpoints.

mod common;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use arc_swap::ArcSwap;
use serde_json::Value;
use tokio::net::TcpListener;

use common::{client, closed_port, start_programmable_backend, start_proxy};
use waypoint::admin::{setup_admin_router, AdminState, ServerHandle};
use waypoint::config::parse_config;
use waypoint::health::HealthProbe;
use waypoint::routing::LocationTable;

/// Serves `name` to traffic; answers health checks with `probe_status`.
async fn backend(name: &'static str, probe_status: u16) -> SocketAddr {
    start_programmable_backend(move |request| async move {
        if request.is_health_check() {
            (probe_status, String::new())
        } else {
            (200, name.to_string())
        }
    })
    .await
}

fn pool_config(servers: &[String], enabled: bool) -> String {
    let servers = servers
        .iter()
        .map(|s| format!("\"{s}\""))
        .collect::<Vec<_>>()
        .join(", ");
    format!(
        r#"
        [[servers]]
        listen = "127.0.0.1:0"

        [[servers.locations]]
        path = "/"
        proxy_pass = "pool"

        [[upstreams]]
        name = "pool"
        servers = [{servers}]

        [health_check]
        enabled = {enabled}
        probe_timeout_secs = 1
        "#
    )
}

async fn fetch(proxy: SocketAddr) -> String {
    client()
        .get(format!("http://{proxy}/"))
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap()
}

#[tokio::test]
async fn test_unhealthy_backend_is_skipped() {
    let healthy = backend("healthy", 200).await;
    let sick = backend("sick", 503).await;
    let proxy = start_proxy(&pool_config(&[format!("http://{healthy}"), format!("http://{sick}")], true)).await;

    // The first request triggers the background refresh.
    fetch(proxy).await;
    tokio::time::sleep(Duration::from_millis(500)).await;

    for _ in 0..4 {
        assert_eq!(fetch(proxy).await, "healthy");
    }
}

#[tokio::test]
async fn test_all_unhealthy_falls_back_to_rotation() {
    let a = backend("a", 503).await;
    let b = backend("b", 503).await;
    let proxy = start_proxy(&pool_config(&[format!("http://{a}"), format!("http://{b}")], true)).await;

    fetch(proxy).await;
    tokio::time::sleep(Duration::from_millis(500)).await;

    let mut seen = Vec::new();
    for _ in 0..4 {
        seen.push(fetch(proxy).await);
    }
    assert!(seen.contains(&"a".to_string()));
    assert!(seen.contains(&"b".to_string()));
}

async fn start_admin(config: &str, api_key: &str) -> SocketAddr {
    let config = parse_config(config).unwrap();
    let table = LocationTable::build(&config.servers[0], &config, &HealthProbe::new()).unwrap();
    let state = AdminState::new(
        api_key,
        vec![ServerHandle {
            listen: config.servers[0].listen.clone(),
            table: Arc::new(ArcSwap::from_pointee(table)),
        }],
    );

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, setup_admin_router(state)).await.unwrap();
    });
    addr
}

#[tokio::test]
async fn test_admin_requires_bearer_token() {
    let admin = start_admin(&pool_config(&[], false), "secret").await;

    let res = client().get(format!("http://{admin}/admin/status")).send().await.unwrap();
    assert_eq!(res.status(), 401);

    let res = client()
        .get(format!("http://{admin}/admin/status"))
        .bearer_auth("wrong")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 401);

    let res = client()
        .get(format!("http://{admin}/admin/status"))
        .bearer_auth("secret")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 200);
    let status: Value = res.json().await.unwrap();
    assert_eq!(status["status"], "operational");
}

#[tokio::test]
async fn test_admin_health_report_probes_every_backend() {
    let up = backend("up", 200).await;
    let down = closed_port().await;
    let up_url = format!("http://{up}");
    let down_url = format!("http://{down}");
    let admin = start_admin(&pool_config(&[up_url.clone(), down_url.clone()], false), "secret").await;

    // Cached records start healthy.
    let cached: Value = client()
        .get(format!("http://{admin}/admin/backends"))
        .bearer_auth("secret")
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(cached[0]["location"], "/");
    assert_eq!(cached[0]["backends"][1]["healthy"], true);

    let report: Value = client()
        .get(format!("http://{admin}/admin/health"))
        .bearer_auth("secret")
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let backends = report[0]["backends"].as_array().unwrap();
    assert_eq!(backends[0]["address"], up_url.as_str());
    assert_eq!(backends[0]["healthy"], true);
    assert_eq!(backends[1]["address"], down_url.as_str());
    assert_eq!(backends[1]["healthy"], false);

    // The report also updates the cached records.
    let cached: Value = client()
        .get(format!("http://{admin}/admin/backends"))
        .bearer_auth("secret")
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(cached[0]["backends"][1]["healthy"], false);
}
