//! Location matching, redirects and static files through a running proxy.

mod common;

use common::{client, parse_echo, start_echo_backend, start_proxy};

#[tokio::test]
async fn test_locations_redirects_and_static_files() {
    let backend = start_echo_backend().await;
    let www = tempfile::tempdir().unwrap();
    std::fs::create_dir(www.path().join("assets")).unwrap();
    std::fs::write(www.path().join("assets").join("app.js"), "console.log(1);").unwrap();
    std::fs::write(www.path().join("assets").join("index.html"), "<p>assets</p>").unwrap();

    let config = format!(
        r#"
        [[servers]]
        listen = "127.0.0.1:0"

        [[servers.locations]]
        path = "/api/"
        proxy_pass = "http://{backend}"

        [[servers.locations]]
        path = "/api/v2/"
        proxy_pass = "http://{backend}/two"

        [[servers.locations]]
        path = "/assets/"
        root = "{root}"

        [health_check]
        enabled = false
        "#,
        root = www.path().display()
    );
    let proxy = start_proxy(&config).await;
    let client = client();

    let res = client.get(format!("http://{proxy}/api/v2/items")).send().await.unwrap();
    assert_eq!(parse_echo(&res.text().await.unwrap()).target, "/two/items");

    let res = client.get(format!("http://{proxy}/api/v1/items")).send().await.unwrap();
    assert_eq!(parse_echo(&res.text().await.unwrap()).target, "/v1/items");

    let res = client.get(format!("http://{proxy}/api?x=1")).send().await.unwrap();
    assert_eq!(res.status(), 301);
    assert_eq!(res.headers()["location"], "/api/?x=1");

    let res = client.get(format!("http://{proxy}/assets/app.js")).send().await.unwrap();
    assert_eq!(res.status(), 200);
    assert_eq!(res.text().await.unwrap(), "console.log(1);");

    let res = client.get(format!("http://{proxy}/assets/")).send().await.unwrap();
    assert_eq!(res.text().await.unwrap(), "<p>assets</p>");

    let res = client.get(format!("http://{proxy}/assets/missing.css")).send().await.unwrap();
    assert_eq!(res.status(), 404);

    let res = client.get(format!("http://{proxy}/elsewhere")).send().await.unwrap();
    assert_eq!(res.status(), 404);
    assert_eq!(res.text().await.unwrap(), "404 page not found\n");
}
