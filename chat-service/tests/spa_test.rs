mod common;

use chat_service::config::Environment;
use common::{test_config, TestApp};

const INDEX_HTML: &str = "<html><body>chat app shell</body></html>";
const APP_JS: &str = "console.log(\"bundle\");";

async fn spawn_prod_app(dist: &std::path::Path) -> TestApp {
    tokio::fs::write(dist.join("index.html"), INDEX_HTML)
        .await
        .unwrap();
    tokio::fs::write(dist.join("app.js"), APP_JS).await.unwrap();

    let mut config = test_config();
    config.environment = Environment::Prod;
    config.frontend.dist_path = dist.to_str().unwrap().to_string();

    TestApp::spawn_with_config(config).await
}

#[tokio::test]
async fn production_serves_index_for_extensionless_paths() {
    let dist = tempfile::tempdir().unwrap();
    let app = spawn_prod_app(dist.path()).await;

    for path in ["/", "/some-page", "/sessions/42"] {
        let response = app
            .client
            .get(app.url(path))
            .send()
            .await
            .expect("Failed to execute request");

        assert_eq!(response.status(), 200, "path {}", path);
        assert!(response
            .headers()
            .get("content-type")
            .and_then(|v| v.to_str().ok())
            .unwrap()
            .starts_with("text/html"));
        assert_eq!(response.text().await.unwrap(), INDEX_HTML);
    }
}

#[tokio::test]
async fn production_serves_assets_by_extension() {
    let dist = tempfile::tempdir().unwrap();
    let app = spawn_prod_app(dist.path()).await;

    let response = app
        .client
        .get(app.url("/app.js"))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status(), 200);
    assert_eq!(
        response
            .headers()
            .get("content-type")
            .and_then(|v| v.to_str().ok()),
        Some("text/javascript")
    );
    assert_eq!(response.text().await.unwrap(), APP_JS);
}

#[tokio::test]
async fn production_missing_asset_is_404_not_index() {
    let dist = tempfile::tempdir().unwrap();
    let app = spawn_prod_app(dist.path()).await;

    let response = app
        .client
        .get(app.url("/missing.js"))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status(), 404);
}

#[tokio::test]
async fn production_fallback_is_get_only() {
    let dist = tempfile::tempdir().unwrap();
    let app = spawn_prod_app(dist.path()).await;

    let response = app
        .client
        .post(app.url("/some-page"))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status(), 404);
}

#[tokio::test]
async fn dev_mode_does_not_serve_the_spa() {
    let app = TestApp::spawn().await;

    let response = app
        .client
        .get(app.url("/some-page"))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status(), 404);
}

#[tokio::test]
async fn production_debug_path_sees_the_bundle() {
    let dist = tempfile::tempdir().unwrap();
    let app = spawn_prod_app(dist.path()).await;

    let response = app
        .client
        .get(app.url("/debug-path"))
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status(), 200);

    let body: serde_json::Value = response.json().await.expect("Failed to parse JSON");
    assert_eq!(body["index_html_exists"], true);
}
