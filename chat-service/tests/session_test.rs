mod common;

use common::{TestApp, OTHER_TOKEN, TEST_TOKEN, TEST_USER_ID};
use serde_json::json;

#[tokio::test]
async fn create_session_returns_created_session() {
    let app = TestApp::spawn().await;

    let body = app
        .create_session(TEST_TOKEN, "Interview prep", &["user_other"])
        .await;

    assert_eq!(body["owner_id"], TEST_USER_ID);
    assert_eq!(body["title"], "Interview prep");
    assert_eq!(body["status"], "active");
    assert_eq!(body["message_count"], 0);
    assert_eq!(body["participant_ids"], json!(["user_other"]));
    assert!(body["session_id"].as_str().is_some());
}

#[tokio::test]
async fn create_session_requires_auth() {
    let app = TestApp::spawn().await;

    let response = app
        .client
        .post(app.url("/api/sessions"))
        .json(&json!({ "title": "No token" }))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status(), 401);

    let response = app
        .client
        .post(app.url("/api/sessions"))
        .bearer_auth("tok_bogus")
        .json(&json!({ "title": "Bad token" }))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status(), 401);
}

#[tokio::test]
async fn create_session_rejects_invalid_title() {
    let app = TestApp::spawn().await;

    let response = app
        .client
        .post(app.url("/api/sessions"))
        .bearer_auth(TEST_TOKEN)
        .json(&json!({ "title": "" }))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status(), 422);
}

#[tokio::test]
async fn list_sessions_shows_only_member_sessions() {
    let app = TestApp::spawn().await;

    app.create_session(TEST_TOKEN, "Mine", &[]).await;
    app.create_session(OTHER_TOKEN, "Theirs", &[]).await;
    app.create_session(OTHER_TOKEN, "Shared", &[TEST_USER_ID])
        .await;

    let response = app
        .client
        .get(app.url("/api/sessions"))
        .bearer_auth(TEST_TOKEN)
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status(), 200);

    let body: serde_json::Value = response.json().await.expect("Failed to parse JSON");
    assert_eq!(body["total"], 2);

    let titles: Vec<&str> = body["sessions"]
        .as_array()
        .unwrap()
        .iter()
        .map(|s| s["title"].as_str().unwrap())
        .collect();
    assert!(titles.contains(&"Mine"));
    assert!(titles.contains(&"Shared"));
    assert!(!titles.contains(&"Theirs"));
}

#[tokio::test]
async fn get_session_enforces_membership() {
    let app = TestApp::spawn().await;

    let session = app.create_session(TEST_TOKEN, "Private", &[]).await;
    let session_id = session["session_id"].as_str().unwrap();

    let response = app
        .client
        .get(app.url(&format!("/api/sessions/{}", session_id)))
        .bearer_auth(OTHER_TOKEN)
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status(), 403);

    let response = app
        .client
        .get(app.url("/api/sessions/does-not-exist"))
        .bearer_auth(TEST_TOKEN)
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status(), 404);

    let response = app
        .client
        .get(app.url(&format!("/api/sessions/{}", session_id)))
        .bearer_auth(TEST_TOKEN)
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status(), 200);
}

#[tokio::test]
async fn update_session_title_is_owner_only() {
    let app = TestApp::spawn().await;

    let session = app
        .create_session(TEST_TOKEN, "Before", &["user_other"])
        .await;
    let session_id = session["session_id"].as_str().unwrap();

    // A participant may read but not rename.
    let response = app
        .client
        .patch(app.url(&format!("/api/sessions/{}", session_id)))
        .bearer_auth(OTHER_TOKEN)
        .json(&json!({ "title": "Hijacked" }))
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status(), 403);

    let response = app
        .client
        .patch(app.url(&format!("/api/sessions/{}", session_id)))
        .bearer_auth(TEST_TOKEN)
        .json(&json!({ "title": "After" }))
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status(), 200);

    let body: serde_json::Value = response.json().await.expect("Failed to parse JSON");
    assert_eq!(body["title"], "After");
}

#[tokio::test]
async fn end_session_transitions_and_conflicts_on_repeat() {
    let app = TestApp::spawn().await;

    let session = app.create_session(TEST_TOKEN, "To end", &[]).await;
    let session_id = session["session_id"].as_str().unwrap();

    let response = app
        .client
        .post(app.url(&format!("/api/sessions/{}/end", session_id)))
        .bearer_auth(TEST_TOKEN)
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status(), 200);

    let body: serde_json::Value = response.json().await.expect("Failed to parse JSON");
    assert_eq!(body["status"], "ended");
    assert!(body["ended_at"].as_str().is_some());

    let response = app
        .client
        .post(app.url(&format!("/api/sessions/{}/end", session_id)))
        .bearer_auth(TEST_TOKEN)
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status(), 409);
}

#[tokio::test]
async fn delete_session_removes_it() {
    let app = TestApp::spawn().await;

    let session = app.create_session(TEST_TOKEN, "Disposable", &[]).await;
    let session_id = session["session_id"].as_str().unwrap();

    let response = app
        .client
        .delete(app.url(&format!("/api/sessions/{}", session_id)))
        .bearer_auth(TEST_TOKEN)
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status(), 204);

    let response = app
        .client
        .get(app.url(&format!("/api/sessions/{}", session_id)))
        .bearer_auth(TEST_TOKEN)
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status(), 404);
}
