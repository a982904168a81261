mod common;

use chat_service::models::{ChatMessage, ChatSession};
use common::{TestApp, TEST_SIGNING_KEY};
use serde_json::json;
use service_core::utils::signature::signature_header;

fn signed_header(body: &str) -> String {
    signature_header(TEST_SIGNING_KEY, chrono::Utc::now().timestamp(), body)
        .expect("Failed to sign payload")
}

#[tokio::test]
async fn introspection_lists_registered_functions() {
    let app = TestApp::spawn().await;

    let response = app
        .client
        .get(app.url("/api/inngest"))
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status(), 200);

    let body: serde_json::Value = response.json().await.expect("Failed to parse JSON");
    assert_eq!(body["app_id"], "chat-service");
    assert_eq!(body["function_count"], 3);
    assert_eq!(body["has_signing_key"], true);

    let ids: Vec<&str> = body["functions"]
        .as_array()
        .unwrap()
        .iter()
        .map(|f| f["id"].as_str().unwrap())
        .collect();
    assert_eq!(
        ids,
        vec![
            "purge-session-messages",
            "sync-user-created",
            "sync-user-deleted"
        ]
    );
}

#[tokio::test]
async fn registration_returns_manifest_even_when_engine_is_down() {
    let app = TestApp::spawn().await;

    let response = app
        .client
        .put(app.url("/api/inngest"))
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status(), 200);

    let body: serde_json::Value = response.json().await.expect("Failed to parse JSON");
    assert_eq!(body["app_id"], "chat-service");
    assert_eq!(body["serve_path"], "/api/inngest");
    assert_eq!(body["functions"].as_array().unwrap().len(), 3);
    // No engine is listening in the test environment.
    assert_eq!(body["registered"], false);
}

#[tokio::test]
async fn signed_user_created_event_syncs_user() {
    let app = TestApp::spawn().await;

    let body = json!({
        "event": {
            "name": "identity/user.created",
            "data": { "id": "user_wf", "email": "wf@example.com", "name": "Workflow User" }
        }
    })
    .to_string();

    let response = app
        .client
        .post(app.url("/api/inngest?fn_id=sync-user-created"))
        .header("x-workflow-signature", signed_header(&body))
        .header("content-type", "application/json")
        .body(body)
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status(), 200);

    let result: serde_json::Value = response.json().await.expect("Failed to parse JSON");
    assert_eq!(result["status"], "completed");
    assert_eq!(result["result"]["synced"], "user_wf");

    let user = app
        .store
        .find_user("user_wf")
        .await
        .unwrap()
        .expect("User was not synced");
    assert_eq!(user.email.as_deref(), Some("wf@example.com"));
}

#[tokio::test]
async fn signed_user_deleted_event_removes_user() {
    let app = TestApp::spawn().await;

    let create = json!({
        "event": { "name": "identity/user.created", "data": { "id": "user_gone" } }
    })
    .to_string();
    let response = app
        .client
        .post(app.url("/api/inngest?fn_id=sync-user-created"))
        .header("x-workflow-signature", signed_header(&create))
        .header("content-type", "application/json")
        .body(create)
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status(), 200);

    let delete = json!({
        "event": { "name": "identity/user.deleted", "data": { "id": "user_gone" } }
    })
    .to_string();
    let response = app
        .client
        .post(app.url("/api/inngest?fn_id=sync-user-deleted"))
        .header("x-workflow-signature", signed_header(&delete))
        .header("content-type", "application/json")
        .body(delete)
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status(), 200);

    assert!(app.store.find_user("user_gone").await.unwrap().is_none());
}

#[tokio::test]
async fn session_ended_event_purges_messages() {
    let app = TestApp::spawn().await;

    let session = ChatSession::new("user_primary".to_string(), "Old".to_string(), vec![]);
    app.store.insert_session(&session).await.unwrap();
    app.store
        .insert_message(&ChatMessage::new(
            session.session_id.clone(),
            "user_primary".to_string(),
            "stale".to_string(),
        ))
        .await
        .unwrap();

    let body = json!({
        "event": {
            "name": "chat/session.ended",
            "data": { "session_id": session.session_id }
        }
    })
    .to_string();

    let response = app
        .client
        .post(app.url("/api/inngest?fn_id=purge-session-messages"))
        .header("x-workflow-signature", signed_header(&body))
        .header("content-type", "application/json")
        .body(body)
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status(), 200);

    let (messages, total) = app
        .store
        .list_messages(&session.session_id, 1, 20)
        .await
        .unwrap();
    assert!(messages.is_empty());
    assert_eq!(total, 0);
}

#[tokio::test]
async fn tampered_signature_is_rejected() {
    let app = TestApp::spawn().await;

    let body = json!({
        "event": { "name": "identity/user.created", "data": { "id": "user_evil" } }
    })
    .to_string();

    let mut header = signed_header(&body);
    let flipped = if header.ends_with('0') { '1' } else { '0' };
    header.pop();
    header.push(flipped);

    let response = app
        .client
        .post(app.url("/api/inngest?fn_id=sync-user-created"))
        .header("x-workflow-signature", header)
        .header("content-type", "application/json")
        .body(body)
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status(), 401);

    assert!(app.store.find_user("user_evil").await.unwrap().is_none());
}

#[tokio::test]
async fn missing_signature_is_rejected() {
    let app = TestApp::spawn().await;

    let response = app
        .client
        .post(app.url("/api/inngest?fn_id=sync-user-created"))
        .header("content-type", "application/json")
        .body("{\"event\":{\"name\":\"identity/user.created\",\"data\":{\"id\":\"x\"}}}")
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status(), 401);
}

#[tokio::test]
async fn unknown_function_is_404() {
    let app = TestApp::spawn().await;

    let body = json!({ "event": { "name": "whatever", "data": {} } }).to_string();

    let response = app
        .client
        .post(app.url("/api/inngest?fn_id=does-not-exist"))
        .header("x-workflow-signature", signed_header(&body))
        .header("content-type", "application/json")
        .body(body)
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status(), 404);
}

#[tokio::test]
async fn missing_fn_id_is_400() {
    let app = TestApp::spawn().await;

    let body = json!({ "event": { "name": "whatever", "data": {} } }).to_string();

    let response = app
        .client
        .post(app.url("/api/inngest"))
        .header("x-workflow-signature", signed_header(&body))
        .header("content-type", "application/json")
        .body(body)
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status(), 400);
}
