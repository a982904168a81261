use chat_service::config::{
    AuthProviderConfig, ChatConfig, Environment, FrontendConfig, MongoConfig, WorkflowConfig,
};
use chat_service::services::{AuthIdentity, ChatStore, InMemoryStore, StaticSessionResolver};
use chat_service::startup::Application;
use secrecy::Secret;
use serde_json::json;
use service_core::config::Config as CoreConfig;
use std::sync::Arc;

pub const TEST_TOKEN: &str = "tok_primary";
pub const OTHER_TOKEN: &str = "tok_other";
pub const TEST_USER_ID: &str = "user_primary";
pub const OTHER_USER_ID: &str = "user_other";
pub const TEST_SIGNING_KEY: &str = "signkey-test-0123456789";

pub struct TestApp {
    pub address: String,
    pub port: u16,
    pub store: Arc<dyn ChatStore>,
    pub client: reqwest::Client,
}

/// Baseline test configuration: random port, in-memory store semantics,
/// signature verification enabled on the workflow webhook.
pub fn test_config() -> ChatConfig {
    ChatConfig {
        common: CoreConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
        },
        environment: Environment::Dev,
        client_url: "http://localhost:5173".to_string(),
        mongodb: MongoConfig {
            uri: "mongodb://localhost:27017".to_string(),
            database: "chat_test".to_string(),
        },
        auth: AuthProviderConfig {
            api_url: "http://localhost:8901".to_string(),
            api_key: Secret::new("test-auth-key".to_string()),
        },
        workflow: WorkflowConfig {
            app_id: "chat-service".to_string(),
            api_url: "http://localhost:8288".to_string(),
            event_key: None,
            signing_key: Some(Secret::new(TEST_SIGNING_KEY.to_string())),
            serve_path: "/api/inngest".to_string(),
        },
        frontend: FrontendConfig {
            dist_path: "frontend/dist".to_string(),
        },
    }
}

impl TestApp {
    pub async fn spawn() -> Self {
        Self::spawn_with_config(test_config()).await
    }

    pub async fn spawn_with_config(config: ChatConfig) -> Self {
        let store: Arc<dyn ChatStore> = Arc::new(InMemoryStore::new());

        let resolver = StaticSessionResolver::new()
            .with_token(
                TEST_TOKEN,
                AuthIdentity {
                    user_id: TEST_USER_ID.to_string(),
                    email: Some("primary@example.com".to_string()),
                    name: Some("Primary User".to_string()),
                },
            )
            .with_token(
                OTHER_TOKEN,
                AuthIdentity {
                    user_id: OTHER_USER_ID.to_string(),
                    email: Some("other@example.com".to_string()),
                    name: Some("Other User".to_string()),
                },
            );

        let app = Application::build_with_store(config, store.clone(), Arc::new(resolver))
            .await
            .expect("Failed to build test application");

        let port = app.port();
        let address = format!("http://127.0.0.1:{}", port);

        tokio::spawn(async move {
            app.run_until_stopped().await.ok();
        });

        // Wait for the server to accept connections.
        let client = reqwest::Client::new();
        let health_url = format!("{}/health", address);
        for _ in 0..50 {
            if client.get(&health_url).send().await.is_ok() {
                break;
            }
            tokio::time::sleep(tokio::time::Duration::from_millis(50)).await;
        }

        TestApp {
            address,
            port,
            store,
            client,
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.address, path)
    }

    /// Create a session through the API and return the response body.
    pub async fn create_session(
        &self,
        token: &str,
        title: &str,
        participant_ids: &[&str],
    ) -> serde_json::Value {
        let response = self
            .client
            .post(self.url("/api/sessions"))
            .bearer_auth(token)
            .json(&json!({ "title": title, "participant_ids": participant_ids }))
            .send()
            .await
            .expect("Failed to execute request");

        assert_eq!(response.status(), 201);
        response.json().await.expect("Failed to parse JSON")
    }
}
