//! Event-handler functions executed on engine callbacks.

use crate::models::User;
use crate::services::ChatStore;
use crate::workflow::{
    WorkflowEvent, WorkflowFunction, EVENT_SESSION_ENDED, EVENT_USER_CREATED, EVENT_USER_DELETED,
};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use service_core::error::AppError;
use std::sync::Arc;

/// Mirror a provider-created user into the users collection.
pub struct SyncUserCreated {
    store: Arc<dyn ChatStore>,
}

#[derive(Debug, Deserialize)]
struct UserCreatedData {
    id: String,
    email: Option<String>,
    name: Option<String>,
    image_url: Option<String>,
}

impl SyncUserCreated {
    pub fn new(store: Arc<dyn ChatStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl WorkflowFunction for SyncUserCreated {
    fn id(&self) -> &str {
        "sync-user-created"
    }

    fn trigger(&self) -> &str {
        EVENT_USER_CREATED
    }

    async fn run(&self, event: WorkflowEvent) -> Result<serde_json::Value, AppError> {
        let data: UserCreatedData = serde_json::from_value(event.data).map_err(|e| {
            AppError::BadRequest(anyhow::anyhow!("Malformed user.created payload: {}", e))
        })?;

        let user = User::new(data.id, data.email, data.name, data.image_url);
        self.store.upsert_user(&user).await?;

        tracing::info!(user_id = %user.user_id, "User synced from identity provider");
        Ok(json!({ "synced": user.user_id }))
    }
}

/// Remove a provider-deleted user from the users collection.
pub struct SyncUserDeleted {
    store: Arc<dyn ChatStore>,
}

#[derive(Debug, Deserialize)]
struct UserDeletedData {
    id: String,
}

impl SyncUserDeleted {
    pub fn new(store: Arc<dyn ChatStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl WorkflowFunction for SyncUserDeleted {
    fn id(&self) -> &str {
        "sync-user-deleted"
    }

    fn trigger(&self) -> &str {
        EVENT_USER_DELETED
    }

    async fn run(&self, event: WorkflowEvent) -> Result<serde_json::Value, AppError> {
        let data: UserDeletedData = serde_json::from_value(event.data).map_err(|e| {
            AppError::BadRequest(anyhow::anyhow!("Malformed user.deleted payload: {}", e))
        })?;

        let removed = self.store.delete_user(&data.id).await?;

        tracing::info!(user_id = %data.id, removed, "User removal processed");
        Ok(json!({ "removed": removed }))
    }
}

/// Drop the message history of an ended session.
pub struct PurgeSessionMessages {
    store: Arc<dyn ChatStore>,
}

#[derive(Debug, Deserialize)]
struct SessionEndedData {
    session_id: String,
}

impl PurgeSessionMessages {
    pub fn new(store: Arc<dyn ChatStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl WorkflowFunction for PurgeSessionMessages {
    fn id(&self) -> &str {
        "purge-session-messages"
    }

    fn trigger(&self) -> &str {
        EVENT_SESSION_ENDED
    }

    async fn run(&self, event: WorkflowEvent) -> Result<serde_json::Value, AppError> {
        let data: SessionEndedData = serde_json::from_value(event.data).map_err(|e| {
            AppError::BadRequest(anyhow::anyhow!("Malformed session.ended payload: {}", e))
        })?;

        let purged = self.store.delete_session_messages(&data.session_id).await?;

        tracing::info!(session_id = %data.session_id, purged, "Session messages purged");
        Ok(json!({ "purged": purged }))
    }
}
