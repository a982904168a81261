//! Workflow-engine adapter.
//!
//! Orchestration (retries, scheduling, fan-out) lives in the hosted engine;
//! this module only registers plain event-handler functions and executes
//! them when the engine calls back on the serve path.

pub mod client;
pub mod functions;

pub use client::WorkflowClient;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use service_core::error::AppError;
use std::collections::HashMap;
use std::sync::Arc;

pub const EVENT_USER_CREATED: &str = "identity/user.created";
pub const EVENT_USER_DELETED: &str = "identity/user.deleted";
pub const EVENT_SESSION_ENDED: &str = "chat/session.ended";

/// An event as delivered by (or sent to) the workflow engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowEvent {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub data: serde_json::Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ts: Option<i64>,
}

impl WorkflowEvent {
    pub fn new(name: impl Into<String>, data: serde_json::Value) -> Self {
        Self {
            id: None,
            name: name.into(),
            data,
            ts: Some(chrono::Utc::now().timestamp_millis()),
        }
    }
}

/// A function the engine can invoke through the serve path.
#[async_trait]
pub trait WorkflowFunction: Send + Sync {
    fn id(&self) -> &str;

    /// Event name that triggers this function.
    fn trigger(&self) -> &str;

    async fn run(&self, event: WorkflowEvent) -> Result<serde_json::Value, AppError>;
}

/// Manifest entry describing one registered function.
#[derive(Debug, Clone, Serialize)]
pub struct FunctionManifest {
    pub id: String,
    pub trigger: String,
}

#[derive(Default)]
pub struct FunctionRegistry {
    functions: HashMap<String, Arc<dyn WorkflowFunction>>,
}

impl FunctionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, function: Arc<dyn WorkflowFunction>) {
        self.functions.insert(function.id().to_string(), function);
    }

    pub fn get(&self, id: &str) -> Option<Arc<dyn WorkflowFunction>> {
        self.functions.get(id).cloned()
    }

    pub fn len(&self) -> usize {
        self.functions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }

    pub fn manifest(&self) -> Vec<FunctionManifest> {
        let mut entries: Vec<FunctionManifest> = self
            .functions
            .values()
            .map(|f| FunctionManifest {
                id: f.id().to_string(),
                trigger: f.trigger().to_string(),
            })
            .collect();
        entries.sort_by(|a, b| a.id.cmp(&b.id));
        entries
    }
}

/// Build the registry with every function this app exposes to the engine.
pub fn build_registry(store: Arc<dyn crate::services::ChatStore>) -> FunctionRegistry {
    let mut registry = FunctionRegistry::new();
    registry.register(Arc::new(functions::SyncUserCreated::new(store.clone())));
    registry.register(Arc::new(functions::SyncUserDeleted::new(store.clone())));
    registry.register(Arc::new(functions::PurgeSessionMessages::new(store)));
    registry
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::InMemoryStore;

    #[tokio::test]
    async fn registry_contains_all_functions() {
        let store = Arc::new(InMemoryStore::new());
        let registry = build_registry(store);

        assert_eq!(registry.len(), 3);
        assert!(registry.get("sync-user-created").is_some());
        assert!(registry.get("sync-user-deleted").is_some());
        assert!(registry.get("purge-session-messages").is_some());
        assert!(registry.get("nope").is_none());

        let manifest = registry.manifest();
        assert_eq!(manifest.len(), 3);
        assert_eq!(manifest[0].id, "purge-session-messages");
        assert_eq!(manifest[0].trigger, EVENT_SESSION_ENDED);
    }
}
