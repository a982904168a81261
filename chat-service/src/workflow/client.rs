use crate::config::WorkflowConfig;
use crate::workflow::{FunctionManifest, WorkflowEvent};
use reqwest::Client;
use secrecy::ExposeSecret;
use serde::Serialize;
use service_core::error::AppError;

/// Client for the workflow engine's event and registration APIs.
#[derive(Clone)]
pub struct WorkflowClient {
    client: Client,
    config: WorkflowConfig,
}

/// Registration payload pushed to the engine on a `PUT` to the serve path.
#[derive(Debug, Serialize)]
pub struct AppManifest {
    pub app_id: String,
    pub serve_path: String,
    pub functions: Vec<FunctionManifest>,
}

impl WorkflowClient {
    pub fn new(config: WorkflowConfig) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }

    /// Whether outbound event delivery is configured.
    pub fn is_configured(&self) -> bool {
        self.config.event_key.is_some()
    }

    /// Push an event to the engine's ingest endpoint.
    ///
    /// Callers treat failures as non-fatal; delivery guarantees are the
    /// engine's concern once the event is accepted.
    pub async fn send_event(&self, event: &WorkflowEvent) -> Result<(), AppError> {
        let Some(event_key) = &self.config.event_key else {
            tracing::debug!(event = %event.name, "Workflow event key not configured, dropping event");
            return Ok(());
        };

        let url = format!("{}/e/{}", self.config.api_url, event_key.expose_secret());

        let response = self
            .client
            .post(&url)
            .json(&[event])
            .send()
            .await
            .map_err(|e| {
                AppError::BadGateway(format!("Workflow engine unreachable: {}", e))
            })?;

        if !response.status().is_success() {
            return Err(AppError::BadGateway(format!(
                "Workflow engine rejected event: {}",
                response.status()
            )));
        }

        tracing::debug!(event = %event.name, "Workflow event accepted");
        Ok(())
    }

    /// Announce this app's functions to the engine.
    pub async fn register_app(&self, manifest: &AppManifest) -> Result<(), AppError> {
        let url = format!("{}/fn/register", self.config.api_url);

        let response = self
            .client
            .post(&url)
            .json(manifest)
            .send()
            .await
            .map_err(|e| {
                AppError::BadGateway(format!("Workflow engine unreachable: {}", e))
            })?;

        if !response.status().is_success() {
            return Err(AppError::BadGateway(format!(
                "Workflow engine rejected registration: {}",
                response.status()
            )));
        }

        tracing::info!(
            app_id = %manifest.app_id,
            functions = manifest.functions.len(),
            "Registered functions with workflow engine"
        );
        Ok(())
    }
}
