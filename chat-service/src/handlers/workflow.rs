//! Serve-path handlers for the workflow engine.
//!
//! `GET` introspects, `PUT` syncs registration, `POST` executes a function
//! on the engine's behalf after signature verification.

use crate::startup::AppState;
use crate::workflow::client::AppManifest;
use crate::workflow::WorkflowEvent;
use axum::{
    extract::{Query, State},
    http::HeaderMap,
    response::IntoResponse,
    Json,
};
use secrecy::ExposeSecret;
use serde::Deserialize;
use serde_json::json;
use service_core::error::AppError;
use service_core::utils::signature::{verify_signature_header, DEFAULT_TOLERANCE_SECS};

pub const SIGNATURE_HEADER: &str = "x-workflow-signature";

pub async fn introspect(State(state): State<AppState>) -> impl IntoResponse {
    let registry = &state.registry;

    Json(json!({
        "app_id": state.config.workflow.app_id,
        "function_count": registry.len(),
        "functions": registry.manifest(),
        "has_event_key": state.config.workflow.event_key.is_some(),
        "has_signing_key": state.config.workflow.signing_key.is_some(),
        "mode": state.config.environment.as_str(),
    }))
}

pub async fn register_app(State(state): State<AppState>) -> impl IntoResponse {
    let manifest = AppManifest {
        app_id: state.config.workflow.app_id.clone(),
        serve_path: state.config.workflow.serve_path.clone(),
        functions: state.registry.manifest(),
    };

    // Registration is best-effort: the engine may be unreachable during
    // local development, and it re-syncs on its own schedule anyway.
    let registered = match state.workflow.register_app(&manifest).await {
        Ok(()) => true,
        Err(e) => {
            tracing::warn!("Workflow registration push failed: {}", e);
            false
        }
    };

    Json(json!({
        "app_id": manifest.app_id,
        "serve_path": manifest.serve_path,
        "functions": manifest.functions,
        "registered": registered,
    }))
}

#[derive(Debug, Deserialize)]
pub struct InvokeParams {
    pub fn_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct InvokePayload {
    event: WorkflowEvent,
}

pub async fn invoke_function(
    State(state): State<AppState>,
    Query(params): Query<InvokeParams>,
    headers: HeaderMap,
    body: String,
) -> Result<impl IntoResponse, AppError> {
    if let Some(signing_key) = &state.config.workflow.signing_key {
        let header = headers
            .get(SIGNATURE_HEADER)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| {
                tracing::warn!("Missing {} header", SIGNATURE_HEADER);
                AppError::Unauthorized(anyhow::anyhow!("Missing webhook signature"))
            })?;

        let now = chrono::Utc::now().timestamp();
        let is_valid = verify_signature_header(
            signing_key.expose_secret(),
            header,
            &body,
            now,
            DEFAULT_TOLERANCE_SECS,
        )
        .map_err(|e| AppError::Unauthorized(anyhow::anyhow!("Malformed signature: {}", e)))?;

        if !is_valid {
            tracing::warn!("Invalid workflow webhook signature");
            return Err(AppError::Unauthorized(anyhow::anyhow!(
                "Invalid webhook signature"
            )));
        }
    } else {
        tracing::debug!("No signing key configured, skipping webhook verification");
    }

    let fn_id = params
        .fn_id
        .ok_or_else(|| AppError::BadRequest(anyhow::anyhow!("Missing fn_id")))?;

    let function = state
        .registry
        .get(&fn_id)
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Unknown function: {}", fn_id)))?;

    let payload: InvokePayload = serde_json::from_str(&body)
        .map_err(|e| AppError::BadRequest(anyhow::anyhow!("Invalid event payload: {}", e)))?;

    tracing::info!(
        fn_id = %fn_id,
        event = %payload.event.name,
        "Executing workflow function"
    );

    let result = function.run(payload.event).await?;

    Ok(Json(json!({
        "status": "completed",
        "fn_id": fn_id,
        "result": result,
    })))
}
