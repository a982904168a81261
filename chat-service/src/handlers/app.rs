//! Health/debug endpoints and production SPA serving.

use crate::startup::AppState;
use axum::{
    extract::State,
    http::{header, Method, StatusCode, Uri},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use service_core::error::AppError;
use std::path::{Component, Path, PathBuf};

pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(json!({
            "msg": "api is up and running",
            "service": "chat-service",
            "version": env!("CARGO_PKG_VERSION"),
            "is_production": state.config.environment.is_production(),
            "env_value": state.config.environment.as_str(),
        })),
    )
}

/// Operational debug endpoint: reports whether the frontend bundle is where
/// the config says it is.
pub async fn debug_path(State(state): State<AppState>) -> impl IntoResponse {
    let dist_path = &state.config.frontend.dist_path;
    let index_path = Path::new(dist_path).join("index.html");
    let index_html_exists = tokio::fs::try_exists(&index_path).await.unwrap_or(false);

    Json(json!({
        "index_html_exists": index_html_exists,
        "path_attempted": dist_path,
    }))
}

/// Fallback for every unmatched route.
///
/// In production, GET paths without a file extension receive the SPA's
/// `index.html` so client-side routing can take over; paths with an
/// extension are served from the dist directory. Everything else is a 404.
pub async fn spa_fallback(
    State(state): State<AppState>,
    method: Method,
    uri: Uri,
) -> Result<Response, AppError> {
    if !state.config.environment.is_production() || method != Method::GET {
        return Err(AppError::NotFound(anyhow::anyhow!("Resource not found")));
    }

    let dist = Path::new(&state.config.frontend.dist_path);
    let rel_path = uri.path().trim_start_matches('/');

    if has_file_extension(rel_path) {
        let file_path = safe_join(dist, rel_path).ok_or_else(|| {
            AppError::BadRequest(anyhow::anyhow!("Invalid asset path"))
        })?;

        let data = tokio::fs::read(&file_path)
            .await
            .map_err(|_| AppError::NotFound(anyhow::anyhow!("Asset not found")))?;

        return Ok((
            StatusCode::OK,
            [(header::CONTENT_TYPE, detect_content_type(rel_path))],
            data,
        )
            .into_response());
    }

    let index = dist.join("index.html");
    let html = tokio::fs::read(&index).await.map_err(|e| {
        tracing::error!(path = %index.display(), "Failed to read SPA index: {}", e);
        AppError::NotFound(anyhow::anyhow!("Frontend bundle not found"))
    })?;

    Ok((
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/html; charset=utf-8")],
        html,
    )
        .into_response())
}

/// Whether the last path segment looks like a file name.
fn has_file_extension(path: &str) -> bool {
    path.rsplit('/').next().is_some_and(|segment| {
        segment.contains('.')
    })
}

/// Join a request path onto the dist directory, refusing traversal.
fn safe_join(base: &Path, rel_path: &str) -> Option<PathBuf> {
    let rel = Path::new(rel_path);
    if rel
        .components()
        .any(|c| !matches!(c, Component::Normal(_)))
    {
        return None;
    }
    Some(base.join(rel))
}

fn detect_content_type(path: &str) -> &'static str {
    let extension = path.rsplit('.').next().unwrap_or_default();
    match extension {
        "html" => "text/html; charset=utf-8",
        "js" | "mjs" => "text/javascript",
        "css" => "text/css",
        "json" | "map" => "application/json",
        "svg" => "image/svg+xml",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "webp" => "image/webp",
        "ico" => "image/x-icon",
        "txt" => "text/plain; charset=utf-8",
        "woff" => "font/woff",
        "woff2" => "font/woff2",
        "wasm" => "application/wasm",
        _ => "application/octet-stream",
    }
}
