pub mod config;
pub mod dtos;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod services;
pub mod startup;
pub mod workflow;

use crate::config::ChatConfig;
use crate::startup::AppState;
use axum::{
    http::{header, HeaderValue, Method},
    middleware::{from_fn, from_fn_with_state},
    routing::{get, post},
    Router,
};
use service_core::middleware::{
    security_headers::security_headers_middleware, tracing::request_id_middleware,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

/// Compose middleware and mount the routes.
///
/// Order, outermost first: CORS, security headers, request id, request
/// tracing, auth capability attachment, then the routes. Unmatched paths
/// land in the SPA fallback.
pub fn build_router(state: AppState) -> Router {
    let serve_path = state.config.workflow.serve_path.clone();
    let cors = cors_layer(&state.config);

    Router::new()
        .route("/health", get(handlers::app::health_check))
        .route("/debug-path", get(handlers::app::debug_path))
        .route(
            &serve_path,
            get(handlers::workflow::introspect)
                .put(handlers::workflow::register_app)
                .post(handlers::workflow::invoke_function),
        )
        .route(
            "/api/sessions",
            post(handlers::sessions::create_session).get(handlers::sessions::list_sessions),
        )
        .route(
            "/api/sessions/:session_id",
            get(handlers::sessions::get_session)
                .patch(handlers::sessions::update_session)
                .delete(handlers::sessions::delete_session),
        )
        .route(
            "/api/sessions/:session_id/end",
            post(handlers::sessions::end_session),
        )
        .route(
            "/api/chat/:session_id/messages",
            get(handlers::chat::list_messages).post(handlers::chat::send_message),
        )
        .fallback(handlers::app::spa_fallback)
        .layer(from_fn_with_state(
            state.clone(),
            middleware::attach_auth_middleware,
        ))
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &axum::http::Request<_>| {
                let request_id = request
                    .headers()
                    .get("x-request-id")
                    .and_then(|value| value.to_str().ok())
                    .unwrap_or("-");

                tracing::info_span!(
                    "http_request",
                    request_id = %request_id,
                    method = %request.method(),
                    uri = %request.uri(),
                    version = ?request.version(),
                )
            }),
        )
        .layer(from_fn(request_id_middleware))
        .layer(from_fn(security_headers_middleware))
        .layer(cors)
        .with_state(state)
}

/// Single-origin CORS with credentials, so the browser can send the
/// provider's session cookie alongside API calls.
fn cors_layer(config: &ChatConfig) -> CorsLayer {
    let origin = config
        .client_url
        .parse::<HeaderValue>()
        .unwrap_or_else(|e| {
            tracing::error!(
                "Invalid CORS origin '{}': {}. Falling back to the dev origin.",
                config.client_url,
                e
            );
            HeaderValue::from_static("http://localhost:5173")
        });

    CorsLayer::new()
        .allow_origin(origin)
        .allow_credentials(true)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
}
