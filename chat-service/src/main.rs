use chat_service::config::ChatConfig;
use chat_service::startup::Application;
use service_core::observability::init_tracing;

#[tokio::main]
async fn main() -> std::io::Result<()> {
    init_tracing("chat-service", "info");

    let config = ChatConfig::load().map_err(|e| {
        tracing::error!("Failed to load configuration: {}", e);
        std::io::Error::other(format!("Configuration error: {}", e))
    })?;

    // Fail fast: if the database or the listener is unavailable the process
    // exits non-zero instead of serving a degraded API.
    let app = Application::build(config).await.map_err(|e| {
        tracing::error!("Failed to start server: {}", e);
        std::io::Error::other(format!("Startup error: {}", e))
    })?;

    tracing::info!("Server is running on port {}", app.port());

    app.run_until_stopped().await
}
