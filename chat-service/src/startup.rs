//! Application startup and lifecycle management.

use crate::config::ChatConfig;
use crate::services::{ChatDb, ChatStore, IdentityProviderClient, SessionResolver};
use crate::workflow::{build_registry, FunctionRegistry, WorkflowClient};
use service_core::error::AppError;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::signal;

/// Shared application state, injected into every handler.
#[derive(Clone)]
pub struct AppState {
    pub config: ChatConfig,
    pub store: Arc<dyn ChatStore>,
    pub auth: Arc<dyn SessionResolver>,
    pub workflow: Arc<WorkflowClient>,
    pub registry: Arc<FunctionRegistry>,
}

/// Application container for managing server lifecycle.
pub struct Application {
    port: u16,
    listener: TcpListener,
    state: AppState,
}

impl Application {
    /// Build the application against MongoDB and the real identity provider.
    pub async fn build(config: ChatConfig) -> Result<Self, AppError> {
        let db = ChatDb::connect(&config.mongodb.uri, &config.mongodb.database)
            .await
            .map_err(|e| {
                tracing::error!("Failed to connect to MongoDB: {}", e);
                e
            })?;

        db.initialize_indexes().await.map_err(|e| {
            tracing::error!("Failed to initialize database indexes: {}", e);
            e
        })?;

        let store: Arc<dyn ChatStore> = Arc::new(db);
        let auth: Arc<dyn SessionResolver> =
            Arc::new(IdentityProviderClient::new(config.auth.clone()));

        Self::assemble(config, store, auth).await
    }

    /// Build with injected store and resolver (used by the tests).
    pub async fn build_with_store(
        config: ChatConfig,
        store: Arc<dyn ChatStore>,
        auth: Arc<dyn SessionResolver>,
    ) -> Result<Self, AppError> {
        Self::assemble(config, store, auth).await
    }

    async fn assemble(
        config: ChatConfig,
        store: Arc<dyn ChatStore>,
        auth: Arc<dyn SessionResolver>,
    ) -> Result<Self, AppError> {
        let workflow = Arc::new(WorkflowClient::new(config.workflow.clone()));
        let registry = Arc::new(build_registry(store.clone()));

        tracing::info!(
            functions = registry.len(),
            "Workflow function registry initialized"
        );

        let state = AppState {
            config,
            store,
            auth,
            workflow,
            registry,
        };

        // Port 0 binds a random free port for the tests.
        let addr = state.config.common.bind_address();
        let listener = TcpListener::bind(&addr).await.map_err(|e| {
            tracing::error!("Failed to bind TCP listener to {}: {}", addr, e);
            AppError::from(e)
        })?;
        let port = listener.local_addr()?.port();

        tracing::info!("Listening on {}", port);

        Ok(Self {
            port,
            listener,
            state,
        })
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn store(&self) -> Arc<dyn ChatStore> {
        self.state.store.clone()
    }

    /// Run the application until a shutdown signal arrives.
    pub async fn run_until_stopped(self) -> std::io::Result<()> {
        let router = crate::build_router(self.state);
        axum::serve(self.listener, router)
            .with_graceful_shutdown(shutdown_signal())
            .await
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
