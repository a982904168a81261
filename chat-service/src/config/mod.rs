use secrecy::Secret;
use serde::Deserialize;
use service_core::config as core_config;
use service_core::error::AppError;
use std::env;

/// Default CORS origin for local frontend development.
const DEFAULT_CLIENT_URL: &str = "http://localhost:5173";

/// Default mount path of the workflow engine webhook.
const DEFAULT_WORKFLOW_SERVE_PATH: &str = "/api/inngest";

#[derive(Debug, Clone)]
pub struct ChatConfig {
    pub common: core_config::Config,
    pub environment: Environment,
    /// Single origin allowed to make credentialed browser requests.
    pub client_url: String,
    pub mongodb: MongoConfig,
    pub auth: AuthProviderConfig,
    pub workflow: WorkflowConfig,
    pub frontend: FrontendConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MongoConfig {
    pub uri: String,
    pub database: String,
}

/// Identity-provider connection settings. Token verification is delegated
/// to the provider; we only hold the endpoint and service key.
#[derive(Debug, Clone)]
pub struct AuthProviderConfig {
    pub api_url: String,
    pub api_key: Secret<String>,
}

#[derive(Debug, Clone)]
pub struct WorkflowConfig {
    /// Identifier this app registers under with the workflow engine.
    pub app_id: String,
    /// Base URL of the engine's event/registration API.
    pub api_url: String,
    /// Key used when pushing events to the engine.
    pub event_key: Option<Secret<String>>,
    /// Key used to verify engine callbacks; optional in dev only.
    pub signing_key: Option<Secret<String>>,
    /// Path the engine calls back on.
    pub serve_path: String,
}

#[derive(Debug, Clone)]
pub struct FrontendConfig {
    /// Directory holding the built frontend bundle.
    pub dist_path: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Dev,
    Prod,
}

impl Environment {
    pub fn is_production(&self) -> bool {
        matches!(self, Environment::Prod)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Dev => "dev",
            Environment::Prod => "prod",
        }
    }
}

impl ChatConfig {
    pub fn load() -> Result<Self, AppError> {
        let common = core_config::Config::load()?;

        let environment = match env::var("ENVIRONMENT")
            .unwrap_or_else(|_| "dev".to_string())
            .as_str()
        {
            "prod" | "production" => Environment::Prod,
            _ => Environment::Dev,
        };
        let is_prod = environment.is_production();

        Ok(ChatConfig {
            common,
            environment,
            client_url: get_env("CLIENT_URL", Some(DEFAULT_CLIENT_URL), is_prod)?,
            mongodb: MongoConfig {
                uri: get_env("MONGODB_URI", Some("mongodb://localhost:27017"), is_prod)?,
                database: get_env("MONGODB_DATABASE", Some("chat_db"), is_prod)?,
            },
            auth: AuthProviderConfig {
                api_url: get_env("AUTH_API_URL", Some("http://localhost:8901"), is_prod)?,
                api_key: Secret::new(get_env("AUTH_API_KEY", Some("dev-auth-key"), is_prod)?),
            },
            workflow: WorkflowConfig {
                app_id: get_env("WORKFLOW_APP_ID", Some("chat-service"), is_prod)?,
                api_url: get_env("WORKFLOW_API_URL", Some("http://localhost:8288"), is_prod)?,
                event_key: optional_env("WORKFLOW_EVENT_KEY", is_prod)?.map(Secret::new),
                signing_key: optional_env("WORKFLOW_SIGNING_KEY", is_prod)?.map(Secret::new),
                serve_path: get_env(
                    "WORKFLOW_SERVE_PATH",
                    Some(DEFAULT_WORKFLOW_SERVE_PATH),
                    is_prod,
                )?,
            },
            frontend: FrontendConfig {
                dist_path: get_env("FRONTEND_DIST_PATH", Some("frontend/dist"), is_prod)?,
            },
        })
    }
}

fn get_env(key: &str, default: Option<&str>, is_prod: bool) -> Result<String, AppError> {
    match env::var(key) {
        Ok(val) => Ok(val),
        Err(_) => {
            if is_prod {
                Err(AppError::ConfigError(anyhow::anyhow!(
                    "{} is required in production but not set",
                    key
                )))
            } else if let Some(def) = default {
                Ok(def.to_string())
            } else {
                Err(AppError::ConfigError(anyhow::anyhow!(
                    "{} is required but not set",
                    key
                )))
            }
        }
    }
}

/// Like `get_env` but absence is allowed in dev; still required in prod.
fn optional_env(key: &str, is_prod: bool) -> Result<Option<String>, AppError> {
    match env::var(key) {
        Ok(val) if !val.is_empty() => Ok(Some(val)),
        _ if is_prod => Err(AppError::ConfigError(anyhow::anyhow!(
            "{} is required in production but not set",
            key
        ))),
        _ => Ok(None),
    }
}
