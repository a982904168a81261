//! Session resolution against the external identity provider.
//!
//! Token issuance, rotation and revocation are the provider's concern; this
//! module only turns an opaque session token into an identity.

use crate::config::AuthProviderConfig;
use async_trait::async_trait;
use reqwest::Client;
use secrecy::ExposeSecret;
use serde::Deserialize;
use service_core::error::AppError;
use std::collections::HashMap;

/// Identity attached to a request once its session token resolves.
#[derive(Debug, Clone)]
pub struct AuthIdentity {
    pub user_id: String,
    pub email: Option<String>,
    pub name: Option<String>,
}

#[async_trait]
pub trait SessionResolver: Send + Sync {
    async fn resolve(&self, token: &str) -> Result<AuthIdentity, AppError>;
}

/// Resolver backed by the identity provider's introspection endpoint.
pub struct IdentityProviderClient {
    client: Client,
    config: AuthProviderConfig,
}

#[derive(Debug, Deserialize)]
struct IntrospectResponse {
    active: bool,
    user_id: Option<String>,
    email: Option<String>,
    name: Option<String>,
}

impl IdentityProviderClient {
    pub fn new(config: AuthProviderConfig) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }
}

#[async_trait]
impl SessionResolver for IdentityProviderClient {
    async fn resolve(&self, token: &str) -> Result<AuthIdentity, AppError> {
        let url = format!("{}/v1/sessions/introspect", self.config.api_url);

        let response = self
            .client
            .post(&url)
            .bearer_auth(self.config.api_key.expose_secret())
            .json(&serde_json::json!({ "token": token }))
            .send()
            .await
            .map_err(|e| {
                tracing::error!("Identity provider request to {} failed: {}", url, e);
                AppError::BadGateway(format!("Identity provider unreachable: {}", e))
            })?;

        if !response.status().is_success() {
            tracing::warn!(status = %response.status(), "Identity provider rejected introspection");
            return Err(AppError::AuthError(anyhow::anyhow!(
                "Session token rejected"
            )));
        }

        let body: IntrospectResponse = response.json().await.map_err(|e| {
            tracing::error!("Failed to parse identity provider response: {}", e);
            AppError::BadGateway(format!("Invalid identity provider response: {}", e))
        })?;

        if !body.active {
            return Err(AppError::AuthError(anyhow::anyhow!("Session is not active")));
        }

        let user_id = body.user_id.ok_or_else(|| {
            AppError::BadGateway("Identity provider omitted user id".to_string())
        })?;

        Ok(AuthIdentity {
            user_id,
            email: body.email,
            name: body.name,
        })
    }
}

/// Fixed token map for tests and offline development.
#[derive(Default)]
pub struct StaticSessionResolver {
    tokens: HashMap<String, AuthIdentity>,
}

impl StaticSessionResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(mut self, token: impl Into<String>, identity: AuthIdentity) -> Self {
        self.tokens.insert(token.into(), identity);
        self
    }
}

#[async_trait]
impl SessionResolver for StaticSessionResolver {
    async fn resolve(&self, token: &str) -> Result<AuthIdentity, AppError> {
        self.tokens
            .get(token)
            .cloned()
            .ok_or_else(|| AppError::AuthError(anyhow::anyhow!("Unknown session token")))
    }
}
