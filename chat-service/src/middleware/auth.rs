use crate::services::{AuthIdentity, SessionResolver};
use crate::startup::AppState;
use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts},
    middleware::Next,
    response::Response,
};
use service_core::error::AppError;
use std::sync::Arc;

/// Auth-lookup capability attached to every request.
///
/// Carries the raw bearer token (if any) and the resolver; the identity
/// provider is only contacted when a handler actually demands an identity
/// through the `AuthUser` extractor.
#[derive(Clone)]
pub struct AuthCapability {
    token: Option<String>,
    resolver: Arc<dyn SessionResolver>,
}

impl AuthCapability {
    pub fn new(token: Option<String>, resolver: Arc<dyn SessionResolver>) -> Self {
        Self { token, resolver }
    }

    pub async fn resolve(&self) -> Result<AuthIdentity, AppError> {
        let token = self.token.as_deref().ok_or_else(|| {
            AppError::Unauthorized(anyhow::anyhow!("Missing session token"))
        })?;
        self.resolver.resolve(token).await
    }
}

/// Attach the auth capability to the request context.
///
/// Never rejects by itself so that public routes (health, SPA, workflow
/// webhook) stay reachable without a token.
pub async fn attach_auth_middleware(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Response {
    let token = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(|value| value.to_string());

    req.extensions_mut()
        .insert(AuthCapability::new(token, state.auth.clone()));

    next.run(req).await
}

/// Extractor that resolves the request's session token to an identity.
pub struct AuthUser(pub AuthIdentity);

#[axum::async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let capability = parts.extensions.get::<AuthCapability>().ok_or_else(|| {
            AppError::InternalError(anyhow::anyhow!(
                "Auth capability missing from request extensions"
            ))
        })?;

        let identity = capability.resolve().await?;
        tracing::Span::current().record("user_id", identity.user_id.as_str());

        Ok(AuthUser(identity))
    }
}
