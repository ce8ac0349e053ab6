use async_trait::async_trait;
use axum::extract::{FromRequest, FromRequestParts};
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;

use crate::core::Principal;
use crate::web::{AppState, WebError};

/// JSON body whose rejections render as `input_error`.
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(WebError))]
pub struct ApiJson<T>(pub T);

/// Caller resolved from the `Authorization: Bearer <token>` header.
pub struct AuthenticatedPrincipal(pub Principal);

impl AuthenticatedPrincipal {
    /// Admin-only routes reject every other role.
    pub fn require_admin(&self) -> Result<&Principal, WebError> {
        if !self.0.is_admin() {
            return Err(WebError::Forbidden("Admin role required".to_string()));
        }
        Ok(&self.0)
    }
}

#[async_trait]
impl FromRequestParts<AppState> for AuthenticatedPrincipal {
    type Rejection = WebError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| WebError::Unauthorized("Missing bearer token".to_string()))?;

        let token = bearer_token(header)
            .ok_or_else(|| WebError::Unauthorized("Malformed authorization header".to_string()))?;

        let principal = state.auth.resolve(token).await?;
        Ok(Self(principal))
    }
}

fn bearer_token(header: &str) -> Option<&str> {
    let (scheme, token) = header.split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
}
