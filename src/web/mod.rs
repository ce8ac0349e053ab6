//! HTTP surface
//!
//! One generic handler set serves every declared entity; schemas are looked
//! up per request, so declaring an entity never touches the router.

mod auth;
mod extract;
mod records;
mod router;
mod schemas;
mod state;

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use tracing::error;

use crate::auth::AuthError;
use crate::core::{EngineError, ErrorKind};

pub use extract::{ApiJson, AuthenticatedPrincipal};
pub use router::build_router;
pub use state::AppState;

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

#[derive(Debug)]
pub enum WebError {
    Engine(EngineError),
    Auth(AuthError),
    Unauthorized(String),
    Forbidden(String),
    Input(String),
}

impl From<EngineError> for WebError {
    fn from(err: EngineError) -> Self {
        WebError::Engine(err)
    }
}

impl From<AuthError> for WebError {
    fn from(err: AuthError) -> Self {
        WebError::Auth(err)
    }
}

impl From<JsonRejection> for WebError {
    fn from(rejection: JsonRejection) -> Self {
        WebError::Input(rejection.body_text())
    }
}

impl IntoResponse for WebError {
    fn into_response(self) -> Response {
        let (status, message, code) = match self {
            WebError::Engine(err) => {
                let status = match err.kind() {
                    ErrorKind::Validation | ErrorKind::Uniqueness | ErrorKind::Conflict => {
                        StatusCode::BAD_REQUEST
                    }
                    ErrorKind::Forbidden => StatusCode::FORBIDDEN,
                    ErrorKind::NotFound => StatusCode::NOT_FOUND,
                    ErrorKind::Storage => {
                        error!(error = %err, "storage failure");
                        StatusCode::INTERNAL_SERVER_ERROR
                    }
                };
                (status, err.detail().to_string(), err.kind().as_str().to_string())
            }

            WebError::Auth(err) => match err {
                AuthError::InvalidCredentials | AuthError::InvalidToken | AuthError::TokenExpired => (
                    StatusCode::UNAUTHORIZED,
                    err.to_string(),
                    "unauthorized".to_string(),
                ),
                AuthError::UserExists(_) => {
                    (StatusCode::BAD_REQUEST, err.to_string(), "conflict".to_string())
                }
                AuthError::InvalidUsername(_) | AuthError::InvalidPassword(_) => (
                    StatusCode::BAD_REQUEST,
                    err.to_string(),
                    "validation_error".to_string(),
                ),
                AuthError::Hash(_) => {
                    error!(error = %err, "password hashing failure");
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        err.to_string(),
                        "internal_error".to_string(),
                    )
                }
            },

            WebError::Unauthorized(msg) => {
                (StatusCode::UNAUTHORIZED, msg, "unauthorized".to_string())
            }
            WebError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg, "forbidden".to_string()),
            WebError::Input(msg) => (StatusCode::BAD_REQUEST, msg, "input_error".to_string()),
        };

        let body = Json(ErrorResponse {
            error: message,
            code,
        });

        (status, body).into_response()
    }
}

pub type Result<T> = std::result::Result<T, WebError>;

#[cfg(test)]
mod tests {
    use super::*;

    fn status_of(err: WebError) -> StatusCode {
        err.into_response().status()
    }

    #[test]
    fn maps_engine_errors() {
        assert_eq!(status_of(EngineError::validation("x").into()), StatusCode::BAD_REQUEST);
        assert_eq!(status_of(EngineError::uniqueness("x").into()), StatusCode::BAD_REQUEST);
        assert_eq!(status_of(EngineError::conflict("x").into()), StatusCode::BAD_REQUEST);
        assert_eq!(status_of(EngineError::forbidden("x").into()), StatusCode::FORBIDDEN);
        assert_eq!(status_of(EngineError::not_found("x").into()), StatusCode::NOT_FOUND);
        assert_eq!(
            status_of(EngineError::storage("disk").into()),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn maps_auth_errors() {
        assert_eq!(status_of(AuthError::InvalidToken.into()), StatusCode::UNAUTHORIZED);
        assert_eq!(status_of(AuthError::TokenExpired.into()), StatusCode::UNAUTHORIZED);
        assert_eq!(
            status_of(AuthError::UserExists("bob".into()).into()),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_of(AuthError::Hash("cost".into()).into()),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
