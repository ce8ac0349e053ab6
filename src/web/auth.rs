use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use serde::{Deserialize, Serialize};

use crate::auth::{AccessToken, User};
use crate::core::Role;
use crate::web::{ApiJson, AppState, AuthenticatedPrincipal, Result};

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    pub username: String,
    pub password: String,
    #[serde(default = "default_role")]
    pub role: Role,
}

fn default_role() -> Role {
    Role::from("user")
}

pub async fn healthcheck() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

pub async fn issue_token(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<LoginRequest>,
) -> Result<Json<AccessToken>> {
    let user = state
        .auth
        .authenticate(&request.username, &request.password)
        .await?;
    Ok(Json(state.auth.issue_token(&user).await))
}

/// New users always land in the calling admin's tenant.
pub async fn create_user(
    State(state): State<AppState>,
    caller: AuthenticatedPrincipal,
    ApiJson(request): ApiJson<CreateUserRequest>,
) -> Result<(StatusCode, Json<User>)> {
    let admin = caller.require_admin()?;
    let user = state
        .auth
        .create_user(&request.username, &request.password, admin.tenant_id, request.role)
        .await?;
    Ok((StatusCode::CREATED, Json(user)))
}
