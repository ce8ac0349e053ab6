use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use serde::Deserialize;

use crate::core::Role;
use crate::permission::{EntityPermission, PermissionSet};
use crate::schema::{EntitySchema, EntitySchemaVersion, FieldDefinition};
use crate::web::{ApiJson, AppState, AuthenticatedPrincipal, Result, WebError};

#[derive(Debug, Deserialize)]
pub struct DeclareSchemaRequest {
    pub entity_name: String,
    #[serde(alias = "schema")]
    pub fields: Vec<FieldDefinition>,
}

#[derive(Debug, Deserialize)]
pub struct ReviseSchemaRequest {
    #[serde(alias = "schema")]
    pub fields: Vec<FieldDefinition>,
}

pub async fn declare_schema(
    State(state): State<AppState>,
    caller: AuthenticatedPrincipal,
    ApiJson(request): ApiJson<DeclareSchemaRequest>,
) -> Result<(StatusCode, Json<EntitySchema>)> {
    let admin = caller.require_admin()?;
    let schema = state
        .platform
        .schemas()
        .declare(admin.tenant_id, &request.entity_name, request.fields)
        .await?;
    Ok((StatusCode::CREATED, Json(schema)))
}

pub async fn list_schemas(
    State(state): State<AppState>,
    AuthenticatedPrincipal(caller): AuthenticatedPrincipal,
) -> Json<Vec<EntitySchema>> {
    Json(state.platform.schemas().list(caller.tenant_id).await)
}

pub async fn get_schema(
    State(state): State<AppState>,
    AuthenticatedPrincipal(caller): AuthenticatedPrincipal,
    Path(entity): Path<String>,
) -> Result<Json<EntitySchema>> {
    let schema = state.platform.schemas().get(caller.tenant_id, &entity).await?;
    Ok(Json(schema))
}

pub async fn revise_schema(
    State(state): State<AppState>,
    caller: AuthenticatedPrincipal,
    Path(entity): Path<String>,
    ApiJson(request): ApiJson<ReviseSchemaRequest>,
) -> Result<Json<EntitySchema>> {
    let admin = caller.require_admin()?;
    let schema = state
        .platform
        .schemas()
        .revise(admin.tenant_id, &entity, request.fields)
        .await?;
    Ok(Json(schema))
}

pub async fn list_versions(
    State(state): State<AppState>,
    caller: AuthenticatedPrincipal,
    Path(entity): Path<String>,
) -> Result<Json<Vec<EntitySchemaVersion>>> {
    let admin = caller.require_admin()?;
    let versions = state
        .platform
        .schemas()
        .versions(admin.tenant_id, &entity)
        .await?;
    Ok(Json(versions))
}

pub async fn rollback_schema(
    State(state): State<AppState>,
    caller: AuthenticatedPrincipal,
    Path((entity, version)): Path<(String, String)>,
) -> Result<Json<EntitySchema>> {
    let admin = caller.require_admin()?;
    let version = version
        .parse::<u32>()
        .map_err(|_| WebError::Input("version must be a positive integer".to_string()))?;
    let schema = state
        .platform
        .schemas()
        .rollback(admin.tenant_id, &entity, version)
        .await?;
    Ok(Json(schema))
}

pub async fn list_permissions(
    State(state): State<AppState>,
    caller: AuthenticatedPrincipal,
    Path(entity): Path<String>,
) -> Result<Json<Vec<EntityPermission>>> {
    let admin = caller.require_admin()?;
    let rows = state
        .platform
        .schemas()
        .permissions(admin.tenant_id, &entity)
        .await?;
    Ok(Json(rows))
}

pub async fn set_permissions(
    State(state): State<AppState>,
    caller: AuthenticatedPrincipal,
    Path((entity, role)): Path<(String, String)>,
    ApiJson(permissions): ApiJson<PermissionSet>,
) -> Result<Json<EntityPermission>> {
    let admin = caller.require_admin()?;
    let row = state
        .platform
        .schemas()
        .set_permissions(admin.tenant_id, &entity, Role::from(role), permissions)
        .await?;
    Ok(Json(row))
}
