use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::core::{payload_from_json, Payload, UserId};
use crate::record::{Record, RecordLog};
use crate::web::{ApiJson, AppState, AuthenticatedPrincipal, Result, WebError};

#[derive(Debug, Serialize)]
pub struct RecordView {
    pub id: Uuid,
    pub entity_name: String,
    pub data: Payload,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub created_by: UserId,
    pub updated_by: UserId,
}

impl From<Record> for RecordView {
    fn from(record: Record) -> Self {
        Self {
            id: record.id,
            entity_name: record.entity_name,
            data: record.payload,
            created_at: record.created_at,
            updated_at: record.updated_at,
            created_by: record.created_by,
            updated_by: record.updated_by,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct DeletedResponse {
    pub status: &'static str,
}

pub async fn create_record(
    State(state): State<AppState>,
    AuthenticatedPrincipal(caller): AuthenticatedPrincipal,
    Path(entity): Path<String>,
    ApiJson(body): ApiJson<serde_json::Value>,
) -> Result<(StatusCode, Json<RecordView>)> {
    let payload = payload_from_json(body)?;
    let record = state.platform.records().create(&caller, &entity, payload).await?;
    Ok((StatusCode::CREATED, Json(record.into())))
}

pub async fn list_records(
    State(state): State<AppState>,
    AuthenticatedPrincipal(caller): AuthenticatedPrincipal,
    Path(entity): Path<String>,
) -> Result<Json<Vec<RecordView>>> {
    let records = state.platform.records().list(&caller, &entity).await?;
    Ok(Json(records.into_iter().map(RecordView::from).collect()))
}

pub async fn get_record(
    State(state): State<AppState>,
    AuthenticatedPrincipal(caller): AuthenticatedPrincipal,
    Path((entity, id)): Path<(String, String)>,
) -> Result<Json<RecordView>> {
    let id = parse_uuid(&id)?;
    let record = state.platform.records().get(&caller, &entity, id).await?;
    Ok(Json(record.into()))
}

pub async fn update_record(
    State(state): State<AppState>,
    AuthenticatedPrincipal(caller): AuthenticatedPrincipal,
    Path((entity, id)): Path<(String, String)>,
    ApiJson(body): ApiJson<serde_json::Value>,
) -> Result<Json<RecordView>> {
    let id = parse_uuid(&id)?;
    let payload = payload_from_json(body)?;
    let record = state
        .platform
        .records()
        .update(&caller, &entity, id, payload)
        .await?;
    Ok(Json(record.into()))
}

pub async fn delete_record(
    State(state): State<AppState>,
    AuthenticatedPrincipal(caller): AuthenticatedPrincipal,
    Path((entity, id)): Path<(String, String)>,
) -> Result<Json<DeletedResponse>> {
    let id = parse_uuid(&id)?;
    state.platform.records().delete(&caller, &entity, id).await?;
    Ok(Json(DeletedResponse { status: "deleted" }))
}

pub async fn record_history(
    State(state): State<AppState>,
    AuthenticatedPrincipal(caller): AuthenticatedPrincipal,
    Path((entity, id)): Path<(String, String)>,
) -> Result<Json<Vec<RecordLog>>> {
    let id = parse_uuid(&id)?;
    let logs = state.platform.records().history(&caller, &entity, id).await?;
    Ok(Json(logs))
}

fn parse_uuid(raw: &str) -> Result<Uuid> {
    Uuid::parse_str(raw).map_err(|_| WebError::Input("id must be a valid UUID string".to_string()))
}
