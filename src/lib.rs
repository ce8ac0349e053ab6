// ============================================================================
// Univera Library
// ============================================================================

pub mod auth;
pub mod config;
pub mod core;
pub mod facade;
pub mod permission;
pub mod record;
pub mod schema;
pub mod storage;
pub mod validation;
pub mod web;

// Re-export main types for convenience
pub use auth::{AccessToken, AuthError, AuthManager, User};
pub use config::{AppConfig, EngineConfig};
pub use crate::core::{EngineError, ErrorKind, Principal, Result, Role, TenantId, UserId, Value};
pub use facade::Platform;
pub use permission::{Action, EntityPermission, PermissionGate, PermissionSet};
pub use record::{Record, RecordEngine, RecordLog};
pub use schema::{EntitySchema, EntitySchemaVersion, FieldDefinition, FieldType, SchemaStore};
pub use web::{build_router, AppState};
