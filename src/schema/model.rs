use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::core::TenantId;
use crate::schema::FieldDefinition;

/// Current schema of one entity within a tenant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntitySchema {
    pub tenant_id: TenantId,
    pub entity_name: String,
    pub fields: Vec<FieldDefinition>,
    pub version: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl EntitySchema {
    /// History row capturing the current field list.
    pub fn snapshot(&self) -> EntitySchemaVersion {
        EntitySchemaVersion {
            tenant_id: self.tenant_id,
            entity_name: self.entity_name.clone(),
            version: self.version,
            fields: self.fields.clone(),
            created_at: self.updated_at,
        }
    }
}

/// Immutable, numbered snapshot of an entity's field list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntitySchemaVersion {
    pub tenant_id: TenantId,
    pub entity_name: String,
    pub version: u32,
    pub fields: Vec<FieldDefinition>,
    pub created_at: DateTime<Utc>,
}
