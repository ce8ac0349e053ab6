use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::core::{Payload, TenantId, UserId};

/// One instance of an entity's data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub id: Uuid,
    pub tenant_id: TenantId,
    pub entity_name: String,
    pub payload: Payload,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub created_by: UserId,
    pub updated_by: UserId,
}

impl Record {
    pub fn new(tenant_id: TenantId, entity_name: &str, payload: Payload, actor: UserId) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            tenant_id,
            entity_name: entity_name.to_string(),
            payload,
            created_at: now,
            updated_at: now,
            created_by: actor,
            updated_by: actor,
        }
    }
}

/// Audit row written on every record update, never on create or delete.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordLog {
    pub id: Uuid,
    pub record_id: Uuid,
    pub tenant_id: TenantId,
    pub entity_name: String,
    pub before: Payload,
    pub after: Payload,
    pub changed_at: DateTime<Utc>,
    pub changed_by: UserId,
}
