use std::sync::Arc;

use chrono::Utc;
use tracing::info;

use crate::core::{EngineError, Result, Role, TenantId};
use crate::permission::{EntityPermission, PermissionSet};
use crate::schema::definition::{check_entity_name, check_fields};
use crate::schema::{EntitySchema, EntitySchemaVersion, FieldDefinition};
use crate::storage::{Storage, TenantState};

/// Versioned entity schemas per tenant.
///
/// Every declare, revise and rollback commits the schema change together with
/// its history snapshot; version numbers only ever grow.
#[derive(Clone)]
pub struct SchemaStore {
    storage: Arc<Storage>,
    standard_roles: Arc<Vec<Role>>,
}

impl SchemaStore {
    pub fn new(storage: Arc<Storage>, standard_roles: Vec<Role>) -> Self {
        Self {
            storage,
            standard_roles: Arc::new(standard_roles),
        }
    }

    pub async fn declare(
        &self,
        tenant: TenantId,
        entity_name: &str,
        fields: Vec<FieldDefinition>,
    ) -> Result<EntitySchema> {
        check_entity_name(entity_name)?;
        check_fields(&fields)?;
        let roles = Arc::clone(&self.standard_roles);

        let schema = self
            .storage
            .transaction(tenant, move |state| {
                if state.schema(entity_name).is_some() {
                    return Err(EngineError::conflict(format!(
                        "Entity '{}' already exists.",
                        entity_name
                    )));
                }

                let now = Utc::now();
                let schema = EntitySchema {
                    tenant_id: tenant,
                    entity_name: entity_name.to_string(),
                    fields,
                    version: 1,
                    created_at: now,
                    updated_at: now,
                };

                state.push_version(schema.snapshot());
                state.put_schema(schema.clone());
                for role in roles.iter() {
                    state.put_permission(EntityPermission::new(
                        tenant,
                        entity_name,
                        role.clone(),
                        PermissionSet::allow_all(),
                    ));
                }

                Ok(schema)
            })
            .await?;

        info!(
            tenant = %tenant,
            entity = entity_name,
            fields = schema.fields.len(),
            "entity schema declared"
        );
        Ok(schema)
    }

    /// Replaces the field list. Existing records are left as they are.
    pub async fn revise(
        &self,
        tenant: TenantId,
        entity_name: &str,
        fields: Vec<FieldDefinition>,
    ) -> Result<EntitySchema> {
        check_fields(&fields)?;

        let schema = self
            .storage
            .transaction(tenant, move |state| {
                let current = current_schema(state, entity_name)?;
                Ok(advance(state, current, fields))
            })
            .await?;

        info!(
            tenant = %tenant,
            entity = entity_name,
            version = schema.version,
            "entity schema revised"
        );
        Ok(schema)
    }

    /// Restores the field list of `target_version` as a new version.
    pub async fn rollback(
        &self,
        tenant: TenantId,
        entity_name: &str,
        target_version: u32,
    ) -> Result<EntitySchema> {
        let schema = self
            .storage
            .transaction(tenant, move |state| {
                let current = current_schema(state, entity_name)?;
                let fields = state
                    .version(entity_name, target_version)
                    .map(|snapshot| snapshot.fields.clone())
                    .ok_or_else(|| {
                        EngineError::not_found(format!(
                            "Version {} of entity '{}' not found",
                            target_version, entity_name
                        ))
                    })?;
                Ok(advance(state, current, fields))
            })
            .await?;

        info!(
            tenant = %tenant,
            entity = entity_name,
            restored = target_version,
            version = schema.version,
            "entity schema rolled back"
        );
        Ok(schema)
    }

    /// All current schemas of the tenant, ordered by entity name.
    pub async fn list(&self, tenant: TenantId) -> Vec<EntitySchema> {
        self.storage
            .read(tenant, |state| state.schemas().cloned().collect())
            .await
    }

    pub async fn get(&self, tenant: TenantId, entity_name: &str) -> Result<EntitySchema> {
        self.storage
            .read(tenant, |state| current_schema(state, entity_name))
            .await
    }

    /// Version history in ascending version order.
    pub async fn versions(&self, tenant: TenantId, entity_name: &str) -> Result<Vec<EntitySchemaVersion>> {
        self.storage
            .read(tenant, |state| {
                current_schema(state, entity_name)?;
                Ok(state.versions(entity_name).cloned().collect())
            })
            .await
    }

    /// Creates or replaces the permission row of `role` for an entity.
    pub async fn set_permissions(
        &self,
        tenant: TenantId,
        entity_name: &str,
        role: Role,
        permissions: PermissionSet,
    ) -> Result<EntityPermission> {
        let row = self
            .storage
            .transaction(tenant, move |state| {
                current_schema(state, entity_name)?;
                let row = EntityPermission::new(tenant, entity_name, role, permissions);
                state.put_permission(row.clone());
                Ok(row)
            })
            .await?;

        info!(
            tenant = %tenant,
            entity = entity_name,
            role = %row.role,
            can_read = row.permissions.can_read,
            can_create = row.permissions.can_create,
            can_update = row.permissions.can_update,
            can_delete = row.permissions.can_delete,
            "entity permissions set"
        );
        Ok(row)
    }

    pub async fn permissions(&self, tenant: TenantId, entity_name: &str) -> Result<Vec<EntityPermission>> {
        self.storage
            .read(tenant, |state| {
                current_schema(state, entity_name)?;
                Ok(state.permissions(entity_name).cloned().collect())
            })
            .await
    }
}

/// Current schema of an entity, or NotFound.
pub(crate) fn current_schema(state: &TenantState, entity_name: &str) -> Result<EntitySchema> {
    state
        .schema(entity_name)
        .cloned()
        .ok_or_else(|| EngineError::not_found(format!("Entity '{}' not found", entity_name)))
}

fn advance(state: &mut TenantState, current: EntitySchema, fields: Vec<FieldDefinition>) -> EntitySchema {
    let schema = EntitySchema {
        fields,
        version: current.version + 1,
        updated_at: Utc::now(),
        ..current
    };
    state.push_version(schema.snapshot());
    state.put_schema(schema.clone());
    schema
}
