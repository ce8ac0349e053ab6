use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info};
use uuid::Uuid;

use crate::core::{EngineError, Payload, Principal, Result};
use crate::permission::{Action, PermissionGate};
use crate::record::{Record, RecordLog};
use crate::schema::current_schema;
use crate::storage::{Storage, TenantState};
use crate::validation::{check_unique, Validator};

/// CRUD over dynamic records.
///
/// Every operation resolves the entity's current schema first, so an entity
/// the tenant never declared is NotFound before any permission is consulted.
/// The gate, validation, uniqueness scan and write share one transaction.
#[derive(Clone)]
pub struct RecordEngine {
    storage: Arc<Storage>,
    validator: Arc<Validator>,
}

impl RecordEngine {
    pub fn new(storage: Arc<Storage>, validator: Arc<Validator>) -> Self {
        Self { storage, validator }
    }

    pub async fn create(&self, actor: &Principal, entity_name: &str, payload: Payload) -> Result<Record> {
        let validator = Arc::clone(&self.validator);

        let record = self
            .storage
            .transaction(actor.tenant_id, |state| {
                let schema = current_schema(state, entity_name)?;
                PermissionGate::check(state, &actor.role, entity_name, Action::Create)?;
                validator.validate(&schema.fields, &payload)?;
                let payload = validator.normalize(&schema.fields, payload);
                check_unique(state, entity_name, &schema.fields, &payload, None)?;

                let record = Record::new(actor.tenant_id, entity_name, payload, actor.user_id);
                state.put_record(record.clone());
                Ok(record)
            })
            .await?;

        info!(
            tenant = %actor.tenant_id,
            entity = entity_name,
            record = %record.id,
            actor = %actor.user_id,
            "record created"
        );
        Ok(record)
    }

    /// All records of the entity, oldest first.
    pub async fn list(&self, actor: &Principal, entity_name: &str) -> Result<Vec<Record>> {
        self.storage
            .read(actor.tenant_id, |state| {
                authorize_read(state, actor, entity_name)?;
                let mut records: Vec<Record> = state.records(entity_name).cloned().collect();
                records.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
                Ok(records)
            })
            .await
    }

    pub async fn get(&self, actor: &Principal, entity_name: &str, id: Uuid) -> Result<Record> {
        self.storage
            .read(actor.tenant_id, |state| {
                authorize_read(state, actor, entity_name)?;
                locate(state, entity_name, id).cloned()
            })
            .await
    }

    /// Replaces the payload wholesale and appends one audit row.
    pub async fn update(
        &self,
        actor: &Principal,
        entity_name: &str,
        id: Uuid,
        payload: Payload,
    ) -> Result<Record> {
        let validator = Arc::clone(&self.validator);

        let record = self
            .storage
            .transaction(actor.tenant_id, |state| {
                let schema = current_schema(state, entity_name)?;
                PermissionGate::check(state, &actor.role, entity_name, Action::Update)?;
                let existing = locate(state, entity_name, id)?.clone();
                validator.validate(&schema.fields, &payload)?;
                let after = validator.normalize(&schema.fields, payload);
                check_unique(state, entity_name, &schema.fields, &after, Some(id))?;

                let now = Utc::now();
                let log = RecordLog {
                    id: Uuid::new_v4(),
                    record_id: id,
                    tenant_id: actor.tenant_id,
                    entity_name: entity_name.to_string(),
                    before: existing.payload.clone(),
                    after: after.clone(),
                    changed_at: now,
                    changed_by: actor.user_id,
                };
                let record = Record {
                    payload: after,
                    updated_at: now,
                    updated_by: actor.user_id,
                    ..existing
                };

                state.put_record(record.clone());
                state.push_log(log);
                Ok(record)
            })
            .await?;

        info!(
            tenant = %actor.tenant_id,
            entity = entity_name,
            record = %id,
            actor = %actor.user_id,
            "record updated"
        );
        Ok(record)
    }

    /// Removes the record. No audit row is written.
    pub async fn delete(&self, actor: &Principal, entity_name: &str, id: Uuid) -> Result<()> {
        self.storage
            .transaction(actor.tenant_id, |state| {
                current_schema(state, entity_name)?;
                PermissionGate::check(state, &actor.role, entity_name, Action::Delete)?;
                locate(state, entity_name, id)?;
                state.remove_record(entity_name, id);
                Ok(())
            })
            .await?;

        info!(
            tenant = %actor.tenant_id,
            entity = entity_name,
            record = %id,
            actor = %actor.user_id,
            "record deleted"
        );
        Ok(())
    }

    /// Audit rows of one record in the order they were written.
    pub async fn history(&self, actor: &Principal, entity_name: &str, id: Uuid) -> Result<Vec<RecordLog>> {
        let logs: Vec<RecordLog> = self
            .storage
            .read(actor.tenant_id, |state| {
                authorize_read(state, actor, entity_name)?;
                locate(state, entity_name, id)?;
                Ok::<_, EngineError>(state.logs_for(entity_name, id).cloned().collect())
            })
            .await?;

        debug!(entity = entity_name, record = %id, entries = logs.len(), "record history read");
        Ok(logs)
    }
}

fn authorize_read(state: &TenantState, actor: &Principal, entity_name: &str) -> Result<()> {
    current_schema(state, entity_name)?;
    PermissionGate::check(state, &actor.role, entity_name, Action::Read)
}

fn locate<'a>(state: &'a TenantState, entity_name: &str, id: Uuid) -> Result<&'a Record> {
    state
        .record(entity_name, id)
        .ok_or_else(|| EngineError::not_found(format!("Record {} not found", id)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Role, TenantId, UserId, Value};
    use crate::permission::PermissionSet;
    use crate::schema::{FieldDefinition, SchemaStore};

    struct Fixture {
        schemas: SchemaStore,
        records: RecordEngine,
        tenant: TenantId,
    }

    impl Fixture {
        async fn new() -> Self {
            let storage = Arc::new(Storage::in_memory());
            let schemas = SchemaStore::new(Arc::clone(&storage), vec![Role::admin(), Role::from("user")]);
            let records = RecordEngine::new(storage, Arc::new(Validator::default()));
            let tenant = TenantId::new();
            schemas
                .declare(
                    tenant,
                    "counters",
                    vec![
                        FieldDefinition::integer("x").required(),
                        FieldDefinition::string("label").unique(),
                    ],
                )
                .await
                .unwrap();
            Self { schemas, records, tenant }
        }

        fn user(&self, role: &str) -> Principal {
            Principal::new(self.tenant, UserId::new(), role)
        }
    }

    fn payload(x: i64, label: &str) -> Payload {
        let mut payload = Payload::new();
        payload.insert("x".into(), Value::Integer(x));
        payload.insert("label".into(), Value::from(label));
        payload
    }

    #[tokio::test]
    async fn test_create_sets_audit_columns() {
        let fx = Fixture::new().await;
        let actor = fx.user("user");
        let record = fx.records.create(&actor, "counters", payload(1, "a")).await.unwrap();
        assert_eq!(record.created_by, actor.user_id);
        assert_eq!(record.updated_by, actor.user_id);
        assert_eq!(record.tenant_id, fx.tenant);

        let fetched = fx.records.get(&actor, "counters", record.id).await.unwrap();
        assert_eq!(fetched, record);
    }

    #[tokio::test]
    async fn test_unknown_entity_is_not_found_before_permission() {
        let fx = Fixture::new().await;
        let err = fx
            .records
            .create(&fx.user("nobody"), "ghosts", Payload::new())
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_update_writes_one_log_and_delete_none() {
        let fx = Fixture::new().await;
        let actor = fx.user("user");
        let record = fx.records.create(&actor, "counters", payload(1, "a")).await.unwrap();
        let updated = fx
            .records
            .update(&actor, "counters", record.id, payload(2, "a"))
            .await
            .unwrap();
        assert_eq!(updated.created_at, record.created_at);
        assert_eq!(updated.payload.get("x"), Some(&Value::Integer(2)));

        let history = fx.records.history(&actor, "counters", record.id).await.unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].before, payload(1, "a"));
        assert_eq!(history[0].after, payload(2, "a"));

        fx.records.delete(&actor, "counters", record.id).await.unwrap();
        let err = fx.records.get(&actor, "counters", record.id).await.unwrap_err();
        assert!(matches!(err, EngineError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_failed_update_leaves_no_log() {
        let fx = Fixture::new().await;
        let actor = fx.user("user");
        let first = fx.records.create(&actor, "counters", payload(1, "a")).await.unwrap();
        fx.records.create(&actor, "counters", payload(1, "b")).await.unwrap();

        let err = fx
            .records
            .update(&actor, "counters", first.id, payload(5, "b"))
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::Uniqueness(_)));
        assert!(fx.records.history(&actor, "counters", first.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_role_without_row_is_forbidden_until_granted() {
        let fx = Fixture::new().await;
        let viewer = fx.user("viewer");
        let err = fx.records.create(&viewer, "counters", payload(1, "a")).await.unwrap_err();
        assert!(matches!(err, EngineError::Forbidden(_)));

        let permissions = PermissionSet {
            can_create: true,
            ..PermissionSet::deny_all()
        };
        fx.schemas
            .set_permissions(fx.tenant, "counters", Role::from("viewer"), permissions)
            .await
            .unwrap();
        assert!(fx.records.create(&viewer, "counters", payload(1, "a")).await.is_ok());

        let err = fx.records.list(&viewer, "counters").await.unwrap_err();
        assert!(matches!(err, EngineError::Forbidden(_)));
    }

    #[tokio::test]
    async fn test_list_returns_every_record() {
        let fx = Fixture::new().await;
        let actor = fx.user("user");
        let mut ids = Vec::new();
        for (x, label) in [(1, "a"), (2, "b"), (3, "c")] {
            ids.push(fx.records.create(&actor, "counters", payload(x, label)).await.unwrap().id);
        }
        let listed: Vec<Uuid> = fx
            .records
            .list(&actor, "counters")
            .await
            .unwrap()
            .into_iter()
            .map(|record| record.id)
            .collect();
        assert_eq!(listed.len(), 3);
        assert!(ids.iter().all(|id| listed.contains(id)));
    }
}
