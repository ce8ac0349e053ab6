use im::{OrdMap, Vector};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::core::Role;
use crate::permission::EntityPermission;
use crate::record::{Record, RecordLog};
use crate::schema::{EntitySchema, EntitySchemaVersion};

/// Everything one tenant owns.
///
/// Built on persistent collections so a transaction can work against a
/// clone and either publish it or drop it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TenantState {
    schemas: OrdMap<String, EntitySchema>,
    versions: OrdMap<String, Vector<EntitySchemaVersion>>,
    permissions: OrdMap<String, OrdMap<Role, EntityPermission>>,
    records: OrdMap<String, OrdMap<Uuid, Record>>,
    logs: Vector<RecordLog>,
}

impl TenantState {
    // ------------------------------------------------------------------
    // Schemas
    // ------------------------------------------------------------------

    pub fn schema(&self, entity_name: &str) -> Option<&EntitySchema> {
        self.schemas.get(entity_name)
    }

    pub fn schemas(&self) -> impl Iterator<Item = &EntitySchema> {
        self.schemas.values()
    }

    pub fn put_schema(&mut self, schema: EntitySchema) {
        self.schemas.insert(schema.entity_name.clone(), schema);
    }

    pub fn push_version(&mut self, version: EntitySchemaVersion) {
        match self.versions.get_mut(&version.entity_name) {
            Some(history) => history.push_back(version),
            None => {
                self.versions
                    .insert(version.entity_name.clone(), Vector::unit(version));
            }
        }
    }

    pub fn versions(&self, entity_name: &str) -> impl Iterator<Item = &EntitySchemaVersion> {
        self.versions.get(entity_name).into_iter().flat_map(|history| history.iter())
    }

    pub fn version(&self, entity_name: &str, version: u32) -> Option<&EntitySchemaVersion> {
        self.versions(entity_name).find(|snapshot| snapshot.version == version)
    }

    // ------------------------------------------------------------------
    // Permissions
    // ------------------------------------------------------------------

    pub fn permission(&self, entity_name: &str, role: &Role) -> Option<&EntityPermission> {
        self.permissions.get(entity_name).and_then(|rows| rows.get(role))
    }

    pub fn permissions(&self, entity_name: &str) -> impl Iterator<Item = &EntityPermission> {
        self.permissions.get(entity_name).into_iter().flat_map(|rows| rows.values())
    }

    pub fn put_permission(&mut self, permission: EntityPermission) {
        match self.permissions.get_mut(&permission.entity_name) {
            Some(rows) => {
                rows.insert(permission.role.clone(), permission);
            }
            None => {
                let entity_name = permission.entity_name.clone();
                let rows = OrdMap::unit(permission.role.clone(), permission);
                self.permissions.insert(entity_name, rows);
            }
        }
    }

    // ------------------------------------------------------------------
    // Records
    // ------------------------------------------------------------------

    pub fn records(&self, entity_name: &str) -> impl Iterator<Item = &Record> {
        self.records.get(entity_name).into_iter().flat_map(|rows| rows.values())
    }

    pub fn record(&self, entity_name: &str, id: Uuid) -> Option<&Record> {
        self.records.get(entity_name).and_then(|rows| rows.get(&id))
    }

    pub fn record_count(&self, entity_name: &str) -> usize {
        self.records.get(entity_name).map_or(0, |rows| rows.len())
    }

    pub fn put_record(&mut self, record: Record) {
        match self.records.get_mut(&record.entity_name) {
            Some(rows) => {
                rows.insert(record.id, record);
            }
            None => {
                let entity_name = record.entity_name.clone();
                self.records.insert(entity_name, OrdMap::unit(record.id, record));
            }
        }
    }

    pub fn remove_record(&mut self, entity_name: &str, id: Uuid) -> Option<Record> {
        self.records.get_mut(entity_name).and_then(|rows| rows.remove(&id))
    }

    // ------------------------------------------------------------------
    // Audit log
    // ------------------------------------------------------------------

    pub fn push_log(&mut self, log: RecordLog) {
        self.logs.push_back(log);
    }

    pub fn logs(&self) -> impl Iterator<Item = &RecordLog> {
        self.logs.iter()
    }

    pub fn logs_for(&self, entity_name: &str, record_id: Uuid) -> impl Iterator<Item = &RecordLog> {
        let entity_name = entity_name.to_string();
        self.logs
            .iter()
            .filter(move |log| log.record_id == record_id && log.entity_name == entity_name)
    }
}
