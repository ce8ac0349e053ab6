use std::path::Path;
use std::sync::Arc;

use crate::config::EngineConfig;
use crate::core::Result;
use crate::permission::PermissionGate;
use crate::record::RecordEngine;
use crate::schema::SchemaStore;
use crate::storage::Storage;
use crate::validation::Validator;

/// Entry point tying the engine components to one shared storage.
///
/// # Examples
///
/// ```
/// use univera::{EngineConfig, Platform, Principal, TenantId, UserId};
/// use univera::schema::FieldDefinition;
/// use univera::core::{Payload, Value};
///
/// # tokio_test::block_on(async {
/// let platform = Platform::in_memory(EngineConfig::default());
/// let tenant = TenantId::new();
/// platform
///     .schemas()
///     .declare(tenant, "books", vec![FieldDefinition::string("title").required()])
///     .await
///     .unwrap();
///
/// let admin = Principal::new(tenant, UserId::new(), "admin");
/// let mut payload = Payload::new();
/// payload.insert("title".into(), Value::from("Dune"));
/// let record = platform.records().create(&admin, "books", payload).await.unwrap();
/// assert_eq!(record.entity_name, "books");
/// # });
/// ```
#[derive(Clone)]
pub struct Platform {
    storage: Arc<Storage>,
    schemas: SchemaStore,
    records: RecordEngine,
    gate: PermissionGate,
    validator: Arc<Validator>,
}

impl Platform {
    pub fn in_memory(config: EngineConfig) -> Self {
        Self::assemble(Arc::new(Storage::in_memory()), config)
    }

    /// Opens a durable platform backed by snapshots under `data_dir`.
    pub async fn open<P: AsRef<Path>>(data_dir: P, config: EngineConfig) -> Result<Self> {
        let storage = Storage::open(data_dir).await?;
        Ok(Self::assemble(Arc::new(storage), config))
    }

    fn assemble(storage: Arc<Storage>, config: EngineConfig) -> Self {
        let validator = Arc::new(Validator::new(config.pattern_cache_size));
        Self {
            schemas: SchemaStore::new(Arc::clone(&storage), config.standard_roles),
            records: RecordEngine::new(Arc::clone(&storage), Arc::clone(&validator)),
            gate: PermissionGate::new(Arc::clone(&storage)),
            validator,
            storage,
        }
    }

    pub fn schemas(&self) -> &SchemaStore {
        &self.schemas
    }

    pub fn records(&self) -> &RecordEngine {
        &self.records
    }

    pub fn gate(&self) -> &PermissionGate {
        &self.gate
    }

    pub fn validator(&self) -> &Validator {
        &self.validator
    }

    pub fn storage(&self) -> &Arc<Storage> {
        &self.storage
    }
}
