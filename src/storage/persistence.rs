//! Durable per-tenant snapshots.
//!
//! Layout: `<data_dir>/tenants/<tenant-id>.msgpack`. A snapshot is the whole
//! tenant state encoded with MessagePack and replaced atomically (temp file in
//! the same directory, fsync, rename).

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use tracing::{debug, warn};

use crate::core::{EngineError, Result, TenantId};
use crate::storage::TenantState;

const SNAPSHOT_EXTENSION: &str = "msgpack";

#[derive(Debug, Clone)]
pub struct SnapshotManager {
    dir: PathBuf,
}

impl SnapshotManager {
    pub fn new<P: AsRef<Path>>(data_dir: P) -> Self {
        Self {
            dir: data_dir.as_ref().join("tenants"),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn snapshot_path(&self, tenant: TenantId) -> PathBuf {
        self.dir.join(format!("{}.{}", tenant, SNAPSHOT_EXTENSION))
    }

    pub async fn save(&self, tenant: TenantId, state: &TenantState) -> Result<()> {
        let bytes = rmp_serde::to_vec_named(state)
            .map_err(|e| EngineError::storage(format!("Failed to serialize snapshot: {}", e)))?;
        let dir = self.dir.clone();
        let path = self.snapshot_path(tenant);

        tokio::task::spawn_blocking(move || write_atomic(&dir, &path, &bytes))
            .await
            .map_err(|e| EngineError::storage(format!("Snapshot writer panicked: {}", e)))??;

        debug!(tenant = %tenant, "tenant snapshot written");
        Ok(())
    }

    /// Loads every tenant snapshot in the directory.
    pub async fn load_all(&self) -> Result<Vec<(TenantId, TenantState)>> {
        let dir = self.dir.clone();
        tokio::task::spawn_blocking(move || read_all(&dir))
            .await
            .map_err(|e| EngineError::storage(format!("Snapshot reader panicked: {}", e)))?
    }
}

fn write_atomic(dir: &Path, path: &Path, bytes: &[u8]) -> Result<()> {
    fs::create_dir_all(dir)
        .map_err(|e| EngineError::storage(format!("Failed to create snapshot directory: {}", e)))?;
    let mut temp = NamedTempFile::new_in(dir)
        .map_err(|e| EngineError::storage(format!("Failed to create temp file: {}", e)))?;
    temp.write_all(bytes)
        .map_err(|e| EngineError::storage(format!("Failed to write snapshot: {}", e)))?;
    temp.as_file()
        .sync_all()
        .map_err(|e| EngineError::storage(format!("Failed to sync snapshot: {}", e)))?;
    temp.persist(path)
        .map_err(|e| EngineError::storage(format!("Failed to rename snapshot: {}", e.error)))?;
    Ok(())
}

fn read_all(dir: &Path) -> Result<Vec<(TenantId, TenantState)>> {
    if !dir.exists() {
        return Ok(Vec::new());
    }

    let mut loaded = Vec::new();
    let entries = fs::read_dir(dir)
        .map_err(|e| EngineError::storage(format!("Failed to read snapshot directory: {}", e)))?;

    for entry in entries {
        let path = entry?.path();
        if path.extension().and_then(|ext| ext.to_str()) != Some(SNAPSHOT_EXTENSION) {
            continue;
        }
        let Some(tenant) = path
            .file_stem()
            .and_then(|stem| stem.to_str())
            .and_then(|stem| stem.parse::<TenantId>().ok())
        else {
            warn!(path = %path.display(), "skipping snapshot with unrecognised file name");
            continue;
        };

        let bytes = fs::read(&path)
            .map_err(|e| EngineError::storage(format!("Failed to read snapshot: {}", e)))?;
        let state: TenantState = rmp_serde::from_slice(&bytes).map_err(|e| {
            EngineError::storage(format!(
                "Failed to deserialize snapshot {}: {}",
                path.display(),
                e
            ))
        })?;
        loaded.push((tenant, state));
    }

    Ok(loaded)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Role;
    use crate::permission::{EntityPermission, PermissionSet};
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_snapshot_save_and_load() {
        let temp_dir = TempDir::new().unwrap();
        let manager = SnapshotManager::new(temp_dir.path());
        let tenant = TenantId::new();

        let mut state = TenantState::default();
        state.put_permission(EntityPermission::new(
            tenant,
            "orders",
            Role::from("user"),
            PermissionSet::read_only(),
        ));
        manager.save(tenant, &state).await.unwrap();
        assert!(manager.snapshot_path(tenant).exists());

        let loaded = manager.load_all().await.unwrap();
        assert_eq!(loaded.len(), 1);
        let (loaded_tenant, loaded_state) = &loaded[0];
        assert_eq!(*loaded_tenant, tenant);
        let row = loaded_state.permission("orders", &Role::from("user")).unwrap();
        assert_eq!(row.permissions, PermissionSet::read_only());
    }

    #[tokio::test]
    async fn test_load_missing_dir_is_empty() {
        let temp_dir = TempDir::new().unwrap();
        let manager = SnapshotManager::new(temp_dir.path().join("nothing-here"));
        assert!(manager.load_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_foreign_files_are_ignored() {
        let temp_dir = TempDir::new().unwrap();
        let manager = SnapshotManager::new(temp_dir.path());
        fs::create_dir_all(manager.dir()).unwrap();
        fs::write(manager.dir().join("notes.txt"), b"hello").unwrap();
        fs::write(manager.dir().join("not-a-uuid.msgpack"), b"junk").unwrap();
        assert!(manager.load_all().await.unwrap().is_empty());
    }
}
