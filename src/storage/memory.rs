use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::info;

use crate::core::{Result, TenantId};
use crate::storage::{SnapshotManager, TenantState};

/// Tenant-partitioned state store.
///
/// Every tenant has its own lock, so work in one tenant never waits on
/// another. The partition directory lock is held only long enough to look a
/// partition handle up or create it.
pub struct Storage {
    partitions: RwLock<HashMap<TenantId, Arc<RwLock<TenantState>>>>,
    snapshots: Option<SnapshotManager>,
}

impl Storage {
    pub fn in_memory() -> Self {
        Self {
            partitions: RwLock::new(HashMap::new()),
            snapshots: None,
        }
    }

    /// Opens a durable store, loading every tenant snapshot under `data_dir`.
    pub async fn open<P: AsRef<Path>>(data_dir: P) -> Result<Self> {
        let snapshots = SnapshotManager::new(data_dir);
        let loaded = snapshots.load_all().await?;
        info!(
            dir = %snapshots.dir().display(),
            tenants = loaded.len(),
            "storage opened"
        );

        let partitions = loaded
            .into_iter()
            .map(|(tenant, state)| (tenant, Arc::new(RwLock::new(state))))
            .collect();

        Ok(Self {
            partitions: RwLock::new(partitions),
            snapshots: Some(snapshots),
        })
    }

    pub fn is_durable(&self) -> bool {
        self.snapshots.is_some()
    }

    pub async fn tenants(&self) -> Vec<TenantId> {
        let mut tenants: Vec<TenantId> = self.partitions.read().await.keys().copied().collect();
        tenants.sort();
        tenants
    }

    async fn existing_partition(&self, tenant: TenantId) -> Option<Arc<RwLock<TenantState>>> {
        self.partitions.read().await.get(&tenant).cloned()
    }

    async fn partition(&self, tenant: TenantId) -> Arc<RwLock<TenantState>> {
        if let Some(partition) = self.existing_partition(tenant).await {
            return partition;
        }
        self.partitions
            .write()
            .await
            .entry(tenant)
            .or_default()
            .clone()
    }

    /// Runs `f` against a consistent view of the tenant's state.
    pub async fn read<T, F>(&self, tenant: TenantId, f: F) -> T
    where
        F: FnOnce(&TenantState) -> T,
    {
        match self.existing_partition(tenant).await {
            Some(partition) => {
                let state = partition.read().await;
                f(&state)
            }
            None => f(&TenantState::default()),
        }
    }

    /// Runs `f` as one all-or-nothing transaction on the tenant's state.
    ///
    /// `f` works on a draft while the partition write lock is held. The draft
    /// replaces the live state only if `f` succeeds and, for durable stores,
    /// the snapshot is written; otherwise it is dropped.
    pub async fn transaction<T, F>(&self, tenant: TenantId, f: F) -> Result<T>
    where
        F: FnOnce(&mut TenantState) -> Result<T>,
    {
        let partition = self.partition(tenant).await;
        let mut live = partition.write().await;

        let mut draft = live.clone();
        let output = f(&mut draft)?;

        if let Some(snapshots) = &self.snapshots {
            snapshots.save(tenant, &draft).await?;
        }

        *live = draft;
        Ok(output)
    }
}

impl Default for Storage {
    fn default() -> Self {
        Self::in_memory()
    }
}
