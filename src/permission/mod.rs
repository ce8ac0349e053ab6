//! Permission Gate
//!
//! A fixed four-action CRUD matrix per tenant, entity and role. Rows are
//! seeded allow-all for the standard roles when a schema is declared; a role
//! without a row is denied every action.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tracing::debug;

use crate::core::{EngineError, Result, Role, TenantId};
use crate::storage::{Storage, TenantState};

/// Record operation being authorized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    Create,
    Read,
    Update,
    Delete,
}

impl Action {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Read => "read",
            Self::Update => "update",
            Self::Delete => "delete",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn allowed() -> bool {
    true
}

/// The four allow/deny flags for one role. Omitted flags default to allowed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionSet {
    #[serde(default = "allowed")]
    pub can_read: bool,
    #[serde(default = "allowed")]
    pub can_create: bool,
    #[serde(default = "allowed")]
    pub can_update: bool,
    #[serde(default = "allowed")]
    pub can_delete: bool,
}

impl PermissionSet {
    pub fn allow_all() -> Self {
        Self {
            can_read: true,
            can_create: true,
            can_update: true,
            can_delete: true,
        }
    }

    pub fn deny_all() -> Self {
        Self {
            can_read: false,
            can_create: false,
            can_update: false,
            can_delete: false,
        }
    }

    pub fn read_only() -> Self {
        Self {
            can_read: true,
            ..Self::deny_all()
        }
    }

    pub fn allows(&self, action: Action) -> bool {
        match action {
            Action::Create => self.can_create,
            Action::Read => self.can_read,
            Action::Update => self.can_update,
            Action::Delete => self.can_delete,
        }
    }
}

impl Default for PermissionSet {
    fn default() -> Self {
        Self::allow_all()
    }
}

/// Permission row for `(tenant, entity, role)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityPermission {
    pub tenant_id: TenantId,
    pub entity_name: String,
    pub role: Role,
    #[serde(flatten)]
    pub permissions: PermissionSet,
}

impl EntityPermission {
    pub fn new(tenant_id: TenantId, entity_name: &str, role: Role, permissions: PermissionSet) -> Self {
        Self {
            tenant_id,
            entity_name: entity_name.to_string(),
            role,
            permissions,
        }
    }
}

#[derive(Clone)]
pub struct PermissionGate {
    storage: Arc<Storage>,
}

impl PermissionGate {
    pub fn new(storage: Arc<Storage>) -> Self {
        Self { storage }
    }

    pub async fn authorize(
        &self,
        tenant: TenantId,
        role: &Role,
        entity_name: &str,
        action: Action,
    ) -> Result<()> {
        self.storage
            .read(tenant, |state| Self::check(state, role, entity_name, action))
            .await
    }

    /// Decides against an already-locked tenant state, so callers can
    /// authorize inside the transaction that performs the write.
    pub fn check(state: &TenantState, role: &Role, entity_name: &str, action: Action) -> Result<()> {
        let allowed = state
            .permission(entity_name, role)
            .is_some_and(|row| row.permissions.allows(action));

        if !allowed {
            debug!(entity = entity_name, role = %role, action = %action, "permission denied");
            return Err(EngineError::forbidden(format!(
                "Role '{}' may not {} '{}' records",
                role, action, entity_name
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state_with(role: &str, permissions: PermissionSet) -> TenantState {
        let mut state = TenantState::default();
        state.put_permission(EntityPermission::new(
            TenantId::new(),
            "orders",
            Role::from(role),
            permissions,
        ));
        state
    }

    #[test]
    fn test_missing_row_denies() {
        let state = TenantState::default();
        let err = PermissionGate::check(&state, &Role::from("viewer"), "orders", Action::Read).unwrap_err();
        assert!(matches!(err, EngineError::Forbidden(_)));
    }

    #[test]
    fn test_row_flags_are_respected() {
        let state = state_with("viewer", PermissionSet::read_only());
        let viewer = Role::from("viewer");
        assert!(PermissionGate::check(&state, &viewer, "orders", Action::Read).is_ok());
        assert!(PermissionGate::check(&state, &viewer, "orders", Action::Create).is_err());
        assert!(PermissionGate::check(&state, &viewer, "orders", Action::Update).is_err());
        assert!(PermissionGate::check(&state, &viewer, "orders", Action::Delete).is_err());
    }

    #[test]
    fn test_rows_are_per_entity() {
        let state = state_with("user", PermissionSet::allow_all());
        assert!(PermissionGate::check(&state, &Role::from("user"), "invoices", Action::Read).is_err());
    }

    #[test]
    fn test_omitted_flags_default_to_allowed() {
        let set: PermissionSet = serde_json::from_str(r#"{"can_delete": false}"#).unwrap();
        assert!(set.can_read && set.can_create && set.can_update);
        assert!(!set.can_delete);
    }

    #[tokio::test]
    async fn test_authorize_reads_tenant_state() {
        let storage = Arc::new(Storage::in_memory());
        let tenant = TenantId::new();
        storage
            .transaction(tenant, |state| {
                state.put_permission(EntityPermission::new(
                    tenant,
                    "orders",
                    Role::from("clerk"),
                    PermissionSet::read_only(),
                ));
                Ok(())
            })
            .await
            .unwrap();

        let gate = PermissionGate::new(storage);
        let clerk = Role::from("clerk");
        assert!(gate.authorize(tenant, &clerk, "orders", Action::Read).await.is_ok());
        assert!(gate.authorize(tenant, &clerk, "orders", Action::Delete).await.is_err());
        assert!(gate.authorize(TenantId::new(), &clerk, "orders", Action::Read).await.is_err());
    }
}
