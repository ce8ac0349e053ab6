pub mod memory;
pub mod persistence;
pub mod tenant;

pub use memory::Storage;
pub use persistence::SnapshotManager;
pub use tenant::TenantState;
