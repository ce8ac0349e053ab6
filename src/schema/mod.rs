//! Schema Store
//!
//! - `field.rs` - field definitions and field types
//! - `model.rs` - current schema and immutable version snapshots
//! - `definition.rs` - structural checks on entity names and field lists
//! - `store.rs` - versioned storage, rollback and permission seeding

pub mod definition;
mod field;
mod model;
mod store;

pub use field::{FieldDefinition, FieldType};
pub use model::{EntitySchema, EntitySchemaVersion};
pub use store::SchemaStore;
pub(crate) use store::current_schema;
