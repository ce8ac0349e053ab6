use uuid::Uuid;

use crate::core::{EngineError, Payload, Result};
use crate::schema::FieldDefinition;
use crate::storage::TenantState;

/// Rejects a payload whose unique-field values already appear on another
/// record of the same tenant and entity.
///
/// Values are compared by their canonical text form, so `1` and `"1"`
/// collide. Nulls never collide. `exclude` skips the record being updated.
pub fn check_unique(
    state: &TenantState,
    entity_name: &str,
    fields: &[FieldDefinition],
    payload: &Payload,
    exclude: Option<Uuid>,
) -> Result<()> {
    for field in fields.iter().filter(|field| field.unique) {
        let Some(candidate) = payload.get(&field.name).and_then(|value| value.canonical_text()) else {
            continue;
        };

        let duplicate = state
            .records(entity_name)
            .filter(|record| Some(record.id) != exclude)
            .filter_map(|record| record.payload.get(&field.name))
            .any(|existing| existing.canonical_text().as_deref() == Some(candidate.as_str()));

        if duplicate {
            return Err(EngineError::uniqueness(format!(
                "{} must be unique. Duplicate value: {}",
                field.name, candidate
            )));
        }
    }

    Ok(())
}
