//! Structural checks applied to entity names and field lists before a schema
//! is declared or revised.

use lazy_static::lazy_static;
use regex::Regex;
use std::collections::HashSet;

use crate::core::{EngineError, Result};
use crate::schema::{FieldDefinition, FieldType};

/// Path segments owned by fixed routes; an entity may not shadow them.
pub const RESERVED_ENTITY_NAMES: &[&str] = &["schemas", "auth", "health"];

const MAX_ENTITY_NAME_LEN: usize = 64;

lazy_static! {
    static ref ENTITY_NAME: Regex = Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("entity name regex");
}

/// Validates entity names so they are safe as a single path segment.
pub fn check_entity_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(EngineError::validation("Entity name cannot be empty"));
    }

    if name.len() > MAX_ENTITY_NAME_LEN {
        return Err(EngineError::validation(format!(
            "Entity name too long (max {} characters)",
            MAX_ENTITY_NAME_LEN
        )));
    }

    if !ENTITY_NAME.is_match(name) {
        return Err(EngineError::validation(
            "Entity name must start with a letter or underscore and contain only letters, numbers, and underscores",
        ));
    }

    if RESERVED_ENTITY_NAMES
        .iter()
        .any(|reserved| name.eq_ignore_ascii_case(reserved))
    {
        return Err(EngineError::validation(format!(
            "Entity name '{}' is reserved",
            name
        )));
    }

    Ok(())
}

pub fn check_fields(fields: &[FieldDefinition]) -> Result<()> {
    let mut seen = HashSet::new();
    for field in fields {
        if field.name.trim().is_empty() {
            return Err(EngineError::validation("Field name cannot be empty"));
        }
        if !seen.insert(field.name.as_str()) {
            return Err(EngineError::validation(format!(
                "Duplicate field name: {}",
                field.name
            )));
        }
        check_constraints(field)?;
    }
    Ok(())
}

fn check_constraints(field: &FieldDefinition) -> Result<()> {
    let name = &field.name;

    if (field.min.is_some() || field.max.is_some()) && !field.field_type.is_numeric() {
        return Err(EngineError::validation(format!(
            "Field {} declares min/max but is of type {}",
            name, field.field_type
        )));
    }

    let has_string_constraint =
        field.min_length.is_some() || field.max_length.is_some() || field.pattern.is_some();
    if has_string_constraint && field.field_type != FieldType::String {
        return Err(EngineError::validation(format!(
            "Field {} declares length/pattern constraints but is of type {}",
            name, field.field_type
        )));
    }

    if field.relation.is_some() && field.field_type != FieldType::Relation {
        return Err(EngineError::validation(format!(
            "Field {} declares a relation target but is of type {}",
            name, field.field_type
        )));
    }

    if let (Some(min), Some(max)) = (field.min, field.max) {
        if min > max {
            return Err(EngineError::validation(format!(
                "Field {} has min {} greater than max {}",
                name, min, max
            )));
        }
    }

    if let (Some(min), Some(max)) = (field.min_length, field.max_length) {
        if min > max {
            return Err(EngineError::validation(format!(
                "Field {} has min_length {} greater than max_length {}",
                name, min, max
            )));
        }
    }

    if let Some(pattern) = &field.pattern {
        Regex::new(pattern).map_err(|err| {
            EngineError::validation(format!("Field {} has an invalid pattern: {}", name, err))
        })?;
    }

    Ok(())
}
