//! Per-field validation rules (Chain of Responsibility pattern).
//!
//! Each rule inspects one present, non-null value against its field
//! definition. The validator runs the chain in order for every field and
//! stops at the first failure.

use chrono::NaiveDate;
use lru::LruCache;
use regex::Regex;
use std::num::NonZeroUsize;
use std::sync::Mutex;

use crate::core::{EngineError, Result, Value};
use crate::schema::{FieldDefinition, FieldType};

pub trait FieldRule: Send + Sync {
    fn check(&self, field: &FieldDefinition, value: &Value) -> Result<()>;
}

/// Declared type against the runtime value kind.
#[derive(Debug, Clone, Default)]
pub struct TypeRule;

impl FieldRule for TypeRule {
    fn check(&self, field: &FieldDefinition, value: &Value) -> Result<()> {
        let conforms = match field.field_type {
            FieldType::String => matches!(value, Value::Text(_)),
            FieldType::Integer => matches!(value, Value::Integer(_)),
            FieldType::Float => value.is_numeric(),
            FieldType::Boolean => matches!(value, Value::Boolean(_)),
            FieldType::Date => match value {
                Value::Date(_) => true,
                Value::Text(text) => parse_iso_date(text).is_some(),
                _ => false,
            },
            FieldType::File => matches!(value, Value::Text(_)),
            // Opaque reference; the target record is never looked up.
            FieldType::Relation => true,
        };

        if conforms {
            return Ok(());
        }

        let expected = match field.field_type {
            FieldType::Date => "ISO date",
            FieldType::File => "file URL string",
            other => other.as_str(),
        };
        Err(EngineError::validation(format!(
            "Field {} must be {}",
            field.name, expected
        )))
    }
}

/// Inclusive `min` / `max` on numeric fields.
#[derive(Debug, Clone, Default)]
pub struct RangeRule;

impl FieldRule for RangeRule {
    fn check(&self, field: &FieldDefinition, value: &Value) -> Result<()> {
        let Some(number) = value.as_f64() else {
            return Ok(());
        };

        if let Some(min) = field.min {
            if number < min {
                return Err(EngineError::validation(format!(
                    "Field {} must be >= {}",
                    field.name, min
                )));
            }
        }

        if let Some(max) = field.max {
            if number > max {
                return Err(EngineError::validation(format!(
                    "Field {} must be <= {}",
                    field.name, max
                )));
            }
        }

        Ok(())
    }
}

/// Inclusive `min_length` / `max_length`, counted in characters.
#[derive(Debug, Clone, Default)]
pub struct LengthRule;

impl FieldRule for LengthRule {
    fn check(&self, field: &FieldDefinition, value: &Value) -> Result<()> {
        if field.field_type != FieldType::String {
            return Ok(());
        }
        let Some(text) = value.as_str() else {
            return Ok(());
        };
        let length = text.chars().count();

        if let Some(min) = field.min_length {
            if length < min {
                return Err(EngineError::validation(format!(
                    "Field {} must be at least {} characters",
                    field.name, min
                )));
            }
        }

        if let Some(max) = field.max_length {
            if length > max {
                return Err(EngineError::validation(format!(
                    "Field {} must be at most {} characters",
                    field.name, max
                )));
            }
        }

        Ok(())
    }
}

/// Full-string regular expression match, with compiled patterns kept in an
/// LRU cache keyed by the declared pattern.
pub struct PatternRule {
    cache: Mutex<LruCache<String, Regex>>,
}

impl PatternRule {
    pub const DEFAULT_CACHE_SIZE: usize = 256;

    pub fn new(cache_size: usize) -> Self {
        let capacity = NonZeroUsize::new(cache_size).unwrap_or(NonZeroUsize::MIN);
        Self {
            cache: Mutex::new(LruCache::new(capacity)),
        }
    }

    fn is_full_match(&self, field: &FieldDefinition, pattern: &str, text: &str) -> Result<bool> {
        let mut cache = self.cache.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        if let Some(regex) = cache.get(pattern) {
            return Ok(regex.is_match(text));
        }

        let regex = Regex::new(&format!("^(?:{})$", pattern)).map_err(|err| {
            EngineError::validation(format!(
                "Field {} has an invalid pattern: {}",
                field.name, err
            ))
        })?;
        let matched = regex.is_match(text);
        cache.put(pattern.to_string(), regex);
        Ok(matched)
    }
}

impl Default for PatternRule {
    fn default() -> Self {
        Self::new(Self::DEFAULT_CACHE_SIZE)
    }
}

impl FieldRule for PatternRule {
    fn check(&self, field: &FieldDefinition, value: &Value) -> Result<()> {
        if field.field_type != FieldType::String {
            return Ok(());
        }
        let (Some(pattern), Some(text)) = (field.pattern.as_deref(), value.as_str()) else {
            return Ok(());
        };

        if !self.is_full_match(field, pattern, text)? {
            return Err(EngineError::validation(format!(
                "Field {} must match pattern {}",
                field.name, pattern
            )));
        }

        Ok(())
    }
}

/// Strict `YYYY-MM-DD` calendar date. Date-time forms are rejected so the
/// stored value always reads back as the submitted text.
pub fn parse_iso_date(text: &str) -> Option<NaiveDate> {
    let date = NaiveDate::parse_from_str(text, "%Y-%m-%d").ok()?;
    (date.format("%Y-%m-%d").to_string() == text).then_some(date)
}
