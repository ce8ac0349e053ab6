use crate::core::{EngineError, Payload, Result, Value};
use crate::schema::{FieldDefinition, FieldType};
use crate::validation::rules::{
    parse_iso_date, FieldRule, LengthRule, PatternRule, RangeRule, TypeRule,
};

/// Checks payloads against a field list, failing on the first violation.
pub struct Validator {
    rules: Vec<Box<dyn FieldRule>>,
}

impl Validator {
    pub fn new(pattern_cache_size: usize) -> Self {
        Self {
            rules: vec![
                Box::new(TypeRule),
                Box::new(RangeRule),
                Box::new(LengthRule),
                Box::new(PatternRule::new(pattern_cache_size)),
            ],
        }
    }

    pub fn validate(&self, fields: &[FieldDefinition], payload: &Payload) -> Result<()> {
        for field in fields.iter().filter(|field| field.required) {
            if payload.get(&field.name).is_none_or(Value::is_null) {
                return Err(EngineError::validation(format!(
                    "Missing required field: {}",
                    field.name
                )));
            }
        }

        if let Some(unknown) = payload.keys().find(|key| !fields.iter().any(|f| &f.name == *key)) {
            return Err(EngineError::validation(format!("Unknown field: {}", unknown)));
        }

        for field in fields {
            let Some(value) = payload.get(&field.name).filter(|value| !value.is_null()) else {
                continue;
            };
            for rule in &self.rules {
                rule.check(field, value)?;
            }
        }

        Ok(())
    }

    /// Rewrites accepted date strings as calendar dates. Call after `validate`.
    pub fn normalize(&self, fields: &[FieldDefinition], mut payload: Payload) -> Payload {
        for field in fields.iter().filter(|f| f.field_type == FieldType::Date) {
            if let Some(value) = payload.get_mut(&field.name) {
                if let Some(date) = value.as_str().and_then(parse_iso_date) {
                    *value = Value::Date(date);
                }
            }
        }
        payload
    }
}

impl Default for Validator {
    fn default() -> Self {
        Self::new(PatternRule::DEFAULT_CACHE_SIZE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn payload(entries: &[(&str, Value)]) -> Payload {
        entries
            .iter()
            .map(|(key, value)| (key.to_string(), value.clone()))
            .collect()
    }

    fn customer_fields() -> Vec<FieldDefinition> {
        vec![
            FieldDefinition::string("name").required(),
            FieldDefinition::string("email").required().unique(),
            FieldDefinition::integer("age").min(0.0).max(150.0),
            FieldDefinition::date("joined"),
        ]
    }

    #[test]
    fn test_missing_required_field_is_named() {
        let validator = Validator::default();
        let err = validator
            .validate(&customer_fields(), &payload(&[("email", Value::from("a@b.c"))]))
            .unwrap_err();
        assert_eq!(err.detail(), "Missing required field: name");
    }

    #[test]
    fn test_null_counts_as_absent() {
        let validator = Validator::default();
        let err = validator
            .validate(
                &customer_fields(),
                &payload(&[("name", Value::Null), ("email", Value::from("a@b.c"))]),
            )
            .unwrap_err();
        assert_eq!(err.detail(), "Missing required field: name");

        // Optional nulls are skipped by the rule chain.
        let ok = payload(&[
            ("name", Value::from("Ada")),
            ("email", Value::from("a@b.c")),
            ("age", Value::Null),
        ]);
        assert!(validator.validate(&customer_fields(), &ok).is_ok());
    }

    #[test]
    fn test_required_checked_before_unknown() {
        let validator = Validator::default();
        let err = validator
            .validate(&customer_fields(), &payload(&[("nickname", Value::from("x"))]))
            .unwrap_err();
        assert_eq!(err.detail(), "Missing required field: name");
    }

    #[test]
    fn test_unknown_field_rejected() {
        let validator = Validator::default();
        let err = validator
            .validate(
                &customer_fields(),
                &payload(&[
                    ("name", Value::from("Ada")),
                    ("email", Value::from("a@b.c")),
                    ("nickname", Value::from("x")),
                ]),
            )
            .unwrap_err();
        assert_eq!(err.detail(), "Unknown field: nickname");
    }

    #[test]
    fn test_first_violation_in_field_order() {
        let validator = Validator::default();
        let err = validator
            .validate(
                &customer_fields(),
                &payload(&[
                    ("name", Value::Integer(5)),
                    ("email", Value::from("a@b.c")),
                    ("age", Value::Integer(500)),
                ]),
            )
            .unwrap_err();
        assert_eq!(err.detail(), "Field name must be string");
    }

    #[test]
    fn test_bounds_inclusive() {
        let validator = Validator::default();
        let fields = vec![FieldDefinition::integer("score").min(0.0).max(10.0)];
        assert!(validator.validate(&fields, &payload(&[("score", Value::Integer(10))])).is_ok());
        assert!(validator.validate(&fields, &payload(&[("score", Value::Integer(11))])).is_err());
    }

    #[test]
    fn test_pattern() {
        let validator = Validator::default();
        let fields = vec![FieldDefinition::string("slug").pattern("^[a-z]+$")];
        assert!(validator.validate(&fields, &payload(&[("slug", Value::from("abc"))])).is_ok());
        assert!(validator.validate(&fields, &payload(&[("slug", Value::from("ABC"))])).is_err());
    }

    #[test]
    fn test_normalize_dates() {
        let validator = Validator::default();
        let fields = customer_fields();
        let normalized = validator.normalize(
            &fields,
            payload(&[("joined", Value::from("2024-03-01"))]),
        );
        assert_eq!(
            normalized.get("joined").and_then(Value::as_date),
            NaiveDate::from_ymd_opt(2024, 3, 1)
        );
    }

    #[test]
    fn test_date_time_rejected_for_date_field() {
        let validator = Validator::default();
        let fields = vec![FieldDefinition::date("joined")];
        let err = validator
            .validate(&fields, &payload(&[("joined", Value::from("2024-03-01T08:00:00Z"))]))
            .unwrap_err();
        assert_eq!(err.detail(), "Field joined must be ISO date");
    }
}
