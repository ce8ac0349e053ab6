use chrono::NaiveDate;
use serde::de::Deserializer;
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::core::{EngineError, Result};

/// Record payload: field name to runtime-typed value.
pub type Payload = BTreeMap<String, Value>;

/// Runtime-typed payload value.
///
/// Human-readable formats (JSON) see the natural JSON shape; binary formats
/// (snapshots) keep the variant tag so dates survive a round trip.
#[derive(Debug, Clone)]
pub enum Value {
    Null,
    Boolean(bool),
    Integer(i64),
    Float(f64),
    Text(String),
    Date(NaiveDate),
    List(Vec<Value>),
    Object(BTreeMap<String, Value>),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, Self::Integer(_) | Self::Float(_))
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Float(f) => Some(*f),
            Self::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_date(&self) -> Option<NaiveDate> {
        match self {
            Self::Date(d) => Some(*d),
            _ => None,
        }
    }

    /// Textual form used for uniqueness comparison.
    ///
    /// Mirrors how a JSON document column renders a scalar as text, so an
    /// integer `1` and the string `"1"` share the same form. `Null` has none.
    pub fn canonical_text(&self) -> Option<String> {
        match self {
            Self::Null => None,
            Self::Text(s) => Some(s.clone()),
            Self::Date(d) => Some(d.format("%Y-%m-%d").to_string()),
            Self::Boolean(b) => Some(b.to_string()),
            Self::Integer(i) => Some(i.to_string()),
            other => Some(other.to_json().to_string()),
        }
    }

    pub fn from_json(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => Self::Null,
            serde_json::Value::Bool(b) => Self::Boolean(b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Self::Integer(i),
                None => Self::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            serde_json::Value::String(s) => Self::Text(s),
            serde_json::Value::Array(items) => {
                Self::List(items.into_iter().map(Self::from_json).collect())
            }
            serde_json::Value::Object(map) => Self::Object(
                map.into_iter()
                    .map(|(key, value)| (key, Self::from_json(value)))
                    .collect(),
            ),
        }
    }

    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Self::Null => serde_json::Value::Null,
            Self::Boolean(b) => serde_json::Value::Bool(*b),
            Self::Integer(i) => serde_json::Value::from(*i),
            Self::Float(f) => serde_json::Number::from_f64(*f)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            Self::Text(s) => serde_json::Value::String(s.clone()),
            Self::Date(d) => serde_json::Value::String(d.format("%Y-%m-%d").to_string()),
            Self::List(items) => serde_json::Value::Array(items.iter().map(Self::to_json).collect()),
            Self::Object(map) => serde_json::Value::Object(
                map.iter()
                    .map(|(key, value)| (key.clone(), value.to_json()))
                    .collect(),
            ),
        }
    }
}

/// Converts a JSON request body into a payload; the body must be an object.
pub fn payload_from_json(value: serde_json::Value) -> Result<Payload> {
    match value {
        serde_json::Value::Object(map) => Ok(map
            .into_iter()
            .map(|(key, value)| (key, Value::from_json(value)))
            .collect()),
        other => Err(EngineError::validation(format!(
            "Payload must be a JSON object, got {}",
            json_kind(&other)
        ))),
    }
}

fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "boolean",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Null, Self::Null) => true,
            (Self::Boolean(a), Self::Boolean(b)) => a == b,
            (Self::Integer(a), Self::Integer(b)) => a == b,
            (Self::Float(a), Self::Float(b)) => {
                if a.is_nan() && b.is_nan() {
                    return true;
                }
                (a - b).abs() < f64::EPSILON
            }
            (Self::Integer(i), Self::Float(f)) | (Self::Float(f), Self::Integer(i)) => {
                (*i as f64 - f).abs() < f64::EPSILON
            }
            (Self::Text(a), Self::Text(b)) => a == b,
            (Self::Date(a), Self::Date(b)) => a == b,
            (Self::List(a), Self::List(b)) => a == b,
            (Self::Object(a), Self::Object(b)) => a == b,
            _ => false,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => write!(f, "null"),
            Self::Text(s) => write!(f, "{}", s),
            other => match other.canonical_text() {
                Some(text) => write!(f, "{}", text),
                None => write!(f, "null"),
            },
        }
    }
}

#[derive(Serialize)]
enum TaggedRef<'a> {
    Null,
    Boolean(bool),
    Integer(i64),
    Float(f64),
    Text(&'a str),
    Date(NaiveDate),
    List(&'a [Value]),
    Object(&'a BTreeMap<String, Value>),
}

#[derive(Deserialize)]
enum Tagged {
    Null,
    Boolean(bool),
    Integer(i64),
    Float(f64),
    Text(String),
    Date(NaiveDate),
    List(Vec<Value>),
    Object(BTreeMap<String, Value>),
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        if serializer.is_human_readable() {
            return self.to_json().serialize(serializer);
        }
        let tagged = match self {
            Self::Null => TaggedRef::Null,
            Self::Boolean(b) => TaggedRef::Boolean(*b),
            Self::Integer(i) => TaggedRef::Integer(*i),
            Self::Float(f) => TaggedRef::Float(*f),
            Self::Text(s) => TaggedRef::Text(s),
            Self::Date(d) => TaggedRef::Date(*d),
            Self::List(items) => TaggedRef::List(items),
            Self::Object(map) => TaggedRef::Object(map),
        };
        tagged.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Value {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        if deserializer.is_human_readable() {
            return serde_json::Value::deserialize(deserializer).map(Self::from_json);
        }
        Ok(match Tagged::deserialize(deserializer)? {
            Tagged::Null => Self::Null,
            Tagged::Boolean(b) => Self::Boolean(b),
            Tagged::Integer(i) => Self::Integer(i),
            Tagged::Float(f) => Self::Float(f),
            Tagged::Text(s) => Self::Text(s),
            Tagged::Date(d) => Self::Date(d),
            Tagged::List(items) => Self::List(items),
            Tagged::Object(map) => Self::Object(map),
        })
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Self::Integer(i)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Self::Float(f)
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Boolean(b)
    }
}

impl From<NaiveDate> for Value {
    fn from(d: NaiveDate) -> Self {
        Self::Date(d)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_value_equality() {
        assert_eq!(Value::Integer(42), Value::Integer(42));
        assert_eq!(Value::Integer(1), Value::Float(1.0));
        assert_ne!(Value::Integer(1), Value::Text("1".into()));
    }

    #[test]
    fn test_canonical_text_coerces_scalars() {
        assert_eq!(Value::Integer(1).canonical_text(), Value::from("1").canonical_text());
        assert_eq!(Value::Boolean(true).canonical_text().as_deref(), Some("true"));
        assert_eq!(Value::Float(1.5).canonical_text().as_deref(), Some("1.5"));
        assert_eq!(Value::Null.canonical_text(), None);
        let date = NaiveDate::from_ymd_opt(2024, 2, 29).unwrap();
        assert_eq!(Value::Date(date).canonical_text().as_deref(), Some("2024-02-29"));
    }

    #[test]
    fn test_from_json_numbers() {
        assert!(matches!(Value::from_json(json!(7)), Value::Integer(7)));
        assert!(matches!(Value::from_json(json!(7.25)), Value::Float(_)));
        assert!(matches!(Value::from_json(json!([1, "a"])), Value::List(ref items) if items.len() == 2));
    }

    #[test]
    fn test_payload_must_be_object() {
        assert!(payload_from_json(json!({"a": 1})).is_ok());
        let err = payload_from_json(json!([1, 2])).unwrap_err();
        assert!(err.to_string().contains("array"));
    }

    #[test]
    fn test_json_serialization_is_natural() {
        let date = NaiveDate::from_ymd_opt(2023, 1, 5).unwrap();
        let encoded = serde_json::to_value(Value::Date(date)).unwrap();
        assert_eq!(encoded, json!("2023-01-05"));
    }

    #[test]
    fn test_binary_serialization_keeps_dates() {
        let date = NaiveDate::from_ymd_opt(2023, 1, 5).unwrap();
        let mut payload = Payload::new();
        payload.insert("born".into(), Value::Date(date));
        payload.insert("name".into(), Value::from("ada"));

        let bytes = rmp_serde::to_vec_named(&payload).unwrap();
        let decoded: Payload = rmp_serde::from_slice(&bytes).unwrap();
        assert_eq!(decoded.get("born").and_then(Value::as_date), Some(date));
        assert_eq!(decoded, payload);
    }
}
