use std::fmt;

use chrono::NaiveDateTime;
use rusqlite::types::Value;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

/// Values that can be bound to a statement or read back from a row.
///
/// One enum is the currency for the whole crate so binding, inference, and
/// result extraction never branch on driver types:
/// ```rust
/// use sql_conduit::prelude::*;
///
/// let params = vec![
///     ParamValue::Int(1),
///     ParamValue::Text("alice".into()),
///     ParamValue::Bool(true),
/// ];
/// # let _ = params;
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum ParamValue {
    /// Integer value (64-bit)
    Int(i64),
    /// Floating point value (64-bit)
    Float(f64),
    /// Text/string value
    Text(String),
    /// Boolean value
    Bool(bool),
    /// Timestamp value
    Timestamp(NaiveDateTime),
    /// NULL value
    Null,
    /// Structured/composite value
    Json(JsonValue),
    /// Binary data
    Blob(Vec<u8>),
}

impl ParamValue {
    /// Check if this value is NULL
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    #[must_use]
    pub fn as_int(&self) -> Option<&i64> {
        if let ParamValue::Int(value) = self {
            Some(value)
        } else {
            None
        }
    }

    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        if let ParamValue::Text(value) = self {
            Some(value)
        } else {
            None
        }
    }

    #[must_use]
    pub fn as_bool(&self) -> Option<&bool> {
        if let ParamValue::Bool(value) = self {
            return Some(value);
        } else if let Some(i) = self.as_int() {
            if *i == 1 {
                return Some(&true);
            } else if *i == 0 {
                return Some(&false);
            }
        }
        None
    }

    #[must_use]
    pub fn as_timestamp(&self) -> Option<NaiveDateTime> {
        if let ParamValue::Timestamp(value) = self {
            return Some(*value);
        } else if let Some(s) = self.as_text() {
            // Try "YYYY-MM-DD HH:MM:SS"
            if let Ok(dt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S") {
                return Some(dt);
            }
            // Try "YYYY-MM-DD HH:MM:SS.SSS"
            if let Ok(dt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S.%3f") {
                return Some(dt);
            }
        }
        None
    }

    #[must_use]
    pub fn as_float(&self) -> Option<f64> {
        if let ParamValue::Float(value) = self {
            Some(*value)
        } else {
            None
        }
    }

    #[must_use]
    pub fn as_blob(&self) -> Option<&[u8]> {
        if let ParamValue::Blob(bytes) = self {
            Some(bytes)
        } else {
            None
        }
    }
}

/// Storage type a parameter is bound under.
///
/// Explicit parameter configuration may name any of these; automatic
/// inference only ever produces `Boolean`, `Integer`, `Text`, or `Binary`
/// (everything else widens to `Text`, see [`crate::inference`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageType {
    Boolean,
    Integer,
    Float,
    Text,
    Binary,
    /// Bind SQL NULL regardless of the value supplied.
    Null,
}

impl fmt::Display for StorageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            StorageType::Boolean => "boolean",
            StorageType::Integer => "integer",
            StorageType::Float => "float",
            StorageType::Text => "text",
            StorageType::Binary => "binary",
            StorageType::Null => "null",
        };
        f.write_str(name)
    }
}

/// Render a value into the driver type dictated by its storage type.
///
/// NULL values bind as NULL under every storage type. Where a value does not
/// match its configured type, the rendering prefers a faithful textual form
/// over a lossy cast (`Text("abc")` under `Integer` stays text and lets the
/// database's column affinity decide), so a misconfigured type never silently
/// zeroes data.
pub(crate) fn render_value(value: &ParamValue, ty: StorageType) -> Value {
    if value.is_null() {
        return Value::Null;
    }
    match ty {
        StorageType::Null => Value::Null,
        StorageType::Boolean => Value::Integer(i64::from(is_truthy(value))),
        StorageType::Integer => match value {
            ParamValue::Int(i) => Value::Integer(*i),
            ParamValue::Bool(b) => Value::Integer(i64::from(*b)),
            ParamValue::Float(f) => Value::Integer(*f as i64),
            ParamValue::Text(s) => s
                .trim()
                .parse::<i64>()
                .map_or_else(|_| Value::Text(s.clone()), Value::Integer),
            other => fallback_text(other),
        },
        StorageType::Float => match value {
            ParamValue::Float(f) => Value::Real(*f),
            ParamValue::Int(i) => Value::Real(*i as f64),
            ParamValue::Bool(b) => Value::Real(if *b { 1.0 } else { 0.0 }),
            ParamValue::Text(s) => s
                .trim()
                .parse::<f64>()
                .map_or_else(|_| Value::Text(s.clone()), Value::Real),
            other => fallback_text(other),
        },
        StorageType::Text => match value {
            ParamValue::Blob(bytes) => Value::Blob(bytes.clone()),
            other => Value::Text(text_form(other)),
        },
        StorageType::Binary => match value {
            ParamValue::Blob(bytes) => Value::Blob(bytes.clone()),
            other => Value::Blob(text_form(other).into_bytes()),
        },
    }
}

fn fallback_text(value: &ParamValue) -> Value {
    match value {
        ParamValue::Blob(bytes) => Value::Blob(bytes.clone()),
        other => Value::Text(text_form(other)),
    }
}

/// Canonical textual form of a value, used for `Text` bindings and literal
/// substitution. Timestamps use the `%F %T%.f` format the rest of the crate
/// reads back.
pub(crate) fn text_form(value: &ParamValue) -> String {
    match value {
        ParamValue::Int(i) => i.to_string(),
        ParamValue::Float(f) => f.to_string(),
        ParamValue::Text(s) => s.clone(),
        ParamValue::Bool(b) => if *b { "1" } else { "0" }.to_string(),
        ParamValue::Timestamp(dt) => dt.format("%F %T%.f").to_string(),
        ParamValue::Json(j) => j.to_string(),
        ParamValue::Null => String::new(),
        ParamValue::Blob(bytes) => String::from_utf8_lossy(bytes).into_owned(),
    }
}

fn is_truthy(value: &ParamValue) -> bool {
    match value {
        ParamValue::Bool(b) => *b,
        ParamValue::Int(i) => *i != 0,
        ParamValue::Float(f) => *f != 0.0,
        ParamValue::Text(s) => !s.is_empty(),
        ParamValue::Null => false,
        _ => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn null_binds_null_under_every_storage_type() {
        for ty in [
            StorageType::Boolean,
            StorageType::Integer,
            StorageType::Float,
            StorageType::Text,
            StorageType::Binary,
            StorageType::Null,
        ] {
            assert_eq!(render_value(&ParamValue::Null, ty), Value::Null);
        }
    }

    #[test]
    fn boolean_rendering_uses_truthiness() {
        assert_eq!(
            render_value(&ParamValue::Bool(true), StorageType::Boolean),
            Value::Integer(1)
        );
        assert_eq!(
            render_value(&ParamValue::Int(0), StorageType::Boolean),
            Value::Integer(0)
        );
        assert_eq!(
            render_value(&ParamValue::Text(String::new()), StorageType::Boolean),
            Value::Integer(0)
        );
    }

    #[test]
    fn mismatched_text_keeps_its_text_form() {
        assert_eq!(
            render_value(&ParamValue::Text("abc".into()), StorageType::Integer),
            Value::Text("abc".into())
        );
        assert_eq!(
            render_value(&ParamValue::Text("41".into()), StorageType::Integer),
            Value::Integer(41)
        );
    }

    #[test]
    fn float_under_text_round_trips_through_affinity_form() {
        assert_eq!(
            render_value(&ParamValue::Float(3.25), StorageType::Text),
            Value::Text("3.25".into())
        );
    }

    #[test]
    fn json_widens_to_its_serialized_form() {
        let v = ParamValue::Json(serde_json::json!({"k": [1, 2]}));
        assert_eq!(
            render_value(&v, StorageType::Text),
            Value::Text(r#"{"k":[1,2]}"#.into())
        );
    }

    #[test]
    fn storage_type_null_discards_the_value() {
        assert_eq!(
            render_value(&ParamValue::Int(7), StorageType::Null),
            Value::Null
        );
    }
}
