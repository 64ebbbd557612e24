use serde::{Deserialize, Serialize};
use serde_json::Value;
use shapefile::dbase;

use crate::types::EntityId;

/// A non-geometry property carried by a boundary file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Null,
    Bool(bool),
    Number(f64),
    Text(String),
}

impl FieldValue {
    #[inline] pub fn is_null(&self) -> bool { matches!(self, FieldValue::Null) }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            FieldValue::Number(n) => Some(*n),
            FieldValue::Text(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Interpret the value as an entity id (`"3550308"` or `3550308.0`).
    pub fn as_entity_id(&self) -> Option<EntityId> {
        match self {
            FieldValue::Number(n) => EntityId::from_f64(*n),
            FieldValue::Text(s) => EntityId::parse(s),
            _ => None,
        }
    }

    /// Convert to a JSON value for GeoJSON properties.
    pub fn to_json(&self) -> Value {
        match self {
            FieldValue::Null => Value::Null,
            FieldValue::Bool(b) => Value::Bool(*b),
            FieldValue::Number(n) => serde_json::Number::from_f64(*n).map_or(Value::Null, Value::Number),
            FieldValue::Text(s) => Value::String(s.clone()),
        }
    }
}

impl From<&dbase::FieldValue> for FieldValue {
    fn from(value: &dbase::FieldValue) -> Self {
        match value {
            dbase::FieldValue::Character(Some(s)) => FieldValue::Text(s.trim().to_string()),
            dbase::FieldValue::Memo(s) => FieldValue::Text(s.trim().to_string()),
            dbase::FieldValue::Numeric(Some(n)) => FieldValue::Number(*n),
            dbase::FieldValue::Float(Some(f)) => FieldValue::Number(f64::from(*f)),
            dbase::FieldValue::Integer(i) => FieldValue::Number(f64::from(*i)),
            dbase::FieldValue::Double(d) => FieldValue::Number(*d),
            dbase::FieldValue::Currency(c) => FieldValue::Number(*c),
            dbase::FieldValue::Logical(Some(b)) => FieldValue::Bool(*b),
            _ => FieldValue::Null,
        }
    }
}

impl From<&Value> for FieldValue {
    fn from(value: &Value) -> Self {
        match value {
            Value::Null => FieldValue::Null,
            Value::Bool(b) => FieldValue::Bool(*b),
            Value::Number(n) => n.as_f64().map_or(FieldValue::Null, FieldValue::Number),
            Value::String(s) => FieldValue::Text(s.clone()),
            other => FieldValue::Text(other.to_string()),
        }
    }
}
