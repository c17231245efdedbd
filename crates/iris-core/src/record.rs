//! Record capability interface.
//!
//! The serializer never depends on a storage layer's concrete record type.
//! It only needs to read field values and know which field is the key.

use serde_json::{Map, Value};
use std::fmt::Debug;

/// Flat field-name to value mapping handed to and returned by storage.
pub type Attributes = Map<String, Value>;

/// A boxed, type-erased record.
pub type BoxRecord = Box<dyn Record>;

/// Read access to one stored record.
pub trait Record: Send + Sync + Debug {
    /// Returns the value of `field`, if present.
    fn get(&self, field: &str) -> Option<&Value>;

    /// Name of the primary-key field.
    fn primary_key_field(&self) -> &str;

    /// Value of the primary key.
    fn primary_key(&self) -> Option<&Value> {
        self.get(self.primary_key_field())
    }

    /// Native JSON rendering used by the host's own endpoints.
    fn to_value(&self) -> Value;
}

/// Renders a key value as a JSON:API `id`.
///
/// Strings are used verbatim; every other scalar uses its JSON text.
pub fn key_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// A [`Record`] backed by an ordered JSON map.
#[derive(Debug, Clone, PartialEq)]
pub struct MapRecord {
    primary_key: String,
    values: Attributes,
}

impl MapRecord {
    /// Wraps `values`, keyed by `primary_key`.
    pub fn new(primary_key: impl Into<String>, values: Attributes) -> Self {
        Self {
            primary_key: primary_key.into(),
            values,
        }
    }

    /// Builds a record from a JSON object; non-objects yield an empty record.
    pub fn from_value(primary_key: impl Into<String>, value: Value) -> Self {
        let values = match value {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        Self::new(primary_key, values)
    }

    /// Underlying values.
    pub fn values(&self) -> &Attributes {
        &self.values
    }

    /// Mutable access for storage implementations.
    pub fn values_mut(&mut self) -> &mut Attributes {
        &mut self.values
    }

    /// Boxes the record.
    pub fn boxed(self) -> BoxRecord {
        Box::new(self)
    }
}

impl Record for MapRecord {
    fn get(&self, field: &str) -> Option<&Value> {
        self.values.get(field)
    }

    fn primary_key_field(&self) -> &str {
        &self.primary_key
    }

    fn to_value(&self) -> Value {
        Value::Object(self.values.clone())
    }
}
