//! Generic record store wire representation.

use gangway_error::{GangwayResult, JsonError};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One record as returned by the store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Record {
    /// Opaque record identifier
    pub id: String,
    /// Field map keyed by column name
    #[serde(default)]
    pub fields: Map<String, Value>,
    /// Creation timestamp, as reported by the store
    #[serde(rename = "createdTime", skip_serializing_if = "Option::is_none")]
    pub created_time: Option<String>,
}

impl Record {
    /// Required string field.
    ///
    /// # Errors
    ///
    /// Returns a [`JsonError`] when the field is missing or not a string.
    pub fn str_field(&self, name: &str) -> GangwayResult<String> {
        self.fields
            .get(name)
            .and_then(|v| v.as_str())
            .map(|s| s.to_string())
            .ok_or_else(|| JsonError::new(format!("missing string field '{name}'")).into())
    }

    /// Optional string field.
    pub fn opt_str(&self, name: &str) -> Option<String> {
        self.fields
            .get(name)
            .and_then(|v| v.as_str())
            .map(|s| s.to_string())
    }

    /// Boolean field, absent means false.
    pub fn bool_field(&self, name: &str) -> bool {
        self.fields
            .get(name)
            .and_then(|v| v.as_bool())
            .unwrap_or(false)
    }

    /// Optional boolean field, preserving absence.
    pub fn opt_bool(&self, name: &str) -> Option<bool> {
        self.fields.get(name).and_then(|v| v.as_bool())
    }

    /// String-array field, absent means empty.
    pub fn str_list(&self, name: &str) -> Vec<String> {
        match self.fields.get(name) {
            Some(Value::Array(items)) => items
                .iter()
                .filter_map(|v| v.as_str())
                .map(|s| s.to_string())
                .collect(),
            _ => Vec::new(),
        }
    }

    /// First element of a linked-record array, or the bare string value.
    ///
    /// Linked references come back as one-element arrays; lookup/formula
    /// columns sometimes collapse to a scalar.
    pub fn linked(&self, name: &str) -> Option<String> {
        match self.fields.get(name) {
            Some(Value::Array(items)) => items
                .first()
                .and_then(|v| v.as_str())
                .map(|s| s.to_string()),
            Some(Value::String(s)) => Some(s.clone()),
            _ => None,
        }
    }

    /// Required linked-record reference.
    ///
    /// # Errors
    ///
    /// Returns a [`JsonError`] when the reference is missing.
    pub fn required_linked(&self, name: &str) -> GangwayResult<String> {
        self.linked(name)
            .ok_or_else(|| JsonError::new(format!("missing linked field '{name}'")).into())
    }
}

/// One record as submitted to the store for insert or update.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RecordPayload {
    /// Record identifier, present for updates and absent for inserts
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Field map keyed by column name
    pub fields: Map<String, Value>,
}

impl RecordPayload {
    /// Create an empty payload, optionally targeting an existing record.
    pub fn new(id: Option<String>) -> Self {
        Self {
            id,
            fields: Map::new(),
        }
    }

    /// Set a string field.
    pub fn set_str(&mut self, name: &str, value: impl Into<String>) {
        self.fields
            .insert(name.to_string(), Value::String(value.into()));
    }

    /// Set a string field only when a value is present.
    pub fn set_opt_str(&mut self, name: &str, value: Option<&str>) {
        if let Some(value) = value {
            self.set_str(name, value);
        }
    }

    /// Set a boolean field.
    pub fn set_bool(&mut self, name: &str, value: bool) {
        self.fields.insert(name.to_string(), Value::Bool(value));
    }

    /// Set a linked-record reference (one-element array).
    pub fn set_linked(&mut self, name: &str, id: &str) {
        self.fields.insert(
            name.to_string(),
            Value::Array(vec![Value::String(id.to_string())]),
        );
    }
}
