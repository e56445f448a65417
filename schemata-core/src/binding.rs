//! Binding request fields to a table's descriptors.
//!
//! Request bodies are decoded into a generic map only at the boundary; every
//! entry is coerced against its field descriptor here before it reaches the
//! executor.

use serde_json::{Map, Value as JsonValue};
use std::collections::HashMap;

use crate::coerce;
use crate::error::{CoercionError, ExplorerError, ExplorerResult};
use crate::field::FieldDescriptor;
use crate::table::TableDescriptor;
use crate::value::Value;

/// Untyped field input decoded from a request body.
#[derive(Debug, Clone, PartialEq)]
pub enum RequestFields {
    /// JSON object; values go through [`coerce::convert`].
    Json(Map<String, JsonValue>),
    /// Form-encoded body; values go through [`coerce::parse`].
    Form(HashMap<String, String>),
}

impl Default for RequestFields {
    fn default() -> Self {
        RequestFields::Json(Map::new())
    }
}

impl RequestFields {
    pub fn contains(&self, name: &str) -> bool {
        match self {
            RequestFields::Json(map) => map.contains_key(name),
            RequestFields::Form(map) => map.contains_key(name),
        }
    }

    /// Coerce the entry for `field`, if the request supplied one.
    pub fn coerce(&self, field: &FieldDescriptor) -> Option<Result<Value, CoercionError>> {
        match self {
            RequestFields::Json(map) => map.get(field.name()).map(|raw| coerce::convert(field, raw)),
            RequestFields::Form(map) => map.get(field.name()).map(|raw| coerce::parse(field, raw)),
        }
    }
}

/// Parallel field names and values for an insert or update.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChangeSet {
    names: Vec<String>,
    values: Vec<Value>,
}

impl ChangeSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, name: impl Into<String>, value: Value) {
        self.names.push(name.into());
        self.values.push(value);
    }

    /// Bind an insert: every required field must be present.
    ///
    /// Auto-increment keys are skipped even when the request supplies them.
    pub fn for_insert(table: &TableDescriptor, fields: &RequestFields) -> ExplorerResult<Self> {
        let mut changes = Self::new();
        for field in table.fields() {
            if field.is_auto_increment() {
                continue;
            }
            match fields.coerce(field) {
                Some(value) => changes.push(field.name(), value?),
                None if field.is_required() => {
                    return Err(ExplorerError::field_required(field.name()));
                }
                None => {}
            }
        }
        Ok(changes)
    }

    /// Bind an update: only supplied fields change.
    ///
    /// Supplying the primary key is rejected as an invalid field type.
    pub fn for_update(table: &TableDescriptor, fields: &RequestFields) -> ExplorerResult<Self> {
        let mut changes = Self::new();
        for field in table.fields() {
            if !fields.contains(field.name()) {
                continue;
            }
            if field.is_primary_key() {
                return Err(ExplorerError::invalid_field_type(field.name()));
            }
            if let Some(value) = fields.coerce(field) {
                changes.push(field.name(), value?);
            }
        }
        Ok(changes)
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.names.iter().map(String::as_str).zip(self.values.iter())
    }
}
