//! Record codec: scanned column values to records and back.

use crate::field::FieldKind;
use crate::value::{Record, Value};

/// A scanned column value: a typed payload that may be NULL.
#[derive(Debug, Clone, PartialEq)]
pub enum ScannedValue {
    Integer(Option<i64>),
    Text(Option<String>),
    Float64(Option<f64>),
}

impl ScannedValue {
    /// An empty (NULL) slot for a column of `kind`.
    pub fn empty(kind: FieldKind) -> Self {
        match kind {
            FieldKind::Integer => ScannedValue::Integer(None),
            FieldKind::Text => ScannedValue::Text(None),
            FieldKind::Float64 => ScannedValue::Float64(None),
        }
    }

    /// Wrap a native value into the slot for `kind`.
    ///
    /// Returns `None` when the value does not fit the kind.
    pub fn from_value(kind: FieldKind, value: Value) -> Option<Self> {
        match (kind, value) {
            (kind, Value::Null) => Some(Self::empty(kind)),
            (FieldKind::Integer, Value::Integer(v)) => Some(ScannedValue::Integer(Some(v))),
            (FieldKind::Text, Value::Text(v)) => Some(ScannedValue::Text(Some(v))),
            (FieldKind::Float64, Value::Float64(v)) => Some(ScannedValue::Float64(Some(v))),
            _ => None,
        }
    }

    pub fn kind(&self) -> FieldKind {
        match self {
            ScannedValue::Integer(_) => FieldKind::Integer,
            ScannedValue::Text(_) => FieldKind::Text,
            ScannedValue::Float64(_) => FieldKind::Float64,
        }
    }

    pub fn is_valid(&self) -> bool {
        match self {
            ScannedValue::Integer(v) => v.is_some(),
            ScannedValue::Text(v) => v.is_some(),
            ScannedValue::Float64(v) => v.is_some(),
        }
    }

    pub fn into_value(self) -> Value {
        match self {
            ScannedValue::Integer(v) => v.map_or(Value::Null, Value::Integer),
            ScannedValue::Text(v) => v.map_or(Value::Null, Value::Text),
            ScannedValue::Float64(v) => v.map_or(Value::Null, Value::Float64),
        }
    }
}

/// Decode one scanned row into a record.
///
/// `names` and `scanned` are produced from the same column list, so their
/// lengths always agree.
pub fn decode<S: AsRef<str>>(names: &[S], scanned: Vec<ScannedValue>) -> Record {
    debug_assert_eq!(names.len(), scanned.len(), "column/value count mismatch");
    let mut record = Record::with_capacity(names.len());
    for (name, value) in names.iter().zip(scanned) {
        record.push(name.as_ref(), value.into_value());
    }
    record
}

/// Split a record back into parallel name and value lists.
pub fn encode(record: Record) -> (Vec<String>, Vec<Value>) {
    record.into_entries().into_iter().unzip()
}
