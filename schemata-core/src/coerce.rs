//! Value coercion: loosely-typed request input into a field's native value.
//!
//! Two independent paths:
//! - [`convert`] takes decoded JSON, where every number may arrive as a float.
//! - [`parse`] takes raw text such as form or query-string values.

use serde_json::Value as JsonValue;

use crate::error::CoercionError;
use crate::field::{FieldDescriptor, FieldKind};
use crate::value::Value;

/// Literal accepted by [`parse`] as SQL NULL.
pub const NULL_SENTINEL: &str = "null";

/// Largest magnitude an `f64` can have while still converting to `i64` exactly.
const I64_FLOAT_BOUND: f64 = 9_223_372_036_854_775_808.0;

/// Convert a decoded JSON value into the native value for `field`.
///
/// Null is accepted only for nullable fields. An integral float converts to
/// an integer field; a fractional one is rejected, never truncated.
pub fn convert(field: &FieldDescriptor, raw: &JsonValue) -> Result<Value, CoercionError> {
    let invalid = || CoercionError::InvalidType {
        field: field.name().to_string(),
    };

    match (field.kind(), raw) {
        (_, JsonValue::Null) if field.is_nullable() => Ok(Value::Null),
        (FieldKind::Text, JsonValue::String(s)) => Ok(Value::Text(s.clone())),
        (FieldKind::Float64, JsonValue::Number(n)) => n.as_f64().map(Value::Float64).ok_or_else(invalid),
        (FieldKind::Integer, JsonValue::Number(n)) => {
            if let Some(v) = n.as_i64() {
                return Ok(Value::Integer(v));
            }
            match n.as_f64() {
                Some(v) if is_integral(v) => Ok(Value::Integer(v as i64)),
                _ => Err(invalid()),
            }
        }
        _ => Err(invalid()),
    }
}

/// Parse raw text into the native value for `field`.
///
/// The exact string `"null"` maps to NULL when the field allows it.
pub fn parse(field: &FieldDescriptor, text: &str) -> Result<Value, CoercionError> {
    if text == NULL_SENTINEL {
        if !field.is_nullable() {
            return Err(CoercionError::NotNullable {
                field: field.name().to_string(),
            });
        }
        return Ok(Value::Null);
    }

    let malformed = || CoercionError::Malformed {
        field: field.name().to_string(),
        kind: field.kind(),
        input: text.to_string(),
    };

    match field.kind() {
        FieldKind::Integer => text.parse::<i64>().map(Value::Integer).map_err(|_| malformed()),
        FieldKind::Text => Ok(Value::Text(text.to_string())),
        FieldKind::Float64 => text.parse::<f64>().map(Value::Float64).map_err(|_| malformed()),
    }
}

fn is_integral(v: f64) -> bool {
    v.is_finite() && v.round() == v && v.abs() < I64_FLOAT_BOUND
}
