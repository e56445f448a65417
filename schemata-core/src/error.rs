//! Error types for Schemata operations

use crate::FieldKind;
use thiserror::Error;

/// Catalog construction errors.
///
/// Every variant is raised while turning introspected column metadata into
/// descriptors, before any request is served.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SchemaError {
    #[error("table {table} has no columns")]
    EmptyTable { table: String },

    #[error("column {table}.{column} has unsupported type {declared:?}")]
    UnsupportedColumnType {
        table: String,
        column: String,
        declared: String,
    },

    #[error("table {table} has no primary key column")]
    MissingPrimaryKey { table: String },

    #[error("table {table} has more than one primary key column: {columns:?}")]
    MultiplePrimaryKeys { table: String, columns: Vec<String> },

    #[error("primary key {table}.{column} is {kind}; only integer keys are addressable")]
    NonIntegerPrimaryKey {
        table: String,
        column: String,
        kind: FieldKind,
    },

    #[error("column {table}.{column} is auto-increment but not the primary key")]
    AutoIncrementWithoutKey { table: String, column: String },

    #[error("column {column} appears twice in table {table}")]
    DuplicateColumn { table: String, column: String },

    #[error("table {table} appears twice in the catalog")]
    DuplicateTable { table: String },
}

/// Failures converting request input into a field's native value.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CoercionError {
    #[error("field {field} have invalid type")]
    InvalidType { field: String },

    #[error("{field} cannot be null")]
    NotNullable { field: String },

    #[error("field {field} expects {kind}, got {input:?}")]
    Malformed {
        field: String,
        kind: FieldKind,
        input: String,
    },
}

impl CoercionError {
    /// Name of the field the conversion failed for.
    pub fn field(&self) -> &str {
        match self {
            CoercionError::InvalidType { field }
            | CoercionError::NotNullable { field }
            | CoercionError::Malformed { field, .. } => field,
        }
    }
}

/// A row identifier that could not be parsed from a path segment.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("entry id must be int >= 1")]
pub struct IdentifierError {
    pub input: String,
}

/// Backing store failures.
///
/// The reason text is for server-side logs only; it is never sent to clients.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("store connection failed: {reason}")]
    Connection { reason: String },

    #[error("query failed: {reason}")]
    Query { reason: String },

    #[error("constraint violated on {table}: {reason}")]
    Constraint { table: String, reason: String },

    #[error("unexpected result shape: {reason}")]
    Decode { reason: String },
}

/// Catalog construction failed; fatal at startup.
#[derive(Debug, Clone, Error)]
pub enum IntrospectionError {
    #[error("introspection query failed: {0}")]
    Store(#[from] StoreError),

    #[error("schema rejected: {0}")]
    Schema(#[from] SchemaError),
}

/// Master error type for request-time operations.
#[derive(Debug, Clone, Error)]
pub enum ExplorerError {
    #[error("unknown table")]
    UnknownTable { table: String },

    #[error("record not found")]
    RecordNotFound,

    #[error("field {field} have invalid type")]
    InvalidFieldType { field: String },

    #[error("field {field} is required")]
    FieldRequired { field: String },

    #[error("unknown field {field}")]
    UnknownField { field: String },

    #[error(transparent)]
    Coercion(#[from] CoercionError),

    #[error(transparent)]
    InvalidIdentifier(#[from] IdentifierError),

    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

impl ExplorerError {
    pub fn unknown_table(table: impl Into<String>) -> Self {
        ExplorerError::UnknownTable {
            table: table.into(),
        }
    }

    pub fn invalid_field_type(field: impl Into<String>) -> Self {
        ExplorerError::InvalidFieldType {
            field: field.into(),
        }
    }

    pub fn field_required(field: impl Into<String>) -> Self {
        ExplorerError::FieldRequired {
            field: field.into(),
        }
    }
}

/// Result type alias for request-time operations.
pub type ExplorerResult<T> = Result<T, ExplorerError>;

/// Result type alias for store calls.
pub type StoreResult<T> = Result<T, StoreError>;

// =============================================================================
// TESTS
// =============================================================================
