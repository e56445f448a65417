//! Column descriptors and declared-type classification.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::SchemaError;

/// Storage classification of a column.
///
/// Only these three kinds are served; any other declared type is rejected
/// while the catalog is built.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    Integer,
    Text,
    Float64,
}

impl FieldKind {
    /// Classify a declared SQL type string.
    ///
    /// Rules are applied in order on the lower-cased string: `char`/`text`
    /// first, then `int`, then `float`/`real`/`double`.
    pub fn classify(declared: &str) -> Option<FieldKind> {
        let declared = declared.to_lowercase();
        let contains_any = |needles: &[&str]| needles.iter().any(|n| declared.contains(n));

        if contains_any(&["char", "text"]) {
            Some(FieldKind::Text)
        } else if contains_any(&["int"]) {
            Some(FieldKind::Integer)
        } else if contains_any(&["float", "real", "double"]) {
            Some(FieldKind::Float64)
        } else {
            None
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FieldKind::Integer => "integer",
            FieldKind::Text => "text",
            FieldKind::Float64 => "float64",
        }
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One row of column metadata, shaped like `SHOW FULL COLUMNS` output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnMetadata {
    /// Column name
    pub field: String,
    /// Declared type, e.g. `varchar(255)` or `int(11)`
    pub column_type: String,
    /// `YES` when the column accepts NULL
    pub null: String,
    /// `PRI` for primary-key columns
    pub key: String,
    /// Default expression, `None` when the column has no default
    pub default: Option<String>,
    /// Extra attributes, e.g. `auto_increment`
    pub extra: String,
}

impl ColumnMetadata {
    /// Plain column: not null, no key, no default.
    pub fn new(field: impl Into<String>, column_type: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            column_type: column_type.into(),
            null: "NO".to_string(),
            key: String::new(),
            default: None,
            extra: String::new(),
        }
    }

    pub fn nullable(mut self) -> Self {
        self.null = "YES".to_string();
        self
    }

    pub fn primary_key(mut self) -> Self {
        self.key = "PRI".to_string();
        self
    }

    pub fn auto_increment(mut self) -> Self {
        self.extra = "auto_increment".to_string();
        self
    }

    pub fn with_default(mut self, default: impl Into<String>) -> Self {
        self.default = Some(default.into());
        self
    }
}

/// Immutable description of one column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldDescriptor {
    name: String,
    kind: FieldKind,
    primary_key: bool,
    auto_increment: bool,
    nullable: bool,
    has_default: bool,
}

impl FieldDescriptor {
    pub fn new(name: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            name: name.into(),
            kind,
            primary_key: false,
            auto_increment: false,
            nullable: false,
            has_default: false,
        }
    }

    /// Build a descriptor from introspected metadata.
    pub fn from_column(table: &str, column: &ColumnMetadata) -> Result<Self, SchemaError> {
        let kind = FieldKind::classify(&column.column_type).ok_or_else(|| {
            SchemaError::UnsupportedColumnType {
                table: table.to_string(),
                column: column.field.clone(),
                declared: column.column_type.clone(),
            }
        })?;

        let primary_key = column.key.eq_ignore_ascii_case("pri");
        let auto_increment = column.extra.to_lowercase().contains("auto_increment");
        if auto_increment && !primary_key {
            return Err(SchemaError::AutoIncrementWithoutKey {
                table: table.to_string(),
                column: column.field.clone(),
            });
        }

        Ok(Self {
            name: column.field.clone(),
            kind,
            primary_key,
            auto_increment,
            nullable: column.null.eq_ignore_ascii_case("yes"),
            has_default: column.default.is_some(),
        })
    }

    pub fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self
    }

    /// Mark as auto-increment; implies primary key.
    pub fn auto_increment(mut self) -> Self {
        self.primary_key = true;
        self.auto_increment = true;
        self
    }

    pub fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    pub fn with_default(mut self) -> Self {
        self.has_default = true;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> FieldKind {
        self.kind
    }

    pub fn is_primary_key(&self) -> bool {
        self.primary_key
    }

    pub fn is_auto_increment(&self) -> bool {
        self.auto_increment
    }

    pub fn is_nullable(&self) -> bool {
        self.nullable
    }

    pub fn has_default(&self) -> bool {
        self.has_default
    }

    /// Whether an insert must supply this field.
    pub fn is_required(&self) -> bool {
        !self.nullable && !self.has_default && !self.auto_increment
    }
}
