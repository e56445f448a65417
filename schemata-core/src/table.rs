//! Table descriptors.

use std::collections::HashMap;

use crate::error::SchemaError;
use crate::field::{ColumnMetadata, FieldDescriptor, FieldKind};

/// Immutable description of one table.
///
/// Fields keep column discovery order. Exactly one field is the primary key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableDescriptor {
    name: String,
    fields: Vec<FieldDescriptor>,
    positions: HashMap<String, usize>,
    key: usize,
}

impl TableDescriptor {
    pub fn new(name: impl Into<String>, fields: Vec<FieldDescriptor>) -> Result<Self, SchemaError> {
        let name = name.into();
        if fields.is_empty() {
            return Err(SchemaError::EmptyTable { table: name });
        }

        let mut positions = HashMap::with_capacity(fields.len());
        for (i, field) in fields.iter().enumerate() {
            if positions.insert(field.name().to_string(), i).is_some() {
                return Err(SchemaError::DuplicateColumn {
                    table: name,
                    column: field.name().to_string(),
                });
            }
        }

        let keys: Vec<usize> = fields
            .iter()
            .enumerate()
            .filter(|(_, f)| f.is_primary_key())
            .map(|(i, _)| i)
            .collect();
        let key = match keys.as_slice() {
            [key] => *key,
            [] => return Err(SchemaError::MissingPrimaryKey { table: name }),
            _ => {
                return Err(SchemaError::MultiplePrimaryKeys {
                    table: name,
                    columns: keys.iter().map(|&i| fields[i].name().to_string()).collect(),
                })
            }
        };
        if fields[key].kind() != FieldKind::Integer {
            return Err(SchemaError::NonIntegerPrimaryKey {
                table: name,
                column: fields[key].name().to_string(),
                kind: fields[key].kind(),
            });
        }

        Ok(Self {
            name,
            fields,
            positions,
            key,
        })
    }

    /// Build a descriptor from introspected column metadata.
    pub fn from_columns(name: &str, columns: &[ColumnMetadata]) -> Result<Self, SchemaError> {
        let fields = columns
            .iter()
            .map(|c| FieldDescriptor::from_column(name, c))
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(name, fields)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn fields(&self) -> &[FieldDescriptor] {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&FieldDescriptor> {
        self.positions.get(name).map(|&i| &self.fields[i])
    }

    /// Position of a field in discovery order.
    pub fn position(&self, name: &str) -> Option<usize> {
        self.positions.get(name).copied()
    }

    pub fn primary_key(&self) -> &FieldDescriptor {
        &self.fields[self.key]
    }

    pub fn primary_key_name(&self) -> &str {
        self.fields[self.key].name()
    }

    pub fn field_names(&self) -> Vec<&str> {
        self.fields.iter().map(|f| f.name()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn users_fields() -> Vec<FieldDescriptor> {
        vec![
            FieldDescriptor::new("id", FieldKind::Integer).auto_increment(),
            FieldDescriptor::new("name", FieldKind::Text),
            FieldDescriptor::new("age", FieldKind::Integer).nullable(),
        ]
    }

    #[test]
    fn test_table_lookup_and_key() -> Result<(), SchemaError> {
        let table = TableDescriptor::new("users", users_fields())?;
        assert_eq!(table.name(), "users");
        assert_eq!(table.primary_key_name(), "id");
        assert_eq!(table.field_names(), vec!["id", "name", "age"]);
        assert_eq!(table.position("age"), Some(2));
        assert_eq!(
            table.field("name").map(|f| f.kind()),
            Some(FieldKind::Text)
        );
        assert!(table.field("missing").is_none());
        Ok(())
    }

    #[test]
    fn test_table_rejects_empty() {
        assert_eq!(
            TableDescriptor::new("t", vec![]),
            Err(SchemaError::EmptyTable {
                table: "t".to_string()
            })
        );
    }

    #[test]
    fn test_table_rejects_missing_key() {
        let fields = vec![FieldDescriptor::new("name", FieldKind::Text)];
        assert!(matches!(
            TableDescriptor::new("t", fields),
            Err(SchemaError::MissingPrimaryKey { .. })
        ));
    }

    #[test]
    fn test_table_rejects_composite_key() {
        let fields = vec![
            FieldDescriptor::new("a", FieldKind::Integer).primary_key(),
            FieldDescriptor::new("b", FieldKind::Integer).primary_key(),
        ];
        match TableDescriptor::new("t", fields) {
            Err(SchemaError::MultiplePrimaryKeys { columns, .. }) => {
                assert_eq!(columns, vec!["a".to_string(), "b".to_string()]);
            }
            other => panic!("expected MultiplePrimaryKeys, got {:?}", other),
        }
    }

    #[test]
    fn test_table_rejects_text_key() {
        let columns = vec![
            ColumnMetadata::new("code", "varchar(8)").primary_key(),
            ColumnMetadata::new("label", "text"),
        ];
        assert_eq!(
            TableDescriptor::from_columns("codes", &columns),
            Err(SchemaError::NonIntegerPrimaryKey {
                table: "codes".to_string(),
                column: "code".to_string(),
                kind: FieldKind::Text,
            })
        );

        let fields = vec![FieldDescriptor::new("ratio", FieldKind::Float64).primary_key()];
        assert!(matches!(
            TableDescriptor::new("t", fields),
            Err(SchemaError::NonIntegerPrimaryKey { kind: FieldKind::Float64, .. })
        ));
    }

    #[test]
    fn test_table_rejects_duplicate_column() {
        let fields = vec![
            FieldDescriptor::new("id", FieldKind::Integer).primary_key(),
            FieldDescriptor::new("id", FieldKind::Text),
        ];
        assert!(matches!(
            TableDescriptor::new("t", fields),
            Err(SchemaError::DuplicateColumn { .. })
        ));
    }

    #[test]
    fn test_from_columns() -> Result<(), SchemaError> {
        let columns = vec![
            ColumnMetadata::new("id", "int(11)").primary_key().auto_increment(),
            ColumnMetadata::new("title", "varchar(255)"),
            ColumnMetadata::new("score", "double").nullable(),
        ];
        let table = TableDescriptor::from_columns("items", &columns)?;
        assert_eq!(table.fields().len(), 3);
        assert!(table.primary_key().is_auto_increment());
        assert_eq!(table.field("score").map(|f| f.kind()), Some(FieldKind::Float64));
        Ok(())
    }
}
