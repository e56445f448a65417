//! The schema catalog: every served table, built once at startup.

use std::collections::HashMap;

use crate::error::SchemaError;
use crate::field::ColumnMetadata;
use crate::table::TableDescriptor;

/// Immutable snapshot of the discovered tables.
///
/// Built before traffic starts and shared read-only afterwards, so it needs
/// no interior locking.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SchemaCatalog {
    tables: Vec<TableDescriptor>,
    index: HashMap<String, usize>,
}

impl SchemaCatalog {
    pub fn from_tables(tables: Vec<TableDescriptor>) -> Result<Self, SchemaError> {
        let mut index = HashMap::with_capacity(tables.len());
        for (i, table) in tables.iter().enumerate() {
            if index.insert(table.name().to_string(), i).is_some() {
                return Err(SchemaError::DuplicateTable {
                    table: table.name().to_string(),
                });
            }
        }
        Ok(Self { tables, index })
    }

    /// Build the catalog from `(table name, column metadata)` pairs in
    /// discovery order.
    pub fn from_metadata<I>(metadata: I) -> Result<Self, SchemaError>
    where
        I: IntoIterator<Item = (String, Vec<ColumnMetadata>)>,
    {
        let tables = metadata
            .into_iter()
            .map(|(name, columns)| TableDescriptor::from_columns(&name, &columns))
            .collect::<Result<Vec<_>, _>>()?;
        Self::from_tables(tables)
    }

    pub fn table_names(&self) -> Vec<&str> {
        self.tables.iter().map(|t| t.name()).collect()
    }

    pub fn lookup(&self, name: &str) -> Option<&TableDescriptor> {
        self.index.get(name).map(|&i| &self.tables[i])
    }

    pub fn tables(&self) -> &[TableDescriptor] {
        &self.tables
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}
