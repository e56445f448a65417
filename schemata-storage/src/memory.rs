//! In-memory store.
//!
//! Interprets the statement model directly instead of parsing SQL. Rows are
//! kept per table, ordered by an integer primary key.

use ::async_trait::async_trait;
use schemata_core::{
    coerce, statement::{Column, Insert, Select, Update}, ColumnMetadata, FieldDescriptor,
    Identifier, ScannedValue, Statement, StoreError, StoreResult, Value,
};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::RwLock;

use crate::store::{ExecOutcome, SchemaStore};

#[derive(Debug, Clone, Default)]
struct MemTable {
    columns: Vec<ColumnMetadata>,
    rows: BTreeMap<i64, Vec<Value>>,
    last_id: i64,
}

impl MemTable {
    fn position(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.field == name)
    }

    fn key_position(&self, table: &str) -> StoreResult<usize> {
        self.columns
            .iter()
            .position(|c| c.key.eq_ignore_ascii_case("pri"))
            .ok_or_else(|| StoreError::Constraint {
                table: table.to_string(),
                reason: "table has no primary key".to_string(),
            })
    }

    fn positions(&self, table: &str, columns: &[Column]) -> StoreResult<Vec<usize>> {
        columns
            .iter()
            .map(|c| {
                self.position(&c.name).ok_or_else(|| StoreError::Query {
                    reason: format!("column \"{}\" of relation \"{}\" does not exist", c.name, table),
                })
            })
            .collect()
    }

    fn check_not_null(&self, table: &str, pos: usize, value: &Value) -> StoreResult<()> {
        let column = &self.columns[pos];
        if value.is_null() && !column.null.eq_ignore_ascii_case("yes") {
            return Err(StoreError::Constraint {
                table: table.to_string(),
                reason: format!("null value in column \"{}\" violates not-null constraint", column.field),
            });
        }
        Ok(())
    }

    /// Value for a column the insert did not name.
    fn implicit_value(&mut self, table: &str, pos: usize) -> StoreResult<Value> {
        let column = self.columns[pos].clone();
        if column.extra.to_lowercase().contains("auto_increment") {
            self.last_id += 1;
            return Ok(Value::Integer(self.last_id));
        }
        if let Some(default) = &column.default {
            let field = FieldDescriptor::from_column(table, &column).map_err(|e| StoreError::Decode {
                reason: e.to_string(),
            })?;
            return coerce::parse(&field, default).map_err(|e| StoreError::Decode {
                reason: e.to_string(),
            });
        }
        self.check_not_null(table, pos, &Value::Null)?;
        Ok(Value::Null)
    }

    fn scan(&self, row: &[Value], positions: &[usize], columns: &[Column]) -> StoreResult<Vec<ScannedValue>> {
        positions
            .iter()
            .zip(columns)
            .map(|(&pos, column)| {
                ScannedValue::from_value(column.kind, row[pos].clone()).ok_or_else(|| {
                    StoreError::Decode {
                        reason: format!("column \"{}\" does not hold {}", column.name, column.kind),
                    }
                })
            })
            .collect()
    }
}

/// Store backed by in-process maps.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    tables: RwLock<BTreeMap<String, MemTable>>,
    unavailable: AtomicBool,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a table with the given column metadata.
    pub fn with_table(mut self, name: impl Into<String>, columns: Vec<ColumnMetadata>) -> Self {
        self.tables.get_mut().insert(
            name.into(),
            MemTable {
                columns,
                ..MemTable::default()
            },
        );
        self
    }

    /// Make every subsequent call fail as if the connection dropped.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Number of rows currently stored in `table`.
    pub async fn row_count(&self, table: &str) -> usize {
        self.tables
            .read()
            .await
            .get(table)
            .map_or(0, |t| t.rows.len())
    }

    fn ensure_available(&self) -> StoreResult<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(StoreError::Connection {
                reason: "in-memory store marked unavailable".to_string(),
            });
        }
        Ok(())
    }

    fn missing(table: &str) -> StoreError {
        StoreError::Query {
            reason: format!("relation \"{}\" does not exist", table),
        }
    }

    async fn select(&self, s: &Select) -> StoreResult<Vec<Vec<ScannedValue>>> {
        let tables = self.tables.read().await;
        let table = tables.get(&s.table).ok_or_else(|| Self::missing(&s.table))?;
        let positions = table.positions(&s.table, &s.columns)?;

        let rows: Vec<&Vec<Value>> = match (s.filter, s.page) {
            (Some(id), _) => table.rows.get(&id.get()).into_iter().collect(),
            (None, Some(page)) => table
                .rows
                .values()
                .skip(page.offset() as usize)
                .take(page.limit() as usize)
                .collect(),
            (None, None) => table.rows.values().collect(),
        };

        rows.into_iter()
            .map(|row| table.scan(row, &positions, &s.columns))
            .collect()
    }

    async fn insert(&self, s: &Insert) -> StoreResult<ExecOutcome> {
        let mut tables = self.tables.write().await;
        let table = tables.get_mut(&s.table).ok_or_else(|| Self::missing(&s.table))?;
        let key_pos = table.key_position(&s.table)?;
        let named = table.positions(&s.table, &s.columns)?;

        let mut row = Vec::with_capacity(table.columns.len());
        for pos in 0..table.columns.len() {
            let value = match named.iter().position(|&p| p == pos) {
                Some(i) => {
                    let value = s.values[i].clone();
                    table.check_not_null(&s.table, pos, &value)?;
                    value
                }
                None => table.implicit_value(&s.table, pos)?,
            };
            row.push(value);
        }

        let key = match row[key_pos] {
            Value::Integer(key) => key,
            _ => {
                return Err(StoreError::Constraint {
                    table: s.table.clone(),
                    reason: "primary key must be an integer".to_string(),
                })
            }
        };
        if table.rows.contains_key(&key) {
            return Err(StoreError::Constraint {
                table: s.table.clone(),
                reason: format!("duplicate key value {}", key),
            });
        }
        table.last_id = table.last_id.max(key);
        table.rows.insert(key, row);

        Ok(ExecOutcome {
            rows_affected: 1,
            generated_id: s.returning.as_ref().map(|_| Identifier::new(key)),
        })
    }

    async fn update(&self, s: &Update) -> StoreResult<ExecOutcome> {
        let mut tables = self.tables.write().await;
        let table = tables.get_mut(&s.table).ok_or_else(|| Self::missing(&s.table))?;
        let positions = table.positions(&s.table, &s.columns)?;
        for (&pos, value) in positions.iter().zip(&s.values) {
            table.check_not_null(&s.table, pos, value)?;
        }

        let Some(row) = table.rows.get_mut(&s.id.get()) else {
            return Ok(ExecOutcome::default());
        };
        for (&pos, value) in positions.iter().zip(&s.values) {
            row[pos] = value.clone();
        }
        Ok(ExecOutcome {
            rows_affected: 1,
            generated_id: None,
        })
    }
}

#[async_trait]
impl SchemaStore for InMemoryStore {
    async fn list_tables(&self) -> StoreResult<Vec<String>> {
        self.ensure_available()?;
        Ok(self.tables.read().await.keys().cloned().collect())
    }

    async fn describe_table(&self, table: &str) -> StoreResult<Vec<ColumnMetadata>> {
        self.ensure_available()?;
        self.tables
            .read()
            .await
            .get(table)
            .map(|t| t.columns.clone())
            .ok_or_else(|| Self::missing(table))
    }

    async fn fetch(&self, statement: &Statement) -> StoreResult<Vec<Vec<ScannedValue>>> {
        self.ensure_available()?;
        match statement {
            Statement::Select(s) => self.select(s).await,
            Statement::Insert(s) if s.returning.is_some() => {
                let outcome = self.insert(s).await?;
                Ok(outcome
                    .generated_id
                    .map(|id| vec![ScannedValue::Integer(Some(id.get()))])
                    .into_iter()
                    .collect())
            }
            other => Err(StoreError::Query {
                reason: format!("statement returns no rows: {}", other),
            }),
        }
    }

    async fn execute(&self, statement: &Statement) -> StoreResult<ExecOutcome> {
        self.ensure_available()?;
        match statement {
            Statement::Insert(s) => self.insert(s).await,
            Statement::Update(s) => self.update(s).await,
            Statement::Delete(s) => {
                let mut tables = self.tables.write().await;
                let table = tables.get_mut(&s.table).ok_or_else(|| Self::missing(&s.table))?;
                let removed = table.rows.remove(&s.id.get()).is_some();
                Ok(ExecOutcome {
                    rows_affected: u64::from(removed),
                    generated_id: None,
                })
            }
            Statement::Select(_) => Err(StoreError::Query {
                reason: "SELECT must go through fetch".to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use schemata_core::{ChangeSet, Page, TableDescriptor};

    fn users_columns() -> Vec<ColumnMetadata> {
        vec![
            ColumnMetadata::new("id", "int(11)").primary_key().auto_increment(),
            ColumnMetadata::new("name", "text"),
            ColumnMetadata::new("status", "varchar(16)").with_default("active"),
            ColumnMetadata::new("age", "int(11)").nullable(),
        ]
    }

    fn users_table() -> TableDescriptor {
        TableDescriptor::from_columns("users", &users_columns())
            .unwrap_or_else(|e| panic!("users table: {}", e))
    }

    fn store() -> InMemoryStore {
        InMemoryStore::new().with_table("users", users_columns())
    }

    fn insert_name(name: &str) -> Statement {
        let mut changes = ChangeSet::new();
        changes.push("name", Value::from(name));
        Statement::insert(&users_table(), &changes)
            .unwrap_or_else(|e| panic!("insert statement: {}", e))
    }

    #[tokio::test]
    async fn test_introspection() -> StoreResult<()> {
        let store = store().with_table("audit", vec![ColumnMetadata::new("id", "int").primary_key()]);
        assert_eq!(store.list_tables().await?, vec!["audit", "users"]);
        assert_eq!(store.describe_table("users").await?.len(), 4);
        assert!(store.describe_table("nope").await.is_err());
        Ok(())
    }

    #[tokio::test]
    async fn test_insert_assigns_ids_and_defaults() -> StoreResult<()> {
        let store = store();
        let first = store.execute(&insert_name("a")).await?;
        let second = store.execute(&insert_name("b")).await?;
        assert_eq!(first.generated_id, Some(Identifier::new(1)));
        assert_eq!(second.generated_id, Some(Identifier::new(2)));

        let rows = store.fetch(&Statement::get(&users_table(), Identifier::new(2))).await?;
        assert_eq!(
            rows,
            vec![vec![
                ScannedValue::Integer(Some(2)),
                ScannedValue::Text(Some("b".to_string())),
                ScannedValue::Text(Some("active".to_string())),
                ScannedValue::Integer(None),
            ]]
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_insert_enforces_not_null() {
        let store = store();
        let stmt = Statement::insert(&users_table(), &ChangeSet::new())
            .unwrap_or_else(|e| panic!("insert statement: {}", e));
        assert!(matches!(
            store.execute(&stmt).await,
            Err(StoreError::Constraint { .. })
        ));
        assert_eq!(store.row_count("users").await, 0);
    }

    #[tokio::test]
    async fn test_paged_select_is_key_ordered() -> StoreResult<()> {
        let store = store();
        for name in ["a", "b", "c", "d"] {
            store.execute(&insert_name(name)).await?;
        }
        let rows = store.fetch(&Statement::list(&users_table(), Page::new(2, 1))).await?;
        let ids: Vec<_> = rows.iter().map(|r| r[0].clone()).collect();
        assert_eq!(
            ids,
            vec![ScannedValue::Integer(Some(2)), ScannedValue::Integer(Some(3))]
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_update_and_delete_report_affected_rows() -> StoreResult<()> {
        let store = store();
        store.execute(&insert_name("a")).await?;

        let mut changes = ChangeSet::new();
        changes.push("age", Value::Integer(30));
        let hit = Statement::update(&users_table(), Identifier::new(1), &changes)
            .unwrap_or_else(|e| panic!("update: {}", e));
        let miss = Statement::update(&users_table(), Identifier::new(5), &changes)
            .unwrap_or_else(|e| panic!("update: {}", e));
        assert_eq!(store.execute(&hit).await?.rows_affected, 1);
        assert_eq!(store.execute(&miss).await?.rows_affected, 0);

        let delete = Statement::delete(&users_table(), Identifier::new(1));
        assert_eq!(store.execute(&delete).await?.rows_affected, 1);
        assert_eq!(store.execute(&delete).await?.rows_affected, 0);
        Ok(())
    }

    #[tokio::test]
    async fn test_unavailable_store_fails_every_call() {
        let store = store();
        store.set_unavailable(true);
        assert!(matches!(
            store.list_tables().await,
            Err(StoreError::Connection { .. })
        ));
        store.set_unavailable(false);
        assert!(store.list_tables().await.is_ok());
    }
}
