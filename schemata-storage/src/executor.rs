//! Query executor: the five record operations over a catalog and a store.

use std::sync::Arc;

use schemata_core::{
    codec, ChangeSet, ExplorerError, ExplorerResult, Identifier, IntrospectionError, Page,
    Record, SchemaCatalog, ScannedValue, Statement, StoreError, TableDescriptor,
};
use tracing::{debug, trace};

use crate::catalog::load_catalog;
use crate::store::SchemaStore;

/// Runs record operations against tables of an immutable catalog.
///
/// Each operation is a single statement; there is no cross-statement
/// transaction and no retry. Cloning shares the catalog and store.
#[derive(Clone)]
pub struct QueryExecutor {
    catalog: Arc<SchemaCatalog>,
    store: Arc<dyn SchemaStore>,
}

impl std::fmt::Debug for QueryExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueryExecutor")
            .field("tables", &self.catalog.table_names())
            .finish_non_exhaustive()
    }
}

impl QueryExecutor {
    pub fn new(catalog: Arc<SchemaCatalog>, store: Arc<dyn SchemaStore>) -> Self {
        Self { catalog, store }
    }

    /// Introspect `store` and build an executor over the resulting catalog.
    pub async fn connect(store: Arc<dyn SchemaStore>) -> Result<Self, IntrospectionError> {
        let catalog = load_catalog(store.as_ref()).await?;
        Ok(Self::new(Arc::new(catalog), store))
    }

    pub fn catalog(&self) -> &SchemaCatalog {
        &self.catalog
    }

    pub fn table_names(&self) -> Vec<&str> {
        self.catalog.table_names()
    }

    /// Resolve a table name, failing with `UnknownTable`.
    pub fn table(&self, name: &str) -> ExplorerResult<&TableDescriptor> {
        self.catalog
            .lookup(name)
            .ok_or_else(|| ExplorerError::unknown_table(name))
    }

    // ========================================================================
    // READS
    // ========================================================================

    /// Rows ordered ascending by primary key, windowed by `page`.
    pub async fn list(&self, table: &str, page: Page) -> ExplorerResult<Vec<Record>> {
        let table = self.table(table)?;
        debug!(
            table = %table.name(),
            limit = page.limit(),
            offset = page.offset(),
            "Listing records"
        );
        let rows = self.fetch(&Statement::list(table, page)).await?;
        Ok(decode_rows(table, rows))
    }

    /// The row whose primary key is `id`, or `None`.
    pub async fn get(&self, table: &str, id: Identifier) -> ExplorerResult<Option<Record>> {
        let table = self.table(table)?;
        debug!(table = %table.name(), %id, "Getting record");
        let rows = self.fetch(&Statement::get(table, id)).await?;
        Ok(decode_rows(table, rows).into_iter().next())
    }

    // ========================================================================
    // WRITES
    // ========================================================================

    /// Delete the row whose primary key is `id`; `false` if none matched.
    pub async fn delete(&self, table: &str, id: Identifier) -> ExplorerResult<bool> {
        let table = self.table(table)?;
        debug!(table = %table.name(), %id, "Deleting record");
        let outcome = self.execute(&Statement::delete(table, id)).await?;
        Ok(outcome.rows_affected > 0)
    }

    /// Insert a row with exactly the fields in `changes`.
    ///
    /// Returns the generated key, or [`Identifier::ZERO`] when the primary key
    /// is not auto-increment.
    pub async fn create(&self, table: &str, changes: &ChangeSet) -> ExplorerResult<Identifier> {
        let table = self.table(table)?;
        debug!(table = %table.name(), fields = ?changes.names(), "Creating record");
        let statement = Statement::insert(table, changes)?;

        if !table.primary_key().is_auto_increment() {
            self.execute(&statement).await?;
            return Ok(Identifier::ZERO);
        }

        let rows = self.fetch(&statement).await?;
        match rows.into_iter().next().and_then(|row| row.into_iter().next()) {
            Some(ScannedValue::Integer(Some(id))) => Ok(Identifier::new(id)),
            other => Err(StoreError::Decode {
                reason: format!("insert into {} returned no key: {:?}", table.name(), other),
            }
            .into()),
        }
    }

    /// Set the fields in `changes` on the row whose primary key is `id`.
    ///
    /// An empty change set issues no UPDATE and reports whether the row exists.
    pub async fn update(
        &self,
        table: &str,
        id: Identifier,
        changes: &ChangeSet,
    ) -> ExplorerResult<bool> {
        let table = self.table(table)?;
        debug!(table = %table.name(), %id, fields = ?changes.names(), "Updating record");

        if changes.is_empty() {
            let rows = self.fetch(&Statement::get(table, id)).await?;
            return Ok(!rows.is_empty());
        }

        let outcome = self.execute(&Statement::update(table, id, changes)?).await?;
        Ok(outcome.rows_affected > 0)
    }

    async fn fetch(&self, statement: &Statement) -> ExplorerResult<Vec<Vec<ScannedValue>>> {
        trace!(sql = %statement, "fetch");
        Ok(self.store.fetch(statement).await?)
    }

    async fn execute(&self, statement: &Statement) -> ExplorerResult<crate::ExecOutcome> {
        trace!(sql = %statement, "execute");
        Ok(self.store.execute(statement).await?)
    }
}

fn decode_rows(table: &TableDescriptor, rows: Vec<Vec<ScannedValue>>) -> Vec<Record> {
    let names = table.field_names();
    rows.into_iter().map(|row| codec::decode(&names, row)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::InMemoryStore;
    use schemata_core::{ColumnMetadata, Value};

    async fn executor() -> QueryExecutor {
        let store = InMemoryStore::new()
            .with_table(
                "users",
                vec![
                    ColumnMetadata::new("id", "int(11)").primary_key().auto_increment(),
                    ColumnMetadata::new("name", "text"),
                    ColumnMetadata::new("age", "int(11)").nullable(),
                ],
            )
            .with_table(
                "tags",
                vec![
                    ColumnMetadata::new("code", "bigint").primary_key(),
                    ColumnMetadata::new("weight", "double precision").with_default("1.5"),
                ],
            );
        QueryExecutor::connect(Arc::new(store))
            .await
            .unwrap_or_else(|e| panic!("catalog: {}", e))
    }

    fn named(name: &str) -> ChangeSet {
        let mut changes = ChangeSet::new();
        changes.push("name", Value::from(name));
        changes
    }

    #[tokio::test]
    async fn test_unknown_table_is_rejected_before_any_statement() {
        let exec = executor().await;
        let err = exec.list("nope", Page::default()).await.err();
        assert!(matches!(err, Some(ExplorerError::UnknownTable { .. })));
        let err = exec.delete("nope", Identifier::new(1)).await.err();
        assert!(matches!(err, Some(ExplorerError::UnknownTable { .. })));
    }

    #[tokio::test]
    async fn test_create_then_get() -> ExplorerResult<()> {
        let exec = executor().await;
        let id = exec.create("users", &named("Alice")).await?;
        assert_eq!(id, Identifier::new(1));

        let record = exec.get("users", id).await?.unwrap_or_else(|| panic!("missing"));
        assert_eq!(record.get("id"), Some(&Value::Integer(1)));
        assert_eq!(record.get("name"), Some(&Value::from("Alice")));
        assert_eq!(record.get("age"), Some(&Value::Null));
        Ok(())
    }

    #[tokio::test]
    async fn test_create_without_auto_increment_returns_zero() -> ExplorerResult<()> {
        let exec = executor().await;
        let mut changes = ChangeSet::new();
        changes.push("code", Value::Integer(42));
        let id = exec.create("tags", &changes).await?;
        assert!(id.is_zero());

        let record = exec
            .get("tags", Identifier::new(42))
            .await?
            .unwrap_or_else(|| panic!("missing"));
        assert_eq!(record.get("weight"), Some(&Value::Float64(1.5)));
        Ok(())
    }

    #[tokio::test]
    async fn test_get_missing_is_none() -> ExplorerResult<()> {
        let exec = executor().await;
        assert!(exec.get("users", Identifier::new(9)).await?.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn test_update_touches_only_named_fields() -> ExplorerResult<()> {
        let exec = executor().await;
        let id = exec.create("users", &named("Alice")).await?;

        let mut changes = ChangeSet::new();
        changes.push("age", Value::Integer(30));
        assert!(exec.update("users", id, &changes).await?);
        assert!(!exec.update("users", Identifier::new(77), &changes).await?);

        let record = exec.get("users", id).await?.unwrap_or_else(|| panic!("missing"));
        assert_eq!(record.get("name"), Some(&Value::from("Alice")));
        assert_eq!(record.get("age"), Some(&Value::Integer(30)));
        Ok(())
    }

    #[tokio::test]
    async fn test_empty_update_reports_existence() -> ExplorerResult<()> {
        let exec = executor().await;
        let id = exec.create("users", &named("Alice")).await?;
        assert!(exec.update("users", id, &ChangeSet::new()).await?);
        assert!(!exec.update("users", Identifier::new(2), &ChangeSet::new()).await?);
        Ok(())
    }

    #[tokio::test]
    async fn test_delete_reports_removal() -> ExplorerResult<()> {
        let exec = executor().await;
        let id = exec.create("users", &named("Alice")).await?;
        assert!(exec.delete("users", id).await?);
        assert!(!exec.delete("users", id).await?);
        assert!(exec.get("users", id).await?.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn test_store_failure_surfaces_as_store_error() {
        let store = Arc::new(InMemoryStore::new().with_table(
            "users",
            vec![ColumnMetadata::new("id", "int").primary_key().auto_increment()],
        ));
        let exec = QueryExecutor::connect(store.clone())
            .await
            .unwrap_or_else(|e| panic!("catalog: {}", e));
        store.set_unavailable(true);
        assert!(matches!(
            exec.list("users", Page::default()).await,
            Err(ExplorerError::Store(StoreError::Connection { .. }))
        ));
    }
}
