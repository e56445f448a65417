//! Async store trait for introspection and statement execution.
//!
//! Implementations wrap a concrete backend. Every call may block on I/O;
//! none of them retry or impose timeouts of their own.

use ::async_trait::async_trait;
use schemata_core::{ColumnMetadata, Identifier, ScannedValue, Statement, StoreResult};

/// Outcome of a statement that does not return rows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExecOutcome {
    /// Rows inserted, updated or deleted
    pub rows_affected: u64,
    /// Key assigned by the auto-increment mechanism, if any
    pub generated_id: Option<Identifier>,
}

/// Backing store for the schema catalog and the query executor.
#[async_trait]
pub trait SchemaStore: Send + Sync {
    // ========================================================================
    // INTROSPECTION
    // ========================================================================

    /// Names of all tables, in discovery order.
    async fn list_tables(&self) -> StoreResult<Vec<String>>;

    /// Full column metadata for one table, in column order.
    async fn describe_table(&self, table: &str) -> StoreResult<Vec<ColumnMetadata>>;

    // ========================================================================
    // STATEMENTS
    // ========================================================================

    /// Run a row-returning statement; one scanned value per result column.
    async fn fetch(&self, statement: &Statement) -> StoreResult<Vec<Vec<ScannedValue>>>;

    /// Run a statement for its effect.
    async fn execute(&self, statement: &Statement) -> StoreResult<ExecOutcome>;
}
