//! Shared application state for Axum routers.

use schemata_storage::QueryExecutor;

/// Application-wide state shared across all routes.
///
/// Built once after the catalog is loaded; never mutated while serving.
#[derive(Debug, Clone)]
pub struct AppState {
    pub executor: QueryExecutor,
}

impl AppState {
    pub fn new(executor: QueryExecutor) -> Self {
        Self { executor }
    }
}

crate::impl_from_ref!(QueryExecutor, executor);
