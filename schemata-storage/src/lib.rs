//! Schemata Storage - Store Trait, In-Memory Store and Query Executor
//!
//! Defines the store abstraction the catalog is introspected from and
//! statements are executed against. The PostgreSQL implementation lives in
//! schemata-api.

pub mod catalog;
pub mod executor;
pub mod memory;
pub mod store;

pub use catalog::load_catalog;
pub use executor::QueryExecutor;
pub use memory::InMemoryStore;
pub use store::{ExecOutcome, SchemaStore};
