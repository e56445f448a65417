//! Schemata Core - Schema-Driven Record Model
//!
//! Pure types with no I/O. All other crates depend on this.
//!
//! - Column and table descriptors built from introspected metadata
//! - The immutable schema catalog
//! - Value coercion from loosely-typed request input
//! - The record codec for scanned rows
//! - The statement model and its PostgreSQL rendering

pub mod binding;
pub mod catalog;
pub mod codec;
pub mod coerce;
pub mod error;
pub mod field;
pub mod page;
pub mod statement;
pub mod table;
pub mod value;

pub use binding::{ChangeSet, RequestFields};
pub use catalog::SchemaCatalog;
pub use codec::ScannedValue;
pub use error::{
    CoercionError, ExplorerError, ExplorerResult, IdentifierError, IntrospectionError,
    SchemaError, StoreError, StoreResult,
};
pub use field::{ColumnMetadata, FieldDescriptor, FieldKind};
pub use page::{Page, DEFAULT_LIMIT, DEFAULT_OFFSET};
pub use statement::{Column, Param, Statement};
pub use table::TableDescriptor;
pub use value::{Identifier, Record, Value};
