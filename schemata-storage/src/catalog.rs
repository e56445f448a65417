//! Catalog construction from a live store.

use schemata_core::{IntrospectionError, SchemaCatalog};
use tracing::{debug, info};

use crate::store::SchemaStore;

/// Introspect every table in `store` and build the catalog.
///
/// Any query failure or rejected table aborts the whole build; a partial
/// catalog is never returned.
pub async fn load_catalog(store: &dyn SchemaStore) -> Result<SchemaCatalog, IntrospectionError> {
    let names = store.list_tables().await?;
    debug!(count = names.len(), "Discovered tables");

    let mut metadata = Vec::with_capacity(names.len());
    for name in names {
        let columns = store.describe_table(&name).await?;
        debug!(table = %name, columns = columns.len(), "Described table");
        metadata.push((name, columns));
    }

    let catalog = SchemaCatalog::from_metadata(metadata)?;
    info!(tables = ?catalog.table_names(), "Schema catalog loaded");
    Ok(catalog)
}
