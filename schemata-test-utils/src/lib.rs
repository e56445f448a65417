//! Schemata Test Utilities
//!
//! Shared test infrastructure for the Schemata workspace:
//! - Proptest generators for descriptors, values and request input
//! - Fixtures for the `users` scenario schema and seeded stores
//! - Assertions for explorer results

pub use schemata_storage::{InMemoryStore, QueryExecutor};

pub use schemata_core::{
    ChangeSet, ColumnMetadata, ExplorerError, ExplorerResult, FieldDescriptor, FieldKind,
    Identifier, Page, Record, RequestFields, SchemaCatalog, TableDescriptor, Value,
};

// ============================================================================
// PROPTEST GENERATORS
// ============================================================================

pub mod generators {
    //! Proptest strategies for Schemata types.

    use super::*;
    use proptest::prelude::*;
    use serde_json::Value as JsonValue;

    /// Any of the three served kinds.
    pub fn arb_field_kind() -> impl Strategy<Value = FieldKind> {
        prop_oneof![
            Just(FieldKind::Integer),
            Just(FieldKind::Text),
            Just(FieldKind::Float64),
        ]
    }

    /// A declared SQL type string that classifies as `kind`.
    pub fn arb_declared_type(kind: FieldKind) -> BoxedStrategy<String> {
        let names: &'static [&'static str] = match kind {
            FieldKind::Integer => &["int", "int(11)", "bigint", "smallint", "tinyint(1)", "integer"],
            FieldKind::Text => &["text", "varchar(255)", "char(8)", "character varying", "longtext"],
            FieldKind::Float64 => &["float", "double", "real", "double precision"],
        };
        proptest::sample::select(names).prop_map(str::to_string).boxed()
    }

    /// Column name safe to use as an identifier.
    pub fn arb_column_name() -> impl Strategy<Value = String> {
        "[a-z][a-z0-9_]{0,15}"
    }

    /// A non-key field descriptor.
    pub fn arb_field_descriptor() -> impl Strategy<Value = FieldDescriptor> {
        (arb_column_name(), arb_field_kind(), any::<bool>(), any::<bool>()).prop_map(
            |(name, kind, nullable, has_default)| {
                let mut field = FieldDescriptor::new(name, kind);
                if nullable {
                    field = field.nullable();
                }
                if has_default {
                    field = field.with_default();
                }
                field
            },
        )
    }

    /// A native non-null value of `kind`.
    pub fn arb_value(kind: FieldKind) -> BoxedStrategy<Value> {
        match kind {
            FieldKind::Integer => any::<i64>().prop_map(Value::Integer).boxed(),
            FieldKind::Text => "[ -~]{0,40}".prop_map(Value::Text).boxed(),
            FieldKind::Float64 => (-1.0e12f64..1.0e12).prop_map(Value::Float64).boxed(),
        }
    }

    /// JSON input that must coerce to a value of `kind`.
    pub fn arb_json_for_kind(kind: FieldKind) -> BoxedStrategy<JsonValue> {
        match kind {
            FieldKind::Integer => prop_oneof![
                any::<i64>().prop_map(JsonValue::from),
                (-(1i64 << 52)..(1i64 << 52)).prop_map(|n| JsonValue::from(n as f64)),
            ]
            .boxed(),
            FieldKind::Text => "[ -~]{0,40}".prop_map(JsonValue::from).boxed(),
            FieldKind::Float64 => (-1.0e12f64..1.0e12).prop_map(JsonValue::from).boxed(),
        }
    }

    /// A `users` row body as JSON: a name and an optional age.
    pub fn arb_user_body() -> impl Strategy<Value = JsonValue> {
        ("[A-Za-z][A-Za-z ]{0,20}", proptest::option::of(0i64..130)).prop_map(|(name, age)| {
            let mut body = serde_json::Map::new();
            body.insert("name".to_string(), JsonValue::from(name));
            if let Some(age) = age {
                body.insert("age".to_string(), JsonValue::from(age));
            }
            JsonValue::Object(body)
        })
    }

    /// A window that is always accepted by `Page::new`.
    pub fn arb_page() -> impl Strategy<Value = Page> {
        (1u32..20, 0u32..40).prop_map(|(limit, offset)| Page::new(limit, offset))
    }
}

// ============================================================================
// TEST FIXTURES
// ============================================================================

pub mod fixtures {
    //! Pre-built schemas and stores.

    use super::*;
    use std::sync::Arc;

    /// `users(id int auto_increment pk, name text not null, age int null)`.
    pub fn users_columns() -> Vec<ColumnMetadata> {
        vec![
            ColumnMetadata::new("id", "int(11)").primary_key().auto_increment(),
            ColumnMetadata::new("name", "text"),
            ColumnMetadata::new("age", "int(11)").nullable(),
        ]
    }

    /// `products(sku bigint pk, title varchar not null, price double default 9.99,
    /// stock int null)`; the key is supplied by the caller.
    pub fn products_columns() -> Vec<ColumnMetadata> {
        vec![
            ColumnMetadata::new("sku", "bigint").primary_key(),
            ColumnMetadata::new("title", "varchar(120)"),
            ColumnMetadata::new("price", "double").with_default("9.99"),
            ColumnMetadata::new("stock", "int(11)").nullable(),
        ]
    }

    pub fn users_table() -> TableDescriptor {
        TableDescriptor::from_columns("users", &users_columns())
            .unwrap_or_else(|e| panic!("users fixture rejected: {}", e))
    }

    pub fn products_table() -> TableDescriptor {
        TableDescriptor::from_columns("products", &products_columns())
            .unwrap_or_else(|e| panic!("products fixture rejected: {}", e))
    }

    /// Catalog holding `products` and `users`, in store order.
    pub fn scenario_catalog() -> SchemaCatalog {
        SchemaCatalog::from_tables(vec![products_table(), users_table()])
            .unwrap_or_else(|e| panic!("scenario catalog rejected: {}", e))
    }

    /// Empty store with the `users` and `products` tables.
    pub fn scenario_store() -> InMemoryStore {
        InMemoryStore::new()
            .with_table("users", users_columns())
            .with_table("products", products_columns())
    }

    /// Executor over [`scenario_store`].
    pub async fn scenario_executor() -> QueryExecutor {
        executor_over(Arc::new(scenario_store())).await
    }

    /// Executor over `store`; the catalog is introspected from it.
    pub async fn executor_over(store: Arc<InMemoryStore>) -> QueryExecutor {
        QueryExecutor::connect(store)
            .await
            .unwrap_or_else(|e| panic!("fixture catalog rejected: {}", e))
    }

    /// Executor whose `users` table holds `count` rows named `user-1..`.
    pub async fn seeded_executor(count: usize) -> QueryExecutor {
        let executor = scenario_executor().await;
        for i in 1..=count {
            let mut changes = ChangeSet::new();
            changes.push("name", Value::from(format!("user-{}", i)));
            changes.push("age", Value::Integer(20 + i as i64));
            executor
                .create("users", &changes)
                .await
                .unwrap_or_else(|e| panic!("seeding users failed: {}", e));
        }
        executor
    }
}

// ============================================================================
// CUSTOM ASSERTIONS
// ============================================================================

pub mod assertions {
    //! Assertions for explorer results.

    use super::*;

    /// Assert that the result failed with `UnknownTable`.
    #[track_caller]
    pub fn assert_unknown_table<T: std::fmt::Debug>(result: &ExplorerResult<T>) {
        match result {
            Err(ExplorerError::UnknownTable { .. }) => {}
            other => panic!("Expected UnknownTable, got: {:?}", other),
        }
    }

    /// Assert that the result failed with an invalid type for `field`.
    #[track_caller]
    pub fn assert_invalid_field<T: std::fmt::Debug>(result: &ExplorerResult<T>, field: &str) {
        match result {
            Err(ExplorerError::InvalidFieldType { field: f }) => assert_eq!(f, field),
            Err(ExplorerError::Coercion(e)) => assert_eq!(e.field(), field),
            other => panic!("Expected invalid type for {}, got: {:?}", field, other),
        }
    }

    /// Assert that the result failed because `field` is required.
    #[track_caller]
    pub fn assert_field_required<T: std::fmt::Debug>(result: &ExplorerResult<T>, field: &str) {
        match result {
            Err(ExplorerError::FieldRequired { field: f }) => assert_eq!(f, field),
            other => panic!("Expected FieldRequired for {}, got: {:?}", field, other),
        }
    }

    /// Assert that record ids ascend strictly.
    #[track_caller]
    pub fn assert_ascending_keys(records: &[Record], key: &str) {
        let keys: Vec<i64> = records
            .iter()
            .map(|r| match r.get(key) {
                Some(Value::Integer(id)) => *id,
                other => panic!("Record key {} is not an integer: {:?}", key, other),
            })
            .collect();
        assert!(
            keys.windows(2).all(|w| w[0] < w[1]),
            "Keys are not ascending: {:?}",
            keys
        );
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_scenario_catalog_fixture() {
        let catalog = fixtures::scenario_catalog();
        assert_eq!(catalog.table_names(), vec!["products", "users"]);
        assert_eq!(fixtures::users_table().primary_key_name(), "id");
        assert!(!fixtures::products_table().primary_key().is_auto_increment());
    }

    #[tokio::test]
    async fn test_seeded_executor_fixture() -> ExplorerResult<()> {
        let executor = fixtures::seeded_executor(3).await;
        let records = executor.list("users", Page::new(10, 0)).await?;
        assert_eq!(records.len(), 3);
        assertions::assert_ascending_keys(&records, "id");
        Ok(())
    }

    #[tokio::test]
    async fn test_assertion_unknown_table() {
        let executor = fixtures::scenario_executor().await;
        let result = executor.get("orders", Identifier::new(1)).await;
        assertions::assert_unknown_table(&result);
    }

    #[test]
    fn test_assertion_field_required() {
        let result = ChangeSet::for_insert(&fixtures::users_table(), &RequestFields::default());
        assertions::assert_field_required(&result, "name");
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(50))]

        #[test]
        fn prop_declared_type_classifies_to_its_kind(
            (kind, declared) in generators::arb_field_kind()
                .prop_flat_map(|k| (Just(k), generators::arb_declared_type(k)))
        ) {
            prop_assert_eq!(FieldKind::classify(&declared), Some(kind));
        }

        #[test]
        fn prop_generated_value_fits_kind(
            (kind, value) in generators::arb_field_kind()
                .prop_flat_map(|k| (Just(k), generators::arb_value(k)))
        ) {
            prop_assert!(value.fits(kind));
        }

        #[test]
        fn prop_generated_user_body_binds(body in generators::arb_user_body()) {
            let fields = match body {
                serde_json::Value::Object(map) => RequestFields::Json(map),
                other => return Err(TestCaseError::fail(format!("not an object: {}", other))),
            };
            let changes = ChangeSet::for_insert(&fixtures::users_table(), &fields);
            prop_assert!(changes.is_ok());
        }
    }
}
