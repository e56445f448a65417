//! Property-Based Tests for the Query Executor
//!
//! Runs the executor over an `InMemoryStore` holding
//! `people(id auto_increment pk, name text, age int null, score double null)`.
//!
//! - List is ordered ascending by primary key and never longer than its limit
//! - Create then Get round-trips every supplied field
//! - Delete reports removal exactly once

use std::sync::Arc;

use proptest::prelude::*;
use schemata_core::{ChangeSet, ColumnMetadata, Identifier, Page, Value};
use schemata_storage::{InMemoryStore, QueryExecutor};
use tokio::runtime::Runtime;

// ============================================================================
// TEST CONFIGURATION
// ============================================================================

fn test_runtime() -> Result<Runtime, TestCaseError> {
    Runtime::new().map_err(|e| TestCaseError::fail(format!("Failed to create runtime: {}", e)))
}

fn people_columns() -> Vec<ColumnMetadata> {
    vec![
        ColumnMetadata::new("id", "int(11)").primary_key().auto_increment(),
        ColumnMetadata::new("name", "varchar(255)"),
        ColumnMetadata::new("age", "int(11)").nullable(),
        ColumnMetadata::new("score", "double").nullable(),
    ]
}

async fn test_executor() -> Result<QueryExecutor, TestCaseError> {
    let store = InMemoryStore::new().with_table("people", people_columns());
    QueryExecutor::connect(Arc::new(store))
        .await
        .map_err(|e| TestCaseError::fail(format!("Failed to load catalog: {}", e)))
}

#[derive(Debug, Clone)]
struct Person {
    name: String,
    age: Option<i64>,
    score: Option<f64>,
}

impl Person {
    fn changes(&self) -> ChangeSet {
        let mut changes = ChangeSet::new();
        changes.push("name", Value::from(self.name.as_str()));
        changes.push("age", self.age.map_or(Value::Null, Value::Integer));
        changes.push("score", self.score.map_or(Value::Null, Value::Float64));
        changes
    }
}

// ============================================================================
// PROPERTY TEST STRATEGIES
// ============================================================================

fn person_strategy() -> impl Strategy<Value = Person> {
    (
        "[A-Za-z][a-z ]{0,30}",
        proptest::option::of(any::<i64>()),
        proptest::option::of(-1.0e9f64..1.0e9),
    )
        .prop_map(|(name, age, score)| Person { name, age, score })
}

// ============================================================================
// PROPERTIES
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_list_is_ordered_and_bounded(
        rows in 0usize..20,
        limit in 1u32..10,
        offset in 0u32..25,
    ) {
        let rt = test_runtime()?;
        rt.block_on(async {
            let exec = test_executor().await?;
            for i in 0..rows {
                let person = Person { name: format!("p{}", i), age: None, score: None };
                exec.create("people", &person.changes())
                    .await
                    .map_err(|e| TestCaseError::fail(e.to_string()))?;
            }

            let records = exec
                .list("people", Page::new(limit, offset))
                .await
                .map_err(|e| TestCaseError::fail(e.to_string()))?;
            prop_assert!(records.len() <= limit as usize);

            let ids: Vec<i64> = records
                .iter()
                .filter_map(|r| match r.get("id") {
                    Some(Value::Integer(id)) => Some(*id),
                    _ => None,
                })
                .collect();
            prop_assert_eq!(ids.len(), records.len());
            prop_assert!(ids.windows(2).all(|w| w[0] < w[1]));

            let expected = rows.saturating_sub(offset as usize).min(limit as usize);
            prop_assert_eq!(records.len(), expected);
            Ok::<(), TestCaseError>(())
        })?;
    }

    #[test]
    fn prop_default_page_matches_explicit_defaults(rows in 0usize..12) {
        let rt = test_runtime()?;
        rt.block_on(async {
            let exec = test_executor().await?;
            for i in 0..rows {
                let person = Person { name: format!("p{}", i), age: Some(i as i64), score: None };
                exec.create("people", &person.changes())
                    .await
                    .map_err(|e| TestCaseError::fail(e.to_string()))?;
            }

            let defaulted = exec
                .list("people", Page::from_params(None, None))
                .await
                .map_err(|e| TestCaseError::fail(e.to_string()))?;
            let explicit = exec
                .list("people", Page::new(5, 0))
                .await
                .map_err(|e| TestCaseError::fail(e.to_string()))?;
            prop_assert_eq!(defaulted, explicit);
            Ok::<(), TestCaseError>(())
        })?;
    }

    #[test]
    fn prop_create_get_round_trip(person in person_strategy()) {
        let rt = test_runtime()?;
        rt.block_on(async {
            let exec = test_executor().await?;
            let id = exec
                .create("people", &person.changes())
                .await
                .map_err(|e| TestCaseError::fail(e.to_string()))?;
            prop_assert_eq!(id, Identifier::new(1));

            let record = exec
                .get("people", id)
                .await
                .map_err(|e| TestCaseError::fail(e.to_string()))?
                .ok_or_else(|| TestCaseError::fail("created record not found"))?;

            prop_assert_eq!(record.get("id"), Some(&Value::Integer(1)));
            prop_assert_eq!(record.get("name"), Some(&Value::from(person.name.as_str())));
            prop_assert_eq!(record.get("age"), Some(&person.age.map_or(Value::Null, Value::Integer)));
            prop_assert_eq!(record.get("score"), Some(&person.score.map_or(Value::Null, Value::Float64)));
            Ok::<(), TestCaseError>(())
        })?;
    }

    #[test]
    fn prop_delete_removes_exactly_once(person in person_strategy(), missing in 2i64..1000) {
        let rt = test_runtime()?;
        rt.block_on(async {
            let exec = test_executor().await?;
            let id = exec
                .create("people", &person.changes())
                .await
                .map_err(|e| TestCaseError::fail(e.to_string()))?;

            let absent = exec
                .delete("people", Identifier::new(missing))
                .await
                .map_err(|e| TestCaseError::fail(e.to_string()))?;
            prop_assert!(!absent);

            let first = exec.delete("people", id).await.map_err(|e| TestCaseError::fail(e.to_string()))?;
            let second = exec.delete("people", id).await.map_err(|e| TestCaseError::fail(e.to_string()))?;
            prop_assert!(first);
            prop_assert!(!second);

            let after = exec.get("people", id).await.map_err(|e| TestCaseError::fail(e.to_string()))?;
            prop_assert!(after.is_none());
            Ok::<(), TestCaseError>(())
        })?;
    }
}
