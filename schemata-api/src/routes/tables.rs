//! Table and record handlers.
//!
//! Each handler resolves the table first, so an unknown table is reported
//! before a bad id, a bad body, or an unsupported method.

use axum::{
    extract::{rejection::QueryRejection, Query, State},
    Json,
};
use schemata_core::{ChangeSet, ExplorerError, Identifier, Page, Record};
use schemata_storage::QueryExecutor;
use serde::Serialize;
use serde_json::{Map, Value as JsonValue};

use crate::error::{ApiError, ApiResult};
use crate::extractors::{ApiPath, FieldInput};

// ============================================================================
// RESPONSE TYPES
// ============================================================================

/// Success envelope: `{"response": ...}`.
#[derive(Debug, Serialize)]
pub struct Envelope<T> {
    pub response: T,
}

impl<T> Envelope<T> {
    fn json(response: T) -> Json<Self> {
        Json(Self { response })
    }
}

#[derive(Debug, Serialize)]
pub struct TablesResponse {
    pub tables: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct RecordsResponse {
    pub records: Vec<Record>,
}

#[derive(Debug, Serialize)]
pub struct RecordResponse {
    pub record: Record,
}

#[derive(Debug, Serialize)]
pub struct UpdatedResponse {
    pub updated: u8,
}

#[derive(Debug, Serialize)]
pub struct DeletedResponse {
    pub deleted: u8,
}

/// Raw paging parameters; invalid values fall back to defaults.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct PageParams {
    pub limit: Option<String>,
    pub offset: Option<String>,
}

impl PageParams {
    /// Take the first occurrence of each key; later repeats are ignored.
    pub fn from_pairs(pairs: Vec<(String, String)>) -> Self {
        let mut params = Self::default();
        for (key, value) in pairs {
            let slot = match key.as_str() {
                "limit" => &mut params.limit,
                "offset" => &mut params.offset,
                _ => continue,
            };
            if slot.is_none() {
                *slot = Some(value);
            }
        }
        params
    }

    pub fn page(&self) -> Page {
        Page::from_params(self.limit.as_deref(), self.offset.as_deref())
    }
}

/// Parse a record id path segment.
pub fn parse_id(raw: &str) -> ApiResult<Identifier> {
    raw.parse::<Identifier>()
        .map_err(|e| ApiError::from(ExplorerError::from(e)))
}

// ============================================================================
// HANDLERS
// ============================================================================

/// GET /
pub async fn list_tables(State(executor): State<QueryExecutor>) -> Json<Envelope<TablesResponse>> {
    let tables = executor
        .table_names()
        .into_iter()
        .map(str::to_string)
        .collect();
    Envelope::json(TablesResponse { tables })
}

/// GET /{table}?limit=&offset=
pub async fn list_records(
    State(executor): State<QueryExecutor>,
    ApiPath(table): ApiPath<String>,
    query: Result<Query<Vec<(String, String)>>, QueryRejection>,
) -> ApiResult<Json<Envelope<RecordsResponse>>> {
    let params = match query {
        Ok(Query(pairs)) => PageParams::from_pairs(pairs),
        Err(rejection) => {
            tracing::debug!(
                reason = %rejection.body_text(),
                "Unreadable query string, using default page"
            );
            PageParams::default()
        }
    };
    let records = executor.list(&table, params.page()).await?;
    Ok(Envelope::json(RecordsResponse { records }))
}

/// PUT /{table}
///
/// Responds with the generated key under the primary-key field name.
pub async fn create_record(
    State(executor): State<QueryExecutor>,
    ApiPath(table): ApiPath<String>,
    input: FieldInput,
) -> ApiResult<Json<Envelope<Map<String, JsonValue>>>> {
    let descriptor = executor.table(&table)?;
    let fields = input.into_fields()?;
    let changes = ChangeSet::for_insert(descriptor, &fields)?;
    let id = executor.create(&table, &changes).await?;

    let mut created = Map::new();
    created.insert(
        descriptor.primary_key_name().to_string(),
        JsonValue::from(id.get()),
    );
    Ok(Envelope::json(created))
}

/// GET /{table}/{id}
pub async fn get_record(
    State(executor): State<QueryExecutor>,
    ApiPath((table, raw_id)): ApiPath<(String, String)>,
) -> ApiResult<Json<Envelope<RecordResponse>>> {
    executor.table(&table)?;
    let id = parse_id(&raw_id)?;
    let record = executor
        .get(&table, id)
        .await?
        .ok_or_else(ApiError::record_not_found)?;
    Ok(Envelope::json(RecordResponse { record }))
}

/// POST /{table}/{id}
pub async fn update_record(
    State(executor): State<QueryExecutor>,
    ApiPath((table, raw_id)): ApiPath<(String, String)>,
    input: FieldInput,
) -> ApiResult<Json<Envelope<UpdatedResponse>>> {
    let descriptor = executor.table(&table)?;
    let id = parse_id(&raw_id)?;
    let fields = input.into_fields()?;
    let changes = ChangeSet::for_update(descriptor, &fields)?;
    let updated = executor.update(&table, id, &changes).await?;
    Ok(Envelope::json(UpdatedResponse {
        updated: u8::from(updated),
    }))
}

/// DELETE /{table}/{id}
pub async fn delete_record(
    State(executor): State<QueryExecutor>,
    ApiPath((table, raw_id)): ApiPath<(String, String)>,
) -> ApiResult<Json<Envelope<DeletedResponse>>> {
    executor.table(&table)?;
    let id = parse_id(&raw_id)?;
    let deleted = executor.delete(&table, id).await?;
    Ok(Envelope::json(DeletedResponse {
        deleted: u8::from(deleted),
    }))
}

// ============================================================================
// FALLBACKS
// ============================================================================

pub async fn root_method_not_allowed() -> ApiError {
    ApiError::method_not_allowed()
}

pub async fn table_method_not_allowed(
    State(executor): State<QueryExecutor>,
    ApiPath(table): ApiPath<String>,
) -> ApiError {
    match executor.table(&table) {
        Ok(_) => ApiError::method_not_allowed(),
        Err(e) => e.into(),
    }
}

pub async fn record_method_not_allowed(
    State(executor): State<QueryExecutor>,
    ApiPath((table, _id)): ApiPath<(String, String)>,
) -> ApiError {
    match executor.table(&table) {
        Ok(_) => ApiError::method_not_allowed(),
        Err(e) => e.into(),
    }
}

pub async fn unknown_path() -> ApiError {
    ApiError::unknown_path()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;

    #[test]
    fn test_parse_id() {
        assert_eq!(parse_id("42").ok(), Some(Identifier::new(42)));
        for raw in ["0", "-1", "abc", "1.5", ""] {
            assert_eq!(parse_id(raw).err().map(|e| e.code), Some(ErrorCode::InvalidId), "{}", raw);
        }
    }

    #[test]
    fn test_page_params_fall_back_to_defaults() {
        let params = PageParams {
            limit: Some("ten".to_string()),
            offset: None,
        };
        assert_eq!(params.page(), Page::default());

        let params = PageParams {
            limit: Some("10".to_string()),
            offset: Some("20".to_string()),
        };
        assert_eq!(params.page(), Page::new(10, 20));
    }

    #[test]
    fn test_page_params_take_first_occurrence() {
        let pairs = vec![
            ("limit".to_string(), "2".to_string()),
            ("sort".to_string(), "name".to_string()),
            ("limit".to_string(), "3".to_string()),
            ("offset".to_string(), "4".to_string()),
            ("offset".to_string(), "x".to_string()),
        ];
        let params = PageParams::from_pairs(pairs);
        assert_eq!(params.limit.as_deref(), Some("2"));
        assert_eq!(params.offset.as_deref(), Some("4"));
        assert_eq!(params.page(), Page::new(2, 4));
    }
}
