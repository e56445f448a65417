//! Database Connection Pool and PostgreSQL Store
//!
//! Connection pooling uses deadpool-postgres. `PgStore` implements
//! `SchemaStore` on top of the pool: introspection reads
//! `information_schema`, statements run exactly as the statement model
//! renders them.

use ::async_trait::async_trait;
use deadpool_postgres::{
    Config, ManagerConfig, Pool, PoolConfig, RecyclingMethod, Runtime, Timeouts,
};
use schemata_core::{
    ColumnMetadata, FieldKind, Param, ScannedValue, Statement, StoreError, StoreResult, Value,
};
use schemata_storage::{ExecOutcome, SchemaStore};
use std::time::Duration;
use tokio_postgres::{types::ToSql, NoTls, Row};

use crate::config::{process_env, required, var_or, ConfigError};
use crate::error::{ApiError, ApiResult};

// ============================================================================
// CONNECTION POOL CONFIGURATION
// ============================================================================

/// Database connection pool configuration.
#[derive(Debug, Clone)]
pub struct DbConfig {
    /// PostgreSQL host
    pub host: String,
    /// PostgreSQL port
    pub port: u16,
    /// Database name
    pub dbname: String,
    /// Database user
    pub user: String,
    /// Database password
    pub password: String,
    /// Schema whose tables are served
    pub schema: String,
    /// Maximum pool size
    pub max_size: usize,
    /// Connection timeout
    pub timeout: Duration,
}

impl DbConfig {
    /// Create a new database configuration from environment variables.
    ///
    /// `SCHEMATA_DB_NAME` is required; everything else has a default.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(process_env)
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        Ok(Self {
            host: var_or(&lookup, "SCHEMATA_DB_HOST", "localhost".to_string())?,
            port: var_or(&lookup, "SCHEMATA_DB_PORT", 5432)?,
            dbname: required(&lookup, "SCHEMATA_DB_NAME")?,
            user: var_or(&lookup, "SCHEMATA_DB_USER", "postgres".to_string())?,
            password: lookup("SCHEMATA_DB_PASSWORD").unwrap_or_default(),
            schema: var_or(&lookup, "SCHEMATA_DB_SCHEMA", "public".to_string())?,
            max_size: var_or(&lookup, "SCHEMATA_DB_POOL_SIZE", 16)?,
            timeout: Duration::from_secs(var_or(&lookup, "SCHEMATA_DB_TIMEOUT", 30)?),
        })
    }

    /// Create a connection pool from this configuration.
    pub fn create_pool(&self) -> ApiResult<Pool> {
        let mut cfg = Config::new();
        cfg.host = Some(self.host.clone());
        cfg.port = Some(self.port);
        cfg.dbname = Some(self.dbname.clone());
        cfg.user = Some(self.user.clone());
        cfg.password = Some(self.password.clone());

        cfg.manager = Some(ManagerConfig {
            recycling_method: RecyclingMethod::Fast,
        });
        cfg.pool = Some(PoolConfig {
            max_size: self.max_size,
            timeouts: Timeouts {
                wait: Some(self.timeout),
                create: Some(self.timeout),
                recycle: Some(self.timeout),
            },
            ..PoolConfig::default()
        });

        let pool = cfg
            .create_pool(Some(Runtime::Tokio1), NoTls)
            .map_err(|e| ApiError::internal_error(format!("Failed to create pool: {}", e)))?;

        Ok(pool)
    }
}

/// Check out a connection and run a trivial query.
pub async fn ping(pool: &Pool) -> ApiResult<()> {
    let conn = pool.get().await?;
    conn.simple_query("SELECT 1").await?;
    Ok(())
}

// ============================================================================
// POSTGRES STORE
// ============================================================================

const LIST_TABLES_SQL: &str = "SELECT table_name::text FROM information_schema.tables \
     WHERE table_schema = $1 AND table_type = 'BASE TABLE' ORDER BY table_name";

const DESCRIBE_TABLE_SQL: &str = "SELECT c.column_name::text, c.data_type::text, \
     c.is_nullable::text, c.column_default::text, c.is_identity::text, \
     EXISTS (SELECT 1 FROM information_schema.table_constraints tc \
         JOIN information_schema.key_column_usage k \
           ON k.constraint_schema = tc.constraint_schema \
          AND k.constraint_name = tc.constraint_name \
        WHERE tc.constraint_type = 'PRIMARY KEY' \
          AND tc.table_schema = c.table_schema \
          AND tc.table_name = c.table_name \
          AND k.column_name = c.column_name) AS is_primary \
     FROM information_schema.columns c \
     WHERE c.table_schema = $1 AND c.table_name = $2 \
     ORDER BY c.ordinal_position";

/// Declared type reported for columns outside the served type families.
const UNSUPPORTED_TYPE: &str = "unsupported";

/// PostgreSQL-backed store.
#[derive(Clone)]
pub struct PgStore {
    pool: Pool,
    schema: String,
}

impl PgStore {
    pub fn new(pool: Pool, schema: impl Into<String>) -> Self {
        Self {
            pool,
            schema: schema.into(),
        }
    }

    async fn get_conn(&self) -> StoreResult<deadpool_postgres::Object> {
        self.pool.get().await.map_err(|e| StoreError::Connection {
            reason: e.to_string(),
        })
    }
}

#[async_trait]
impl SchemaStore for PgStore {
    async fn list_tables(&self) -> StoreResult<Vec<String>> {
        let conn = self.get_conn().await?;
        let rows = conn
            .query(LIST_TABLES_SQL, &[&self.schema])
            .await
            .map_err(|e| store_error("information_schema.tables", e))?;
        rows.iter()
            .map(|row| row.try_get::<_, String>(0).map_err(decode_error))
            .collect()
    }

    async fn describe_table(&self, table: &str) -> StoreResult<Vec<ColumnMetadata>> {
        let conn = self.get_conn().await?;
        let rows = conn
            .query(DESCRIBE_TABLE_SQL, &[&self.schema, &table])
            .await
            .map_err(|e| store_error(table, e))?;
        rows.iter()
            .map(|row| column_metadata(table, row).map_err(decode_error))
            .collect()
    }

    async fn fetch(&self, statement: &Statement) -> StoreResult<Vec<Vec<ScannedValue>>> {
        let conn = self.get_conn().await?;
        let sql = statement.sql();
        let params = bind_params(&statement.params())?;
        let rows = conn
            .query(sql.as_str(), &param_refs(&params))
            .await
            .map_err(|e| store_error(statement.table(), e))?;

        let kinds: Vec<FieldKind> = statement.result_columns().iter().map(|c| c.kind).collect();
        rows.iter()
            .map(|row| scan_row(row, &kinds).map_err(decode_error))
            .collect()
    }

    async fn execute(&self, statement: &Statement) -> StoreResult<ExecOutcome> {
        let conn = self.get_conn().await?;
        let sql = statement.sql();
        let params = bind_params(&statement.params())?;
        let rows_affected = conn
            .execute(sql.as_str(), &param_refs(&params))
            .await
            .map_err(|e| store_error(statement.table(), e))?;
        Ok(ExecOutcome {
            rows_affected,
            generated_id: None,
        })
    }
}

// ============================================================================
// MAPPING HELPERS
// ============================================================================

/// Map an `information_schema` data type onto a declared type the catalog
/// classifies, or [`UNSUPPORTED_TYPE`].
pub fn declared_type(data_type: &str) -> &str {
    match data_type {
        "smallint" | "integer" | "bigint" | "real" | "double precision" | "character varying"
        | "character" | "text" => data_type,
        _ => UNSUPPORTED_TYPE,
    }
}

/// Build `SHOW FULL COLUMNS`-shaped metadata from one introspection row.
pub fn metadata_from_parts(
    name: String,
    data_type: &str,
    is_nullable: &str,
    default: Option<String>,
    is_identity: bool,
    is_primary: bool,
) -> ColumnMetadata {
    let serial = default
        .as_deref()
        .map_or(false, |d| d.starts_with("nextval("));
    ColumnMetadata {
        field: name,
        column_type: declared_type(data_type).to_string(),
        null: if is_nullable.eq_ignore_ascii_case("yes") {
            "YES".to_string()
        } else {
            "NO".to_string()
        },
        key: if is_primary { "PRI".to_string() } else { String::new() },
        default,
        extra: if is_primary && (is_identity || serial) {
            "auto_increment".to_string()
        } else {
            String::new()
        },
    }
}

fn column_metadata(table: &str, row: &Row) -> Result<ColumnMetadata, tokio_postgres::Error> {
    let name: String = row.try_get(0)?;
    let data_type: String = row.try_get(1)?;
    let is_nullable: String = row.try_get(2)?;
    let default: Option<String> = row.try_get(3)?;
    let is_identity: Option<String> = row.try_get(4)?;
    let is_primary: bool = row.try_get(5)?;

    if declared_type(&data_type) == UNSUPPORTED_TYPE {
        tracing::warn!(table, column = %name, data_type = %data_type, "Column type is not served");
    }

    Ok(metadata_from_parts(
        name,
        &data_type,
        &is_nullable,
        default,
        is_identity.as_deref() == Some("YES"),
        is_primary,
    ))
}

type BoxedParam = Box<dyn ToSql + Sync + Send>;

/// Convert bound parameters to typed PostgreSQL values; NULLs keep the
/// parameter's kind so the cast in the SQL text still applies.
fn bind_params(params: &[Param]) -> StoreResult<Vec<BoxedParam>> {
    params
        .iter()
        .map(|p| -> StoreResult<BoxedParam> {
            let boxed: BoxedParam = match (p.kind, &p.value) {
                (FieldKind::Integer, Value::Null) => Box::new(None::<i64>),
                (FieldKind::Text, Value::Null) => Box::new(None::<String>),
                (FieldKind::Float64, Value::Null) => Box::new(None::<f64>),
                (FieldKind::Integer, Value::Integer(v)) => Box::new(Some(*v)),
                (FieldKind::Text, Value::Text(v)) => Box::new(Some(v.clone())),
                (FieldKind::Float64, Value::Float64(v)) => Box::new(Some(*v)),
                (kind, value) => {
                    return Err(StoreError::Decode {
                        reason: format!("cannot bind {:?} as {}", value, kind),
                    })
                }
            };
            Ok(boxed)
        })
        .collect()
}

fn param_refs(params: &[BoxedParam]) -> Vec<&(dyn ToSql + Sync)> {
    params
        .iter()
        .map(|p| &**p as &(dyn ToSql + Sync))
        .collect()
}

fn scan_row(row: &Row, kinds: &[FieldKind]) -> Result<Vec<ScannedValue>, tokio_postgres::Error> {
    kinds
        .iter()
        .enumerate()
        .map(|(i, kind)| -> Result<ScannedValue, tokio_postgres::Error> {
            Ok(match kind {
                FieldKind::Integer => ScannedValue::Integer(row.try_get(i)?),
                FieldKind::Text => ScannedValue::Text(row.try_get(i)?),
                FieldKind::Float64 => ScannedValue::Float64(row.try_get(i)?),
            })
        })
        .collect()
}

/// Classify a driver error; integrity violations keep the table name.
fn store_error(table: &str, err: tokio_postgres::Error) -> StoreError {
    let integrity = err
        .code()
        .map_or(false, |code| code.code().starts_with("23"));
    if integrity {
        StoreError::Constraint {
            table: table.to_string(),
            reason: err.to_string(),
        }
    } else if err.is_closed() {
        StoreError::Connection {
            reason: err.to_string(),
        }
    } else {
        StoreError::Query {
            reason: err.to_string(),
        }
    }
}

fn decode_error(err: tokio_postgres::Error) -> StoreError {
    StoreError::Decode {
        reason: err.to_string(),
    }
}
