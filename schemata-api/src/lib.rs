//! Schemata API - HTTP Record Explorer
//!
//! Exposes every table of a PostgreSQL schema as JSON CRUD endpoints. The
//! schema is introspected once at startup; requests are resolved against
//! that immutable catalog and executed through `schemata-storage`.

pub mod config;
pub mod db;
pub mod error;
pub mod extractors;
pub mod macros;
pub mod middleware;
pub mod routes;
pub mod state;
pub mod telemetry;

pub use config::{ApiConfig, ConfigError};
pub use db::{ping, DbConfig, PgStore};
pub use error::{ApiError, ApiResult, ErrorCode};
pub use routes::create_api_router;
pub use state::AppState;
