//! Schemata API Server Entry Point
//!
//! Bootstraps logging and configuration, introspects the database schema,
//! and serves the record API until interrupted.

use std::sync::Arc;

use axum::Router;
use schemata_api::telemetry::{init_tracer, TelemetryConfig};
use schemata_api::{create_api_router, ping, ApiConfig, ApiError, ApiResult, DbConfig, PgStore};
use schemata_storage::QueryExecutor;

#[tokio::main]
async fn main() -> ApiResult<()> {
    let telemetry_config = TelemetryConfig::from_env()?;
    init_tracer(&telemetry_config)?;

    let db_config = DbConfig::from_env()?;
    let api_config = ApiConfig::from_env()?;

    let pool = db_config.create_pool()?;
    ping(&pool).await?;
    tracing::info!(
        host = %db_config.host,
        dbname = %db_config.dbname,
        schema = %db_config.schema,
        "Connected to database"
    );

    let store = Arc::new(PgStore::new(pool, db_config.schema.clone()));
    let executor = QueryExecutor::connect(store).await?;

    let app: Router = create_api_router(executor, &api_config);

    let addr = api_config.bind_addr;
    tracing::info!(%addr, "Starting Schemata API server");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| ApiError::internal_error(format!("Failed to bind {}: {}", addr, e)))?;

    let server = axum::serve(listener, app);
    tokio::select! {
        result = server => {
            result.map_err(|e| ApiError::internal_error(format!("Server error: {}", e)))?;
        }
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Shutdown signal received");
        }
    }

    Ok(())
}
