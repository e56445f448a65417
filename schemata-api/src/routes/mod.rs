//! REST API Routes Module
//!
//! Routes are resolved against the schema catalog at request time:
//! - `GET /` lists tables
//! - `/{table}` lists (GET) and creates (PUT) records
//! - `/{table}/{id}` reads (GET), updates (POST) and deletes (DELETE) one record
//!
//! Every response body is JSON; errors use `{"error": "<message>"}`.

pub mod tables;

use std::time::Duration;

use axum::{
    extract::DefaultBodyLimit,
    http::{header, HeaderValue, Method},
    middleware::{from_fn, from_fn_with_state},
    routing::{get, MethodRouter},
    Router,
};
use schemata_storage::QueryExecutor;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};

use crate::config::ApiConfig;
use crate::middleware::request_timeout_middleware;
use crate::state::AppState;
use crate::telemetry::observability_middleware;

// ============================================================================
// CORS LAYER
// ============================================================================

/// Build the CORS layer from ApiConfig.
///
/// Empty origins allow any origin.
fn build_cors_layer(config: &ApiConfig) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::PUT,
            Method::POST,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT])
        .max_age(Duration::from_secs(config.cors_max_age_secs));

    if config.cors_origins.is_empty() {
        tracing::info!("CORS: allowing all origins");
        cors.allow_origin(Any)
    } else {
        tracing::info!("CORS: allowing origins: {:?}", config.cors_origins);
        let origins: Vec<HeaderValue> = config
            .cors_origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();
        cors.allow_origin(origins)
    }
}

// ============================================================================
// ROUTER
// ============================================================================

fn table_routes() -> MethodRouter<AppState> {
    get(tables::list_records)
        .put(tables::create_record)
        .fallback(tables::table_method_not_allowed)
}

fn record_routes() -> MethodRouter<AppState> {
    get(tables::get_record)
        .post(tables::update_record)
        .delete(tables::delete_record)
        .fallback(tables::record_method_not_allowed)
}

/// Routes without state or layers.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(tables::list_tables).fallback(tables::root_method_not_allowed))
        .route("/:table", table_routes())
        .route("/:table/", table_routes())
        .route("/:table/:id", record_routes())
        .route("/:table/:id/", record_routes())
        .fallback(tables::unknown_path)
}

/// Create the complete API router.
///
/// Layers, outermost first: CORS, request span, timeout, body limit.
pub fn create_api_router(executor: QueryExecutor, config: &ApiConfig) -> Router {
    routes()
        .with_state(AppState::new(executor))
        .layer(
            ServiceBuilder::new()
                .layer(build_cors_layer(config))
                .layer(from_fn(observability_middleware))
                .layer(from_fn_with_state(
                    config.request_timeout,
                    request_timeout_middleware,
                ))
                .layer(DefaultBodyLimit::max(config.body_limit_bytes)),
        )
}

