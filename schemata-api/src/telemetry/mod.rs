//! Schemata Telemetry - Logging Infrastructure
//!
//! Structured logging via `tracing` plus per-request spans for the API layer.

pub mod middleware;
pub mod tracer;

pub use middleware::observability_middleware;
pub use tracer::{init_tracer, LogFormat, TelemetryConfig};
