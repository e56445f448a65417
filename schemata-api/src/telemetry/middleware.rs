//! Axum Middleware for HTTP Request Tracing
//!
//! Wraps every request in an `http_request` span and logs completion with
//! status and latency.

use axum::{extract::Request, middleware::Next, response::Response};
use once_cell::sync::Lazy;
use regex::Regex;
use std::time::Instant;
use tracing::{info_span, Instrument};

static ID_SEGMENT: Lazy<Option<Regex>> = Lazy::new(|| Regex::new(r"/\d+(/|$)").ok());

/// Normalize a path for span fields (numeric ids become `{id}`).
pub fn normalize_path(path: &str) -> String {
    match ID_SEGMENT.as_ref() {
        Some(pattern) => pattern.replace_all(path, "/{id}$1").to_string(),
        None => path.to_string(),
    }
}

/// Observability middleware for Axum.
pub async fn observability_middleware(request: Request, next: Next) -> Response {
    let start = Instant::now();

    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let normalized_path = normalize_path(&path);

    let span = info_span!(
        "http_request",
        http.method = %method,
        http.target = %path,
        http.route = %normalized_path,
    );

    let response = next.run(request).instrument(span).await;

    let status = response.status();
    let duration = start.elapsed();

    if status.is_server_error() {
        tracing::warn!(
            method = %method,
            path = %path,
            status = status.as_u16(),
            duration_ms = duration.as_millis(),
            "Request failed"
        );
    } else {
        tracing::info!(
            method = %method,
            path = %path,
            status = status.as_u16(),
            duration_ms = duration.as_millis(),
            "Request completed"
        );
    }

    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_path_numeric_id() {
        assert_eq!(normalize_path("/users/12345"), "/users/{id}");
        assert_eq!(normalize_path("/users/7/"), "/users/{id}/");
    }

    #[test]
    fn test_normalize_path_no_ids() {
        assert_eq!(normalize_path("/users"), "/users");
        assert_eq!(normalize_path("/"), "/");
    }

    #[test]
    fn test_normalize_path_keeps_mixed_segments() {
        assert_eq!(normalize_path("/table2/abc"), "/table2/abc");
        assert_eq!(normalize_path("/users/12a"), "/users/12a");
    }
}
