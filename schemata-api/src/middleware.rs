//! Request lifetime middleware.

use std::time::Duration;

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::error::ApiError;

/// Bound a request's lifetime, store calls included.
///
/// An expired request drops the handler future, which cancels any in-flight
/// store call, and answers 408 with a JSON error body.
pub async fn request_timeout_middleware(
    State(timeout): State<Duration>,
    request: Request,
    next: Next,
) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_string();

    match tokio::time::timeout(timeout, next.run(request)).await {
        Ok(response) => response,
        Err(_) => {
            tracing::warn!(
                method = %method,
                path = %path,
                timeout_ms = timeout.as_millis(),
                "Request timed out"
            );
            ApiError::request_timeout().into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::{to_bytes, Body},
        http::StatusCode,
        middleware::from_fn_with_state,
        routing::get,
        Router,
    };
    use tower::ServiceExt; // for `oneshot`

    fn test_app(timeout: Duration) -> Router {
        Router::new()
            .route("/fast", get(|| async { "done" }))
            .route(
                "/slow",
                get(|| async {
                    tokio::time::sleep(Duration::from_secs(30)).await;
                    "late"
                }),
            )
            .layer(from_fn_with_state(timeout, request_timeout_middleware))
    }

    async fn call(app: Router, uri: &str) -> Result<(StatusCode, Vec<u8>), String> {
        let request = axum::http::Request::builder()
            .uri(uri)
            .body(Body::empty())
            .map_err(|e| e.to_string())?;
        let response = app
            .oneshot(request)
            .await
            .map_err(|e| format!("Request failed: {:?}", e))?;
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .map_err(|e| e.to_string())?;
        Ok((status, bytes.to_vec()))
    }

    #[tokio::test]
    async fn test_fast_request_passes_through() -> Result<(), String> {
        let (status, body) = call(test_app(Duration::from_secs(5)), "/fast").await?;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, b"done");
        Ok(())
    }

    #[tokio::test]
    async fn test_slow_request_gets_json_timeout() -> Result<(), String> {
        let (status, body) = call(test_app(Duration::from_millis(20)), "/slow").await?;
        assert_eq!(status, StatusCode::REQUEST_TIMEOUT);
        let body: serde_json::Value = serde_json::from_slice(&body).map_err(|e| e.to_string())?;
        assert_eq!(body, serde_json::json!({"error": "request timed out"}));
        Ok(())
    }
}
