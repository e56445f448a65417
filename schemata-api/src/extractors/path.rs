//! Path parameter extractor with JSON rejections.
//!
//! `axum::extract::Path` rejects with a plain-text body; `ApiPath` renders
//! the same failures as an [`ApiError`].

use axum::{
    async_trait,
    extract::{FromRequestParts, Path},
    http::request::Parts,
};
use serde::de::DeserializeOwned;

use crate::error::ApiError;

/// Extractor for path parameters.
///
/// # Example
///
/// ```rust,ignore
/// async fn get_record(
///     ApiPath((table, raw_id)): ApiPath<(String, String)>,
/// ) -> ApiResult<impl IntoResponse> {
///     // ...
/// }
/// ```
#[derive(Debug, Clone)]
pub struct ApiPath<T>(pub T);

#[async_trait]
impl<S, T> FromRequestParts<S> for ApiPath<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Send,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        match Path::<T>::from_request_parts(parts, state).await {
            Ok(Path(value)) => Ok(Self(value)),
            Err(rejection) => {
                tracing::debug!(
                    path = %parts.uri.path(),
                    reason = %rejection.body_text(),
                    "Rejected path parameters"
                );
                Err(ApiError::invalid_path())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::{to_bytes, Body},
        http::{Request, StatusCode},
        routing::get,
        Router,
    };
    use tower::ServiceExt; // for `oneshot`

    fn test_app() -> Router {
        Router::new().route(
            "/:table",
            get(|ApiPath(table): ApiPath<String>| async move { table }),
        )
    }

    #[tokio::test]
    async fn test_valid_segment_is_decoded() -> Result<(), String> {
        let request = Request::builder()
            .uri("/user%20s")
            .body(Body::empty())
            .map_err(|e| e.to_string())?;
        let response = test_app()
            .oneshot(request)
            .await
            .map_err(|e| format!("Request failed: {:?}", e))?;
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .map_err(|e| e.to_string())?;
        assert_eq!(&bytes[..], b"user s");
        Ok(())
    }

    #[tokio::test]
    async fn test_invalid_utf8_segment_is_json_error() -> Result<(), String> {
        let request = Request::builder()
            .uri("/%FF")
            .body(Body::empty())
            .map_err(|e| e.to_string())?;
        let response = test_app()
            .oneshot(request)
            .await
            .map_err(|e| format!("Request failed: {:?}", e))?;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .map_err(|e| e.to_string())?;
        let body: serde_json::Value = serde_json::from_slice(&bytes).map_err(|e| e.to_string())?;
        assert_eq!(body, serde_json::json!({"error": "invalid path"}));
        Ok(())
    }
}
