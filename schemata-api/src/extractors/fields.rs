//! Request body extractor for record field maps.
//!
//! A body is either a JSON object or an `application/x-www-form-urlencoded`
//! form. Decoding never rejects the request: the outcome is carried into the
//! handler, which reports it only after the table has been resolved.

use axum::{
    async_trait,
    body::Bytes,
    extract::{FromRequest, Request},
    http::{header::CONTENT_TYPE, StatusCode},
    Form,
};
use schemata_core::RequestFields;
use serde_json::Value as JsonValue;
use std::collections::HashMap;
use std::convert::Infallible;

use crate::error::{ApiError, ApiResult};

/// Decoded field input, or the error decoding produced.
#[derive(Debug)]
pub struct FieldInput(ApiResult<RequestFields>);

impl FieldInput {
    pub fn into_fields(self) -> ApiResult<RequestFields> {
        self.0
    }
}

#[async_trait]
impl<S> FromRequest<S> for FieldInput
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let decoded = if is_form(&req) {
            match Form::<HashMap<String, String>>::from_request(req, state).await {
                Ok(Form(map)) => Ok(RequestFields::Form(map)),
                Err(rejection) => Err(body_error(rejection.status(), rejection.body_text())),
            }
        } else {
            match Bytes::from_request(req, state).await {
                Ok(bytes) => decode_json(&bytes),
                Err(rejection) => Err(body_error(rejection.status(), rejection.body_text())),
            }
        };
        Ok(Self(decoded))
    }
}

fn is_form(req: &Request) -> bool {
    req.headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map_or(false, |ct| ct.starts_with("application/x-www-form-urlencoded"))
}

fn body_error(status: StatusCode, text: String) -> ApiError {
    if status == StatusCode::PAYLOAD_TOO_LARGE {
        ApiError::payload_too_large()
    } else {
        ApiError::invalid_body(text)
    }
}

/// Decode a JSON object body; an empty body is an empty object.
pub fn decode_json(body: &[u8]) -> ApiResult<RequestFields> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(RequestFields::default());
    }
    match serde_json::from_slice::<JsonValue>(body) {
        Ok(JsonValue::Object(map)) => Ok(RequestFields::Json(map)),
        Ok(_) => Err(ApiError::invalid_body("request body must be a JSON object")),
        Err(e) => Err(ApiError::invalid_body(format!("invalid JSON: {}", e))),
    }
}
