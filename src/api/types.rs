//! Shared API types: the error response and small request/response DTOs.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Deserialize;

use crate::engine::EngineError;

/// Standard API error response.
#[derive(Debug)]
pub enum ApiError {
    BadRequest { code: String, message: String },
    NotFound { code: String, message: String },
    Internal { message: String },
}

impl ApiError {
    pub fn bad_request(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::BadRequest {
            code: code.into(),
            message: message.into(),
        }
    }

    pub fn not_found(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::NotFound {
            code: code.into(),
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }
}

impl From<EngineError> for ApiError {
    fn from(e: EngineError) -> Self {
        match e {
            EngineError::InvalidArgument(message) => Self::bad_request("INVALID_ARGUMENT", message),
            EngineError::NotFound => Self::not_found("NOT_FOUND", "message not found"),
            EngineError::Internal(message) => {
                tracing::error!(error = %message, "engine invariant violated");
                Self::internal("internal error")
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_type, code, message) = match self {
            Self::BadRequest { code, message } => {
                (StatusCode::BAD_REQUEST, "bad_request", code, message)
            }
            Self::NotFound { code, message } => (StatusCode::NOT_FOUND, "not_found", code, message),
            Self::Internal { message } => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "internal_error",
                "INTERNAL".to_string(),
                message,
            ),
        };
        (
            status,
            Json(serde_json::json!({
                "error": error_type,
                "code": code,
                "message": message,
            })),
        )
            .into_response()
    }
}

/// Query parameters accepted by `GET /channels/{name}`.
///
/// `nowait`'s presence (any value, including `nowait` with no `=`) means
/// "don't long-poll, answer from the current ready heap only" — mirrors
/// the reference adapter's boolean query flags. `timeout` bounds how long
/// a long-poll may park before resolving empty.
#[derive(Debug, Deserialize)]
pub struct GetMessageQuery {
    #[serde(default)]
    pub nowait: Option<String>,
    pub timeout: Option<f64>,
}

impl GetMessageQuery {
    pub fn wait_secs(&self, max: f64) -> f64 {
        if self.nowait.is_some() {
            0.0
        } else {
            self.timeout.unwrap_or(0.0).clamp(0.0, max)
        }
    }
}

/// Extracts the `msg` field from a `msg=<url-encoded-bytes>`
/// `application/x-www-form-urlencoded` body, as the direct-ingestion and
/// publish routes expect. Decoded as UTF-8 text; binary payloads should be
/// base64'd into the field by the producer, same as the reference adapter.
pub fn extract_msg_field(body: &[u8]) -> Option<Vec<u8>> {
    form_urlencoded::parse(body)
        .find(|(key, _)| key == "msg")
        .map(|(_, value)| value.into_owned().into_bytes())
}

/// Query parameters accepted by `POST /messages/{id}/touch`.
#[derive(Debug, Deserialize)]
pub struct TouchQuery {
    pub timeout: Option<f64>,
}

/// Query parameters accepted by `POST /channels/{name}` (direct add) and
/// `POST /topics/{topic}` (publish) when not arriving as an SNS envelope.
#[derive(Debug, Deserialize)]
pub struct AddMessageQuery {
    pub priority: Option<i64>,
    pub timeout: Option<f64>,
    pub linger: Option<f64>,
    pub deliver: Option<u32>,
}

/// Query parameters for `PUT /channels/{name}/topics/{topic}`.
#[derive(Debug, Deserialize)]
pub struct AddSubscriptionQuery {
    pub priority: Option<i64>,
    pub timeout: Option<f64>,
    pub linger: Option<f64>,
    pub deliver: Option<u32>,
}
