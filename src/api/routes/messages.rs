//! Routes rooted at `/messages`: operations on a message by id.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;

use crate::api::state::ApiState;
use crate::api::types::{ApiError, TouchQuery};
use crate::engine::EngineError;

fn parse_id(raw: &str) -> Result<u64, ApiError> {
    raw.parse()
        .map_err(|_| ApiError::bad_request("INVALID_ID", "message id must be numeric"))
}

/// Delete is idempotent at the HTTP layer: always 204, so an absent id
/// is not surfaced as 404 here.
pub async fn delete_message(
    State(state): State<ApiState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let id = parse_id(&id)?;
    match state.engine.delete_message_from_id(id) {
        Ok(()) | Err(EngineError::NotFound) => Ok(StatusCode::NO_CONTENT),
        Err(e) => Err(e.into()),
    }
}

pub async fn touch_message(
    State(state): State<ApiState>,
    Path(id): Path<String>,
    Query(q): Query<TouchQuery>,
) -> Result<StatusCode, ApiError> {
    let id = parse_id(&id)?;
    state.engine.touch_message_from_id(id, q.timeout)?;
    Ok(StatusCode::NO_CONTENT)
}
