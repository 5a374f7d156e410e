//! Routes rooted at `/topics`: publish fan-out and enumeration.

use axum::Json;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{IntoResponse, Response};
use std::collections::HashMap;

use crate::api::state::ApiState;
use crate::api::types::{ApiError, extract_msg_field};

/// Publish fans a message out onto every channel subscribed to `topic`.
/// Response body maps channel name -> newly minted message id; an empty
/// map means no subscriber exists (still 202, not an error).
pub async fn publish(
    State(state): State<ApiState>,
    Path(topic): Path<String>,
    headers: HeaderMap,
    body: axum::body::Bytes,
) -> Result<Response, ApiError> {
    let msg_body = extract_msg_field(&body)
        .ok_or_else(|| ApiError::bad_request("MISSING_MSG", "body must set the 'msg' field"))?;

    let mimetype = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("text/plain")
        .to_string();
    let delivered = state.engine.publish_message(&topic, msg_body, mimetype);
    let by_channel: HashMap<String, u64> = delivered
        .into_iter()
        .map(|m| (m.channel, m.id))
        .collect();
    Ok((StatusCode::ACCEPTED, Json(by_channel)).into_response())
}

pub async fn list_topics(State(state): State<ApiState>) -> Json<Vec<String>> {
    Json(state.engine.list_topics())
}

pub async fn list_topic_subscribers(
    State(state): State<ApiState>,
    Path(topic): Path<String>,
) -> Json<Vec<String>> {
    Json(state.engine.list_topic_subscribers(&topic))
}
