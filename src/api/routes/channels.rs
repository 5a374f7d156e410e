//! Routes rooted at `/channels`: direct message ingestion, long-poll
//! consumption, subscriptions, and per-channel stats/drain.

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};
use std::time::Duration;

use crate::api::sns;
use crate::api::state::ApiState;
use crate::api::types::{
    AddMessageQuery, AddSubscriptionQuery, ApiError, GetMessageQuery, extract_msg_field,
};
use crate::core::constants::{
    DEFAULT_PRIORITY, HEADER_MESSAGE_ID, MAX_LONG_POLL_SECS, SNS_MESSAGE_TYPE_HEADER,
};
use crate::engine::Subscription;

fn normalize_linger(raw: Option<f64>, default: Option<f64>) -> Option<f64> {
    match raw {
        Some(v) if v > 0.0 => Some(v),
        Some(_) => None,
        None => default,
    }
}

pub async fn add_message(
    State(state): State<ApiState>,
    Path(channel): Path<String>,
    Query(q): Query<AddMessageQuery>,
    headers: HeaderMap,
    body: axum::body::Bytes,
) -> Result<Response, ApiError> {
    if let Some(sns_type) = headers.get(SNS_MESSAGE_TYPE_HEADER) {
        return sns::handle_sns_ingestion(&state, &channel, sns_type, &body).await;
    }

    let msg_body = extract_msg_field(&body)
        .ok_or_else(|| ApiError::bad_request("MISSING_MSG", "body must set the 'msg' field"))?;

    let mimetype = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("text/plain")
        .to_string();
    let priority = q.priority.unwrap_or(DEFAULT_PRIORITY);
    let timeout = q.timeout.unwrap_or(state.defaults.timeout);
    let linger = normalize_linger(q.linger, state.defaults.linger);
    let deliver = q.deliver.unwrap_or(state.defaults.deliver);

    let message = state
        .engine
        .add_message(&channel, msg_body, mimetype, priority, timeout, linger, deliver)?;

    let mut response =
        (StatusCode::ACCEPTED, Json(serde_json::json!({ "id": message.id }))).into_response();
    response.headers_mut().insert(
        HEADER_MESSAGE_ID,
        HeaderValue::from_str(&message.id.to_string()).expect("id is ASCII digits"),
    );
    Ok(response)
}

pub async fn get_message(
    State(state): State<ApiState>,
    Path(channel): Path<String>,
    Query(q): Query<GetMessageQuery>,
) -> Response {
    let wait_secs = q.wait_secs(MAX_LONG_POLL_SECS);
    match state
        .engine
        .get_message(&channel, Duration::from_secs_f64(wait_secs))
        .await
    {
        Some(message) => {
            let mut response = (
                StatusCode::OK,
                [(header::CONTENT_TYPE, message.mimetype.clone())],
                message.body.clone(),
            )
                .into_response();
            response.headers_mut().insert(
                HEADER_MESSAGE_ID,
                HeaderValue::from_str(&message.id.to_string()).expect("id is ASCII digits"),
            );
            response
        }
        None => StatusCode::NO_CONTENT.into_response(),
    }
}

pub async fn drain_channel(
    State(state): State<ApiState>,
    Path(channel): Path<String>,
) -> Json<serde_json::Value> {
    let removed = state.engine.drain_channel(&channel);
    Json(serde_json::json!({ "removed": removed }))
}

pub async fn channel_stats(
    State(state): State<ApiState>,
    Path(channel): Path<String>,
) -> Json<serde_json::Value> {
    let (ready, hidden) = state.engine.channel_stats(&channel);
    Json(serde_json::json!({ "ready": ready, "hidden": hidden }))
}

pub async fn list_channels(State(state): State<ApiState>) -> Json<Vec<String>> {
    Json(state.engine.list_channels())
}

pub async fn list_topics_for_channel(
    State(state): State<ApiState>,
    Path(channel): Path<String>,
) -> Json<Vec<String>> {
    Json(state.engine.list_topics_for_channel(&channel))
}

pub async fn add_subscription(
    State(state): State<ApiState>,
    Path((channel, topic)): Path<(String, String)>,
    Query(q): Query<AddSubscriptionQuery>,
) -> Result<StatusCode, ApiError> {
    let sub = Subscription {
        timeout: q.timeout.unwrap_or(state.defaults.timeout),
        linger: normalize_linger(q.linger, state.defaults.linger),
        deliver: q.deliver.unwrap_or(state.defaults.deliver),
        priority: q.priority.unwrap_or(DEFAULT_PRIORITY),
    };
    state.engine.add_subscription(&channel, &topic, sub)?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn delete_subscription(
    State(state): State<ApiState>,
    Path((channel, topic)): Path<(String, String)>,
) -> StatusCode {
    // Idempotent at the wire level, same as `DELETE /messages/{id}`: the
    // engine call distinguishes found/not-found, the HTTP contract doesn't.
    let _ = state.engine.delete_subscription(&channel, &topic);
    StatusCode::NO_CONTENT
}
