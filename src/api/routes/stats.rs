//! `/stats` — broker-wide message count.

use axum::Json;
use axum::extract::State;

use crate::api::state::ApiState;

pub async fn stats(State(state): State<ApiState>) -> Json<serde_json::Value> {
    Json(serde_json::json!({ "current-messages": state.engine.stats() }))
}
