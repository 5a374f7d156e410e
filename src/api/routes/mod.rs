//! HTTP route tables, one module per resource group.

pub mod channels;
pub mod messages;
pub mod stats;
pub mod topics;

use axum::Router;
use axum::routing::{get, post, put};

use crate::api::state::ApiState;

pub fn router() -> Router<ApiState> {
    Router::new()
        .route("/channels", get(channels::list_channels))
        .route(
            "/channels/{name}",
            post(channels::add_message)
                .get(channels::get_message)
                .delete(channels::drain_channel),
        )
        .route("/channels/{name}/stats", get(channels::channel_stats))
        .route(
            "/channels/{name}/topics",
            get(channels::list_topics_for_channel),
        )
        .route(
            "/channels/{name}/topics/{topic}",
            put(channels::add_subscription).delete(channels::delete_subscription),
        )
        .route("/messages/{id}", axum::routing::delete(messages::delete_message))
        .route("/messages/{id}/touch", post(messages::touch_message))
        .route("/topics", get(topics::list_topics))
        .route("/topics/{topic}", post(topics::publish))
        .route(
            "/topics/{topic}/channels",
            get(topics::list_topic_subscribers),
        )
        .route("/stats", get(stats::stats))
}
