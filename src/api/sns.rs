//! SNS ingestion adapter: lets an SNS topic deliver straight into a channel
//! over HTTP, without a consumer having to speak SNS itself.
//!
//! Routing is driven entirely by the `x-amz-sns-message-type` header.
//! `SubscriptionConfirmation` triggers a fire-and-forget GET of the
//! envelope's `SubscribeURL`; `Notification` unwraps the envelope's inner
//! `Message` field and feeds it into the channel as the new message body,
//! ignoring `UnsubscribeURL` entirely.

use axum::Json;
use axum::http::{HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use serde::Deserialize;
use std::time::Duration;

use crate::api::state::ApiState;
use crate::api::types::ApiError;
use crate::core::constants::{
    DEFAULT_PRIORITY, HEADER_MESSAGE_ID, SNS_CONFIRM_FETCH_TIMEOUT_SECS,
    SNS_MESSAGE_TYPE_NOTIFICATION, SNS_MESSAGE_TYPE_SUBSCRIPTION_CONFIRMATION,
};
#[derive(Debug, Deserialize)]
struct SnsEnvelope {
    #[serde(rename = "Message")]
    message: Option<String>,
    #[serde(rename = "SubscribeURL")]
    subscribe_url: Option<String>,
}

pub async fn handle_sns_ingestion(
    state: &ApiState,
    channel: &str,
    sns_type: &HeaderValue,
    body: &[u8],
) -> Result<Response, ApiError> {
    let sns_type = sns_type.to_str().unwrap_or_default();
    let envelope: SnsEnvelope = serde_json::from_slice(body)
        .map_err(|_| ApiError::bad_request("INVALID_SNS_BODY", "could not parse SNS envelope"))?;

    match sns_type {
        SNS_MESSAGE_TYPE_SUBSCRIPTION_CONFIRMATION => {
            let Some(url) = envelope.subscribe_url else {
                return Err(ApiError::bad_request(
                    "MISSING_SUBSCRIBE_URL",
                    "SubscriptionConfirmation missing SubscribeURL",
                ));
            };
            tokio::spawn(async move {
                let client = match reqwest::Client::builder()
                    .timeout(Duration::from_secs(SNS_CONFIRM_FETCH_TIMEOUT_SECS))
                    .build()
                {
                    Ok(client) => client,
                    Err(e) => {
                        tracing::warn!(error = %e, "failed to build SNS confirmation client");
                        return;
                    }
                };
                if let Err(e) = client.get(&url).send().await {
                    tracing::warn!(error = %e, url, "failed to confirm SNS subscription");
                }
            });
            Ok(
                (StatusCode::ACCEPTED, Json(serde_json::json!({ "confirmed": true })))
                    .into_response(),
            )
        }
        SNS_MESSAGE_TYPE_NOTIFICATION => {
            let Some(text) = envelope.message else {
                return Err(ApiError::bad_request(
                    "MISSING_MESSAGE",
                    "Notification missing Message",
                ));
            };
            let message = state.engine.add_message(
                channel,
                text.into_bytes(),
                "text/plain".to_string(),
                DEFAULT_PRIORITY,
                state.defaults.timeout,
                state.defaults.linger,
                state.defaults.deliver,
            )?;
            let mut response =
                (StatusCode::ACCEPTED, Json(serde_json::json!({ "id": message.id })))
                    .into_response();
            response.headers_mut().insert(
                HEADER_MESSAGE_ID,
                HeaderValue::from_str(&message.id.to_string()).expect("id is ASCII digits"),
            );
            Ok(response)
        }
        other => Err(ApiError::bad_request(
            "UNKNOWN_SNS_TYPE",
            format!("unrecognized SNS message type: {other}"),
        )),
    }
}
