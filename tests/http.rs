//! HTTP adapter contract tests: exercises the assembled axum router with
//! `tower::ServiceExt::oneshot`, covering the end-to-end request/response
//! contract mirrored from `HTTPTestMethods.test_all`.

use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode, header};
use serde_json::Value;
use tower::ServiceExt;

use linger::api::routes;
use linger::api::state::ApiState;
use linger::core::config::EngineDefaults;
use linger::engine::Engine;

const BODY_LIMIT: usize = 1024 * 1024;

fn test_router() -> Router {
    let state = ApiState {
        engine: Engine::new(),
        defaults: EngineDefaults {
            timeout: 60.0,
            linger: None,
            deliver: 0,
        },
    };
    routes::router().with_state(state)
}

fn form_msg(body: &str) -> String {
    form_urlencoded::Serializer::new(String::new())
        .append_pair("msg", body)
        .finish()
}

async fn json_body(resp: axum::response::Response) -> Value {
    let bytes = to_bytes(resp.into_body(), BODY_LIMIT).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn stats_starts_clean() {
    let router = test_router();
    let resp = router
        .oneshot(Request::get("/stats").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body = json_body(resp).await;
    assert_eq!(body["current-messages"], 0);
}

#[tokio::test]
async fn post_then_get_roundtrips_body_and_id_header() {
    let router = test_router();

    let post_resp = router
        .clone()
        .oneshot(
            Request::post("/channels/test?linger=10")
                .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                .body(Body::from(form_msg("Do this!")))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(post_resp.status(), StatusCode::ACCEPTED);
    let posted_id = post_resp
        .headers()
        .get("X-LINGER-MSG-ID")
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();
    let body = json_body(post_resp).await;
    assert!(body["id"].is_number(), "id should be a JSON number, not a string");
    assert_eq!(body["id"].as_u64().unwrap().to_string(), posted_id);

    let get_resp = router
        .clone()
        .oneshot(
            Request::get("/channels/test?nowait=1")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(get_resp.status(), StatusCode::OK);
    assert_eq!(
        get_resp.headers().get("X-LINGER-MSG-ID").unwrap().to_str().unwrap(),
        posted_id
    );
    let bytes = to_bytes(get_resp.into_body(), BODY_LIMIT).await.unwrap();
    assert_eq!(&bytes[..], b"Do this!");
}

#[tokio::test]
async fn get_on_empty_channel_with_nowait_returns_204() {
    let router = test_router();
    let resp = router
        .oneshot(
            Request::get("/channels/empty?nowait=1")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn subscribe_then_publish_delivers_to_subscriber() {
    let router = test_router();

    let sub_resp = router
        .clone()
        .oneshot(
            Request::put("/channels/test/topics/some-topic?linger=10")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(sub_resp.status(), StatusCode::NO_CONTENT);

    let pub_resp = router
        .clone()
        .oneshot(
            Request::post("/topics/some-topic")
                .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                .body(Body::from(form_msg("Have you heard?")))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(pub_resp.status(), StatusCode::ACCEPTED);
    let delivered = json_body(pub_resp).await;
    assert!(delivered.get("test").is_some());
    assert_eq!(delivered.as_object().unwrap().len(), 1);

    let get_resp = router
        .oneshot(
            Request::get("/channels/test?nowait=1")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(get_resp.status(), StatusCode::OK);
    let bytes = to_bytes(get_resp.into_body(), BODY_LIMIT).await.unwrap();
    assert_eq!(&bytes[..], b"Have you heard?");
}

#[tokio::test]
async fn publish_to_topic_with_no_subscribers_returns_empty_mapping() {
    let router = test_router();
    let resp = router
        .oneshot(
            Request::post("/topics/nobody-listens")
                .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                .body(Body::from(form_msg("Not getting through!")))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::ACCEPTED);
    let delivered = json_body(resp).await;
    assert_eq!(delivered.as_object().unwrap().len(), 0);
}

#[tokio::test]
async fn delete_message_is_idempotent() {
    let router = test_router();

    let post_resp = router
        .clone()
        .oneshot(
            Request::post("/channels/test")
                .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                .body(Body::from(form_msg("x")))
                .unwrap(),
        )
        .await
        .unwrap();
    let id = json_body(post_resp).await["id"].as_u64().unwrap();

    for _ in 0..2 {
        let resp = router
            .clone()
            .oneshot(
                Request::delete(format!("/messages/{id}"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::NO_CONTENT);
    }
}

#[tokio::test]
async fn touch_unknown_id_returns_404() {
    let router = test_router();
    let resp = router
        .oneshot(
            Request::post("/messages/999999/touch")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn touch_a_ready_not_yet_delivered_message_returns_404() {
    let router = test_router();
    let post_resp = router
        .clone()
        .oneshot(
            Request::post("/channels/test")
                .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                .body(Body::from(form_msg("x")))
                .unwrap(),
        )
        .await
        .unwrap();
    let id = json_body(post_resp).await["id"].as_u64().unwrap();

    let resp = router
        .oneshot(
            Request::post(format!("/messages/{id}/touch"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn post_without_msg_field_is_a_bad_request() {
    let router = test_router();
    let resp = router
        .oneshot(
            Request::post("/channels/test")
                .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                .body(Body::from("not=the-right-field"))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn end_to_end_workflow_matches_reference_http_walkthrough() {
    let router = test_router();

    // post message to channel
    let post_resp = router
        .clone()
        .oneshot(
            Request::post("/channels/test?linger=10")
                .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                .body(Body::from(form_msg("Do this!")))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(post_resp.status(), StatusCode::ACCEPTED);

    // create topic subscription
    let sub_resp = router
        .clone()
        .oneshot(
            Request::put("/channels/test/topics/some-topic?linger=10")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(sub_resp.status(), StatusCode::NO_CONTENT);

    // publish to topic, delivered to the subscribed channel
    let pub_resp = router
        .clone()
        .oneshot(
            Request::post("/topics/some-topic")
                .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                .body(Body::from(form_msg("Have you heard?")))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(pub_resp.status(), StatusCode::ACCEPTED);

    // get the first message (FIFO: the direct post arrived first)
    let get_resp = router
        .clone()
        .oneshot(
            Request::get("/channels/test?nowait=1")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(get_resp.status(), StatusCode::OK);
    let first_id = get_resp
        .headers()
        .get("X-LINGER-MSG-ID")
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();
    let bytes = to_bytes(get_resp.into_body(), BODY_LIMIT).await.unwrap();
    assert_eq!(&bytes[..], b"Do this!");

    // delete it
    let del_resp = router
        .clone()
        .oneshot(
            Request::delete(format!("/messages/{first_id}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(del_resp.status(), StatusCode::NO_CONTENT);

    // remove the topic subscription
    let unsub_resp = router
        .clone()
        .oneshot(
            Request::delete("/channels/test/topics/some-topic")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(unsub_resp.status(), StatusCode::NO_CONTENT);

    // publish again: no subscribers left, nothing delivered
    let pub_resp = router
        .clone()
        .oneshot(
            Request::post("/topics/some-topic")
                .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                .body(Body::from(form_msg("Not getting through!")))
                .unwrap(),
        )
        .await
        .unwrap();
    let delivered = json_body(pub_resp).await;
    assert_eq!(delivered.as_object().unwrap().len(), 0);

    // post one more, drain both remaining messages
    let post_resp = router
        .clone()
        .oneshot(
            Request::post("/channels/test")
                .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                .body(Body::from(form_msg("Now do that!")))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(post_resp.status(), StatusCode::ACCEPTED);

    for expected in [b"Have you heard?".as_slice(), b"Now do that!".as_slice()] {
        let get_resp = router
            .clone()
            .oneshot(
                Request::get("/channels/test?nowait=1")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(get_resp.status(), StatusCode::OK);
        let id = get_resp
            .headers()
            .get("X-LINGER-MSG-ID")
            .unwrap()
            .to_str()
            .unwrap()
            .to_string();
        let bytes = to_bytes(get_resp.into_body(), BODY_LIMIT).await.unwrap();
        assert_eq!(&bytes[..], expected);

        let del_resp = router
            .clone()
            .oneshot(
                Request::delete(format!("/messages/{id}"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(del_resp.status(), StatusCode::NO_CONTENT);
    }

    // broker is empty again
    let stats_resp = router
        .oneshot(Request::get("/stats").body(Body::empty()).unwrap())
        .await
        .unwrap();
    let stats = json_body(stats_resp).await;
    assert_eq!(stats["current-messages"], 0);
}

#[tokio::test]
async fn list_channels_and_topics_reflect_subscriptions() {
    let router = test_router();

    router
        .clone()
        .oneshot(
            Request::put("/channels/a/topics/news")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    router
        .clone()
        .oneshot(
            Request::put("/channels/b/topics/news")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    let channels_resp = router
        .clone()
        .oneshot(Request::get("/channels").body(Body::empty()).unwrap())
        .await
        .unwrap();
    let channels: Vec<String> = serde_json::from_slice(
        &to_bytes(channels_resp.into_body(), BODY_LIMIT).await.unwrap(),
    )
    .unwrap();
    assert_eq!(channels, vec!["a".to_string(), "b".to_string()]);

    let subscribers_resp = router
        .oneshot(
            Request::get("/topics/news/channels")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let subscribers: Vec<String> = serde_json::from_slice(
        &to_bytes(subscribers_resp.into_body(), BODY_LIMIT).await.unwrap(),
    )
    .unwrap();
    assert_eq!(subscribers, vec!["a".to_string(), "b".to_string()]);
}
