// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Admin API routes exercised through the router without binding a socket.

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode, header};
use courier_gateway::{GatewayState, router};
use courier_test_utils::{MockModel, TestHarness};
use serde_json::Value;
use tower::ServiceExt;

fn app(harness: &TestHarness) -> Router {
    router(GatewayState::new(harness.admin.clone()))
}

fn form(method: &str, uri: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn empty(method: &str, uri: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

async fn body_text(response: axum::response::Response) -> String {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

async fn body_json(response: axum::response::Response) -> Value {
    serde_json::from_str(&body_text(response).await).unwrap()
}

#[tokio::test]
async fn health_reports_ok() {
    let harness = TestHarness::builder().build().await.unwrap();
    let response = app(&harness).oneshot(empty("GET", "/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["status"], "ok");
}

#[tokio::test]
async fn list_messages_returns_json_page() {
    let harness = TestHarness::builder().build().await.unwrap();
    harness.send("42", "hello").await.unwrap();

    let response = app(&harness)
        .oneshot(empty("GET", "/api/conversations/42/messages?page=0"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    let messages = json.as_array().unwrap();
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0]["id"], 1);
    assert_eq!(messages[0]["role"], "user");
    assert_eq!(messages[0]["content"], "hello");
    assert_eq!(messages[1]["role"], "assistant");
}

#[tokio::test]
async fn unknown_page_is_empty_not_an_error() {
    let harness = TestHarness::builder().build().await.unwrap();
    let response = app(&harness)
        .oneshot(empty("GET", "/api/conversations/42/messages?page=7"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await, serde_json::json!([]));
}

#[tokio::test]
async fn update_and_delete_message() {
    let harness = TestHarness::builder().build().await.unwrap();
    harness.send("1", "typo here").await.unwrap();

    let response = app(&harness)
        .oneshot(form(
            "PUT",
            "/api/conversations/1/messages/1",
            "content=fixed+text",
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["content"], "fixed text");

    let response = app(&harness)
        .oneshot(empty("DELETE", "/api/conversations/1/messages/2"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let stored = harness.messages("1").await.unwrap();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].content, "fixed text");
}

#[tokio::test]
async fn missing_message_is_404() {
    let harness = TestHarness::builder().build().await.unwrap();
    harness.send("1", "hello").await.unwrap();

    let response = app(&harness)
        .oneshot(form("PUT", "/api/conversations/1/messages/99", "content=x"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert!(body_json(response).await["error"].is_string());

    let response = app(&harness)
        .oneshot(empty("DELETE", "/api/conversations/2/messages/1"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn add_message_validates_role() {
    let harness = TestHarness::builder().build().await.unwrap();

    let response = app(&harness)
        .oneshot(form(
            "POST",
            "/api/conversations/3/messages",
            "role=System&content=note",
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    assert_eq!(body_json(response).await["id"], 1);

    let response = app(&harness)
        .oneshot(form(
            "POST",
            "/api/conversations/3/messages",
            "role=narrator&content=note",
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(harness.messages("3").await.unwrap().len(), 1);
}

#[tokio::test]
async fn prompt_returns_plain_text_reply() {
    let harness = TestHarness::builder().build().await.unwrap();

    let response = app(&harness)
        .oneshot(text("POST", "/api/prompt/77", "how are things?"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_text(response).await, "mock response");

    let stored = harness.messages("77").await.unwrap();
    assert_eq!(stored[0].content, "how are things?");
}

#[tokio::test]
async fn anonymous_prompt_uses_conversation_zero() {
    let harness = TestHarness::builder().build().await.unwrap();

    let response = app(&harness)
        .oneshot(form("POST", "/api/prompt", "message=ping"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_text(response).await, "mock response");
    assert_eq!(harness.messages("0").await.unwrap().len(), 2);
}

#[tokio::test]
async fn empty_prompt_is_rejected() {
    let harness = TestHarness::builder().build().await.unwrap();
    let response = app(&harness)
        .oneshot(text("POST", "/api/prompt/5", "   "))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(harness.model.call_count(), 0);
}

#[tokio::test]
async fn system_message_is_set_and_visible() {
    let harness = TestHarness::builder().build().await.unwrap();

    let response = app(&harness)
        .oneshot(form(
            "POST",
            "/api/systemMessage",
            "chatId=12&message=Be+brief.",
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        body_text(response).await,
        "System message set for conversation 12"
    );

    let response = app(&harness)
        .oneshot(empty("GET", "/api/conversations/12"))
        .await
        .unwrap();
    let json = body_json(response).await;
    assert_eq!(json["system_message"], "Be brief.");

    let response = app(&harness)
        .oneshot(form("POST", "/api/systemMessage", "chatId=&message=x"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn conversations_listing_and_deletion() {
    let harness = TestHarness::builder().build().await.unwrap();
    harness.send("1", "a").await.unwrap();
    harness.send("2", "b").await.unwrap();

    let response = app(&harness)
        .oneshot(empty("GET", "/api/conversations"))
        .await
        .unwrap();
    let json = body_json(response).await;
    let ids: Vec<&str> = json
        .as_array()
        .unwrap()
        .iter()
        .filter_map(Value::as_str)
        .collect();
    assert!(ids.contains(&"1"));
    assert!(ids.contains(&"2"));

    let response = app(&harness)
        .oneshot(empty("DELETE", "/api/conversations/1"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = app(&harness)
        .oneshot(empty("GET", "/api/conversations/1"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn broadcast_returns_delivery_count() {
    let harness = TestHarness::builder().build().await.unwrap();
    harness.send("1", "a").await.unwrap();
    harness.send("2", "b").await.unwrap();

    let response = app(&harness)
        .oneshot(form("POST", "/api/broadcast", "message=restarting+soon"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_text(response).await, "2");
    assert_eq!(
        harness.channel.sent_to("2").await,
        vec!["restarting soon"]
    );
}

#[tokio::test]
async fn busy_conversation_maps_to_503() {
    let (model, gate) = MockModel::new().gated();
    let harness = Arc::new(
        TestHarness::builder()
            .with_model(model)
            .with_lock_timeout(Duration::from_millis(50))
            .build()
            .await
            .unwrap(),
    );

    let run = {
        let harness = Arc::clone(&harness);
        tokio::spawn(async move { harness.send("1", "long task").await })
    };
    gate.entered().await;

    let response = app(&harness)
        .oneshot(empty("DELETE", "/api/conversations/1/messages/1"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

    gate.open(1);
    run.await.unwrap().unwrap();
}

#[tokio::test]
async fn tasks_are_scheduled_listed_and_cancelled() {
    let harness = TestHarness::builder().build().await.unwrap();

    let response = app(&harness)
        .oneshot(form(
            "POST",
            "/api/tasks/42",
            "prompt=Remind+me+to+stretch&dueAt=2099-01-01+09%3A00&key=stretch",
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let json = body_json(response).await;
    assert_eq!(json["key"], "stretch");
    assert_eq!(json["conversation_id"], "42");
    assert_eq!(json["due_at"], "2099-01-01T09:00:00Z");

    // Without a key one is derived from the prompt.
    let response = app(&harness)
        .oneshot(form(
            "POST",
            "/api/tasks/7",
            "prompt=Water+the+plants&dueAt=2099-01-02T10%3A00%3A00Z",
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    assert_eq!(body_json(response).await["key"], "water-the-plants");

    let all = body_json(app(&harness).oneshot(empty("GET", "/api/tasks")).await.unwrap()).await;
    assert_eq!(all.as_array().unwrap().len(), 2);
    assert_eq!(all[0]["key"], "stretch");

    let mine = body_json(
        app(&harness)
            .oneshot(empty("GET", "/api/tasks/42"))
            .await
            .unwrap(),
    )
    .await;
    assert_eq!(mine.as_array().unwrap().len(), 1);

    let response = app(&harness)
        .oneshot(empty("DELETE", "/api/tasks/42/stretch"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = app(&harness)
        .oneshot(empty("DELETE", "/api/tasks/42/stretch"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn bad_task_requests_are_400() {
    let harness = TestHarness::builder().build().await.unwrap();

    for body in [
        "prompt=late&dueAt=2001-01-01+09%3A00",
        "prompt=vague&dueAt=next+week",
        "prompt=+&dueAt=2099-01-01+09%3A00",
        "prompt=slashed&dueAt=2099-01-01+09%3A00&key=a%2Fb",
    ] {
        let response = app(&harness)
            .oneshot(form("POST", "/api/tasks/1", body))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{body}");
    }
    assert!(harness.admin.tasks().await.unwrap().is_empty());
}

#[tokio::test]
async fn task_routes_report_disabled_scheduler() {
    let harness = TestHarness::builder()
        .without_scheduler()
        .build()
        .await
        .unwrap();
    let response = app(&harness).oneshot(empty("GET", "/api/tasks")).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(body_text(response).await.contains("disabled"));
}

#[tokio::test]
async fn profile_is_set_and_read_back() {
    let harness = TestHarness::builder().build().await.unwrap();

    let response = app(&harness)
        .oneshot(empty("GET", "/api/profile/42"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = app(&harness)
        .oneshot(form("POST", "/api/profile/42", "profile=Prefers+short+answers."))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app(&harness)
        .oneshot(empty("GET", "/api/profile/42"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_text(response).await, "Prefers short answers.");

    let response = app(&harness)
        .oneshot(form("POST", "/api/profile/42", "profile=++"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

fn text(method: &str, uri: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "text/plain")
        .body(Body::from(body.to_string()))
        .unwrap()
}
