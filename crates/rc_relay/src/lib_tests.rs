use assert_matches::assert_matches;
use pretty_assertions::assert_eq;
use rc_chat::{ChatController, ChatRequest, HttpTransport};
use rc_conversation::TurnStatus;
use rc_test::{
    mock::{MockServer, POST, unreachable_url},
    stream::sse,
};
use reqwest::header::{CACHE_CONTROL, CONTENT_LENGTH};
use serde_json::json;
use test_log::test;

use super::*;

/// Start a relay in front of `backend_url`, returning its base URL.
async fn spawn_relay(backend_url: impl Into<Arc<str>>) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(serve(
        listener,
        RelayState::new(backend_url),
        std::future::pending(),
    ));

    format!("http://{addr}")
}

#[test(tokio::test)]
async fn test_request_body_is_forwarded_verbatim() {
    // Escaped control characters must reach the backend untouched.
    let raw = "{\"message\":\"tab\\there\\u0001\",  \"conversationId\" : \"c1\"}";

    let backend = MockServer::start_async().await;
    let mock = backend
        .mock_async(|when, then| {
            when.method(POST).path("/api/chat/stream").body(raw);
            then.status(200)
                .header("content-type", "text/event-stream")
                .body(sse(&[r#"{"content":"Hi"}"#, r#"{"done":true}"#]));
        })
        .await;

    let relay = spawn_relay(backend.url("/api/chat/stream")).await;
    let response = reqwest::Client::new()
        .post(format!("{relay}{CHAT_STREAM_ROUTE}"))
        .header("content-type", "application/json")
        .body(raw)
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 200);
    assert_eq!(
        response.headers().get(CACHE_CONTROL).unwrap(),
        "no-cache, no-transform"
    );
    assert_eq!(response.headers().get("x-accel-buffering").unwrap(), "no");
    assert_eq!(
        response.headers().get("content-type").unwrap(),
        "text/event-stream"
    );
    assert!(response.headers().get(CONTENT_LENGTH).is_none());
    assert_eq!(
        response.text().await.unwrap(),
        sse(&[r#"{"content":"Hi"}"#, r#"{"done":true}"#])
    );
    mock.assert_async().await;
}

#[test(tokio::test)]
async fn test_backend_status_is_passed_through() {
    let backend = MockServer::start_async().await;
    backend
        .mock_async(|when, then| {
            when.method(POST);
            then.status(429).json_body(json!({ "error": "rate_limited" }));
        })
        .await;

    let relay = spawn_relay(backend.base_url()).await;
    let response = reqwest::Client::new()
        .post(format!("{relay}{CHAT_STREAM_ROUTE}"))
        .body("{}")
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 429);
    assert_eq!(
        response.json::<Value>().await.unwrap(),
        json!({ "error": "rate_limited" })
    );
}

#[test(tokio::test)]
async fn test_unreachable_backend_is_a_json_502() {
    let backend_url = format!("{}/api/chat/stream", unreachable_url());
    let relay = spawn_relay(backend_url.as_str()).await;

    let response = reqwest::Client::new()
        .post(format!("{relay}{CHAT_STREAM_ROUTE}"))
        .body(r#"{"message":"hi"}"#)
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 502);
    let body = response.json::<Value>().await.unwrap();
    assert_eq!(body["error"], "backend_unreachable");
    assert_matches!(body["message"].as_str(), Some(message) if message.contains(&backend_url));
    assert_matches!(body["suggestion"].as_str(), Some(suggestion) if !suggestion.is_empty());
}

#[test(tokio::test)]
async fn test_health() {
    let relay = spawn_relay(unreachable_url()).await;

    let body = reqwest::get(format!("{relay}/healthz"))
        .await
        .unwrap()
        .json::<Value>()
        .await
        .unwrap();

    assert_eq!(body, json!({ "status": "ok" }));
}

#[test(tokio::test)]
async fn test_chat_through_relay() {
    let backend = MockServer::start_async().await;
    backend
        .mock_async(|when, then| {
            when.method(POST).json_body(json!({ "message": "hi" }));
            then.status(200).body(sse(&[
                r#"{"content":"Hel","done":false}"#,
                r#"{"content":"lo","done":false}"#,
                r#"{"done":true,"citations":[{"docId":"d1","page":2}]}"#,
            ]));
        })
        .await;

    let relay = spawn_relay(backend.base_url()).await;
    let controller = ChatController::new(
        HttpTransport::new(format!("{relay}{CHAT_STREAM_ROUTE}")),
        "Thinking...",
    );

    let turn = controller.submit(ChatRequest::new("hi")).unwrap().run().await;

    assert_eq!(turn.status, TurnStatus::Complete);
    assert_eq!(
        turn.assistant_content,
        "Hello\n\n---\nCitations:\n1. d1 (page 2)"
    );
}

#[test(tokio::test)]
async fn test_chat_through_relay_with_unreachable_backend() {
    let backend_url = unreachable_url();
    let relay = spawn_relay(backend_url.as_str()).await;
    let controller = ChatController::new(
        HttpTransport::new(format!("{relay}{CHAT_STREAM_ROUTE}")),
        "Thinking...",
    );

    let turn = controller.submit(ChatRequest::new("hi")).unwrap().run().await;

    assert_eq!(turn.status, TurnStatus::Error);
    assert!(
        turn.assistant_content.contains(&backend_url),
        "{}",
        turn.assistant_content
    );
}
