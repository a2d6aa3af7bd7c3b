use assert_matches::assert_matches;
use futures::StreamExt as _;
use pretty_assertions::assert_eq;
use rc_test::{
    mock::{MockServer, POST, unreachable_url},
    stream::sse,
};
use serde_json::json;
use test_log::test;
use tokio_util::sync::CancellationToken;

use super::*;

#[test]
fn test_request_serializes_only_present_fields() {
    let request = ChatRequest::new("hi");
    assert_eq!(serde_json::to_value(&request).unwrap(), json!({ "message": "hi" }));

    let request = ChatRequest::new("hi")
        .with_conversation("c1")
        .with_model("small")
        .with_document("doc-7");
    assert_eq!(
        serde_json::to_value(&request).unwrap(),
        json!({
            "message": "hi",
            "conversationId": "c1",
            "model": "small",
            "documentId": "doc-7",
        })
    );
}

#[test(tokio::test)]
async fn test_open_streams_response_body() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/api/chat/stream")
                .header("accept", "text/event-stream")
                .json_body(json!({ "message": "hi", "conversationId": "c1" }));
            then.status(200)
                .header("content-type", "text/event-stream")
                .body(sse(&[
                    r#"{"content":"Hel"}"#,
                    r#"{"content":"lo"}"#,
                    r#"{"done":true}"#,
                ]));
        })
        .await;

    let transport = HttpTransport::new(server.url("/api/chat/stream"));
    let body = transport
        .open(&ChatRequest::new("hi").with_conversation("c1"))
        .await
        .unwrap();

    let events = rc_stream::events(body, CancellationToken::new())
        .collect::<Vec<_>>()
        .await;

    assert_eq!(events, vec![
        StreamEvent::delta("Hel"),
        StreamEvent::delta("lo"),
        StreamEvent::done(vec![]),
    ]);
    mock.assert_async().await;
}

#[test(tokio::test)]
async fn test_open_error_status_uses_error_payload() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST);
            then.status(502).json_body(json!({
                "error": "backend_unreachable",
                "message": "Backend at http://backend is unreachable.",
            }));
        })
        .await;

    let transport = HttpTransport::new(server.base_url());
    let error = transport.open(&ChatRequest::new("hi")).await.err();

    assert_matches!(
        error,
        Some(TransportError::Status { code: 502, message })
            if message == "Backend at http://backend is unreachable."
    );
}

#[test(tokio::test)]
async fn test_open_error_status_without_payload() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST);
            then.status(500).body("<html>oops</html>");
        })
        .await;

    let transport = HttpTransport::new(server.base_url());
    let error = transport.open(&ChatRequest::new("hi")).await.err();

    assert_matches!(error, Some(TransportError::Status { code: 500, message }) if message.contains("500"));
}

#[test(tokio::test)]
async fn test_open_unreachable() {
    let url = unreachable_url();
    let transport = HttpTransport::new(url.clone());

    let error = transport.open(&ChatRequest::new("hi")).await.err();
    assert_matches!(error, Some(TransportError::Connect { url: u, .. }) if u == url);
}
