use futures::StreamExt as _;
use pretty_assertions::assert_eq;
use rc_test::stream::{chunked, chunks, failing_after, sse};
use test_log::test;

use super::*;

async fn collect<S>(body: S) -> Vec<StreamEvent>
where
    S: Stream<Item = io::Result<Bytes>> + Send + 'static,
{
    events(body, CancellationToken::new()).collect().await
}

#[test(tokio::test)]
async fn test_events_across_arbitrary_chunk_sizes() {
    let body = sse(&[
        r#"{"content":"Hel","done":false}"#,
        r#"{"content":"lo été","done":false}"#,
        r#"{"content":" 😀","done":false}"#,
        r#"{"done":true,"messageId":"m1"}"#,
    ]);

    let expected = vec![
        StreamEvent::delta("Hel"),
        StreamEvent::delta("lo \u{e9}t\u{e9}"),
        StreamEvent::delta(" \u{1f600}"),
        StreamEvent::Done {
            message_id: Some("m1".to_owned()),
            citations: vec![],
        },
    ];

    for size in 1..=body.len() {
        assert_eq!(collect(chunked(&body, size)).await, expected, "chunk size {size}");
    }
}

#[test(tokio::test)]
async fn test_raw_multi_byte_characters_split_across_reads() {
    let body = sse(&["{\"content\":\"caf\u{e9} na\u{ef}ve\"}"]);

    for size in 1..8 {
        assert_eq!(collect(chunked(&body, size)).await, vec![StreamEvent::delta(
            "caf\u{e9} na\u{ef}ve"
        )]);
    }
}

#[test(tokio::test)]
async fn test_invalid_frame_between_valid_frames_is_skipped() {
    let body = sse(&[
        r#"{"content":"A","done":false}"#,
        r#"{"content": "broken"#,
        r#"{"content":"B","done":false}"#,
    ]);

    let text = collect(chunked(body, 5))
        .await
        .into_iter()
        .map(|event| match event {
            StreamEvent::Delta { text } => text,
            event => panic!("unexpected event {event:?}"),
        })
        .collect::<String>();

    assert_eq!(text, "AB");
}

#[test(tokio::test)]
async fn test_transport_failure_is_a_single_terminal_event() {
    let body = failing_after(
        [
            "data: {\"content\":\"A\"}\n\ndata: {\"content\":\"B\"}\n\n",
            "data: {\"content\":\"C\"",
        ],
        "connection reset by peer",
    );

    let events = collect(body).await;
    assert_eq!(events.len(), 3);
    assert_eq!(&events[..2], &[StreamEvent::delta("A"), StreamEvent::delta("B")]);
    assert!(
        matches!(&events[2], StreamEvent::Failed { message } if message.contains("connection reset")),
        "unexpected event {:?}",
        events[2]
    );
}

#[test(tokio::test)]
async fn test_cancelled_before_reading_yields_nothing() {
    let cancel = CancellationToken::new();
    cancel.cancel();

    let events = events(chunks([sse(&[r#"{"content":"A"}"#])]), cancel)
        .collect::<Vec<_>>()
        .await;

    assert_eq!(events, vec![]);
}

#[test(tokio::test)]
async fn test_cancel_ends_a_stalled_stream() {
    let body = chunks([sse(&[r#"{"content":"A"}"#])]).chain(futures::stream::pending());
    let cancel = CancellationToken::new();
    let events = events(body, cancel.clone());
    tokio::pin!(events);

    assert_eq!(events.next().await, Some(StreamEvent::delta("A")));

    cancel.cancel();
    assert_eq!(events.next().await, None);
}

#[test(tokio::test)]
async fn test_frames_after_cancellation_are_discarded() {
    // Both records arrive in a single read.
    let body = chunks([sse(&["one", "two"])]);
    let cancel = CancellationToken::new();
    let frames = frames(body, cancel.clone());
    tokio::pin!(frames);

    assert_eq!(frames.next().await, Some(Ok("one".to_owned())));

    cancel.cancel();
    assert_eq!(frames.next().await, None);
}
