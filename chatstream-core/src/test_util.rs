//! Shared fixtures for stream tests.

use bytes::Bytes;
use futures::Stream;

use crate::error::CoreResult;
use crate::session::StreamSession;
use crate::stream::ChatEvent;

/// A full reply as the server writes it, with multi-byte text and one unknown kind.
pub fn sample_reply() -> String {
    [
        r#"event: user_message"#,
        r#"data: {"id": 41, "role": "user", "content": "Say hi", "attachments": [], "created_at": "2024-05-01T10:00:00", "citations": []}"#,
        "",
        r#"event: chunk"#,
        r#"data: {"content": "Héllo, "}"#,
        "",
        r#"event: chunk"#,
        r#"data: {"content": "wörld "}"#,
        "",
        r#"event: heartbeat"#,
        r#"data: {}"#,
        "",
        r#"event: chunk"#,
        r#"data: {"content": "🦀"}"#,
        "",
        r#"event: assistant_message"#,
        r#"data: {"id": 42, "role": "assistant", "content": "Héllo, wörld 🦀", "attachments": [], "created_at": "2024-05-01T10:00:02", "citations": [{"document_title": "Greetings", "chunk_content": "hello", "relevance_score": 0.9, "chunk_index": 0}]}"#,
        "",
        r#"event: done"#,
        r#"data: {"status": "complete"}"#,
        "",
        "",
    ]
    .join("\n")
}

/// Cut `bytes` at each offset (sorted, may repeat) into consecutive chunks.
pub fn split_at(bytes: &[u8], offsets: &[usize]) -> Vec<Vec<u8>> {
    let mut chunks = Vec::with_capacity(offsets.len() + 1);
    let mut start = 0;
    for &off in offsets {
        let off = off.clamp(start, bytes.len());
        chunks.push(bytes[start..off].to_vec());
        start = off;
    }
    chunks.push(bytes[start..].to_vec());
    chunks
}

/// Feed chunks synchronously through a fresh session and collect the events.
pub fn feed_chunks(chunks: &[Vec<u8>]) -> Vec<ChatEvent> {
    let mut session = StreamSession::new();
    let mut seen = Vec::new();
    let mut handler = |ev: ChatEvent| seen.push(ev);
    for chunk in chunks {
        session.feed(chunk, &mut handler);
    }
    session.finish(&mut handler);
    seen
}

pub fn byte_chunks(chunks: Vec<Vec<u8>>) -> impl Stream<Item = CoreResult<Bytes>> + Unpin {
    futures::stream::iter(chunks.into_iter().map(|c| Ok(Bytes::from(c))))
}
