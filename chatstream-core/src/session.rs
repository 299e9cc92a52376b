//! The pull loop that drives one streamed reply through the decoder pipeline.

use bytes::Bytes;
use futures::{Stream, StreamExt};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::error::CoreResult;
use crate::sse::{Frame, FrameParser, LineBuffer, Utf8Decoder, decode_frame};
use crate::stream::{ChatEvent, EventHandler};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndReason {
    /// The byte source reported end-of-stream.
    Completed,
    /// The caller cancelled; nothing was dispatched after that point.
    Cancelled,
}

impl EndReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionSummary {
    pub end: EndReason,
    pub events_dispatched: u64,
    pub frames_dropped: u64,
    pub bytes_received: u64,
    pub reply_chars: u64,
}

/// State of one reply stream: decoder tail, partial line and pending frame.
///
/// Owned by the loop in [`StreamSession::run`]; dropping it releases every buffer.
#[derive(Debug)]
pub struct StreamSession {
    decoder: Utf8Decoder,
    lines: LineBuffer,
    frames: FrameParser,
    cancel: CancellationToken,
    events_dispatched: u64,
    frames_dropped: u64,
    bytes_received: u64,
    reply_chars: u64,
}

impl Default for StreamSession {
    fn default() -> Self {
        Self::with_cancellation(CancellationToken::new())
    }
}

impl StreamSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_cancellation(cancel: CancellationToken) -> Self {
        Self {
            decoder: Utf8Decoder::new(),
            lines: LineBuffer::new(),
            frames: FrameParser::new(),
            cancel,
            events_dispatched: 0,
            frames_dropped: 0,
            bytes_received: 0,
            reply_chars: 0,
        }
    }

    /// Push one chunk through the pipeline, dispatching every frame it completes.
    pub fn feed<H: EventHandler + ?Sized>(&mut self, chunk: &[u8], handler: &mut H) {
        self.bytes_received += chunk.len() as u64;
        let text = self.decoder.decode(chunk);
        for line in self.lines.feed(&text) {
            self.process_line(&line, handler);
        }
    }

    /// End-of-stream: flush the decoder tail and the unterminated last line.
    pub fn finish<H: EventHandler + ?Sized>(&mut self, handler: &mut H) {
        let text = self.decoder.finish();
        let mut lines = self.lines.feed(&text);
        lines.extend(self.lines.finish());
        for line in lines {
            self.process_line(&line, handler);
        }
    }

    pub fn summary(&self, end: EndReason) -> SessionSummary {
        SessionSummary {
            end,
            events_dispatched: self.events_dispatched,
            frames_dropped: self.frames_dropped,
            bytes_received: self.bytes_received,
            reply_chars: self.reply_chars,
        }
    }

    /// Pull chunks from `source` until it ends, fails, or the session is cancelled.
    ///
    /// A failed pull ends the session with that error; events already handed to
    /// `handler` stay applied.
    pub async fn run<S, H>(mut self, mut source: S, handler: &mut H) -> CoreResult<SessionSummary>
    where
        S: Stream<Item = CoreResult<Bytes>> + Unpin,
        H: EventHandler + ?Sized,
    {
        let cancel = self.cancel.clone();
        loop {
            let next = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    debug!(bytes.received = self.bytes_received, "stream cancelled");
                    return Ok(self.summary(EndReason::Cancelled));
                }
                next = source.next() => next,
            };
            match next {
                Some(Ok(chunk)) => self.feed(&chunk, handler),
                Some(Err(err)) => {
                    warn!(error.kind = err.kind(), error = %err, "stream read failed");
                    return Err(err);
                }
                None => {
                    self.finish(handler);
                    let end = if cancel.is_cancelled() {
                        EndReason::Cancelled
                    } else {
                        EndReason::Completed
                    };
                    return Ok(self.summary(end));
                }
            }
        }
    }

    fn process_line<H: EventHandler + ?Sized>(&mut self, line: &str, handler: &mut H) {
        if let Some(frame) = self.frames.push_line(line) {
            self.dispatch(frame, handler);
        }
    }

    fn dispatch<H: EventHandler + ?Sized>(&mut self, frame: Frame, handler: &mut H) {
        if self.cancel.is_cancelled() {
            return;
        }
        match decode_frame(&frame) {
            Ok(Some(event)) => {
                if let ChatEvent::Chunk(text) = &event {
                    self.reply_chars += text.chars().count() as u64;
                }
                self.events_dispatched += 1;
                handler.handle(event);
            }
            Ok(None) => debug!(event.kind = %frame.event, "ignoring unknown event kind"),
            Err(err) => {
                self.frames_dropped += 1;
                warn!(event.kind = %frame.event, error = %err, "dropping malformed frame");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ChatStreamError;
    use crate::model::Role;
    use crate::test_util::{byte_chunks, feed_chunks, sample_reply, split_at};

    #[test]
    fn chunk_split_inside_json_string() {
        let events = feed_chunks(&[
            b"event: chunk\ndata: {\"content\": \"Hel".to_vec(),
            b"lo\"}\nevent: done\ndata: {}\n".to_vec(),
        ]);
        assert_eq!(
            events,
            vec![ChatEvent::Chunk("Hello".into()), ChatEvent::Done]
        );
    }

    #[test]
    fn every_single_split_point_matches_whole_delivery() {
        let bytes = sample_reply().into_bytes();
        let expected = feed_chunks(&[bytes.clone()]);
        assert_eq!(expected.len(), 6);

        for i in 0..=bytes.len() {
            let got = feed_chunks(&split_at(&bytes, &[i]));
            assert_eq!(got, expected, "split at byte {i}");
        }
    }

    #[test]
    fn two_split_points_match_whole_delivery() {
        let bytes = sample_reply().into_bytes();
        let expected = feed_chunks(&[bytes.clone()]);

        for i in (0..bytes.len()).step_by(3) {
            for j in (i..=bytes.len()).step_by(5) {
                let got = feed_chunks(&split_at(&bytes, &[i, j]));
                assert_eq!(got, expected, "split at bytes {i} and {j}");
            }
        }
    }

    #[test]
    fn byte_at_a_time_matches_whole_delivery() {
        let bytes = sample_reply().into_bytes();
        let expected = feed_chunks(&[bytes.clone()]);
        let singles: Vec<Vec<u8>> = bytes.iter().map(|b| vec![*b]).collect();
        assert_eq!(feed_chunks(&singles), expected);
    }

    #[test]
    fn chunks_arrive_before_assistant_message() {
        let events = feed_chunks(&[sample_reply().into_bytes()]);
        let kinds: Vec<_> = events.iter().map(|e| e.kind().as_str()).collect();
        assert_eq!(
            kinds,
            vec!["user_message", "chunk", "chunk", "chunk", "assistant_message", "done"]
        );
        let reply: String = events.iter().filter_map(|e| e.as_chunk()).collect();
        assert_eq!(reply, "Héllo, wörld 🦀");
        match &events[4] {
            ChatEvent::AssistantMessage(m) => {
                assert_eq!(m.role, Role::Assistant);
                assert_eq!(m.content, reply);
            }
            other => panic!("expected AssistantMessage, got: {:?}", other),
        }
    }

    #[test]
    fn malformed_payload_does_not_stop_later_frames() {
        let mut session = StreamSession::new();
        let mut seen = Vec::new();
        let mut handler = |ev: ChatEvent| seen.push(ev);
        session.feed(
            b"event: chunk\ndata: {broken\n\nevent: chunk\ndata: {\"wrong\":1}\n\nevent: chunk\ndata: {\"content\":\"ok\"}\n\n",
            &mut handler,
        );
        session.finish(&mut handler);
        let summary = session.summary(EndReason::Completed);
        assert_eq!(seen, vec![ChatEvent::Chunk("ok".into())]);
        assert_eq!(summary.frames_dropped, 2);
        assert_eq!(summary.events_dispatched, 1);
    }

    #[test]
    fn unknown_kind_is_skipped() {
        let events = feed_chunks(&[
            b"event: heartbeat\ndata: {\"ts\":1}\n\nevent: chunk\ndata: {\"content\":\"a\"}\n\n".to_vec(),
        ]);
        assert_eq!(events, vec![ChatEvent::Chunk("a".into())]);
    }

    #[test]
    fn error_event_does_not_end_the_stream() {
        let events = feed_chunks(&[
            b"event: error\ndata: {\"error\":\"upstream timeout\"}\n\nevent: done\ndata: {}\n\n".to_vec(),
        ]);
        assert_eq!(
            events,
            vec![ChatEvent::Error("upstream timeout".into()), ChatEvent::Done]
        );
    }

    #[test]
    fn unterminated_final_data_line_is_flushed() {
        let events = feed_chunks(&[b"event: done\ndata: {\"status\":\"complete\"}".to_vec()]);
        assert_eq!(events, vec![ChatEvent::Done]);
    }

    #[test]
    fn empty_data_line_is_dropped() {
        let events = feed_chunks(&[b"event: done\ndata: \n\nevent: done\ndata: {}\n".to_vec()]);
        assert_eq!(events, vec![ChatEvent::Done]);
    }

    #[tokio::test]
    async fn run_completes_at_end_of_stream() {
        let mut seen = Vec::new();
        let mut handler = |ev: ChatEvent| seen.push(ev);
        let source = byte_chunks(split_at(sample_reply().as_bytes(), &[10, 200]));
        let summary = StreamSession::new().run(source, &mut handler).await.unwrap();
        assert_eq!(summary.end, EndReason::Completed);
        assert_eq!(summary.events_dispatched, 6);
        assert_eq!(summary.bytes_received, sample_reply().len() as u64);
        assert_eq!(summary.reply_chars, "Héllo, wörld 🦀".chars().count() as u64);
        assert_eq!(seen.len(), 6);
    }

    #[tokio::test]
    async fn transport_failure_keeps_dispatched_events() {
        let mut seen = Vec::new();
        let mut handler = |ev: ChatEvent| seen.push(ev);
        let source = futures::stream::iter(vec![
            Ok(Bytes::from_static(b"event: chunk\ndata: {\"content\":\"par\"}\n\n")),
            Err(ChatStreamError::Transport("connection reset".into())),
            Ok(Bytes::from_static(b"event: done\ndata: {}\n\n")),
        ]);
        let err = StreamSession::new()
            .run(source, &mut handler)
            .await
            .unwrap_err();
        assert!(matches!(err, ChatStreamError::Transport(_)));
        assert_eq!(seen, vec![ChatEvent::Chunk("par".into())]);
    }

    #[tokio::test]
    async fn cancelled_before_start_dispatches_nothing() {
        let cancel = CancellationToken::new();
        cancel.cancel();
        let mut calls = 0;
        let mut handler = |_: ChatEvent| calls += 1;
        let source = byte_chunks(vec![sample_reply().into_bytes()]);
        let summary = StreamSession::with_cancellation(cancel)
            .run(source, &mut handler)
            .await
            .unwrap();
        assert_eq!(summary.end, EndReason::Cancelled);
        assert_eq!(calls, 0);
    }

    #[tokio::test]
    async fn cancel_from_handler_stops_dispatch_and_pending_pull() {
        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        let mut seen = Vec::new();
        let mut handler = |ev: ChatEvent| {
            seen.push(ev);
            trigger.cancel();
        };
        // two frames in one chunk, then a source that never yields again
        let source = futures::stream::iter(vec![Ok(Bytes::from_static(
            b"event: chunk\ndata: {\"content\":\"a\"}\nevent: chunk\ndata: {\"content\":\"b\"}\n",
        ))])
        .chain(futures::stream::pending());
        let summary = StreamSession::with_cancellation(cancel)
            .run(source, &mut handler)
            .await
            .unwrap();
        assert_eq!(summary.end, EndReason::Cancelled);
        assert_eq!(seen, vec![ChatEvent::Chunk("a".into())]);
    }
}
