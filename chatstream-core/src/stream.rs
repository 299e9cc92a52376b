//! Streaming primitives exposed by chatstream.
//!
//! Contract:
//! - A reply stream emits events in the order their frames complete on the wire.
//! - The server normally sends `UserMessage`, 0..n `Chunk`s, `AssistantMessage`, then `Done`.
//! - `Error` is an application-level notification; it does not end the stream by itself.
//!
//! Consumers implement [`EventHandler`] (or pass a closure) and match on [`ChatEvent`].

use std::str::FromStr;

use crate::error::CoreResult;
use crate::model::Message;

/// What the consumer receives incrementally.
#[derive(Debug, Clone, PartialEq)]
pub enum ChatEvent {
    /// Echo of the user's turn as persisted by the server.
    UserMessage(Message),
    /// Incremental fragment of the assistant reply; append in arrival order.
    Chunk(String),
    /// Final persisted assistant message; streamed text for this turn is over.
    AssistantMessage(Message),
    /// Upstream failure reported by the server (e.g. the model call failed).
    Error(String),
    /// The server finished the turn.
    Done,
}

impl ChatEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            Self::UserMessage(_) => EventKind::UserMessage,
            Self::Chunk(_) => EventKind::Chunk,
            Self::AssistantMessage(_) => EventKind::AssistantMessage,
            Self::Error(_) => EventKind::Error,
            Self::Done => EventKind::Done,
        }
    }

    /// Convenience accessor for `Chunk` contents.
    pub fn as_chunk(&self) -> Option<&str> {
        match self {
            Self::Chunk(s) => Some(s.as_str()),
            _ => None,
        }
    }
}

/// The closed set of event labels carried on `event: ` lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    UserMessage,
    Chunk,
    AssistantMessage,
    Error,
    Done,
}

impl EventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::UserMessage => "user_message",
            Self::Chunk => "chunk",
            Self::AssistantMessage => "assistant_message",
            Self::Error => "error",
            Self::Done => "done",
        }
    }
}

impl FromStr for EventKind {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user_message" => Ok(Self::UserMessage),
            "chunk" => Ok(Self::Chunk),
            "assistant_message" => Ok(Self::AssistantMessage),
            "error" => Ok(Self::Error),
            "done" => Ok(Self::Done),
            _ => Err(()),
        }
    }
}

/// Receives every dispatched event of one stream invocation.
pub trait EventHandler {
    fn handle(&mut self, event: ChatEvent);
}

impl<F> EventHandler for F
where
    F: FnMut(ChatEvent),
{
    fn handle(&mut self, event: ChatEvent) {
        self(event)
    }
}

/// Boxed stream of raw body chunks. The HTTP layer produces this; tests build it from iterators.
pub type ByteStream = futures::stream::BoxStream<'static, CoreResult<bytes::Bytes>>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn helpers_work() {
        let c = ChatEvent::Chunk("hi".into());
        assert_eq!(c.kind(), EventKind::Chunk);
        assert_eq!(c.as_chunk(), Some("hi"));
        assert_eq!(ChatEvent::Done.as_chunk(), None);
    }

    #[test]
    fn kind_names_parse_back() {
        for kind in [
            EventKind::UserMessage,
            EventKind::Chunk,
            EventKind::AssistantMessage,
            EventKind::Error,
            EventKind::Done,
        ] {
            assert_eq!(kind.as_str().parse::<EventKind>(), Ok(kind));
        }
        assert!("heartbeat".parse::<EventKind>().is_err());
        assert!("Chunk".parse::<EventKind>().is_err());
    }

    #[test]
    fn closures_are_handlers() {
        let mut seen = Vec::new();
        {
            let mut h = |ev: ChatEvent| seen.push(ev);
            h.handle(ChatEvent::Done);
        }
        assert_eq!(seen, vec![ChatEvent::Done]);
    }
}
