use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

use super::Frame;
use crate::model::Message;
use crate::stream::{ChatEvent, EventKind};

/// Why a frame was dropped. Never surfaced past the session; logged only.
#[derive(Debug, Error)]
pub enum FrameError {
    #[error("payload is not valid JSON: {0}")]
    Json(#[source] serde_json::Error),

    #[error("payload does not match the `{kind}` schema: {source}")]
    Schema {
        kind: &'static str,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Deserialize)]
struct ChunkPayload {
    content: String,
}

#[derive(Deserialize)]
struct ErrorPayload {
    error: String,
}

/// Decode a completed frame.
///
/// Returns `Ok(None)` for kinds outside [`EventKind`]. The payload must be
/// JSON for every kind, `done` included, even though its body is unused.
pub fn decode_frame(frame: &Frame) -> Result<Option<ChatEvent>, FrameError> {
    let value: Value = serde_json::from_str(&frame.data).map_err(FrameError::Json)?;

    let Ok(kind) = frame.event.parse::<EventKind>() else {
        return Ok(None);
    };

    let schema = |source: serde_json::Error| FrameError::Schema {
        kind: kind.as_str(),
        source,
    };
    let event = match kind {
        EventKind::UserMessage => {
            ChatEvent::UserMessage(serde_json::from_value::<Message>(value).map_err(schema)?)
        }
        EventKind::Chunk => ChatEvent::Chunk(
            serde_json::from_value::<ChunkPayload>(value)
                .map_err(schema)?
                .content,
        ),
        EventKind::AssistantMessage => ChatEvent::AssistantMessage(
            serde_json::from_value::<Message>(value).map_err(schema)?,
        ),
        EventKind::Error => ChatEvent::Error(
            serde_json::from_value::<ErrorPayload>(value)
                .map_err(schema)?
                .error,
        ),
        EventKind::Done => ChatEvent::Done,
    };
    Ok(Some(event))
}
