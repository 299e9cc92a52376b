/// Attribute keys for stream session telemetry.
/// Keep these stable; changing them is a breaking change for dashboards.
pub const KEY_CONVERSATION_ID: &str = "conversation.id";
pub const KEY_OUTCOME: &str = "stream.outcome";

pub const KEY_EVENTS_DISPATCHED: &str = "events.dispatched";
pub const KEY_FRAMES_DROPPED: &str = "frames.dropped";
pub const KEY_BYTES_RECEIVED: &str = "bytes.received";
pub const KEY_REPLY_CHARS: &str = "reply.chars";
pub const KEY_LATENCY_MS: &str = "latency.ms";

/// Error-related (if applicable)
pub const KEY_ERROR_KIND: &str = "error.kind";
pub const KEY_ERROR_MESSAGE: &str = "error.message";
