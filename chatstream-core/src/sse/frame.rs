use super::{DATA_PREFIX, EVENT_PREFIX};

/// One `(event, data)` pair lifted off the wire, not yet decoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub event: String,
    pub data: String,
}

/// Groups lines into frames.
///
/// An `event: ` line sets the pending kind. A `data: ` line completes the frame
/// when a kind is pending, and resets the parser either way. Everything else
/// is ignored.
#[derive(Debug, Default)]
pub struct FrameParser {
    event: String,
}

impl FrameParser {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_line(&mut self, line: &str) -> Option<Frame> {
        if let Some(kind) = line.strip_prefix(EVENT_PREFIX) {
            self.event = kind.to_string();
            return None;
        }
        if let Some(data) = line.strip_prefix(DATA_PREFIX) {
            let event = std::mem::take(&mut self.event);
            if event.is_empty() {
                return None;
            }
            return Some(Frame {
                event,
                data: data.to_string(),
            });
        }
        None
    }

    /// Kind seen on an `event: ` line that has not been paired with data yet.
    pub fn pending_event(&self) -> Option<&str> {
        (!self.event.is_empty()).then_some(self.event.as_str())
    }
}
