use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::{Value, json};

use super::keys::*;

/// Structured record of one finished stream session.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StreamLog {
    pub conversation_id: Option<i64>,
    /// "completed", "cancelled", or the error kind that ended the session.
    pub outcome: Option<String>,

    pub events_dispatched: Option<u64>,
    pub frames_dropped: Option<u64>,
    pub bytes_received: Option<u64>,
    /// Characters of assistant text received through `chunk` events.
    pub reply_chars: Option<u64>,
    pub latency_ms: Option<u64>,

    pub error_kind: Option<String>,
    pub error_message: Option<String>,
}

impl StreamLog {
    pub fn new() -> Self { Self::default() }
    pub fn conversation_id(mut self, v: i64) -> Self { self.conversation_id = Some(v); self }
    pub fn outcome(mut self, v: &str) -> Self { self.outcome = Some(v.to_string()); self }
    pub fn counts(mut self, dispatched: u64, dropped: u64, bytes: u64) -> Self {
        self.events_dispatched = Some(dispatched);
        self.frames_dropped = Some(dropped);
        self.bytes_received = Some(bytes);
        self
    }
    pub fn reply_chars(mut self, v: u64) -> Self { self.reply_chars = Some(v); self }
    pub fn latency_ms(mut self, v: u64) -> Self { self.latency_ms = Some(v); self }
    pub fn error(mut self, kind: &str, message: &str) -> Self {
        self.error_kind = Some(kind.to_string());
        self.error_message = Some(message.to_string());
        self
    }

    /// Flatten into dashboard attribute keys, skipping unset fields.
    pub fn attributes(&self) -> BTreeMap<&'static str, Value> {
        let mut attrs = BTreeMap::new();
        let mut put = |k: &'static str, v: Option<Value>| {
            if let Some(v) = v {
                attrs.insert(k, v);
            }
        };
        put(KEY_CONVERSATION_ID, self.conversation_id.map(|v| json!(v)));
        put(KEY_OUTCOME, self.outcome.as_ref().map(|v| json!(v)));
        put(KEY_EVENTS_DISPATCHED, self.events_dispatched.map(|v| json!(v)));
        put(KEY_FRAMES_DROPPED, self.frames_dropped.map(|v| json!(v)));
        put(KEY_BYTES_RECEIVED, self.bytes_received.map(|v| json!(v)));
        put(KEY_REPLY_CHARS, self.reply_chars.map(|v| json!(v)));
        put(KEY_LATENCY_MS, self.latency_ms.map(|v| json!(v)));
        put(KEY_ERROR_KIND, self.error_kind.as_ref().map(|v| json!(v)));
        put(KEY_ERROR_MESSAGE, self.error_message.as_ref().map(|v| json!(v)));
        attrs
    }
}
