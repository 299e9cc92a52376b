use crate::model::{Message, Role};
use crate::stream::{ChatEvent, EventHandler};

/// Conversation state as a chat view keeps it while a reply streams in.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Transcript {
    messages: Vec<Message>,
    streaming: String,
    errors: Vec<String>,
    done: bool,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from messages already loaded for the conversation.
    pub fn with_history(messages: Vec<Message>) -> Self {
        Self {
            messages,
            ..Self::default()
        }
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Assistant text received so far for the turn in progress.
    pub fn streaming(&self) -> &str {
        &self.streaming
    }

    pub fn errors(&self) -> &[String] {
        &self.errors
    }

    pub fn is_done(&self) -> bool {
        self.done
    }

    /// Prepare for the next turn; history is kept.
    pub fn begin_turn(&mut self) {
        self.streaming.clear();
        self.done = false;
    }
}

impl EventHandler for Transcript {
    fn handle(&mut self, event: ChatEvent) {
        match event {
            ChatEvent::UserMessage(msg) => self.messages.push(msg),
            ChatEvent::Chunk(text) => self.streaming.push_str(&text),
            ChatEvent::AssistantMessage(msg) => {
                self.streaming.clear();
                // only answer a pending user turn
                if self.messages.last().map(|m| m.role) == Some(Role::User) {
                    self.messages.push(msg);
                }
            }
            ChatEvent::Error(err) => {
                self.streaming.clear();
                self.errors.push(err);
            }
            ChatEvent::Done => self.done = true,
        }
    }
}
