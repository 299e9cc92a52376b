use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum AttachmentCategory {
    Image,
    Document,
    #[serde(other)]
    Other,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Attachment {
    pub filename: String,
    pub file_type: String,
    pub file_path: String,
    pub category: AttachmentCategory,
}

/// Source passage an assistant answer was grounded on.
/// Every field is nullable on the wire when the cited chunk was deleted.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
pub struct Citation {
    #[serde(default)]
    pub document_title: Option<String>,
    #[serde(default)]
    pub chunk_content: Option<String>,
    #[serde(default)]
    pub relevance_score: Option<f64>,
    #[serde(default)]
    pub chunk_index: Option<i64>,
}

/// A message as persisted by the server.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Message {
    pub id: i64,
    pub role: Role,
    pub content: String,
    pub created_at: String,
    #[serde(default)]
    pub attachments: Vec<Attachment>,
    #[serde(default)]
    pub citations: Vec<Citation>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct SendMessageRequest {
    pub content: String,
}

/// Body of the non-streaming send endpoint.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct SendMessageResponse {
    pub user_message: Message,
    pub assistant_message: Message,
}
