use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single message inside a chat session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub message_id: String,
    pub session_id: String,
    pub sender_id: String,
    pub content: String,
    #[serde(with = "mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
}

impl ChatMessage {
    pub fn new(session_id: String, sender_id: String, content: String) -> Self {
        Self {
            message_id: uuid::Uuid::new_v4().to_string(),
            session_id,
            sender_id,
            content,
            created_at: Utc::now(),
        }
    }
}
