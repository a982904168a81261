use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    Active,
    Ended,
}

/// A chat session owned by one user, optionally shared with participants.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatSession {
    pub session_id: String,

    /// Provider user id of the creator.
    pub owner_id: String,

    pub title: String,

    /// Additional members allowed to read and post.
    pub participant_ids: Vec<String>,

    pub status: SessionStatus,

    /// Denormalized count, bumped on every insert.
    pub message_count: i64,

    #[serde(with = "mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub updated_at: DateTime<Utc>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ended_at: Option<mongodb::bson::DateTime>,
}

impl ChatSession {
    pub fn new(owner_id: String, title: String, participant_ids: Vec<String>) -> Self {
        let now = Utc::now();
        Self {
            session_id: uuid::Uuid::new_v4().to_string(),
            owner_id,
            title,
            participant_ids,
            status: SessionStatus::Active,
            message_count: 0,
            created_at: now,
            updated_at: now,
            ended_at: None,
        }
    }

    pub fn is_active(&self) -> bool {
        self.status == SessionStatus::Active
    }

    /// Whether `user_id` may read and post to this session.
    pub fn is_member(&self, user_id: &str) -> bool {
        self.owner_id == user_id || self.participant_ids.iter().any(|p| p == user_id)
    }
}
