use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A user mirrored from the identity provider.
///
/// Written only by the workflow functions reacting to provider events;
/// request handlers treat this collection as read-only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// Identifier assigned by the identity provider.
    pub user_id: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,

    #[serde(with = "mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn new(
        user_id: String,
        email: Option<String>,
        name: Option<String>,
        image_url: Option<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            user_id,
            email,
            name,
            image_url,
            created_at: now,
            updated_at: now,
        }
    }
}
