//! In-memory `ChatStore` used by the integration tests and offline
//! development. Mirrors the MongoDB implementation's behavior, including
//! the denormalized session message count.

use crate::models::{ChatMessage, ChatSession, SessionStatus, User};
use crate::services::store::ChatStore;
use async_trait::async_trait;
use mongodb::bson::DateTime as BsonDateTime;
use service_core::error::AppError;
use std::collections::HashMap;
use tokio::sync::RwLock;

#[derive(Default)]
pub struct InMemoryStore {
    users: RwLock<HashMap<String, User>>,
    sessions: RwLock<HashMap<String, ChatSession>>,
    messages: RwLock<HashMap<String, Vec<ChatMessage>>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn paginate<T: Clone>(items: &[T], page: u64, page_size: u64) -> Vec<T> {
    let skip = ((page - 1) * page_size) as usize;
    items
        .iter()
        .skip(skip)
        .take(page_size as usize)
        .cloned()
        .collect()
}

#[async_trait]
impl ChatStore for InMemoryStore {
    async fn health_check(&self) -> Result<(), AppError> {
        Ok(())
    }

    async fn upsert_user(&self, user: &User) -> Result<(), AppError> {
        self.users
            .write()
            .await
            .insert(user.user_id.clone(), user.clone());
        Ok(())
    }

    async fn find_user(&self, user_id: &str) -> Result<Option<User>, AppError> {
        Ok(self.users.read().await.get(user_id).cloned())
    }

    async fn delete_user(&self, user_id: &str) -> Result<bool, AppError> {
        Ok(self.users.write().await.remove(user_id).is_some())
    }

    async fn insert_session(&self, session: &ChatSession) -> Result<(), AppError> {
        self.sessions
            .write()
            .await
            .insert(session.session_id.clone(), session.clone());
        Ok(())
    }

    async fn find_session(&self, session_id: &str) -> Result<Option<ChatSession>, AppError> {
        Ok(self.sessions.read().await.get(session_id).cloned())
    }

    async fn list_sessions(
        &self,
        user_id: &str,
        page: u64,
        page_size: u64,
    ) -> Result<(Vec<ChatSession>, u64), AppError> {
        let sessions = self.sessions.read().await;
        let mut matching: Vec<ChatSession> = sessions
            .values()
            .filter(|s| s.is_member(user_id))
            .cloned()
            .collect();
        matching.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        let total = matching.len() as u64;
        Ok((paginate(&matching, page, page_size), total))
    }

    async fn update_session_title(
        &self,
        session_id: &str,
        title: &str,
    ) -> Result<Option<ChatSession>, AppError> {
        let mut sessions = self.sessions.write().await;
        Ok(sessions.get_mut(session_id).map(|session| {
            session.title = title.to_string();
            session.updated_at = chrono::Utc::now();
            session.clone()
        }))
    }

    async fn end_session(&self, session_id: &str) -> Result<Option<ChatSession>, AppError> {
        let mut sessions = self.sessions.write().await;
        Ok(sessions.get_mut(session_id).map(|session| {
            session.status = SessionStatus::Ended;
            session.ended_at = Some(BsonDateTime::now());
            session.updated_at = chrono::Utc::now();
            session.clone()
        }))
    }

    async fn delete_session(&self, session_id: &str) -> Result<bool, AppError> {
        Ok(self.sessions.write().await.remove(session_id).is_some())
    }

    async fn insert_message(&self, message: &ChatMessage) -> Result<(), AppError> {
        self.messages
            .write()
            .await
            .entry(message.session_id.clone())
            .or_default()
            .push(message.clone());

        if let Some(session) = self.sessions.write().await.get_mut(&message.session_id) {
            session.message_count += 1;
            session.updated_at = chrono::Utc::now();
        }
        Ok(())
    }

    async fn list_messages(
        &self,
        session_id: &str,
        page: u64,
        page_size: u64,
    ) -> Result<(Vec<ChatMessage>, u64), AppError> {
        let messages = self.messages.read().await;
        let mut matching: Vec<ChatMessage> =
            messages.get(session_id).cloned().unwrap_or_default();
        matching.sort_by(|a, b| a.created_at.cmp(&b.created_at));

        let total = matching.len() as u64;
        Ok((paginate(&matching, page, page_size), total))
    }

    async fn delete_session_messages(&self, session_id: &str) -> Result<u64, AppError> {
        Ok(self
            .messages
            .write()
            .await
            .remove(session_id)
            .map(|m| m.len() as u64)
            .unwrap_or(0))
    }
}
