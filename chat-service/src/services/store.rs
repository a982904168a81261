use crate::models::{ChatMessage, ChatSession, User};
use async_trait::async_trait;
use service_core::error::AppError;

/// Data access for users, sessions and messages.
///
/// The store is an explicitly owned resource injected into handlers through
/// `AppState`, never a module-level singleton. `ChatDb` is the MongoDB
/// implementation; `InMemoryStore` backs the integration tests.
#[async_trait]
pub trait ChatStore: Send + Sync {
    async fn health_check(&self) -> Result<(), AppError>;

    // Users (written only by workflow functions)

    async fn upsert_user(&self, user: &User) -> Result<(), AppError>;
    async fn find_user(&self, user_id: &str) -> Result<Option<User>, AppError>;
    async fn delete_user(&self, user_id: &str) -> Result<bool, AppError>;

    // Sessions

    async fn insert_session(&self, session: &ChatSession) -> Result<(), AppError>;
    async fn find_session(&self, session_id: &str) -> Result<Option<ChatSession>, AppError>;

    /// Sessions the user owns or participates in, newest first.
    async fn list_sessions(
        &self,
        user_id: &str,
        page: u64,
        page_size: u64,
    ) -> Result<(Vec<ChatSession>, u64), AppError>;

    async fn update_session_title(
        &self,
        session_id: &str,
        title: &str,
    ) -> Result<Option<ChatSession>, AppError>;

    async fn end_session(&self, session_id: &str) -> Result<Option<ChatSession>, AppError>;

    async fn delete_session(&self, session_id: &str) -> Result<bool, AppError>;

    // Messages

    /// Insert a message and bump the owning session's message count.
    async fn insert_message(&self, message: &ChatMessage) -> Result<(), AppError>;

    /// Messages of a session, oldest first.
    async fn list_messages(
        &self,
        session_id: &str,
        page: u64,
        page_size: u64,
    ) -> Result<(Vec<ChatMessage>, u64), AppError>;

    async fn delete_session_messages(&self, session_id: &str) -> Result<u64, AppError>;
}
