//! MongoDB-backed store for the chat backend.
//!
//! One client is created at startup and shared by every handler through
//! `AppState`; the driver manages its own connection pool.

use crate::models::{ChatMessage, ChatSession, SessionStatus, User};
use crate::services::store::ChatStore;
use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::{
    bson::{doc, DateTime as BsonDateTime},
    options::{FindOptions, IndexOptions, ReplaceOptions},
    Client as MongoClient, Collection, Database, IndexModel,
};
use service_core::error::AppError;

#[derive(Clone)]
pub struct ChatDb {
    client: MongoClient,
    db: Database,
}

impl ChatDb {
    pub async fn connect(uri: &str, database: &str) -> Result<Self, AppError> {
        tracing::info!(uri = %uri, "Connecting to MongoDB");
        let client = MongoClient::with_uri_str(uri).await.map_err(|e| {
            tracing::error!("Failed to connect to MongoDB at {}: {}", uri, e);
            AppError::DatabaseError(anyhow::anyhow!(e.to_string()))
        })?;
        let db = client.database(database);
        tracing::info!(database = %database, "Successfully connected to MongoDB database");
        Ok(Self { client, db })
    }

    pub async fn initialize_indexes(&self) -> Result<(), AppError> {
        tracing::info!("Creating MongoDB indexes for chat-service");

        let session_id_index = IndexModel::builder()
            .keys(doc! { "session_id": 1 })
            .options(
                IndexOptions::builder()
                    .name("session_id_idx".to_string())
                    .unique(true)
                    .build(),
            )
            .build();

        let owner_id_index = IndexModel::builder()
            .keys(doc! { "owner_id": 1, "created_at": -1 })
            .options(
                IndexOptions::builder()
                    .name("owner_created_idx".to_string())
                    .build(),
            )
            .build();

        let participant_index = IndexModel::builder()
            .keys(doc! { "participant_ids": 1 })
            .options(
                IndexOptions::builder()
                    .name("participant_idx".to_string())
                    .build(),
            )
            .build();

        self.sessions()
            .create_indexes([session_id_index, owner_id_index, participant_index], None)
            .await
            .map_err(|e| {
                tracing::error!("Failed to create session indexes: {}", e);
                AppError::DatabaseError(anyhow::anyhow!(e.to_string()))
            })?;

        let message_session_index = IndexModel::builder()
            .keys(doc! { "session_id": 1, "created_at": 1 })
            .options(
                IndexOptions::builder()
                    .name("session_created_idx".to_string())
                    .build(),
            )
            .build();

        let message_id_index = IndexModel::builder()
            .keys(doc! { "message_id": 1 })
            .options(
                IndexOptions::builder()
                    .name("message_id_idx".to_string())
                    .unique(true)
                    .build(),
            )
            .build();

        self.messages()
            .create_indexes([message_session_index, message_id_index], None)
            .await
            .map_err(|e| {
                tracing::error!("Failed to create message indexes: {}", e);
                AppError::DatabaseError(anyhow::anyhow!(e.to_string()))
            })?;

        let user_id_index = IndexModel::builder()
            .keys(doc! { "user_id": 1 })
            .options(
                IndexOptions::builder()
                    .name("user_id_idx".to_string())
                    .unique(true)
                    .build(),
            )
            .build();

        self.users()
            .create_index(user_id_index, None)
            .await
            .map_err(|e| {
                tracing::error!("Failed to create user index: {}", e);
                AppError::DatabaseError(anyhow::anyhow!(e.to_string()))
            })?;

        tracing::info!("Successfully created all MongoDB indexes");
        Ok(())
    }

    /// Explicit teardown; the pool is also released when the last clone drops.
    pub async fn shutdown(self) {
        self.client.shutdown().await;
        tracing::info!("MongoDB client shut down");
    }

    // Collection accessors

    pub fn users(&self) -> Collection<User> {
        self.db.collection("users")
    }

    pub fn sessions(&self) -> Collection<ChatSession> {
        self.db.collection("sessions")
    }

    pub fn messages(&self) -> Collection<ChatMessage> {
        self.db.collection("messages")
    }
}

fn membership_filter(user_id: &str) -> mongodb::bson::Document {
    doc! {
        "$or": [
            { "owner_id": user_id },
            { "participant_ids": user_id },
        ]
    }
}

#[async_trait]
impl ChatStore for ChatDb {
    async fn health_check(&self) -> Result<(), AppError> {
        self.client
            .database("admin")
            .run_command(doc! { "ping": 1 }, None)
            .await
            .map_err(|e| {
                tracing::error!("MongoDB health check failed: {}", e);
                AppError::DatabaseError(anyhow::anyhow!(e.to_string()))
            })?;
        Ok(())
    }

    async fn upsert_user(&self, user: &User) -> Result<(), AppError> {
        self.users()
            .replace_one(
                doc! { "user_id": &user.user_id },
                user,
                ReplaceOptions::builder().upsert(true).build(),
            )
            .await
            .map_err(|e| {
                tracing::error!("Failed to upsert user: {}", e);
                AppError::DatabaseError(anyhow::anyhow!(e.to_string()))
            })?;
        Ok(())
    }

    async fn find_user(&self, user_id: &str) -> Result<Option<User>, AppError> {
        self.users()
            .find_one(doc! { "user_id": user_id }, None)
            .await
            .map_err(|e| {
                tracing::error!("Failed to find user: {}", e);
                AppError::DatabaseError(anyhow::anyhow!(e.to_string()))
            })
    }

    async fn delete_user(&self, user_id: &str) -> Result<bool, AppError> {
        let result = self
            .users()
            .delete_one(doc! { "user_id": user_id }, None)
            .await
            .map_err(|e| {
                tracing::error!("Failed to delete user: {}", e);
                AppError::DatabaseError(anyhow::anyhow!(e.to_string()))
            })?;
        Ok(result.deleted_count > 0)
    }

    async fn insert_session(&self, session: &ChatSession) -> Result<(), AppError> {
        self.sessions()
            .insert_one(session, None)
            .await
            .map_err(|e| {
                tracing::error!("Failed to insert session: {}", e);
                AppError::DatabaseError(anyhow::anyhow!(e.to_string()))
            })?;
        Ok(())
    }

    async fn find_session(&self, session_id: &str) -> Result<Option<ChatSession>, AppError> {
        self.sessions()
            .find_one(doc! { "session_id": session_id }, None)
            .await
            .map_err(|e| {
                tracing::error!("Failed to find session: {}", e);
                AppError::DatabaseError(anyhow::anyhow!(e.to_string()))
            })
    }

    async fn list_sessions(
        &self,
        user_id: &str,
        page: u64,
        page_size: u64,
    ) -> Result<(Vec<ChatSession>, u64), AppError> {
        let filter = membership_filter(user_id);

        let total = self
            .sessions()
            .count_documents(filter.clone(), None)
            .await
            .map_err(AppError::from)?;

        let find_options = FindOptions::builder()
            .sort(doc! { "created_at": -1 })
            .skip((page - 1) * page_size)
            .limit(page_size as i64)
            .build();

        let cursor = self
            .sessions()
            .find(filter, find_options)
            .await
            .map_err(AppError::from)?;

        let sessions: Vec<ChatSession> = cursor.try_collect().await.map_err(AppError::from)?;

        Ok((sessions, total))
    }

    async fn update_session_title(
        &self,
        session_id: &str,
        title: &str,
    ) -> Result<Option<ChatSession>, AppError> {
        self.sessions()
            .update_one(
                doc! { "session_id": session_id },
                doc! {
                    "$set": {
                        "title": title,
                        "updated_at": BsonDateTime::now(),
                    }
                },
                None,
            )
            .await
            .map_err(|e| {
                tracing::error!("Failed to update session title: {}", e);
                AppError::DatabaseError(anyhow::anyhow!(e.to_string()))
            })?;

        self.find_session(session_id).await
    }

    async fn end_session(&self, session_id: &str) -> Result<Option<ChatSession>, AppError> {
        let now = BsonDateTime::now();
        let status = mongodb::bson::to_bson(&SessionStatus::Ended)
            .map_err(|e| AppError::InternalError(anyhow::anyhow!(e.to_string())))?;

        self.sessions()
            .update_one(
                doc! { "session_id": session_id },
                doc! {
                    "$set": {
                        "status": status,
                        "ended_at": now,
                        "updated_at": now,
                    }
                },
                None,
            )
            .await
            .map_err(|e| {
                tracing::error!("Failed to end session: {}", e);
                AppError::DatabaseError(anyhow::anyhow!(e.to_string()))
            })?;

        self.find_session(session_id).await
    }

    async fn delete_session(&self, session_id: &str) -> Result<bool, AppError> {
        let result = self
            .sessions()
            .delete_one(doc! { "session_id": session_id }, None)
            .await
            .map_err(|e| {
                tracing::error!("Failed to delete session: {}", e);
                AppError::DatabaseError(anyhow::anyhow!(e.to_string()))
            })?;
        Ok(result.deleted_count > 0)
    }

    async fn insert_message(&self, message: &ChatMessage) -> Result<(), AppError> {
        self.messages()
            .insert_one(message, None)
            .await
            .map_err(|e| {
                tracing::error!("Failed to insert message: {}", e);
                AppError::DatabaseError(anyhow::anyhow!(e.to_string()))
            })?;

        self.sessions()
            .update_one(
                doc! { "session_id": &message.session_id },
                doc! {
                    "$inc": { "message_count": 1 },
                    "$set": { "updated_at": BsonDateTime::now() }
                },
                None,
            )
            .await
            .map_err(|e| {
                tracing::error!("Failed to bump session message count: {}", e);
                AppError::DatabaseError(anyhow::anyhow!(e.to_string()))
            })?;

        Ok(())
    }

    async fn list_messages(
        &self,
        session_id: &str,
        page: u64,
        page_size: u64,
    ) -> Result<(Vec<ChatMessage>, u64), AppError> {
        let filter = doc! { "session_id": session_id };

        let total = self
            .messages()
            .count_documents(filter.clone(), None)
            .await
            .map_err(AppError::from)?;

        let find_options = FindOptions::builder()
            .sort(doc! { "created_at": 1 })
            .skip((page - 1) * page_size)
            .limit(page_size as i64)
            .build();

        let cursor = self
            .messages()
            .find(filter, find_options)
            .await
            .map_err(AppError::from)?;

        let messages: Vec<ChatMessage> = cursor.try_collect().await.map_err(AppError::from)?;

        Ok((messages, total))
    }

    async fn delete_session_messages(&self, session_id: &str) -> Result<u64, AppError> {
        let result = self
            .messages()
            .delete_many(doc! { "session_id": session_id }, None)
            .await
            .map_err(|e| {
                tracing::error!("Failed to delete session messages: {}", e);
                AppError::DatabaseError(anyhow::anyhow!(e.to_string()))
            })?;
        Ok(result.deleted_count)
    }
}
