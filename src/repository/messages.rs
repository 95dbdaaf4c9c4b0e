use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{params, OptionalExtension};
use validator::Validate;

use crate::db::models::{Message, MessageStatus};
use crate::db::DbPool;
use crate::error::{AppError, AppResult};
use crate::schemas::MessageCreate;

#[async_trait]
pub trait MessageRepository: Send + Sync {
    /// Store a message from `sender_id`. The contact request must exist;
    /// whether it has been approved is the caller's decision.
    async fn send(&self, sender_id: i64, message: &MessageCreate) -> AppResult<Message>;

    async fn get(&self, id: i64) -> AppResult<Option<Message>>;

    /// Status becomes `read` and `read_at` is set to `at`.
    async fn mark_read(&self, id: i64, at: DateTime<Utc>) -> AppResult<Message>;

    /// Hide from the sender's side only. Leaves `status` alone.
    async fn delete_for_sender(&self, id: i64) -> AppResult<Message>;

    /// Hide from the recipient's side only. Leaves `status` alone.
    async fn delete_for_recipient(&self, id: i64) -> AppResult<Message>;

    /// Messages received by `user_id` that the recipient has not deleted,
    /// newest first.
    async fn inbox(&self, user_id: i64) -> AppResult<Vec<Message>>;

    /// Messages sent by `user_id` that the sender has not deleted, newest
    /// first.
    async fn outbox(&self, user_id: i64) -> AppResult<Vec<Message>>;

    /// Whole conversation under one contact request, oldest first,
    /// regardless of deletion flags.
    async fn list_for_contact_request(&self, contact_request_id: i64) -> AppResult<Vec<Message>>;
}

pub struct SqliteMessageRepository {
    pool: DbPool,
}

impl SqliteMessageRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    fn set_deleted_flag(&self, id: i64, column: &str) -> AppResult<Message> {
        let conn = self.pool.get()?;
        let message = conn
            .query_row(
                &format!(
                    "UPDATE messages SET {} = 1 WHERE id = ?1 RETURNING {}",
                    column,
                    Message::COLUMNS
                ),
                params![id],
                Message::from_row,
            )
            .optional()?
            .ok_or_else(|| AppError::NotFound(format!("message {}", id)))?;

        tracing::debug!("Message {}: {} set", id, column);
        Ok(message)
    }

    fn list(&self, clause: &str, order: &str, id: i64) -> AppResult<Vec<Message>> {
        let conn = self.pool.get()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM messages WHERE {} ORDER BY sent_at {order}, id {order}",
            Message::COLUMNS,
            clause,
            order = order
        ))?;
        let messages = stmt
            .query_map(params![id], Message::from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(messages)
    }
}

#[async_trait]
impl MessageRepository for SqliteMessageRepository {
    async fn send(&self, sender_id: i64, message: &MessageCreate) -> AppResult<Message> {
        message.validate()?;
        let conn = self.pool.get()?;

        let sent = conn.query_row(
            &format!(
                "INSERT INTO messages
                   (sender_id, recipient_id, contact_request_id, subject, content, status, sent_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                 RETURNING {}",
                Message::COLUMNS
            ),
            params![
                sender_id,
                message.recipient_id,
                message.contact_request_id,
                message.subject,
                message.content,
                MessageStatus::Sent,
                Utc::now(),
            ],
            Message::from_row,
        )?;

        tracing::info!(
            "Message {} sent from {} to {}",
            sent.id,
            sent.sender_id,
            sent.recipient_id
        );
        Ok(sent)
    }

    async fn get(&self, id: i64) -> AppResult<Option<Message>> {
        let conn = self.pool.get()?;
        let message = conn
            .query_row(
                &format!("SELECT {} FROM messages WHERE id = ?1", Message::COLUMNS),
                params![id],
                Message::from_row,
            )
            .optional()?;
        Ok(message)
    }

    async fn mark_read(&self, id: i64, at: DateTime<Utc>) -> AppResult<Message> {
        let conn = self.pool.get()?;
        let message = conn
            .query_row(
                &format!(
                    "UPDATE messages SET status = ?1, read_at = ?2
                     WHERE id = ?3
                     RETURNING {}",
                    Message::COLUMNS
                ),
                params![MessageStatus::Read, at, id],
                Message::from_row,
            )
            .optional()?
            .ok_or_else(|| AppError::NotFound(format!("message {}", id)))?;
        Ok(message)
    }

    async fn delete_for_sender(&self, id: i64) -> AppResult<Message> {
        self.set_deleted_flag(id, "deleted_by_sender")
    }

    async fn delete_for_recipient(&self, id: i64) -> AppResult<Message> {
        self.set_deleted_flag(id, "deleted_by_recipient")
    }

    async fn inbox(&self, user_id: i64) -> AppResult<Vec<Message>> {
        self.list(
            "recipient_id = ?1 AND deleted_by_recipient = 0",
            "DESC",
            user_id,
        )
    }

    async fn outbox(&self, user_id: i64) -> AppResult<Vec<Message>> {
        self.list("sender_id = ?1 AND deleted_by_sender = 0", "DESC", user_id)
    }

    async fn list_for_contact_request(&self, contact_request_id: i64) -> AppResult<Vec<Message>> {
        self.list("contact_request_id = ?1", "ASC", contact_request_id)
    }
}
