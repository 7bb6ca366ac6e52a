//! # Message Repository
//!
//! Broadcast messages and their per-user read receipts.
//!
//! Receipts are unique per (message, user); `add_receipt` uses
//! `INSERT OR IGNORE` so re-running a fan-out never duplicates a row.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use emporia_core::{Message, MessageReceipt};

const MESSAGE_COLUMNS: &str = "id, subject, body, target, created_at";
const RECEIPT_COLUMNS: &str = "id, message_id, user_id, is_read, created_at";

/// Repository for messaging operations.
#[derive(Debug, Clone)]
pub struct MessageRepository {
    pool: SqlitePool,
}

impl MessageRepository {
    /// Creates a new MessageRepository.
    pub fn new(pool: SqlitePool) -> Self {
        MessageRepository { pool }
    }

    /// Inserts a broadcast message.
    pub async fn insert(&self, message: &Message) -> DbResult<()> {
        debug!(id = %message.id, target = %message.target, "Inserting message");

        sqlx::query(
            "INSERT INTO messages (id, subject, body, target, created_at) \
             VALUES (?1, ?2, ?3, ?4, ?5)",
        )
        .bind(&message.id)
        .bind(&message.subject)
        .bind(&message.body)
        .bind(&message.target)
        .bind(message.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Gets a message by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Message>> {
        let sql = format!("SELECT {MESSAGE_COLUMNS} FROM messages WHERE id = ?1");
        let message = sqlx::query_as::<_, Message>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(message)
    }

    /// Creates a read receipt for (message, user).
    ///
    /// Returns `true` when a new receipt was created, `false` when one
    /// already existed.
    pub async fn add_receipt(&self, message_id: &str, user_id: &str) -> DbResult<bool> {
        let result = sqlx::query(
            r#"
            INSERT OR IGNORE INTO message_receipts (
                id, message_id, user_id, is_read, created_at
            ) VALUES (?1, ?2, ?3, 0, ?4)
            "#,
        )
        .bind(Uuid::new_v4().to_string())
        .bind(message_id)
        .bind(user_id)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Lists a user's unread messages, newest first.
    pub async fn unread_for_user(&self, user_id: &str) -> DbResult<Vec<Message>> {
        let messages = sqlx::query_as::<_, Message>(
            r#"
            SELECT m.id, m.subject, m.body, m.target, m.created_at
            FROM messages m
            INNER JOIN message_receipts r ON r.message_id = m.id
            WHERE r.user_id = ?1 AND r.is_read = 0
            ORDER BY m.created_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(messages)
    }

    /// Marks a user's receipt for a message as read.
    pub async fn mark_read(&self, message_id: &str, user_id: &str) -> DbResult<()> {
        let result = sqlx::query(
            "UPDATE message_receipts SET is_read = 1 WHERE message_id = ?1 AND user_id = ?2",
        )
        .bind(message_id)
        .bind(user_id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Message receipt", message_id));
        }

        Ok(())
    }

    /// Lists the receipts of a message (for delivery inspection).
    pub async fn receipts_for_message(&self, message_id: &str) -> DbResult<Vec<MessageReceipt>> {
        let sql = format!(
            "SELECT {RECEIPT_COLUMNS} FROM message_receipts \
             WHERE message_id = ?1 ORDER BY created_at"
        );
        let receipts = sqlx::query_as::<_, MessageReceipt>(&sql)
            .bind(message_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(receipts)
    }
}

/// Helper to generate a new message ID.
pub fn generate_message_id() -> String {
    Uuid::new_v4().to_string()
}

// =============================================================================
// Unit Tests
// =============================================================================
