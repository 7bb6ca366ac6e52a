//! # User Repository
//!
//! Database operations for user identities.
//!
//! The tier column is written through `set_tier` only; the engine's
//! recomputation function is the single caller, so the stored tier never
//! diverges from the sales ledger for longer than one recompute.

use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use emporia_core::{Tier, User};

const USER_COLUMNS: &str =
    "id, email, phone, display_name, password_hash, role, tier, created_at";

/// Repository for user identity operations.
#[derive(Debug, Clone)]
pub struct UserRepository {
    pool: SqlitePool,
}

impl UserRepository {
    /// Creates a new UserRepository.
    pub fn new(pool: SqlitePool) -> Self {
        UserRepository { pool }
    }

    /// Inserts a new user.
    pub async fn insert(&self, user: &User) -> DbResult<()> {
        debug!(id = %user.id, email = %user.email, role = ?user.role, "Inserting user");

        sqlx::query(
            r#"
            INSERT INTO users (
                id, email, phone, display_name, password_hash, role, tier, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
        )
        .bind(&user.id)
        .bind(&user.email)
        .bind(&user.phone)
        .bind(&user.display_name)
        .bind(&user.password_hash)
        .bind(user.role)
        .bind(user.tier)
        .bind(user.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Gets a user by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?1");
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }

    /// Gets a user by email (the unique login key).
    pub async fn get_by_email(&self, email: &str) -> DbResult<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE email = ?1");
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }

    /// Gets a user by phone number. Phones are not unique; the earliest
    /// match wins.
    pub async fn get_by_phone(&self, phone: &str) -> DbResult<Option<User>> {
        let sql = format!(
            "SELECT {USER_COLUMNS} FROM users WHERE phone = ?1 ORDER BY created_at LIMIT 1"
        );
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(phone)
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }

    /// Lists all users (messaging fan-out enumerates from here).
    pub async fn list(&self) -> DbResult<Vec<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users ORDER BY created_at");
        let users = sqlx::query_as::<_, User>(&sql)
            .fetch_all(&self.pool)
            .await?;

        Ok(users)
    }

    /// Replaces the stored tier with a single assignment.
    pub async fn set_tier(&self, user_id: &str, tier: Tier) -> DbResult<()> {
        debug!(user_id = %user_id, tier = %tier, "Storing tier");

        let result = sqlx::query("UPDATE users SET tier = ?2 WHERE id = ?1")
            .bind(user_id)
            .bind(tier)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("User", user_id));
        }

        Ok(())
    }
}

/// Helper to generate a new user ID.
pub fn generate_user_id() -> String {
    Uuid::new_v4().to_string()
}

// =============================================================================
// Unit Tests
// =============================================================================
