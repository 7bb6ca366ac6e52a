//! # Sales History Repository
//!
//! Reads over the append-only per-user sales ledger.
//!
//! Rows are written exclusively by the order transactions in
//! `OrderRepository`; this repository only aggregates them. The profit
//! sum is the sole input to tier recomputation.

use sqlx::SqlitePool;

use crate::error::DbResult;
use emporia_core::{Money, SalesRecord};

const SALES_RECORD_COLUMNS: &str = "id, user_id, order_id, shop_order_id, total_spent_cents, \
     total_profit_cents, created_at";

/// Repository for sales-history reads.
#[derive(Debug, Clone)]
pub struct SalesHistoryRepository {
    pool: SqlitePool,
}

impl SalesHistoryRepository {
    /// Creates a new SalesHistoryRepository.
    pub fn new(pool: SqlitePool) -> Self {
        SalesHistoryRepository { pool }
    }

    /// Lists a user's purchase records, newest first.
    pub async fn list_for_user(&self, user_id: &str) -> DbResult<Vec<SalesRecord>> {
        let sql = format!(
            "SELECT {SALES_RECORD_COLUMNS} FROM sales_history \
             WHERE user_id = ?1 ORDER BY created_at DESC"
        );
        let records = sqlx::query_as::<_, SalesRecord>(&sql)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(records)
    }

    /// Cumulative profit a user's purchases have contributed.
    pub async fn total_profit(&self, user_id: &str) -> DbResult<Money> {
        let total: Option<i64> = sqlx::query_scalar(
            "SELECT SUM(total_profit_cents) FROM sales_history WHERE user_id = ?1",
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(Money::from_cents(total.unwrap_or(0)))
    }

    /// Cumulative spend across both sale channels.
    pub async fn total_spent(&self, user_id: &str) -> DbResult<Money> {
        let total: Option<i64> = sqlx::query_scalar(
            "SELECT SUM(total_spent_cents) FROM sales_history WHERE user_id = ?1",
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(Money::from_cents(total.unwrap_or(0)))
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
