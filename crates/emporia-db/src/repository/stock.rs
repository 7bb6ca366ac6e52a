//! # Stock Repository
//!
//! Database operations for the owner's master inventory.
//!
//! The quantity column here is mutated in exactly two places: the
//! transfer transaction (`ShopRepository::transfer`) and the online
//! checkout transaction (`OrderRepository::create_online_order`). Both
//! use a conditional decrement so the column can never go negative, even
//! under concurrent requests.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use emporia_core::StockItem;

/// All columns of `stock_items`, in the order the struct declares them.
const STOCK_ITEM_COLUMNS: &str = "id, title, category, price_cents, cost_cents, quantity, \
     is_new, on_sale, original_price_cents, rating_sum, rating_count, created_at, updated_at";

/// Repository for owner inventory operations.
#[derive(Debug, Clone)]
pub struct StockRepository {
    pool: SqlitePool,
}

impl StockRepository {
    /// Creates a new StockRepository.
    pub fn new(pool: SqlitePool) -> Self {
        StockRepository { pool }
    }

    /// Lists all stock items ordered by title.
    pub async fn list(&self) -> DbResult<Vec<StockItem>> {
        let sql = format!("SELECT {STOCK_ITEM_COLUMNS} FROM stock_items ORDER BY title");
        let items = sqlx::query_as::<_, StockItem>(&sql)
            .fetch_all(&self.pool)
            .await?;

        Ok(items)
    }

    /// Lists stock items in a category, ordered by title.
    pub async fn list_by_category(&self, category: &str) -> DbResult<Vec<StockItem>> {
        let sql = format!(
            "SELECT {STOCK_ITEM_COLUMNS} FROM stock_items WHERE category = ?1 ORDER BY title"
        );
        let items = sqlx::query_as::<_, StockItem>(&sql)
            .bind(category)
            .fetch_all(&self.pool)
            .await?;

        Ok(items)
    }

    /// Gets a stock item by its ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<StockItem>> {
        let sql = format!("SELECT {STOCK_ITEM_COLUMNS} FROM stock_items WHERE id = ?1");
        let item = sqlx::query_as::<_, StockItem>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(item)
    }

    /// Inserts a new stock item.
    pub async fn insert(&self, item: &StockItem) -> DbResult<()> {
        debug!(id = %item.id, title = %item.title, "Inserting stock item");

        sqlx::query(
            r#"
            INSERT INTO stock_items (
                id, title, category, price_cents, cost_cents, quantity,
                is_new, on_sale, original_price_cents,
                rating_sum, rating_count, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)
            "#,
        )
        .bind(&item.id)
        .bind(&item.title)
        .bind(&item.category)
        .bind(item.price_cents)
        .bind(item.cost_cents)
        .bind(item.quantity)
        .bind(item.is_new)
        .bind(item.on_sale)
        .bind(item.original_price_cents)
        .bind(item.rating_sum)
        .bind(item.rating_count)
        .bind(item.created_at)
        .bind(item.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Updates price, cost, and metadata of an existing item.
    ///
    /// Quantity is deliberately not part of this statement; it moves only
    /// through transfers and checkout.
    pub async fn update(&self, item: &StockItem) -> DbResult<()> {
        debug!(id = %item.id, "Updating stock item");

        let now = Utc::now();

        let result = sqlx::query(
            r#"
            UPDATE stock_items SET
                title = ?2,
                category = ?3,
                price_cents = ?4,
                cost_cents = ?5,
                is_new = ?6,
                on_sale = ?7,
                original_price_cents = ?8,
                updated_at = ?9
            WHERE id = ?1
            "#,
        )
        .bind(&item.id)
        .bind(&item.title)
        .bind(&item.category)
        .bind(item.price_cents)
        .bind(item.cost_cents)
        .bind(item.is_new)
        .bind(item.on_sale)
        .bind(item.original_price_cents)
        .bind(now)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Stock item", &item.id));
        }

        Ok(())
    }

    /// Records one star rating against the item's aggregates.
    pub async fn add_rating(&self, id: &str, stars: i64) -> DbResult<()> {
        debug!(id = %id, stars = %stars, "Recording rating");

        let now = Utc::now();

        let result = sqlx::query(
            r#"
            UPDATE stock_items SET
                rating_sum = rating_sum + ?2,
                rating_count = rating_count + 1,
                updated_at = ?3
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .bind(stars)
        .bind(now)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Stock item", id));
        }

        Ok(())
    }

    /// Deletes a stock item. Shop stock rows cascade; order lines and
    /// ledger rows keep their snapshots.
    pub async fn delete(&self, id: &str) -> DbResult<()> {
        debug!(id = %id, "Deleting stock item");

        let result = sqlx::query("DELETE FROM stock_items WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Stock item", id));
        }

        Ok(())
    }

    /// Counts stock items (for diagnostics).
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM stock_items")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

/// Helper to generate a new stock item ID.
pub fn generate_stock_item_id() -> String {
    Uuid::new_v4().to_string()
}

// =============================================================================
// Unit Tests
// =============================================================================
