//! # Shop Repository
//!
//! Database operations for shops, per-shop stock, and the transfer
//! ledger.
//!
//! ## Transfer Transaction
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                 transfer(shop, item, qty)                               │
//! │                                                                         │
//! │  BEGIN                                                                  │
//! │    1. shop row exists?            ── no ──► NotFound (rollback)        │
//! │    2. owner item row exists?      ── no ──► NotFound (rollback)        │
//! │    3. UPDATE stock_items                                                │
//! │         SET quantity = quantity - :n                                    │
//! │         WHERE id = :item AND quantity >= :n                             │
//! │       0 rows affected?            ── yes ─► ShortStock (rollback)      │
//! │    4. upsert shop_stock row, quantity += :n                             │
//! │       (snapshot copied on create; refreshed on the restock path)       │
//! │    5. append shop_transfers ledger row                                  │
//! │  COMMIT                                                                 │
//! │                                                                         │
//! │  Conservation: owner + shop quantity is identical before and after.    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use emporia_core::{Shop, ShopStock, ShopTransfer};

const SHOP_COLUMNS: &str =
    "id, name, address, phone, proprietor_email, proprietor_user_id, created_at";

const SHOP_STOCK_COLUMNS: &str = "id, shop_id, stock_item_id, quantity, price_cents, cost_cents, \
     source_title, created_at, updated_at";

/// Outcome of a transfer attempt.
///
/// A shortfall is an expected business outcome, not a `DbError`; the
/// caller turns it into the user-visible `InsufficientStock` message.
#[derive(Debug)]
pub enum TransferOutcome {
    /// Transfer committed; the appended ledger row is returned.
    Completed(ShopTransfer),
    /// Owner quantity was below the requested amount; nothing changed.
    ShortStock {
        title: String,
        available: i64,
        requested: i64,
    },
}

/// Repository for shop, shop stock, and transfer operations.
#[derive(Debug, Clone)]
pub struct ShopRepository {
    pool: SqlitePool,
}

impl ShopRepository {
    /// Creates a new ShopRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ShopRepository { pool }
    }

    // =========================================================================
    // Shops
    // =========================================================================

    /// Inserts a new shop.
    pub async fn insert(&self, shop: &Shop) -> DbResult<()> {
        debug!(id = %shop.id, name = %shop.name, "Inserting shop");

        sqlx::query(
            r#"
            INSERT INTO shops (
                id, name, address, phone,
                proprietor_email, proprietor_user_id, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
        )
        .bind(&shop.id)
        .bind(&shop.name)
        .bind(&shop.address)
        .bind(&shop.phone)
        .bind(&shop.proprietor_email)
        .bind(&shop.proprietor_user_id)
        .bind(shop.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Gets a shop by its ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Shop>> {
        let sql = format!("SELECT {SHOP_COLUMNS} FROM shops WHERE id = ?1");
        let shop = sqlx::query_as::<_, Shop>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(shop)
    }

    /// Lists all shops ordered by name.
    pub async fn list(&self) -> DbResult<Vec<Shop>> {
        let sql = format!("SELECT {SHOP_COLUMNS} FROM shops ORDER BY name");
        let shops = sqlx::query_as::<_, Shop>(&sql)
            .fetch_all(&self.pool)
            .await?;

        Ok(shops)
    }

    /// Updates a shop's name, address, and phone.
    pub async fn update(&self, shop: &Shop) -> DbResult<()> {
        debug!(id = %shop.id, "Updating shop");

        let result = sqlx::query(
            "UPDATE shops SET name = ?2, address = ?3, phone = ?4 WHERE id = ?1",
        )
        .bind(&shop.id)
        .bind(&shop.name)
        .bind(&shop.address)
        .bind(&shop.phone)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Shop", &shop.id));
        }

        Ok(())
    }

    /// Deletes a shop. Its stock rows cascade; transfer ledger rows and
    /// POS orders are retained.
    pub async fn delete(&self, id: &str) -> DbResult<()> {
        debug!(id = %id, "Deleting shop");

        let result = sqlx::query("DELETE FROM shops WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Shop", id));
        }

        Ok(())
    }

    /// Assigns a proprietor; email and user id move as a pair.
    pub async fn assign_proprietor(
        &self,
        shop_id: &str,
        email: &str,
        user_id: &str,
    ) -> DbResult<()> {
        debug!(shop_id = %shop_id, email = %email, "Assigning proprietor");

        let result = sqlx::query(
            "UPDATE shops SET proprietor_email = ?2, proprietor_user_id = ?3 WHERE id = ?1",
        )
        .bind(shop_id)
        .bind(email)
        .bind(user_id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Shop", shop_id));
        }

        Ok(())
    }

    /// Clears the proprietor pair.
    pub async fn clear_proprietor(&self, shop_id: &str) -> DbResult<()> {
        debug!(shop_id = %shop_id, "Clearing proprietor");

        let result = sqlx::query(
            "UPDATE shops SET proprietor_email = NULL, proprietor_user_id = NULL WHERE id = ?1",
        )
        .bind(shop_id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Shop", shop_id));
        }

        Ok(())
    }

    /// Finds the shop operated by the given proprietor user id, if any.
    pub async fn get_by_proprietor(&self, user_id: &str) -> DbResult<Option<Shop>> {
        let sql = format!("SELECT {SHOP_COLUMNS} FROM shops WHERE proprietor_user_id = ?1");
        let shop = sqlx::query_as::<_, Shop>(&sql)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(shop)
    }

    // =========================================================================
    // Shop Stock
    // =========================================================================

    /// Lists a shop's stock rows.
    pub async fn stock_for_shop(&self, shop_id: &str) -> DbResult<Vec<ShopStock>> {
        let sql = format!(
            "SELECT {SHOP_STOCK_COLUMNS} FROM shop_stock WHERE shop_id = ?1 ORDER BY created_at"
        );
        let rows = sqlx::query_as::<_, ShopStock>(&sql)
            .bind(shop_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows)
    }

    /// Gets the stock row for (shop, item), if the shop stocks it.
    pub async fn get_stock(&self, shop_id: &str, stock_item_id: &str) -> DbResult<Option<ShopStock>> {
        let sql = format!(
            "SELECT {SHOP_STOCK_COLUMNS} FROM shop_stock \
             WHERE shop_id = ?1 AND stock_item_id = ?2"
        );
        let row = sqlx::query_as::<_, ShopStock>(&sql)
            .bind(shop_id)
            .bind(stock_item_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row)
    }

    // =========================================================================
    // Transfer
    // =========================================================================

    /// Moves quantity from the owner inventory to a shop, atomically.
    ///
    /// All-or-nothing: the conditional owner decrement, the shop stock
    /// upsert, and the ledger append commit together or not at all.
    ///
    /// `refresh_snapshot` selects the proprietor restock path: when the
    /// shop already stocks the item, its price/cost/source snapshot is
    /// re-inherited from the current owner record even on top-ups.
    ///
    /// ## Preconditions
    /// `quantity > 0`, validated by the caller.
    pub async fn transfer(
        &self,
        shop_id: &str,
        stock_item_id: &str,
        quantity: i64,
        performed_by: Option<&str>,
        refresh_snapshot: bool,
    ) -> DbResult<TransferOutcome> {
        debug!(
            shop_id = %shop_id,
            stock_item_id = %stock_item_id,
            quantity = %quantity,
            refresh_snapshot = %refresh_snapshot,
            "Transferring stock"
        );

        let mut tx = self.pool.begin().await?;

        let shop_exists: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM shops WHERE id = ?1")
            .bind(shop_id)
            .fetch_one(&mut *tx)
            .await?;
        if shop_exists == 0 {
            return Err(DbError::not_found("Shop", shop_id));
        }

        // Owner row read inside the transaction: title for error context,
        // price/cost for the snapshot, quantity for the shortfall report
        let owner: Option<(String, i64, i64, i64)> = sqlx::query_as(
            "SELECT title, price_cents, cost_cents, quantity FROM stock_items WHERE id = ?1",
        )
        .bind(stock_item_id)
        .fetch_optional(&mut *tx)
        .await?;

        let (title, price_cents, cost_cents, available) = match owner {
            Some(row) => row,
            None => return Err(DbError::not_found("Stock item", stock_item_id)),
        };

        let decremented = sqlx::query(
            r#"
            UPDATE stock_items
            SET quantity = quantity - ?2, updated_at = ?3
            WHERE id = ?1 AND quantity >= ?2
            "#,
        )
        .bind(stock_item_id)
        .bind(quantity)
        .bind(Utc::now())
        .execute(&mut *tx)
        .await?;

        if decremented.rows_affected() == 0 {
            // Dropping the transaction rolls everything back
            return Ok(TransferOutcome::ShortStock {
                title,
                available,
                requested: quantity,
            });
        }

        let now = Utc::now();
        let stock_id = Uuid::new_v4().to_string();

        // Upsert against the (shop_id, stock_item_id) unique key. A fresh
        // row always copies the owner snapshot; an existing row keeps its
        // snapshot unless this is the restock path.
        let upsert = if refresh_snapshot {
            r#"
            INSERT INTO shop_stock (
                id, shop_id, stock_item_id, quantity,
                price_cents, cost_cents, source_title, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?8)
            ON CONFLICT(shop_id, stock_item_id) DO UPDATE SET
                quantity = quantity + excluded.quantity,
                price_cents = excluded.price_cents,
                cost_cents = excluded.cost_cents,
                source_title = excluded.source_title,
                updated_at = excluded.updated_at
            "#
        } else {
            r#"
            INSERT INTO shop_stock (
                id, shop_id, stock_item_id, quantity,
                price_cents, cost_cents, source_title, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?8)
            ON CONFLICT(shop_id, stock_item_id) DO UPDATE SET
                quantity = quantity + excluded.quantity,
                updated_at = excluded.updated_at
            "#
        };

        sqlx::query(upsert)
            .bind(&stock_id)
            .bind(shop_id)
            .bind(stock_item_id)
            .bind(quantity)
            .bind(price_cents)
            .bind(cost_cents)
            .bind(&title)
            .bind(now)
            .execute(&mut *tx)
            .await?;

        let transfer = ShopTransfer {
            id: Uuid::new_v4().to_string(),
            shop_id: shop_id.to_string(),
            stock_item_id: stock_item_id.to_string(),
            quantity,
            performed_by: performed_by.map(|s| s.to_string()),
            created_at: now,
        };

        sqlx::query(
            r#"
            INSERT INTO shop_transfers (
                id, shop_id, stock_item_id, quantity, performed_by, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
        )
        .bind(&transfer.id)
        .bind(&transfer.shop_id)
        .bind(&transfer.stock_item_id)
        .bind(transfer.quantity)
        .bind(&transfer.performed_by)
        .bind(transfer.created_at)
        .execute(&mut *tx)
        .await?;

        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        info!(
            shop_id = %shop_id,
            stock_item_id = %stock_item_id,
            quantity = %quantity,
            "Transfer committed"
        );

        Ok(TransferOutcome::Completed(transfer))
    }

    /// Lists a shop's transfer ledger, newest first.
    pub async fn list_transfers(&self, shop_id: &str) -> DbResult<Vec<ShopTransfer>> {
        let rows = sqlx::query_as::<_, ShopTransfer>(
            r#"
            SELECT id, shop_id, stock_item_id, quantity, performed_by, created_at
            FROM shop_transfers
            WHERE shop_id = ?1
            ORDER BY created_at DESC
            "#,
        )
        .bind(shop_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }
}

/// Helper to generate a new shop ID.
pub fn generate_shop_id() -> String {
    Uuid::new_v4().to_string()
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use crate::repository::stock::generate_stock_item_id;
    use emporia_core::StockItem;

    fn sample_item(quantity: i64) -> StockItem {
        let now = Utc::now();
        StockItem {
            id: generate_stock_item_id(),
            title: "Oak Bookshelf".to_string(),
            category: "furniture".to_string(),
            price_cents: 5000,
            cost_cents: 3000,
            quantity,
            is_new: false,
            on_sale: false,
            original_price_cents: None,
            rating_sum: 0,
            rating_count: 0,
            created_at: now,
            updated_at: now,
        }
    }

    fn sample_shop(name: &str) -> Shop {
        Shop {
            id: generate_shop_id(),
            name: name.to_string(),
            address: "12 Market Street".to_string(),
            phone: "5550100".to_string(),
            proprietor_email: None,
            proprietor_user_id: None,
            created_at: Utc::now(),
        }
    }

    async fn setup() -> (Database, StockItem, Shop) {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let item = sample_item(10);
        db.stock().insert(&item).await.unwrap();
        let shop = sample_shop("Shop A");
        db.shops().insert(&shop).await.unwrap();
        (db, item, shop)
    }

    #[tokio::test]
    async fn test_transfer_conserves_total_quantity() {
        let (db, item, shop) = setup().await;

        let outcome = db
            .shops()
            .transfer(&shop.id, &item.id, 4, None, false)
            .await
            .unwrap();
        assert!(matches!(outcome, TransferOutcome::Completed(_)));

        let owner = db.stock().get_by_id(&item.id).await.unwrap().unwrap();
        let stock = db
            .shops()
            .get_stock(&shop.id, &item.id)
            .await
            .unwrap()
            .unwrap();

        assert_eq!(owner.quantity, 6);
        assert_eq!(stock.quantity, 4);
        assert_eq!(owner.quantity + stock.quantity, 10);

        // Snapshot copied from the owner record
        assert_eq!(stock.price_cents, Some(5000));
        assert_eq!(stock.cost_cents, Some(3000));
        assert_eq!(stock.source_title.as_deref(), Some("Oak Bookshelf"));
    }

    #[tokio::test]
    async fn test_transfer_appends_ledger_row() {
        let (db, item, shop) = setup().await;

        db.shops()
            .transfer(&shop.id, &item.id, 4, Some("owner-1"), false)
            .await
            .unwrap();
        db.shops()
            .transfer(&shop.id, &item.id, 2, Some("owner-1"), false)
            .await
            .unwrap();

        let log = db.shops().list_transfers(&shop.id).await.unwrap();
        assert_eq!(log.len(), 2);
        let total: i64 = log.iter().map(|t| t.quantity).sum();
        assert_eq!(total, 6);
        assert_eq!(log[0].performed_by.as_deref(), Some("owner-1"));
    }

    #[tokio::test]
    async fn test_transfer_short_stock_changes_nothing() {
        let (db, item, shop) = setup().await;

        let outcome = db
            .shops()
            .transfer(&shop.id, &item.id, 11, None, false)
            .await
            .unwrap();

        match outcome {
            TransferOutcome::ShortStock {
                available,
                requested,
                ..
            } => {
                assert_eq!(available, 10);
                assert_eq!(requested, 11);
            }
            other => panic!("expected ShortStock, got {:?}", other),
        }

        let owner = db.stock().get_by_id(&item.id).await.unwrap().unwrap();
        assert_eq!(owner.quantity, 10);
        assert!(db
            .shops()
            .get_stock(&shop.id, &item.id)
            .await
            .unwrap()
            .is_none());
        assert!(db.shops().list_transfers(&shop.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_transfer_missing_item_is_not_found() {
        let (db, _item, shop) = setup().await;

        let err = db
            .shops()
            .transfer(&shop.id, "missing", 1, None, false)
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_topup_keeps_snapshot_unless_refreshed() {
        let (db, mut item, shop) = setup().await;

        db.shops()
            .transfer(&shop.id, &item.id, 2, None, false)
            .await
            .unwrap();

        // Owner re-prices after the first transfer
        item.price_cents = 6000;
        db.stock().update(&item).await.unwrap();

        // Plain top-up keeps the original snapshot
        db.shops()
            .transfer(&shop.id, &item.id, 2, None, false)
            .await
            .unwrap();
        let stock = db
            .shops()
            .get_stock(&shop.id, &item.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stock.quantity, 4);
        assert_eq!(stock.price_cents, Some(5000));

        // Restock path re-inherits current owner pricing
        db.shops()
            .transfer(&shop.id, &item.id, 1, None, true)
            .await
            .unwrap();
        let stock = db
            .shops()
            .get_stock(&shop.id, &item.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stock.quantity, 5);
        assert_eq!(stock.price_cents, Some(6000));
    }

    #[tokio::test]
    async fn test_proprietor_pair_moves_together() {
        let (db, _item, shop) = setup().await;

        db.shops()
            .assign_proprietor(&shop.id, "pat@example.com", "user-9")
            .await
            .unwrap();
        let loaded = db.shops().get_by_id(&shop.id).await.unwrap().unwrap();
        assert!(loaded.has_proprietor());
        assert_eq!(loaded.proprietor_email.as_deref(), Some("pat@example.com"));

        let by_proprietor = db.shops().get_by_proprietor("user-9").await.unwrap();
        assert!(by_proprietor.is_some());

        db.shops().clear_proprietor(&shop.id).await.unwrap();
        let loaded = db.shops().get_by_id(&shop.id).await.unwrap().unwrap();
        assert!(loaded.proprietor_email.is_none());
        assert!(loaded.proprietor_user_id.is_none());
    }

    #[tokio::test]
    async fn test_shop_delete_cascades_stock_keeps_ledger() {
        let (db, item, shop) = setup().await;

        db.shops()
            .transfer(&shop.id, &item.id, 3, None, false)
            .await
            .unwrap();
        db.shops().delete(&shop.id).await.unwrap();

        assert!(db
            .shops()
            .get_stock(&shop.id, &item.id)
            .await
            .unwrap()
            .is_none());
        // The append-only ledger outlives the shop
        assert_eq!(db.shops().list_transfers(&shop.id).await.unwrap().len(), 1);
    }
}
