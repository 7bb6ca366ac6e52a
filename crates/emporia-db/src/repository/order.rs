//! # Order Repository
//!
//! Persistence for online orders and POS shop orders.
//!
//! Both sale channels commit as a single transaction: every line's
//! conditional stock decrement, the order header, its line items, and
//! the sales-history row land together or not at all. No partial order
//! can ever be observed, and validation + decrement cannot race another
//! request between them.
//!
//! ## Checkout Transaction
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │            create_online_order / create_pos_sale                        │
//! │                                                                         │
//! │  BEGIN                                                                  │
//! │    for each line:                                                       │
//! │      UPDATE <stock>                                                     │
//! │        SET quantity = quantity - :n                                     │
//! │        WHERE <key> AND quantity >= :n                                   │
//! │      0 rows? ──► ShortStock, roll back every prior decrement           │
//! │    INSERT order header (totals computed by the caller)                  │
//! │    INSERT line items (price snapshots)                                  │
//! │    INSERT sales_history row (when a customer is known)                  │
//! │  COMMIT                                                                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use emporia_core::{Order, OrderLine, ShopOrder, ShopOrderLine};

const ORDER_COLUMNS: &str = "id, user_id, total_cents, created_at";
const ORDER_LINE_COLUMNS: &str =
    "id, order_id, stock_item_id, title_snapshot, unit_price_cents, quantity";
const SHOP_ORDER_COLUMNS: &str =
    "id, shop_id, customer_user_id, total_cents, discount_bps, created_at";
const SHOP_ORDER_LINE_COLUMNS: &str =
    "id, shop_order_id, stock_item_id, title_snapshot, unit_price_cents, quantity";

// =============================================================================
// Inputs
// =============================================================================

/// A validated, priced line ready for persistence.
#[derive(Debug, Clone)]
pub struct NewOrderLine {
    pub stock_item_id: String,
    pub title: String,
    /// Pre-discount unit price snapshot.
    pub unit_price_cents: i64,
    pub quantity: i64,
}

/// A validated online order ready for persistence.
///
/// Totals and profit are computed by the checkout service from the same
/// owner reads that produced the lines.
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub user_id: String,
    pub lines: Vec<NewOrderLine>,
    pub total_cents: i64,
    pub profit_cents: i64,
}

/// A validated POS sale ready for persistence.
#[derive(Debug, Clone)]
pub struct NewShopOrder {
    pub shop_id: String,
    pub customer_user_id: Option<String>,
    pub lines: Vec<NewOrderLine>,
    /// Post-discount total recorded on the order header.
    pub total_cents: i64,
    /// Tier discount applied to the total.
    pub discount_bps: i64,
    /// Pre-discount profit recorded in the sales ledger.
    pub profit_cents: i64,
}

// =============================================================================
// Outcomes
// =============================================================================

/// Outcome of an online checkout attempt.
#[derive(Debug)]
pub enum CheckoutOutcome {
    /// Order committed.
    Completed(Order),
    /// Some line found fewer owner units than requested; nothing changed.
    ShortStock {
        title: String,
        available: i64,
        requested: i64,
    },
}

/// Quantity left in a shop stock row after a committed POS line.
#[derive(Debug, Clone)]
pub struct PosLineResult {
    pub stock_item_id: String,
    pub title: String,
    pub remaining_quantity: i64,
}

/// Outcome of a POS sale attempt.
#[derive(Debug)]
pub enum PosOutcome {
    /// Sale committed; per-line remaining quantities drive low-stock
    /// warnings.
    Completed {
        order: ShopOrder,
        lines: Vec<PosLineResult>,
    },
    /// Some line found fewer shop units than requested; nothing changed.
    ShortStock {
        title: String,
        available: i64,
        requested: i64,
    },
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for order persistence across both sale channels.
#[derive(Debug, Clone)]
pub struct OrderRepository {
    pool: SqlitePool,
}

impl OrderRepository {
    /// Creates a new OrderRepository.
    pub fn new(pool: SqlitePool) -> Self {
        OrderRepository { pool }
    }

    // =========================================================================
    // Online Checkout
    // =========================================================================

    /// Persists an online order, decrementing owner stock atomically.
    ///
    /// The first line whose conditional decrement affects zero rows
    /// aborts the whole checkout; every prior decrement rolls back.
    pub async fn create_online_order(&self, new: &NewOrder) -> DbResult<CheckoutOutcome> {
        debug!(user_id = %new.user_id, lines = new.lines.len(), "Creating online order");

        let mut tx = self.pool.begin().await?;

        for line in &new.lines {
            let decremented = sqlx::query(
                r#"
                UPDATE stock_items
                SET quantity = quantity - ?2, updated_at = ?3
                WHERE id = ?1 AND quantity >= ?2
                "#,
            )
            .bind(&line.stock_item_id)
            .bind(line.quantity)
            .bind(Utc::now())
            .execute(&mut *tx)
            .await?;

            if decremented.rows_affected() == 0 {
                let available: Option<i64> =
                    sqlx::query_scalar("SELECT quantity FROM stock_items WHERE id = ?1")
                        .bind(&line.stock_item_id)
                        .fetch_optional(&mut *tx)
                        .await?;

                return match available {
                    // Row vanished since the cart was built
                    None => Err(DbError::not_found("Stock item", &line.stock_item_id)),
                    Some(available) => Ok(CheckoutOutcome::ShortStock {
                        title: line.title.clone(),
                        available,
                        requested: line.quantity,
                    }),
                };
            }
        }

        let now = Utc::now();
        let order = Order {
            id: Uuid::new_v4().to_string(),
            user_id: new.user_id.clone(),
            total_cents: new.total_cents,
            created_at: now,
        };

        sqlx::query(
            "INSERT INTO orders (id, user_id, total_cents, created_at) VALUES (?1, ?2, ?3, ?4)",
        )
        .bind(&order.id)
        .bind(&order.user_id)
        .bind(order.total_cents)
        .bind(order.created_at)
        .execute(&mut *tx)
        .await?;

        for line in &new.lines {
            sqlx::query(
                r#"
                INSERT INTO order_lines (
                    id, order_id, stock_item_id, title_snapshot,
                    unit_price_cents, quantity
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                "#,
            )
            .bind(Uuid::new_v4().to_string())
            .bind(&order.id)
            .bind(&line.stock_item_id)
            .bind(&line.title)
            .bind(line.unit_price_cents)
            .bind(line.quantity)
            .execute(&mut *tx)
            .await?;
        }

        sqlx::query(
            r#"
            INSERT INTO sales_history (
                id, user_id, order_id, shop_order_id,
                total_spent_cents, total_profit_cents, created_at
            ) VALUES (?1, ?2, ?3, NULL, ?4, ?5, ?6)
            "#,
        )
        .bind(Uuid::new_v4().to_string())
        .bind(&new.user_id)
        .bind(&order.id)
        .bind(new.total_cents)
        .bind(new.profit_cents)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        info!(
            order_id = %order.id,
            user_id = %order.user_id,
            total_cents = %order.total_cents,
            "Online order committed"
        );

        Ok(CheckoutOutcome::Completed(order))
    }

    // =========================================================================
    // POS Sale
    // =========================================================================

    /// Persists a POS sale, decrementing shop stock atomically.
    ///
    /// Line quantities come off the shop's stock rows, never the owner
    /// ledger. The sales-history row is written only when the sale has a
    /// resolved customer.
    pub async fn create_pos_sale(&self, new: &NewShopOrder) -> DbResult<PosOutcome> {
        debug!(shop_id = %new.shop_id, lines = new.lines.len(), "Creating POS sale");

        let mut tx = self.pool.begin().await?;
        let mut line_results = Vec::with_capacity(new.lines.len());

        for line in &new.lines {
            let decremented = sqlx::query(
                r#"
                UPDATE shop_stock
                SET quantity = quantity - ?3, updated_at = ?4
                WHERE shop_id = ?1 AND stock_item_id = ?2 AND quantity >= ?3
                "#,
            )
            .bind(&new.shop_id)
            .bind(&line.stock_item_id)
            .bind(line.quantity)
            .bind(Utc::now())
            .execute(&mut *tx)
            .await?;

            if decremented.rows_affected() == 0 {
                let available: i64 = sqlx::query_scalar(
                    "SELECT quantity FROM shop_stock WHERE shop_id = ?1 AND stock_item_id = ?2",
                )
                .bind(&new.shop_id)
                .bind(&line.stock_item_id)
                .fetch_optional(&mut *tx)
                .await?
                .unwrap_or(0);

                return Ok(PosOutcome::ShortStock {
                    title: line.title.clone(),
                    available,
                    requested: line.quantity,
                });
            }

            let remaining: i64 = sqlx::query_scalar(
                "SELECT quantity FROM shop_stock WHERE shop_id = ?1 AND stock_item_id = ?2",
            )
            .bind(&new.shop_id)
            .bind(&line.stock_item_id)
            .fetch_one(&mut *tx)
            .await?;

            line_results.push(PosLineResult {
                stock_item_id: line.stock_item_id.clone(),
                title: line.title.clone(),
                remaining_quantity: remaining,
            });
        }

        let now = Utc::now();
        let order = ShopOrder {
            id: Uuid::new_v4().to_string(),
            shop_id: new.shop_id.clone(),
            customer_user_id: new.customer_user_id.clone(),
            total_cents: new.total_cents,
            discount_bps: new.discount_bps,
            created_at: now,
        };

        sqlx::query(
            r#"
            INSERT INTO shop_orders (
                id, shop_id, customer_user_id, total_cents, discount_bps, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
        )
        .bind(&order.id)
        .bind(&order.shop_id)
        .bind(&order.customer_user_id)
        .bind(order.total_cents)
        .bind(order.discount_bps)
        .bind(order.created_at)
        .execute(&mut *tx)
        .await?;

        for line in &new.lines {
            sqlx::query(
                r#"
                INSERT INTO shop_order_lines (
                    id, shop_order_id, stock_item_id, title_snapshot,
                    unit_price_cents, quantity
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                "#,
            )
            .bind(Uuid::new_v4().to_string())
            .bind(&order.id)
            .bind(&line.stock_item_id)
            .bind(&line.title)
            .bind(line.unit_price_cents)
            .bind(line.quantity)
            .execute(&mut *tx)
            .await?;
        }

        if let Some(customer_id) = &new.customer_user_id {
            sqlx::query(
                r#"
                INSERT INTO sales_history (
                    id, user_id, order_id, shop_order_id,
                    total_spent_cents, total_profit_cents, created_at
                ) VALUES (?1, ?2, NULL, ?3, ?4, ?5, ?6)
                "#,
            )
            .bind(Uuid::new_v4().to_string())
            .bind(customer_id)
            .bind(&order.id)
            .bind(new.total_cents)
            .bind(new.profit_cents)
            .bind(now)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        info!(
            shop_order_id = %order.id,
            shop_id = %order.shop_id,
            total_cents = %order.total_cents,
            discount_bps = %order.discount_bps,
            "POS sale committed"
        );

        Ok(PosOutcome::Completed {
            order,
            lines: line_results,
        })
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// Gets an online order by ID.
    pub async fn get_order(&self, id: &str) -> DbResult<Option<Order>> {
        let sql = format!("SELECT {ORDER_COLUMNS} FROM orders WHERE id = ?1");
        let order = sqlx::query_as::<_, Order>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(order)
    }

    /// Gets the lines of an online order.
    pub async fn order_lines(&self, order_id: &str) -> DbResult<Vec<OrderLine>> {
        let sql = format!(
            "SELECT {ORDER_LINE_COLUMNS} FROM order_lines WHERE order_id = ?1 ORDER BY id"
        );
        let lines = sqlx::query_as::<_, OrderLine>(&sql)
            .bind(order_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(lines)
    }

    /// Lists a user's online orders, newest first.
    pub async fn orders_for_user(&self, user_id: &str) -> DbResult<Vec<Order>> {
        let sql = format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE user_id = ?1 ORDER BY created_at DESC"
        );
        let orders = sqlx::query_as::<_, Order>(&sql)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(orders)
    }

    /// Gets a POS order by ID.
    pub async fn get_shop_order(&self, id: &str) -> DbResult<Option<ShopOrder>> {
        let sql = format!("SELECT {SHOP_ORDER_COLUMNS} FROM shop_orders WHERE id = ?1");
        let order = sqlx::query_as::<_, ShopOrder>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(order)
    }

    /// Gets the lines of a POS order.
    pub async fn shop_order_lines(&self, shop_order_id: &str) -> DbResult<Vec<ShopOrderLine>> {
        let sql = format!(
            "SELECT {SHOP_ORDER_LINE_COLUMNS} FROM shop_order_lines \
             WHERE shop_order_id = ?1 ORDER BY id"
        );
        let lines = sqlx::query_as::<_, ShopOrderLine>(&sql)
            .bind(shop_order_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(lines)
    }

    /// Lists a shop's POS orders, newest first.
    pub async fn shop_orders_for_shop(&self, shop_id: &str) -> DbResult<Vec<ShopOrder>> {
        let sql = format!(
            "SELECT {SHOP_ORDER_COLUMNS} FROM shop_orders \
             WHERE shop_id = ?1 ORDER BY created_at DESC"
        );
        let orders = sqlx::query_as::<_, ShopOrder>(&sql)
            .bind(shop_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(orders)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
