//! # Cart Service
//!
//! Storefront cart operations over the session store.
//!
//! Every mutation that can grow a line re-fetches the owner record
//! first, so availability is always judged against the current owner
//! quantity minus what the cart already holds. An out-of-stock add
//! reports the shortfall as a user message and leaves the cart exactly
//! as it was.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

use crate::error::{EngineError, EngineResult};
use crate::session::SessionStore;
use emporia_core::{Cart, CartItem, CoreError};
use emporia_db::Database;

/// Cart contents plus computed totals, as shown to the session.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartView {
    pub items: Vec<CartItem>,
    pub item_count: usize,
    pub total_quantity: i64,
    pub subtotal_cents: i64,
}

impl From<&Cart> for CartView {
    fn from(cart: &Cart) -> Self {
        CartView {
            items: cart.items.clone(),
            item_count: cart.item_count(),
            total_quantity: cart.total_quantity(),
            subtotal_cents: cart.subtotal().cents(),
        }
    }
}

/// Service for session cart manipulation.
#[derive(Clone)]
pub struct CartService {
    db: Database,
    sessions: Arc<SessionStore>,
}

impl CartService {
    /// Creates a new CartService.
    pub fn new(db: Database, sessions: Arc<SessionStore>) -> Self {
        CartService { db, sessions }
    }

    /// The session's current cart.
    pub fn view(&self, session_id: &str) -> CartView {
        self.sessions.with_cart(session_id, |c| CartView::from(c))
    }

    /// Quantity of an item still available to this session: the current
    /// owner quantity minus what the cart already holds.
    pub async fn available(&self, session_id: &str, stock_item_id: &str) -> EngineResult<i64> {
        let item = self
            .db
            .stock()
            .get_by_id(stock_item_id)
            .await?
            .ok_or_else(|| EngineError::not_found("Stock item", stock_item_id))?;

        Ok(self
            .sessions
            .with_cart(session_id, |c| c.available_for(&item)))
    }

    /// Adds an item to the session cart.
    pub async fn add(
        &self,
        session_id: &str,
        stock_item_id: &str,
        quantity: i64,
    ) -> EngineResult<CartView> {
        debug!(session_id = %session_id, stock_item_id = %stock_item_id, quantity = %quantity, "add to cart");

        let item = self
            .db
            .stock()
            .get_by_id(stock_item_id)
            .await?
            .ok_or_else(|| EngineError::not_found("Stock item", stock_item_id))?;

        self.sessions
            .with_cart_mut(session_id, |c| -> Result<CartView, CoreError> {
                c.add_item(&item, quantity)?;
                Ok(CartView::from(&*c))
            })
            .map_err(EngineError::from)
    }

    /// Increments a line by one, re-checked against a fresh owner read.
    pub async fn increment(&self, session_id: &str, stock_item_id: &str) -> EngineResult<CartView> {
        debug!(session_id = %session_id, stock_item_id = %stock_item_id, "increment cart line");

        let item = self
            .db
            .stock()
            .get_by_id(stock_item_id)
            .await?
            .ok_or_else(|| EngineError::not_found("Stock item", stock_item_id))?;

        self.sessions
            .with_cart_mut(session_id, |c| -> Result<CartView, CoreError> {
                c.increment(&item)?;
                Ok(CartView::from(&*c))
            })
            .map_err(EngineError::from)
    }

    /// Decrements a line by one; the line disappears at zero.
    pub fn decrement(&self, session_id: &str, stock_item_id: &str) -> CartView {
        debug!(session_id = %session_id, stock_item_id = %stock_item_id, "decrement cart line");

        self.sessions.with_cart_mut(session_id, |c| {
            c.decrement(stock_item_id);
            CartView::from(&*c)
        })
    }

    /// Removes a line entirely.
    pub fn remove(&self, session_id: &str, stock_item_id: &str) -> CartView {
        self.sessions.with_cart_mut(session_id, |c| {
            c.remove_item(stock_item_id);
            CartView::from(&*c)
        })
    }

    /// Clears the session's cart.
    pub fn clear(&self, session_id: &str) -> CartView {
        self.sessions.with_cart_mut(session_id, |c| {
            c.clear();
            CartView::from(&*c)
        })
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use crate::testutil;

    #[tokio::test]
    async fn test_add_and_view() {
        let engine = testutil::engine().await;
        let item = testutil::seed_item(&engine, "Oak Bookshelf", 5000, 3000, 10).await;
        let carts = engine.carts();

        let view = carts.add("session-1", &item.id, 2).await.unwrap();
        assert_eq!(view.total_quantity, 2);
        assert_eq!(view.subtotal_cents, 10000);

        assert_eq!(carts.available("session-1", &item.id).await.unwrap(), 8);
        // Another session sees the full owner quantity
        assert_eq!(carts.available("session-2", &item.id).await.unwrap(), 10);
    }

    #[tokio::test]
    async fn test_add_when_unavailable_reports_and_keeps_cart() {
        let engine = testutil::engine().await;
        let item = testutil::seed_item(&engine, "Oak Bookshelf", 5000, 3000, 2).await;
        let carts = engine.carts();

        carts.add("session-1", &item.id, 2).await.unwrap();

        let err = carts.add("session-1", &item.id, 1).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::InsufficientStock);

        let view = carts.view("session-1");
        assert_eq!(view.total_quantity, 2);
    }

    #[tokio::test]
    async fn test_increment_rechecks_owner_quantity() {
        let engine = testutil::engine().await;
        let item = testutil::seed_item(&engine, "Oak Bookshelf", 5000, 3000, 3).await;
        let shop = testutil::seed_shop(&engine, "Shop A").await;
        let carts = engine.carts();

        carts.add("session-1", &item.id, 2).await.unwrap();

        // A transfer drains the owner ledger under this cart
        engine
            .transfers()
            .transfer(&shop.id, &item.id, 1, None)
            .await
            .unwrap();

        let err = carts.increment("session-1", &item.id).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::InsufficientStock);
        assert_eq!(carts.view("session-1").total_quantity, 2);
    }

    #[tokio::test]
    async fn test_decrement_to_zero_removes_line() {
        let engine = testutil::engine().await;
        let item = testutil::seed_item(&engine, "Oak Bookshelf", 5000, 3000, 10).await;
        let carts = engine.carts();

        carts.add("session-1", &item.id, 1).await.unwrap();
        let view = carts.decrement("session-1", &item.id);
        assert_eq!(view.item_count, 0);
    }

    #[tokio::test]
    async fn test_missing_item_is_not_found() {
        let engine = testutil::engine().await;
        let carts = engine.carts();

        let err = carts.add("session-1", "missing", 1).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::NotFound);
    }
}
