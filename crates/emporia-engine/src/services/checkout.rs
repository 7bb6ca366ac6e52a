//! # Checkout Service
//!
//! Online storefront checkout: session cart → persisted order.
//!
//! ## Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        checkout(session, user)                          │
//! │                                                                         │
//! │  1. Snapshot the session cart          empty ──► NoItemsSelected       │
//! │  2. Resolve the user                   missing ─► Unauthorized         │
//! │  3. Re-fetch every owner item          missing ─► NotFound             │
//! │     (current price and cost drive total and profit)                    │
//! │  4. Persist order + lines + history in ONE transaction;                │
//! │     each line's conditional decrement arbitrates stock                 │
//! │     short ──► InsufficientStock naming the item, nothing persisted     │
//! │  5. Recompute the user's tier                                          │
//! │  6. Clear the session cart                                             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info};

use crate::error::{EngineError, EngineResult};
use crate::services::customer::CustomerService;
use crate::session::SessionStore;
use emporia_core::{CoreError, Money, Order, OrderLine, Tier};
use emporia_db::{CheckoutOutcome, Database, NewOrder, NewOrderLine};

/// Receipt returned from a completed checkout.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderReceipt {
    pub order: Order,
    pub lines: Vec<OrderLine>,
    /// The customer's tier after this purchase was recorded.
    pub tier: Tier,
}

/// Service for online checkout.
#[derive(Clone)]
pub struct CheckoutService {
    db: Database,
    sessions: Arc<SessionStore>,
    customers: CustomerService,
}

impl CheckoutService {
    /// Creates a new CheckoutService.
    pub fn new(db: Database, sessions: Arc<SessionStore>, customers: CustomerService) -> Self {
        CheckoutService {
            db,
            sessions,
            customers,
        }
    }

    /// Converts the session's cart into a persisted order.
    ///
    /// Stock is never decremented for an order that fails: the whole
    /// checkout is one transaction, and the first short line aborts it
    /// naming the item.
    pub async fn checkout(&self, session_id: &str, user_id: &str) -> EngineResult<OrderReceipt> {
        let cart_items = self.sessions.with_cart(session_id, |c| c.items.clone());
        if cart_items.is_empty() {
            return Err(CoreError::NoItemsSelected.into());
        }

        if self.db.users().get_by_id(user_id).await?.is_none() {
            return Err(CoreError::Unauthorized(format!(
                "No user context for checkout: {}",
                user_id
            ))
            .into());
        }

        // Re-fetch every line's owner record; the order charges the
        // price current at sale time, not the cart's display snapshot
        let mut lines = Vec::with_capacity(cart_items.len());
        let mut total = Money::zero();
        let mut profit = Money::zero();

        for cart_item in &cart_items {
            let item = self
                .db
                .stock()
                .get_by_id(&cart_item.stock_item_id)
                .await?
                .ok_or_else(|| EngineError::not_found("Stock item", &cart_item.stock_item_id))?;

            total += item.price().multiply_quantity(cart_item.quantity);
            profit += item.unit_profit().multiply_quantity(cart_item.quantity);

            lines.push(NewOrderLine {
                stock_item_id: item.id.clone(),
                title: item.title.clone(),
                unit_price_cents: item.price_cents,
                quantity: cart_item.quantity,
            });
        }

        debug!(
            session_id = %session_id,
            user_id = %user_id,
            lines = lines.len(),
            total_cents = total.cents(),
            "Submitting checkout"
        );

        let new = NewOrder {
            user_id: user_id.to_string(),
            lines,
            total_cents: total.cents(),
            profit_cents: profit.cents(),
        };

        let order = match self.db.orders().create_online_order(&new).await? {
            CheckoutOutcome::Completed(order) => order,
            CheckoutOutcome::ShortStock {
                title,
                available,
                requested,
            } => {
                // The cart stays intact so the user can adjust and retry
                return Err(EngineError::insufficient_stock(&title, available, requested));
            }
        };

        let tier = self.customers.recompute_tier(user_id).await?;
        self.sessions.clear(session_id);

        let lines = self.db.orders().order_lines(&order.id).await?;

        info!(
            order_id = %order.id,
            user_id = %user_id,
            total_cents = order.total_cents,
            tier = %tier,
            "Checkout completed"
        );

        Ok(OrderReceipt { order, lines, tier })
    }

    /// A user's past online orders, newest first.
    pub async fn orders_for_user(&self, user_id: &str) -> EngineResult<Vec<Order>> {
        Ok(self.db.orders().orders_for_user(user_id).await?)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
