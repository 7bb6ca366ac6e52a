//! # Cart Module
//!
//! Session-scoped shopping cart with quantity reconciliation.
//!
//! The cart never reserves stock; it only reflects desired quantity. For
//! any item the quantity available to add equals the owner's current
//! quantity minus what this cart already holds, re-checked against a
//! fresh owner read on every increment. Cross-session visibility does not
//! exist: two sessions can each see the full owner quantity, and the
//! checkout's conditional decrement is what finally arbitrates.
//!
//! ## Cart Operations Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Storefront Action         Engine Call             Cart State Change    │
//! │  ─────────────────         ───────────             ─────────────────    │
//! │                                                                         │
//! │  Add to cart ────────────► add_item() ───────────► merge or push line   │
//! │                                                                         │
//! │  "+" button ─────────────► increment() ──────────► qty += 1 (re-check)  │
//! │                                                                         │
//! │  "-" button ─────────────► decrement() ──────────► qty -= 1, remove @ 0 │
//! │                                                                         │
//! │  Checkout / clear ───────► clear() ──────────────► items.clear()        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::types::StockItem;
use crate::{MAX_CART_ITEMS, MAX_ITEM_QUANTITY};

// =============================================================================
// Cart Item
// =============================================================================

/// A line in the shopping cart.
///
/// Title and unit price are a snapshot taken when the line was created;
/// checkout re-fetches the owner record and charges the price current at
/// sale time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CartItem {
    /// Owner stock item this line refers to.
    pub stock_item_id: String,

    /// Title at time of adding (display only).
    pub title: String,

    /// Price in cents at time of adding (display only).
    pub unit_price_cents: i64,

    /// Desired quantity.
    pub quantity: i64,

    /// When this line was created.
    pub added_at: DateTime<Utc>,
}

impl CartItem {
    /// Creates a cart line from an owner stock item.
    pub fn from_item(item: &StockItem, quantity: i64) -> Self {
        CartItem {
            stock_item_id: item.id.clone(),
            title: item.title.clone(),
            unit_price_cents: item.price_cents,
            quantity,
            added_at: Utc::now(),
        }
    }

    /// Line subtotal at the displayed snapshot price.
    pub fn line_total(&self) -> Money {
        Money::from_cents(self.unit_price_cents).multiply_quantity(self.quantity)
    }
}

// =============================================================================
// Cart
// =============================================================================

/// The session cart.
///
/// ## Invariants
/// - Lines are unique by `stock_item_id` (adding the same item merges)
/// - Quantity is always > 0 (decrementing to zero removes the line)
/// - At most `MAX_CART_ITEMS` unique lines, `MAX_ITEM_QUANTITY` per line
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Cart {
    /// Lines in the cart.
    pub items: Vec<CartItem>,

    /// When the cart was created/last cleared.
    pub created_at: DateTime<Utc>,
}

impl Cart {
    /// Creates a new empty cart.
    pub fn new() -> Self {
        Cart {
            items: Vec::new(),
            created_at: Utc::now(),
        }
    }

    /// Quantity of the given item already in this cart.
    pub fn quantity_of(&self, stock_item_id: &str) -> i64 {
        self.items
            .iter()
            .find(|i| i.stock_item_id == stock_item_id)
            .map(|i| i.quantity)
            .unwrap_or(0)
    }

    /// Quantity still available to this cart for the given owner record:
    /// owner quantity minus what the cart already holds.
    pub fn available_for(&self, item: &StockItem) -> i64 {
        item.quantity - self.quantity_of(&item.id)
    }

    /// Adds an item to the cart, merging into an existing line.
    ///
    /// Fails with `InsufficientStock` when the requested quantity exceeds
    /// what is still available to this cart; the cart is left unchanged.
    pub fn add_item(&mut self, item: &StockItem, quantity: i64) -> CoreResult<()> {
        if quantity <= 0 {
            return Err(CoreError::InvalidQuantity(quantity));
        }

        let available = self.available_for(item);
        if available < quantity {
            return Err(CoreError::InsufficientStock {
                title: item.title.clone(),
                available: available.max(0),
                requested: quantity,
            });
        }

        if let Some(line) = self
            .items
            .iter_mut()
            .find(|i| i.stock_item_id == item.id)
        {
            let new_qty = line.quantity + quantity;
            if new_qty > MAX_ITEM_QUANTITY {
                return Err(CoreError::QuantityTooLarge {
                    requested: new_qty,
                    max: MAX_ITEM_QUANTITY,
                });
            }
            line.quantity = new_qty;
            return Ok(());
        }

        if self.items.len() >= MAX_CART_ITEMS {
            return Err(CoreError::CartTooLarge {
                max: MAX_CART_ITEMS,
            });
        }

        self.items.push(CartItem::from_item(item, quantity));
        Ok(())
    }

    /// Increments a line by one, re-checking availability against the
    /// owner record fetched by the caller for this call.
    pub fn increment(&mut self, item: &StockItem) -> CoreResult<()> {
        self.add_item(item, 1)
    }

    /// Decrements a line by one; the line is removed when it reaches
    /// zero. Unknown items are a no-op.
    pub fn decrement(&mut self, stock_item_id: &str) {
        if let Some(pos) = self
            .items
            .iter()
            .position(|i| i.stock_item_id == stock_item_id)
        {
            if self.items[pos].quantity > 1 {
                self.items[pos].quantity -= 1;
            } else {
                self.items.remove(pos);
            }
        }
    }

    /// Removes a line entirely.
    pub fn remove_item(&mut self, stock_item_id: &str) {
        self.items.retain(|i| i.stock_item_id != stock_item_id);
    }

    /// Clears all lines.
    pub fn clear(&mut self) {
        self.items.clear();
        self.created_at = Utc::now();
    }

    /// Number of unique lines.
    pub fn item_count(&self) -> usize {
        self.items.len()
    }

    /// Total quantity across all lines.
    pub fn total_quantity(&self) -> i64 {
        self.items.iter().map(|i| i.quantity).sum()
    }

    /// Cart subtotal at displayed snapshot prices.
    pub fn subtotal(&self) -> Money {
        self.items.iter().map(|i| i.line_total()).sum()
    }

    /// Checks if the cart is empty.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl Default for Cart {
    fn default() -> Self {
        Cart::new()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
