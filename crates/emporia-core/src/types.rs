//! # Domain Types
//!
//! Core domain types used throughout Emporia.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │   StockItem     │   │      Shop       │   │   ShopStock     │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  owner ledger   │──►│  proprietor     │──►│  per-shop qty   │       │
//! │  │  qty, price,    │   │  identity pair  │   │  + price/cost   │       │
//! │  │  cost, flags    │   │                 │   │  snapshot       │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │ Order/ShopOrder │   │  SalesRecord    │   │      User       │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  immutable      │──►│  append-only    │──►│  role + tier    │       │
//! │  │  header + lines │   │  spend/profit   │   │  columns        │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every entity has a UUID v4 `id` string, immutable and used for database
//! relations.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::money::Money;
use crate::tier::Tier;

// =============================================================================
// Role
// =============================================================================

/// Role held by a user identity.
///
/// Owner and Proprietor are administrative: they never receive broadcast
/// messages and never accrue loyalty history of their own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Operates the central inventory.
    Owner,
    /// Back-office administration.
    Admin,
    /// Operates one shop and its POS.
    Proprietor,
    /// Base role: storefront and POS customer.
    Customer,
}

impl Role {
    /// Administrative roles are excluded from messaging fan-out.
    pub const fn is_administrative(&self) -> bool {
        matches!(self, Role::Owner | Role::Proprietor)
    }
}

impl Default for Role {
    fn default() -> Self {
        Role::Customer
    }
}

// =============================================================================
// Stock Item
// =============================================================================

/// An item in the owner's master inventory.
///
/// The quantity column here is the single source of truth for how many
/// units exist in the system; it is mutated only by transfers and online
/// checkout, and never goes negative.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct StockItem {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Display title shown in the storefront and on receipts.
    pub title: String,

    /// Category for browsing/grouping.
    pub category: String,

    /// Sell price in cents.
    pub price_cents: i64,

    /// Cost price in cents (for profit computation).
    pub cost_cents: i64,

    /// Units on hand in the owner inventory.
    pub quantity: i64,

    /// New-arrival flag.
    pub is_new: bool,

    /// On-sale flag.
    pub on_sale: bool,

    /// Original price before a markdown, if any.
    pub original_price_cents: Option<i64>,

    /// Sum of all star ratings received.
    pub rating_sum: i64,

    /// Number of ratings received.
    pub rating_count: i64,

    /// When the item was created.
    pub created_at: DateTime<Utc>,

    /// When the item was last updated.
    pub updated_at: DateTime<Utc>,
}

impl StockItem {
    /// Returns the sell price as Money.
    #[inline]
    pub fn price(&self) -> Money {
        Money::from_cents(self.price_cents)
    }

    /// Returns the cost price as Money.
    #[inline]
    pub fn cost(&self) -> Money {
        Money::from_cents(self.cost_cents)
    }

    /// Profit contributed by one unit sold at the current owner price.
    #[inline]
    pub fn unit_profit(&self) -> Money {
        self.price() - self.cost()
    }

    /// Average star rating, if any ratings exist.
    pub fn average_rating(&self) -> Option<f64> {
        if self.rating_count == 0 {
            None
        } else {
            Some(self.rating_sum as f64 / self.rating_count as f64)
        }
    }
}

// =============================================================================
// Shop
// =============================================================================

/// A shop drawing stock from the owner inventory.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Shop {
    pub id: String,
    pub name: String,
    pub address: String,
    pub phone: String,

    /// Proprietor email; set together with `proprietor_user_id` or both
    /// empty (at most one active proprietor per shop).
    pub proprietor_email: Option<String>,

    /// Proprietor user id; paired with `proprietor_email`.
    pub proprietor_user_id: Option<String>,

    pub created_at: DateTime<Utc>,
}

impl Shop {
    /// Whether the shop currently has an assigned proprietor.
    pub fn has_proprietor(&self) -> bool {
        self.proprietor_user_id.is_some()
    }
}

// =============================================================================
// Shop Stock
// =============================================================================

/// Per-shop stock row, unique per (shop, stock item).
///
/// price/cost/source are a point-in-time copy inherited from the owner
/// record at transfer time, never a live reference; the shop's sell price
/// can diverge from the owner's later price changes.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct ShopStock {
    pub id: String,
    pub shop_id: String,
    pub stock_item_id: String,

    /// Units on hand at this shop.
    pub quantity: i64,

    /// Shop sell price snapshot; None falls through to the owner's
    /// current price at sale time.
    pub price_cents: Option<i64>,

    /// Cost snapshot copied at transfer time (informational; POS profit
    /// uses the owner's current cost).
    pub cost_cents: Option<i64>,

    /// Title of the source item at transfer time.
    pub source_title: Option<String>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ShopStock {
    /// The unit price a POS sale charges: the shop snapshot if set, else
    /// the owner's current price.
    pub fn sale_price(&self, owner: &StockItem) -> Money {
        match self.price_cents {
            Some(cents) => Money::from_cents(cents),
            None => owner.price(),
        }
    }
}

// =============================================================================
// Shop Transfer
// =============================================================================

/// One row of the append-only owner→shop transfer ledger.
///
/// Created only as a side effect of a successful transfer; never mutated
/// or deleted.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct ShopTransfer {
    pub id: String,
    pub shop_id: String,
    pub stock_item_id: String,
    pub quantity: i64,

    /// User id of whoever performed the transfer, when known.
    pub performed_by: Option<String>,

    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Orders
// =============================================================================

/// An online order header. Immutable once created.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Order {
    pub id: String,
    pub user_id: String,

    /// Equals the sum of line subtotals.
    pub total_cents: i64,

    pub created_at: DateTime<Utc>,
}

/// A line item in an online order.
///
/// Uses the snapshot pattern: title and unit price are frozen at sale
/// time.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct OrderLine {
    pub id: String,
    pub order_id: String,
    pub stock_item_id: String,
    pub title_snapshot: String,
    pub unit_price_cents: i64,
    pub quantity: i64,
}

impl OrderLine {
    /// Line subtotal (unit price × quantity).
    #[inline]
    pub fn line_total(&self) -> Money {
        Money::from_cents(self.unit_price_cents).multiply_quantity(self.quantity)
    }
}

/// A POS order header. Immutable once created.
///
/// `total_cents` is post-discount; line items retain pre-discount unit
/// prices so recorded profit stays accurate.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct ShopOrder {
    pub id: String,
    pub shop_id: String,

    /// Resolved customer, when the sale had one.
    pub customer_user_id: Option<String>,

    pub total_cents: i64,

    /// Tier discount applied to the total, in basis points.
    pub discount_bps: i64,

    pub created_at: DateTime<Utc>,
}

/// A line item in a POS order.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct ShopOrderLine {
    pub id: String,
    pub shop_order_id: String,
    pub stock_item_id: String,
    pub title_snapshot: String,
    pub unit_price_cents: i64,
    pub quantity: i64,
}

impl ShopOrderLine {
    /// Pre-discount line subtotal.
    #[inline]
    pub fn line_total(&self) -> Money {
        Money::from_cents(self.unit_price_cents).multiply_quantity(self.quantity)
    }
}

// =============================================================================
// Sales History
// =============================================================================

/// One row of the append-only per-user sales ledger.
///
/// Exactly one of `order_id` / `shop_order_id` is set. The sum of a
/// user's `total_profit_cents` rows is the sole input to tier
/// computation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct SalesRecord {
    pub id: String,
    pub user_id: String,
    pub order_id: Option<String>,
    pub shop_order_id: Option<String>,
    pub total_spent_cents: i64,
    pub total_profit_cents: i64,
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// User
// =============================================================================

/// A user identity with its role and derived tier.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct User {
    pub id: String,
    pub email: String,
    pub phone: Option<String>,
    pub display_name: String,

    /// Argon2 hash; guest signups get the configured default password.
    #[serde(skip_serializing)]
    pub password_hash: String,

    pub role: Role,
    pub tier: Tier,
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Messaging
// =============================================================================

/// A broadcast message.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Message {
    pub id: String,
    pub subject: String,
    pub body: String,

    /// Raw target selector as submitted (parsed case-insensitively at
    /// fan-out time).
    pub target: String,

    pub created_at: DateTime<Utc>,
}

/// Per-user read receipt for a broadcast message, unique per
/// (message, user).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct MessageReceipt {
    pub id: String,
    pub message_id: String,
    pub user_id: String,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn item(price: i64, cost: i64) -> StockItem {
        StockItem {
            id: "item-1".to_string(),
            title: "Walnut Desk".to_string(),
            category: "furniture".to_string(),
            price_cents: price,
            cost_cents: cost,
            quantity: 10,
            is_new: false,
            on_sale: false,
            original_price_cents: None,
            rating_sum: 0,
            rating_count: 0,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_unit_profit() {
        assert_eq!(item(5000, 3000).unit_profit().cents(), 2000);
    }

    #[test]
    fn test_average_rating() {
        let mut i = item(100, 50);
        assert_eq!(i.average_rating(), None);
        i.rating_sum = 9;
        i.rating_count = 2;
        assert_eq!(i.average_rating(), Some(4.5));
    }

    #[test]
    fn test_shop_stock_price_falls_through_to_owner() {
        let owner = item(5000, 3000);
        let mut stock = ShopStock {
            id: "ss-1".to_string(),
            shop_id: "shop-1".to_string(),
            stock_item_id: owner.id.clone(),
            quantity: 4,
            price_cents: None,
            cost_cents: None,
            source_title: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        assert_eq!(stock.sale_price(&owner).cents(), 5000);

        stock.price_cents = Some(5500);
        assert_eq!(stock.sale_price(&owner).cents(), 5500);
    }

    #[test]
    fn test_administrative_roles() {
        assert!(Role::Owner.is_administrative());
        assert!(Role::Proprietor.is_administrative());
        assert!(!Role::Admin.is_administrative());
        assert!(!Role::Customer.is_administrative());
    }

    #[test]
    fn test_order_line_total() {
        let line = OrderLine {
            id: "l-1".to_string(),
            order_id: "o-1".to_string(),
            stock_item_id: "item-1".to_string(),
            title_snapshot: "Walnut Desk".to_string(),
            unit_price_cents: 5000,
            quantity: 3,
        };
        assert_eq!(line.line_total().cents(), 15000);
    }
}
