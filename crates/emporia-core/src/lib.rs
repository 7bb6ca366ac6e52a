//! # emporia-core: Pure Business Logic for Emporia
//!
//! This crate is the heart of the Emporia retail engine. It contains all
//! business logic as pure functions with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Emporia Architecture                             │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                emporia-engine (Operation Boundary)              │   │
//! │  │    checkout, POS sale, transfer, cart session, messaging        │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ emporia-core (THIS CRATE) ★                     │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │   types   │  │   money   │  │   cart    │  │   tier    │  │   │
//! │  │   │ StockItem │  │   Money   │  │   Cart    │  │   Tier    │  │   │
//! │  │   │ Order ... │  │ discounts │  │ reconcile │  │ Broadcast │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    emporia-db (Database Layer)                  │   │
//! │  │              SQLite queries, migrations, repositories           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (StockItem, Shop, Order, User, ...)
//! - [`money`] - Money type with integer arithmetic (no floating point!)
//! - [`tier`] - Loyalty tier derivation and broadcast targeting
//! - [`cart`] - Session cart with quantity reconciliation
//! - [`error`] - Domain error types
//! - [`validation`] - Input validation rules
//!
//! ## Design Principles
//!
//! 1. **Pure Functions**: Every function is deterministic
//! 2. **No I/O**: Database, network, file system access is FORBIDDEN here
//! 3. **Integer Money**: All monetary values are cents (i64)
//! 4. **Explicit Errors**: All errors are typed, never strings or panics

// =============================================================================
// Module Declarations
// =============================================================================

pub mod cart;
pub mod error;
pub mod money;
pub mod tier;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================
// These allow users to do `use emporia_core::Money` instead of
// `use emporia_core::money::Money`

pub use cart::{Cart, CartItem};
pub use error::{CoreError, CoreResult, ValidationError};
pub use money::Money;
pub use tier::{BroadcastTarget, Tier};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum unique lines allowed in a single cart.
///
/// Prevents runaway carts and keeps checkout transactions bounded.
pub const MAX_CART_ITEMS: usize = 100;

/// Maximum quantity of a single item in a cart or sale line.
///
/// Guards against typo-sized orders (1000 instead of 10).
pub const MAX_ITEM_QUANTITY: i64 = 999;

/// Shop stock quantity at or below which a POS sale emits a low-stock
/// warning. Informational, never blocking.
pub const LOW_STOCK_THRESHOLD: i64 = 2;
