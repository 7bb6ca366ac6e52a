//! # emporia-db: Database Layer for Emporia
//!
//! This crate provides database access for the Emporia retail engine.
//! It uses SQLite for storage with sqlx for async operations.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Emporia Data Flow                                │
//! │                                                                         │
//! │  Engine service (checkout, POS sale, transfer)                         │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     emporia-db (THIS CRATE)                     │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐  │   │
//! │  │   │   Database    │    │  Repositories │    │  Migrations  │  │   │
//! │  │   │   (pool.rs)   │    │  (stock, shop │    │  (embedded)  │  │   │
//! │  │   │               │    │   order, ...) │    │              │  │   │
//! │  │   │ SqlitePool    │◄───│ transactional │    │ 001_init.sql │  │   │
//! │  │   │ WAL mode      │    │ sale/transfer │    │              │  │   │
//! │  │   └───────────────┘    └───────────────┘    └──────────────┘  │   │
//! │  │                                                                 │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │                       SQLite Database (emporia.db)                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - Repository implementations
//!
//! ## Usage
//!
//! ```rust,ignore
//! use emporia_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("path/to/emporia.db")).await?;
//! let items = db.stock().list().await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};

// Repository re-exports for convenience
pub use repository::history::SalesHistoryRepository;
pub use repository::message::MessageRepository;
pub use repository::order::{
    CheckoutOutcome, NewOrder, NewOrderLine, NewShopOrder, OrderRepository, PosLineResult,
    PosOutcome,
};
pub use repository::shop::{ShopRepository, TransferOutcome};
pub use repository::stock::StockRepository;
pub use repository::user::UserRepository;
