//! # emporia-engine: Operation Boundary for Emporia
//!
//! This crate wires the pure rules of `emporia-core` and the
//! repositories of `emporia-db` into the operations an application
//! exposes: storefront carts and checkout, POS sales, stock transfers,
//! customer/tier management, and broadcast messaging.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use emporia_engine::{Engine, EngineConfig};
//!
//! emporia_engine::telemetry::init_tracing();
//!
//! let config = EngineConfig::load()?;
//! let engine = Engine::from_config(config).await?;
//!
//! let cart = engine.carts().add("session-1", &item_id, 2).await?;
//! let receipt = engine.checkout().checkout("session-1", &user_id).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod config;
pub mod error;
pub mod report;
pub mod services;
pub mod session;
pub mod telemetry;

// =============================================================================
// Re-exports
// =============================================================================

pub use config::EngineConfig;
pub use error::{EngineError, EngineResult, ErrorCode};
pub use services::cart::{CartService, CartView};
pub use services::checkout::{CheckoutService, OrderReceipt};
pub use services::customer::{CustomerRef, CustomerService};
pub use services::inventory::{InventoryService, NewStockItem, StockItemUpdate};
pub use services::messaging::{BroadcastSummary, MessagingService};
pub use services::pos::{LowStockWarning, PosReceipt, PosService};
pub use services::shops::{ShopDetails, ShopService};
pub use services::transfer::TransferService;
pub use session::SessionStore;

use std::sync::Arc;

use emporia_db::{Database, DbConfig};

/// The engine facade: one handle bundling every service over a shared
/// database and session store.
#[derive(Clone)]
pub struct Engine {
    db: Database,
    config: EngineConfig,
    sessions: Arc<SessionStore>,
}

impl Engine {
    /// Wraps an already-connected database.
    pub fn new(db: Database, config: EngineConfig) -> Self {
        let sessions = Arc::new(SessionStore::new(config.session_idle_timeout()));
        Engine {
            db,
            config,
            sessions,
        }
    }

    /// Connects the database described by the configuration and wraps
    /// it.
    pub async fn from_config(config: EngineConfig) -> EngineResult<Self> {
        let db_config = DbConfig::new(&config.database_path)
            .max_connections(config.max_connections);
        let db = Database::new(db_config).await?;
        Ok(Engine::new(db, config))
    }

    /// The underlying database handle.
    pub fn db(&self) -> &Database {
        &self.db
    }

    /// The session cart store.
    pub fn sessions(&self) -> &Arc<SessionStore> {
        &self.sessions
    }

    /// Owner inventory management.
    pub fn inventory(&self) -> InventoryService {
        InventoryService::new(self.db.clone())
    }

    /// Shop administration.
    pub fn shops(&self) -> ShopService {
        ShopService::new(self.db.clone())
    }

    /// Owner→shop stock movement.
    pub fn transfers(&self) -> TransferService {
        TransferService::new(self.db.clone())
    }

    /// Session cart manipulation.
    pub fn carts(&self) -> CartService {
        CartService::new(self.db.clone(), self.sessions.clone())
    }

    /// Online storefront checkout.
    pub fn checkout(&self) -> CheckoutService {
        CheckoutService::new(self.db.clone(), self.sessions.clone(), self.customers())
    }

    /// In-shop point-of-sale.
    pub fn pos(&self) -> PosService {
        PosService::new(
            self.db.clone(),
            self.customers(),
            self.config.low_stock_threshold,
        )
    }

    /// Customer identity and tier operations.
    pub fn customers(&self) -> CustomerService {
        CustomerService::new(
            self.db.clone(),
            self.config.guest_email_domain.clone(),
            self.config.guest_default_password.clone(),
        )
    }

    /// Broadcast messaging.
    pub fn messaging(&self) -> MessagingService {
        MessagingService::new(self.db.clone())
    }
}

// =============================================================================
// Test Utilities
// =============================================================================

#[cfg(test)]
pub(crate) mod testutil {
    use super::*;
    use chrono::Utc;
    use emporia_core::{Role, StockItem, Tier, User};
    use uuid::Uuid;

    use crate::services::inventory::StockItemUpdate;

    /// An engine over a fresh in-memory database.
    pub async fn engine() -> Engine {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        Engine::new(db, EngineConfig::default())
    }

    /// Seeds an owner stock item.
    pub async fn seed_item(
        engine: &Engine,
        title: &str,
        price_cents: i64,
        cost_cents: i64,
        quantity: i64,
    ) -> StockItem {
        engine
            .inventory()
            .create(crate::services::inventory::NewStockItem {
                title: title.to_string(),
                category: "general".to_string(),
                price_cents,
                cost_cents,
                quantity,
                is_new: false,
                on_sale: false,
                original_price_cents: None,
            })
            .await
            .unwrap()
    }

    /// Seeds a shop without a proprietor.
    pub async fn seed_shop(engine: &Engine, name: &str) -> emporia_core::Shop {
        engine
            .shops()
            .create(crate::services::shops::ShopDetails {
                name: name.to_string(),
                address: "12 Market Street".to_string(),
                phone: "5550100".to_string(),
            })
            .await
            .unwrap()
    }

    /// Seeds a user with the given role.
    pub async fn seed_user(engine: &Engine, email: &str, role: Role) -> User {
        let user = User {
            id: Uuid::new_v4().to_string(),
            email: email.to_string(),
            phone: None,
            display_name: email.split('@').next().unwrap_or("user").to_string(),
            password_hash: "test-hash".to_string(),
            role,
            tier: Tier::Bronze,
            created_at: Utc::now(),
        };
        engine.db().users().insert(&user).await.unwrap();
        user
    }

    /// Seeds a customer, optionally with a phone number.
    pub async fn seed_customer(engine: &Engine, email: &str, phone: Option<&str>) -> User {
        let mut user = seed_user(engine, email, Role::Customer).await;
        if let Some(phone) = phone {
            sqlx::query("UPDATE users SET phone = ?2 WHERE id = ?1")
                .bind(&user.id)
                .bind(phone)
                .execute(engine.db().pool())
                .await
                .unwrap();
            user.phone = Some(phone.to_string());
        }
        user
    }

    /// Seeds one sales-history row directly (spend/profit in cents).
    pub async fn seed_history(engine: &Engine, user_id: &str, spent_cents: i64, profit_cents: i64) {
        sqlx::query(
            r#"
            INSERT INTO sales_history (
                id, user_id, order_id, shop_order_id,
                total_spent_cents, total_profit_cents, created_at
            ) VALUES (?1, ?2, NULL, NULL, ?3, ?4, ?5)
            "#,
        )
        .bind(Uuid::new_v4().to_string())
        .bind(user_id)
        .bind(spent_cents)
        .bind(profit_cents)
        .bind(Utc::now())
        .execute(engine.db().pool())
        .await
        .unwrap();
    }

    /// An update payload mirroring an item's current state.
    pub fn update_from(item: &StockItem) -> StockItemUpdate {
        StockItemUpdate {
            title: item.title.clone(),
            category: item.category.clone(),
            price_cents: item.price_cents,
            cost_cents: item.cost_cents,
            is_new: item.is_new,
            on_sale: item.on_sale,
            original_price_cents: item.original_price_cents,
        }
    }
}
