//! # Shop Service
//!
//! Shop administration: CRUD, proprietor assignment, and local stock
//! views.

use chrono::Utc;
use tracing::info;

use crate::error::{EngineError, EngineResult};
use emporia_core::validation::{validate_email, validate_shop_name};
use emporia_core::{Shop, ShopStock};
use emporia_db::repository::shop::generate_shop_id;
use emporia_db::Database;

/// Input for creating or editing a shop.
#[derive(Debug, Clone)]
pub struct ShopDetails {
    pub name: String,
    pub address: String,
    pub phone: String,
}

/// Service for shop administration.
#[derive(Debug, Clone)]
pub struct ShopService {
    db: Database,
}

impl ShopService {
    /// Creates a new ShopService.
    pub fn new(db: Database) -> Self {
        ShopService { db }
    }

    /// Lists all shops.
    pub async fn list(&self) -> EngineResult<Vec<Shop>> {
        Ok(self.db.shops().list().await?)
    }

    /// Gets one shop, failing with NotFound when missing.
    pub async fn get(&self, id: &str) -> EngineResult<Shop> {
        self.db
            .shops()
            .get_by_id(id)
            .await?
            .ok_or_else(|| EngineError::not_found("Shop", id))
    }

    /// Creates a shop without a proprietor.
    pub async fn create(&self, details: ShopDetails) -> EngineResult<Shop> {
        validate_shop_name(&details.name).map_err(emporia_core::CoreError::from)?;

        let shop = Shop {
            id: generate_shop_id(),
            name: details.name.trim().to_string(),
            address: details.address.trim().to_string(),
            phone: details.phone.trim().to_string(),
            proprietor_email: None,
            proprietor_user_id: None,
            created_at: Utc::now(),
        };

        self.db.shops().insert(&shop).await?;
        info!(id = %shop.id, name = %shop.name, "Shop created");

        Ok(shop)
    }

    /// Edits a shop's details.
    pub async fn update(&self, id: &str, details: ShopDetails) -> EngineResult<Shop> {
        validate_shop_name(&details.name).map_err(emporia_core::CoreError::from)?;

        let mut shop = self.get(id).await?;
        shop.name = details.name.trim().to_string();
        shop.address = details.address.trim().to_string();
        shop.phone = details.phone.trim().to_string();

        self.db.shops().update(&shop).await?;
        Ok(shop)
    }

    /// Deletes a shop; its stock rows cascade, its ledgers remain.
    pub async fn delete(&self, id: &str) -> EngineResult<()> {
        self.db.shops().delete(id).await?;
        info!(id = %id, "Shop deleted");
        Ok(())
    }

    /// Assigns the shop's proprietor; the email/user-id pair moves
    /// together.
    pub async fn assign_proprietor(
        &self,
        shop_id: &str,
        email: &str,
        user_id: &str,
    ) -> EngineResult<Shop> {
        validate_email(email).map_err(emporia_core::CoreError::from)?;

        self.db
            .shops()
            .assign_proprietor(shop_id, email.trim(), user_id)
            .await?;
        info!(shop_id = %shop_id, email = %email, "Proprietor assigned");

        self.get(shop_id).await
    }

    /// Clears the shop's proprietor pair.
    pub async fn clear_proprietor(&self, shop_id: &str) -> EngineResult<Shop> {
        self.db.shops().clear_proprietor(shop_id).await?;
        self.get(shop_id).await
    }

    /// The shop operated by the given proprietor, for deriving the POS
    /// context from an authenticated user.
    pub async fn for_proprietor(&self, user_id: &str) -> EngineResult<Shop> {
        self.db
            .shops()
            .get_by_proprietor(user_id)
            .await?
            .ok_or_else(|| {
                EngineError::new(
                    crate::error::ErrorCode::Unauthorized,
                    "User operates no shop",
                )
            })
    }

    /// A shop's local stock rows with their snapshots.
    pub async fn stock(&self, shop_id: &str) -> EngineResult<Vec<ShopStock>> {
        // Surface NotFound for a missing shop rather than an empty list
        self.get(shop_id).await?;
        Ok(self.db.shops().stock_for_shop(shop_id).await?)
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
    async fn test_create_update_delete() {
        let engine = testutil::engine().await;
        let shops = engine.shops();

        let shop = shops
            .create(ShopDetails {
                name: "Shop A".to_string(),
                address: "12 Market Street".to_string(),
                phone: "5550100".to_string(),
            })
            .await
            .unwrap();

        let updated = shops
            .update(
                &shop.id,
                ShopDetails {
                    name: "Shop A Downtown".to_string(),
                    address: "14 Market Street".to_string(),
                    phone: "5550101".to_string(),
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.name, "Shop A Downtown");

        shops.delete(&shop.id).await.unwrap();
        assert_eq!(shops.get(&shop.id).await.unwrap_err().code, ErrorCode::NotFound);
    }

    #[tokio::test]
    async fn test_proprietor_assignment_round_trip() {
        let engine = testutil::engine().await;
        let shops = engine.shops();
        let shop = testutil::seed_shop(&engine, "Shop A").await;
        let user = testutil::seed_customer(&engine, "pat@example.com", None).await;

        let assigned = shops
            .assign_proprietor(&shop.id, "pat@example.com", &user.id)
            .await
            .unwrap();
        assert!(assigned.has_proprietor());

        let via_user = shops.for_proprietor(&user.id).await.unwrap();
        assert_eq!(via_user.id, shop.id);

        let cleared = shops.clear_proprietor(&shop.id).await.unwrap();
        assert!(!cleared.has_proprietor());
        assert_eq!(
            shops.for_proprietor(&user.id).await.unwrap_err().code,
            ErrorCode::Unauthorized
        );
    }

    #[tokio::test]
    async fn test_stock_listing_includes_snapshot() {
        let engine = testutil::engine().await;
        let item = testutil::seed_item(&engine, "Oak Bookshelf", 5000, 3000, 10).await;
        let shop = testutil::seed_shop(&engine, "Shop A").await;

        engine
            .transfers()
            .transfer(&shop.id, &item.id, 4, None)
            .await
            .unwrap();

        let stock = engine.shops().stock(&shop.id).await.unwrap();
        assert_eq!(stock.len(), 1);
        assert_eq!(stock[0].quantity, 4);
        assert_eq!(stock[0].price_cents, Some(5000));
        assert_eq!(stock[0].source_title.as_deref(), Some("Oak Bookshelf"));
    }
}
