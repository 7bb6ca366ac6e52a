//! # Inventory Service
//!
//! Owner-side management of the master inventory: create, edit, delete,
//! browse, and customer ratings.
//!
//! Quantity is intentionally absent from the edit path; it moves only
//! through transfers and checkout.

use chrono::Utc;
use tracing::info;

use crate::error::{EngineError, EngineResult};
use emporia_core::validation::{validate_price_cents, validate_rating, validate_title};
use emporia_core::StockItem;
use emporia_db::repository::stock::generate_stock_item_id;
use emporia_db::Database;

/// Input for creating a stock item.
#[derive(Debug, Clone)]
pub struct NewStockItem {
    pub title: String,
    pub category: String,
    pub price_cents: i64,
    pub cost_cents: i64,
    /// Initial owner quantity.
    pub quantity: i64,
    pub is_new: bool,
    pub on_sale: bool,
    pub original_price_cents: Option<i64>,
}

/// Input for editing a stock item's metadata and pricing.
#[derive(Debug, Clone)]
pub struct StockItemUpdate {
    pub title: String,
    pub category: String,
    pub price_cents: i64,
    pub cost_cents: i64,
    pub is_new: bool,
    pub on_sale: bool,
    pub original_price_cents: Option<i64>,
}

/// Service for owner inventory management.
#[derive(Debug, Clone)]
pub struct InventoryService {
    db: Database,
}

impl InventoryService {
    /// Creates a new InventoryService.
    pub fn new(db: Database) -> Self {
        InventoryService { db }
    }

    /// Lists the whole inventory.
    pub async fn list(&self) -> EngineResult<Vec<StockItem>> {
        Ok(self.db.stock().list().await?)
    }

    /// Lists one category.
    pub async fn list_by_category(&self, category: &str) -> EngineResult<Vec<StockItem>> {
        Ok(self.db.stock().list_by_category(category).await?)
    }

    /// Gets one item, failing with NotFound when missing.
    pub async fn get(&self, id: &str) -> EngineResult<StockItem> {
        self.db
            .stock()
            .get_by_id(id)
            .await?
            .ok_or_else(|| EngineError::not_found("Stock item", id))
    }

    /// Creates a stock item.
    pub async fn create(&self, input: NewStockItem) -> EngineResult<StockItem> {
        validate_title(&input.title).map_err(emporia_core::CoreError::from)?;
        validate_price_cents(input.price_cents).map_err(emporia_core::CoreError::from)?;
        validate_price_cents(input.cost_cents).map_err(emporia_core::CoreError::from)?;
        if input.quantity < 0 {
            return Err(emporia_core::CoreError::InvalidQuantity(input.quantity).into());
        }

        let now = Utc::now();
        let item = StockItem {
            id: generate_stock_item_id(),
            title: input.title.trim().to_string(),
            category: input.category.trim().to_string(),
            price_cents: input.price_cents,
            cost_cents: input.cost_cents,
            quantity: input.quantity,
            is_new: input.is_new,
            on_sale: input.on_sale,
            original_price_cents: input.original_price_cents,
            rating_sum: 0,
            rating_count: 0,
            created_at: now,
            updated_at: now,
        };

        self.db.stock().insert(&item).await?;
        info!(id = %item.id, title = %item.title, "Stock item created");

        Ok(item)
    }

    /// Edits an item's metadata and pricing. Price and cost are
    /// independently mutable; quantity stays untouched.
    pub async fn update(&self, id: &str, input: StockItemUpdate) -> EngineResult<StockItem> {
        validate_title(&input.title).map_err(emporia_core::CoreError::from)?;
        validate_price_cents(input.price_cents).map_err(emporia_core::CoreError::from)?;
        validate_price_cents(input.cost_cents).map_err(emporia_core::CoreError::from)?;

        let mut item = self.get(id).await?;
        item.title = input.title.trim().to_string();
        item.category = input.category.trim().to_string();
        item.price_cents = input.price_cents;
        item.cost_cents = input.cost_cents;
        item.is_new = input.is_new;
        item.on_sale = input.on_sale;
        item.original_price_cents = input.original_price_cents;

        self.db.stock().update(&item).await?;
        info!(id = %item.id, "Stock item updated");

        Ok(item)
    }

    /// Deletes an item; shop stock rows cascade with it.
    pub async fn delete(&self, id: &str) -> EngineResult<()> {
        self.db.stock().delete(id).await?;
        info!(id = %id, "Stock item deleted");
        Ok(())
    }

    /// Records a 1-5 star rating against the item's aggregates.
    pub async fn rate(&self, id: &str, stars: i64) -> EngineResult<()> {
        validate_rating(stars).map_err(emporia_core::CoreError::from)?;
        self.db.stock().add_rating(id, stars).await?;
        Ok(())
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
    async fn test_create_and_get() {
        let engine = testutil::engine().await;
        let inventory = engine.inventory();

        let item = inventory
            .create(NewStockItem {
                title: "Oak Bookshelf".to_string(),
                category: "furniture".to_string(),
                price_cents: 5000,
                cost_cents: 3000,
                quantity: 10,
                is_new: true,
                on_sale: false,
                original_price_cents: None,
            })
            .await
            .unwrap();

        let fetched = inventory.get(&item.id).await.unwrap();
        assert_eq!(fetched.title, "Oak Bookshelf");
        assert_eq!(fetched.quantity, 10);

        let err = inventory.get("missing").await.unwrap_err();
        assert_eq!(err.code, ErrorCode::NotFound);
    }

    #[tokio::test]
    async fn test_create_rejects_bad_input() {
        let engine = testutil::engine().await;
        let inventory = engine.inventory();

        let err = inventory
            .create(NewStockItem {
                title: "".to_string(),
                category: "furniture".to_string(),
                price_cents: 5000,
                cost_cents: 3000,
                quantity: 1,
                is_new: false,
                on_sale: false,
                original_price_cents: None,
            })
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);

        let err = inventory
            .create(NewStockItem {
                title: "Lamp".to_string(),
                category: "lighting".to_string(),
                price_cents: -5,
                cost_cents: 0,
                quantity: 1,
                is_new: false,
                on_sale: false,
                original_price_cents: None,
            })
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);
    }

    #[tokio::test]
    async fn test_update_prices_independently() {
        let engine = testutil::engine().await;
        let inventory = engine.inventory();
        let item = testutil::seed_item(&engine, "Desk", 8000, 5000, 3).await;

        let updated = inventory
            .update(
                &item.id,
                StockItemUpdate {
                    title: "Desk".to_string(),
                    category: "furniture".to_string(),
                    price_cents: 9000,
                    cost_cents: 5000,
                    is_new: false,
                    on_sale: true,
                    original_price_cents: Some(8000),
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.price_cents, 9000);
        assert_eq!(updated.cost_cents, 5000);
        assert!(updated.on_sale);
        // Quantity untouched by edits
        assert_eq!(inventory.get(&item.id).await.unwrap().quantity, 3);
    }

    #[tokio::test]
    async fn test_rate_validates_stars() {
        let engine = testutil::engine().await;
        let inventory = engine.inventory();
        let item = testutil::seed_item(&engine, "Desk", 8000, 5000, 3).await;

        inventory.rate(&item.id, 4).await.unwrap();
        inventory.rate(&item.id, 5).await.unwrap();

        let fetched = inventory.get(&item.id).await.unwrap();
        assert_eq!(fetched.average_rating(), Some(4.5));

        let err = inventory.rate(&item.id, 6).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);
    }
}
