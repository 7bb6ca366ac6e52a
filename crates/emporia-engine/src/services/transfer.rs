//! # Transfer Service
//!
//! Owner→shop stock movements.
//!
//! Two entry points share one implementation: `transfer` is the
//! owner-initiated path (a fresh shop stock row copies the owner
//! snapshot, top-ups keep it), `restock` is the proprietor-initiated
//! path that re-inherits current owner pricing even on top-ups. Both are
//! all-or-nothing; a failed precondition leaves every stock row
//! unchanged.

use tracing::info;

use crate::error::{EngineError, EngineResult};
use emporia_core::{CoreError, ShopTransfer};
use emporia_db::{Database, TransferOutcome};

/// Service for stock transfers.
#[derive(Debug, Clone)]
pub struct TransferService {
    db: Database,
}

impl TransferService {
    /// Creates a new TransferService.
    pub fn new(db: Database) -> Self {
        TransferService { db }
    }

    /// Owner-initiated transfer. Existing shop snapshots are preserved.
    pub async fn transfer(
        &self,
        shop_id: &str,
        stock_item_id: &str,
        quantity: i64,
        performed_by: Option<&str>,
    ) -> EngineResult<ShopTransfer> {
        self.execute(shop_id, stock_item_id, quantity, performed_by, false)
            .await
    }

    /// Proprietor-initiated restock. The shop's price/cost/source
    /// snapshot is refreshed from the current owner record, including on
    /// top-ups.
    pub async fn restock(
        &self,
        shop_id: &str,
        stock_item_id: &str,
        quantity: i64,
        performed_by: Option<&str>,
    ) -> EngineResult<ShopTransfer> {
        self.execute(shop_id, stock_item_id, quantity, performed_by, true)
            .await
    }

    async fn execute(
        &self,
        shop_id: &str,
        stock_item_id: &str,
        quantity: i64,
        performed_by: Option<&str>,
        refresh_snapshot: bool,
    ) -> EngineResult<ShopTransfer> {
        if quantity <= 0 {
            return Err(CoreError::InvalidQuantity(quantity).into());
        }

        let outcome = self
            .db
            .shops()
            .transfer(shop_id, stock_item_id, quantity, performed_by, refresh_snapshot)
            .await?;

        match outcome {
            TransferOutcome::Completed(transfer) => {
                info!(
                    shop_id = %shop_id,
                    stock_item_id = %stock_item_id,
                    quantity = %quantity,
                    "Stock transferred"
                );
                Ok(transfer)
            }
            TransferOutcome::ShortStock {
                title,
                available,
                requested,
            } => Err(EngineError::insufficient_stock(&title, available, requested)),
        }
    }

    /// A shop's transfer ledger, newest first.
    pub async fn history(&self, shop_id: &str) -> EngineResult<Vec<ShopTransfer>> {
        Ok(self.db.shops().list_transfers(shop_id).await?)
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
    async fn test_transfer_moves_quantity() {
        let engine = testutil::engine().await;
        let item = testutil::seed_item(&engine, "Oak Bookshelf", 5000, 3000, 10).await;
        let shop = testutil::seed_shop(&engine, "Shop A").await;

        engine
            .transfers()
            .transfer(&shop.id, &item.id, 4, Some("owner-1"))
            .await
            .unwrap();

        let owner = engine.inventory().get(&item.id).await.unwrap();
        assert_eq!(owner.quantity, 6);

        let history = engine.transfers().history(&shop.id).await.unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].quantity, 4);
    }

    #[tokio::test]
    async fn test_invalid_quantity_rejected_before_any_read() {
        let engine = testutil::engine().await;
        let item = testutil::seed_item(&engine, "Oak Bookshelf", 5000, 3000, 10).await;
        let shop = testutil::seed_shop(&engine, "Shop A").await;

        for qty in [0, -3] {
            let err = engine
                .transfers()
                .transfer(&shop.id, &item.id, qty, None)
                .await
                .unwrap_err();
            assert_eq!(err.code, ErrorCode::ValidationError);
        }

        let owner = engine.inventory().get(&item.id).await.unwrap();
        assert_eq!(owner.quantity, 10);
    }

    #[tokio::test]
    async fn test_short_stock_is_reported_with_context() {
        let engine = testutil::engine().await;
        let item = testutil::seed_item(&engine, "Oak Bookshelf", 5000, 3000, 2).await;
        let shop = testutil::seed_shop(&engine, "Shop A").await;

        let err = engine
            .transfers()
            .transfer(&shop.id, &item.id, 3, None)
            .await
            .unwrap_err();

        assert_eq!(err.code, ErrorCode::InsufficientStock);
        assert!(err.message.contains("Oak Bookshelf"));
        assert!(err.message.contains("available 2"));
    }

    #[tokio::test]
    async fn test_missing_item_and_shop() {
        let engine = testutil::engine().await;
        let item = testutil::seed_item(&engine, "Oak Bookshelf", 5000, 3000, 10).await;
        let shop = testutil::seed_shop(&engine, "Shop A").await;

        let err = engine
            .transfers()
            .transfer(&shop.id, "missing", 1, None)
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::NotFound);

        let err = engine
            .transfers()
            .transfer("missing", &item.id, 1, None)
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::NotFound);
    }
}
