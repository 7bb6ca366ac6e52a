//! # POS Service
//!
//! In-shop point-of-sale: a quantity map against the shop's own stock.
//!
//! ## Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │              sell(shop, {item → qty}, customer?)                        │
//! │                                                                         │
//! │  1. Drop entries with qty <= 0                                          │
//! │  2. Lines the shop does not stock are skipped silently                  │
//! │  3. Price = shop snapshot if set, else owner current price;            │
//! │     cost = owner current cost                                           │
//! │  4. Nothing survived ──► NoItemsSelected                                │
//! │  5. Resolve customer (optionally signing up a guest identity)          │
//! │  6. Discount = customer's CURRENT tier rate, applied to the total      │
//! │  7. Persist in ONE transaction: shop stock decrements + order +        │
//! │     lines (pre-discount prices) + history (post-discount spend)        │
//! │  8. Recompute tier for the resolved customer                           │
//! │  9. Surface low-stock warnings (remaining <= threshold), never block   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{debug, info};

use crate::error::{EngineError, EngineResult};
use crate::services::customer::{CustomerRef, CustomerService};
use emporia_core::{CoreError, Money, ShopOrder, ShopOrderLine, Tier};
use emporia_db::{Database, NewOrderLine, NewShopOrder, PosOutcome};

/// Non-blocking warning that a shop stock row ran low.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LowStockWarning {
    pub stock_item_id: String,
    pub title: String,
    pub remaining: i64,
}

/// Receipt returned from a completed POS sale.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PosReceipt {
    pub order: ShopOrder,
    pub lines: Vec<ShopOrderLine>,
    /// Total before the tier discount.
    pub pre_discount_total_cents: i64,
    /// The resolved customer's tier at sale time, if any.
    pub customer_tier: Option<Tier>,
    /// Low-stock warnings surfaced after success.
    pub warnings: Vec<LowStockWarning>,
}

/// Service for POS sales.
#[derive(Clone)]
pub struct PosService {
    db: Database,
    customers: CustomerService,
    low_stock_threshold: i64,
}

impl PosService {
    /// Creates a new PosService.
    pub fn new(db: Database, customers: CustomerService, low_stock_threshold: i64) -> Self {
        PosService {
            db,
            customers,
            low_stock_threshold,
        }
    }

    /// Processes an in-shop sale against the shop's stock rows.
    pub async fn sell(
        &self,
        shop_id: &str,
        quantities: &HashMap<String, i64>,
        customer: Option<CustomerRef>,
    ) -> EngineResult<PosReceipt> {
        if self.db.shops().get_by_id(shop_id).await?.is_none() {
            return Err(EngineError::not_found("Shop", shop_id));
        }

        let mut lines = Vec::new();
        let mut pre_discount_total = Money::zero();
        let mut profit = Money::zero();

        for (stock_item_id, &quantity) in quantities {
            if quantity <= 0 {
                continue;
            }

            let stock = match self.db.shops().get_stock(shop_id, stock_item_id).await? {
                Some(stock) => stock,
                None => {
                    // The shop does not stock this item; the line is
                    // dropped without failing the sale
                    debug!(
                        shop_id = %shop_id,
                        stock_item_id = %stock_item_id,
                        "Skipping line the shop does not stock"
                    );
                    continue;
                }
            };

            let owner = self
                .db
                .stock()
                .get_by_id(stock_item_id)
                .await?
                .ok_or_else(|| EngineError::not_found("Stock item", stock_item_id))?;

            let unit_price = stock.sale_price(&owner);
            let unit_cost = owner.cost();

            pre_discount_total += unit_price.multiply_quantity(quantity);
            profit += (unit_price - unit_cost).multiply_quantity(quantity);

            lines.push(NewOrderLine {
                stock_item_id: stock_item_id.clone(),
                title: owner.title.clone(),
                unit_price_cents: unit_price.cents(),
                quantity,
            });
        }

        if lines.is_empty() {
            return Err(CoreError::NoItemsSelected.into());
        }

        let customer = match customer {
            Some(customer_ref) => self.customers.resolve_or_signup(&customer_ref).await?,
            None => None,
        };

        // Discount comes from the tier the customer holds walking in;
        // this sale's own profit only counts toward the next one
        let customer_tier = customer.as_ref().map(|u| u.tier);
        let discount_bps = customer_tier.map(|t| t.discount_bps()).unwrap_or(0);
        let total = pre_discount_total.apply_discount_bps(discount_bps);

        debug!(
            shop_id = %shop_id,
            lines = lines.len(),
            pre_discount_cents = pre_discount_total.cents(),
            discount_bps = discount_bps,
            "Submitting POS sale"
        );

        let new = NewShopOrder {
            shop_id: shop_id.to_string(),
            customer_user_id: customer.as_ref().map(|u| u.id.clone()),
            lines,
            total_cents: total.cents(),
            discount_bps: discount_bps as i64,
            profit_cents: profit.cents(),
        };

        let (order, line_results) = match self.db.orders().create_pos_sale(&new).await? {
            PosOutcome::Completed { order, lines } => (order, lines),
            PosOutcome::ShortStock {
                title,
                available,
                requested,
            } => {
                return Err(EngineError::insufficient_stock(&title, available, requested));
            }
        };

        if let Some(customer) = &customer {
            self.customers.recompute_tier(&customer.id).await?;
        }

        let warnings: Vec<LowStockWarning> = line_results
            .iter()
            .filter(|r| r.remaining_quantity <= self.low_stock_threshold)
            .map(|r| LowStockWarning {
                stock_item_id: r.stock_item_id.clone(),
                title: r.title.clone(),
                remaining: r.remaining_quantity,
            })
            .collect();

        let lines = self.db.orders().shop_order_lines(&order.id).await?;

        info!(
            shop_order_id = %order.id,
            shop_id = %shop_id,
            total_cents = order.total_cents,
            warnings = warnings.len(),
            "POS sale completed"
        );

        Ok(PosReceipt {
            order,
            lines,
            pre_discount_total_cents: pre_discount_total.cents(),
            customer_tier,
            warnings,
        })
    }

    /// A shop's POS orders, newest first.
    pub async fn orders_for_shop(&self, shop_id: &str) -> EngineResult<Vec<ShopOrder>> {
        Ok(self.db.orders().shop_orders_for_shop(shop_id).await?)
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

    fn quantities(entries: &[(&str, i64)]) -> HashMap<String, i64> {
        entries
            .iter()
            .map(|(id, qty)| (id.to_string(), *qty))
            .collect()
    }

    /// The end-to-end scenario: transfer 4 of 10, sell 3 at full price,
    /// land on 1 remaining with a low-stock warning and 60.00 profit.
    #[tokio::test]
    async fn test_transfer_then_sale_scenario() {
        let engine = testutil::engine().await;
        let item = testutil::seed_item(&engine, "Oak Bookshelf", 5000, 3000, 10).await;
        let shop = testutil::seed_shop(&engine, "Shop A").await;

        engine
            .transfers()
            .transfer(&shop.id, &item.id, 4, None)
            .await
            .unwrap();
        assert_eq!(engine.inventory().get(&item.id).await.unwrap().quantity, 6);

        let receipt = engine
            .pos()
            .sell(&shop.id, &quantities(&[(&item.id, 3)]), None)
            .await
            .unwrap();

        // Full price: no customer, no discount
        assert_eq!(receipt.order.total_cents, 15000);
        assert_eq!(receipt.pre_discount_total_cents, 15000);
        assert_eq!(receipt.order.discount_bps, 0);

        // Shop stock dropped to 1 and fired the low-stock warning
        let stock = engine
            .db()
            .shops()
            .get_stock(&shop.id, &item.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stock.quantity, 1);
        assert_eq!(receipt.warnings.len(), 1);
        assert_eq!(receipt.warnings[0].remaining, 1);

        // Owner ledger untouched by the POS sale
        assert_eq!(engine.inventory().get(&item.id).await.unwrap().quantity, 6);
    }

    #[tokio::test]
    async fn test_silver_customer_gets_five_percent() {
        let engine = testutil::engine().await;
        let item = testutil::seed_item(&engine, "Oak Bookshelf", 5000, 3000, 10).await;
        let shop = testutil::seed_shop(&engine, "Shop A").await;
        let user = testutil::seed_customer(&engine, "sam@example.com", None).await;

        // Cumulative profit 2100.00 puts the customer in Silver
        testutil::seed_history(&engine, &user.id, 500_000, 210_000).await;
        engine.customers().recompute_tier(&user.id).await.unwrap();

        engine
            .transfers()
            .transfer(&shop.id, &item.id, 5, None)
            .await
            .unwrap();

        let receipt = engine
            .pos()
            .sell(
                &shop.id,
                &quantities(&[(&item.id, 2)]),
                Some(CustomerRef {
                    email: Some("sam@example.com".to_string()),
                    phone: None,
                    signup_if_missing: false,
                }),
            )
            .await
            .unwrap();

        assert_eq!(receipt.customer_tier, Some(Tier::Silver));
        assert_eq!(receipt.pre_discount_total_cents, 10000);
        // total == preDiscount * (1 - 5%)
        assert_eq!(receipt.order.total_cents, 9500);
        assert_eq!(receipt.order.discount_bps, 500);

        // Line prices stay pre-discount for profit accuracy
        assert_eq!(receipt.lines[0].unit_price_cents, 5000);

        // History records post-discount spend and pre-discount profit
        let records = engine.db().history().list_for_user(&user.id).await.unwrap();
        let sale = records
            .iter()
            .find(|r| r.shop_order_id.is_some())
            .expect("POS sale recorded");
        assert_eq!(sale.total_spent_cents, 9500);
        assert_eq!(sale.total_profit_cents, 4000);
    }

    #[tokio::test]
    async fn test_shop_price_override_beats_owner_price() {
        let engine = testutil::engine().await;
        let item = testutil::seed_item(&engine, "Oak Bookshelf", 5000, 3000, 10).await;
        let shop = testutil::seed_shop(&engine, "Shop A").await;

        engine
            .transfers()
            .transfer(&shop.id, &item.id, 5, None)
            .await
            .unwrap();

        // Owner re-prices after the transfer; the shop keeps its snapshot
        let mut update = testutil::update_from(&item);
        update.price_cents = 9000;
        engine.inventory().update(&item.id, update).await.unwrap();

        let receipt = engine
            .pos()
            .sell(&shop.id, &quantities(&[(&item.id, 1)]), None)
            .await
            .unwrap();

        // Sold at the transfer-time snapshot, not the new owner price
        assert_eq!(receipt.order.total_cents, 5000);
    }

    #[tokio::test]
    async fn test_unstocked_and_nonpositive_lines_are_skipped() {
        let engine = testutil::engine().await;
        let stocked = testutil::seed_item(&engine, "Oak Bookshelf", 5000, 3000, 10).await;
        let unstocked = testutil::seed_item(&engine, "Walnut Desk", 8000, 5000, 10).await;
        let zeroed = testutil::seed_item(&engine, "Brass Lamp", 2000, 1000, 10).await;
        let shop = testutil::seed_shop(&engine, "Shop A").await;

        engine
            .transfers()
            .transfer(&shop.id, &stocked.id, 5, None)
            .await
            .unwrap();
        engine
            .transfers()
            .transfer(&shop.id, &zeroed.id, 5, None)
            .await
            .unwrap();

        let receipt = engine
            .pos()
            .sell(
                &shop.id,
                &quantities(&[(&stocked.id, 1), (&unstocked.id, 2), (&zeroed.id, 0)]),
                None,
            )
            .await
            .unwrap();

        // Only the stocked, positive line survived
        assert_eq!(receipt.lines.len(), 1);
        assert_eq!(receipt.lines[0].stock_item_id, stocked.id);

        // The unstocked item's owner quantity is untouched
        assert_eq!(
            engine.inventory().get(&unstocked.id).await.unwrap().quantity,
            10
        );
    }

    #[tokio::test]
    async fn test_no_surviving_lines_rejects_sale() {
        let engine = testutil::engine().await;
        let unstocked = testutil::seed_item(&engine, "Walnut Desk", 8000, 5000, 10).await;
        let shop = testutil::seed_shop(&engine, "Shop A").await;

        let err = engine
            .pos()
            .sell(
                &shop.id,
                &quantities(&[(&unstocked.id, 2), ("missing", 1)]),
                None,
            )
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::NoItemsSelected);

        let err = engine
            .pos()
            .sell(&shop.id, &HashMap::new(), None)
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::NoItemsSelected);
    }

    #[tokio::test]
    async fn test_guest_signup_during_sale() {
        let engine = testutil::engine().await;
        let item = testutil::seed_item(&engine, "Oak Bookshelf", 5000, 3000, 10).await;
        let shop = testutil::seed_shop(&engine, "Shop A").await;

        engine
            .transfers()
            .transfer(&shop.id, &item.id, 5, None)
            .await
            .unwrap();

        let receipt = engine
            .pos()
            .sell(
                &shop.id,
                &quantities(&[(&item.id, 1)]),
                Some(CustomerRef {
                    email: None,
                    phone: Some("5550199".to_string()),
                    signup_if_missing: true,
                }),
            )
            .await
            .unwrap();

        // Fresh guest starts Bronze: no discount on this first sale
        assert_eq!(receipt.customer_tier, Some(Tier::Bronze));
        assert_eq!(receipt.order.total_cents, 5000);

        let guest = engine
            .customers()
            .resolve(Some("5550199@guest.local"), None)
            .await
            .unwrap()
            .expect("guest identity created");
        let records = engine.db().history().list_for_user(&guest.id).await.unwrap();
        assert_eq!(records.len(), 1);
    }

    #[tokio::test]
    async fn test_short_shop_stock_aborts_sale() {
        let engine = testutil::engine().await;
        let item = testutil::seed_item(&engine, "Oak Bookshelf", 5000, 3000, 10).await;
        let shop = testutil::seed_shop(&engine, "Shop A").await;

        engine
            .transfers()
            .transfer(&shop.id, &item.id, 2, None)
            .await
            .unwrap();

        let err = engine
            .pos()
            .sell(&shop.id, &quantities(&[(&item.id, 3)]), None)
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::InsufficientStock);

        let stock = engine
            .db()
            .shops()
            .get_stock(&shop.id, &item.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stock.quantity, 2);
    }

    #[tokio::test]
    async fn test_missing_shop_is_not_found() {
        let engine = testutil::engine().await;
        let err = engine
            .pos()
            .sell("missing", &HashMap::new(), None)
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::NotFound);
    }
}
