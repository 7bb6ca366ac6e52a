//! # Reporting Summaries
//!
//! User-facing summary formatting over recorded orders.
//!
//! Currency renders with two decimal places. Report figures carry a
//! fixed 10% surcharge on top of recorded totals; the surcharge is
//! display-only and never part of any stored order total.

use serde::{Deserialize, Serialize};

use emporia_core::{Money, Order, OrderLine, ShopOrder};

/// Display-only surcharge applied in report summaries, in basis points.
pub const REPORT_SURCHARGE_BPS: u32 = 1000;

/// Summary of one online order.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderSummary {
    pub order_id: String,
    pub line_count: usize,
    pub total: String,
    pub total_with_surcharge: String,
}

/// Aggregate summary of a shop's POS orders.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShopSalesSummary {
    pub shop_id: String,
    pub order_count: usize,
    pub gross: String,
    pub gross_with_surcharge: String,
}

/// Formats a monetary value for user-facing output.
pub fn format_currency(amount: Money) -> String {
    amount.to_string()
}

/// Builds the summary of an online order.
pub fn order_summary(order: &Order, lines: &[OrderLine]) -> OrderSummary {
    let total = Money::from_cents(order.total_cents);
    OrderSummary {
        order_id: order.id.clone(),
        line_count: lines.len(),
        total: format_currency(total),
        total_with_surcharge: format_currency(total.apply_surcharge_bps(REPORT_SURCHARGE_BPS)),
    }
}

/// Builds the aggregate summary of a shop's POS orders.
pub fn shop_sales_summary(shop_id: &str, orders: &[ShopOrder]) -> ShopSalesSummary {
    let gross: Money = orders
        .iter()
        .map(|o| Money::from_cents(o.total_cents))
        .sum();

    ShopSalesSummary {
        shop_id: shop_id.to_string(),
        order_count: orders.len(),
        gross: format_currency(gross),
        gross_with_surcharge: format_currency(gross.apply_surcharge_bps(REPORT_SURCHARGE_BPS)),
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
