//! # Tier Module
//!
//! Loyalty tier derivation from cumulative profit.
//!
//! A customer's tier is a pure step function of the profit their purchase
//! history has contributed, evaluated high-to-low with no gap and no
//! overlap. Recomputation runs after every completed sale with a
//! resolvable customer and is idempotent: unchanged history yields the
//! same tier.
//!
//! ```text
//! cumulative profit (cents)      tier        discount
//! ─────────────────────────      ────        ────────
//! >= 1_000_000 (10 000.00)       Platinum    15%
//! >=   500_000 ( 5 000.00)       Gold        10%
//! >=   200_000 ( 2 000.00)       Silver       5%
//! otherwise                      Bronze       0%
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::money::Money;

// =============================================================================
// Thresholds
// =============================================================================

/// Cumulative profit (cents) required for Silver.
pub const SILVER_THRESHOLD_CENTS: i64 = 200_000;

/// Cumulative profit (cents) required for Gold.
pub const GOLD_THRESHOLD_CENTS: i64 = 500_000;

/// Cumulative profit (cents) required for Platinum.
pub const PLATINUM_THRESHOLD_CENTS: i64 = 1_000_000;

// =============================================================================
// Tier
// =============================================================================

/// Loyalty tier derived from cumulative profit.
///
/// Stored as an explicit column on the user row and replaced by a single
/// assignment on recomputation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    Bronze,
    Silver,
    Gold,
    Platinum,
}

impl Tier {
    /// Derives the tier from cumulative profit.
    ///
    /// Thresholds are evaluated high-to-low; the boundaries themselves
    /// belong to the higher tier (profit of exactly 2 000.00 is Silver).
    ///
    /// ## Example
    /// ```rust
    /// use emporia_core::money::Money;
    /// use emporia_core::tier::Tier;
    ///
    /// assert_eq!(Tier::from_profit(Money::from_cents(199_999)), Tier::Bronze);
    /// assert_eq!(Tier::from_profit(Money::from_cents(200_000)), Tier::Silver);
    /// ```
    pub fn from_profit(profit: Money) -> Tier {
        let cents = profit.cents();
        if cents >= PLATINUM_THRESHOLD_CENTS {
            Tier::Platinum
        } else if cents >= GOLD_THRESHOLD_CENTS {
            Tier::Gold
        } else if cents >= SILVER_THRESHOLD_CENTS {
            Tier::Silver
        } else {
            Tier::Bronze
        }
    }

    /// The POS discount rate for this tier, in basis points.
    pub const fn discount_bps(&self) -> u32 {
        match self {
            Tier::Bronze => 0,
            Tier::Silver => 500,
            Tier::Gold => 1000,
            Tier::Platinum => 1500,
        }
    }

    /// Canonical lowercase name, matching the stored column value.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Tier::Bronze => "bronze",
            Tier::Silver => "silver",
            Tier::Gold => "gold",
            Tier::Platinum => "platinum",
        }
    }
}

impl Default for Tier {
    fn default() -> Self {
        Tier::Bronze
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Tier {
    type Err = ();

    /// Case-insensitive tier name parsing.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "bronze" => Ok(Tier::Bronze),
            "silver" => Ok(Tier::Silver),
            "gold" => Ok(Tier::Gold),
            "platinum" => Ok(Tier::Platinum),
            _ => Err(()),
        }
    }
}

// =============================================================================
// Broadcast Target
// =============================================================================

/// Audience selector for messaging fan-out.
///
/// Parsing is case-insensitive and unrecognized input falls back to
/// `All`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BroadcastTarget {
    /// Every non-administrative user.
    All,
    /// Only users holding the base customer role.
    CustomersOnly,
    /// Users whose current tier equals the given tier.
    Tier(Tier),
}

impl BroadcastTarget {
    /// Parses a raw selector string.
    ///
    /// ## Example
    /// ```rust
    /// use emporia_core::tier::{BroadcastTarget, Tier};
    ///
    /// assert_eq!(BroadcastTarget::parse("GOLD"), BroadcastTarget::Tier(Tier::Gold));
    /// assert_eq!(BroadcastTarget::parse("customers"), BroadcastTarget::CustomersOnly);
    /// assert_eq!(BroadcastTarget::parse("whatever"), BroadcastTarget::All);
    /// ```
    pub fn parse(raw: &str) -> BroadcastTarget {
        match raw.trim().to_ascii_lowercase().as_str() {
            "all" => BroadcastTarget::All,
            "customers" | "customers_only" | "users" | "users_only" => {
                BroadcastTarget::CustomersOnly
            }
            other => match Tier::from_str(other) {
                Ok(tier) => BroadcastTarget::Tier(tier),
                // Unrecognized selectors widen to everyone
                Err(()) => BroadcastTarget::All,
            },
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tier_step_function_boundaries() {
        assert_eq!(Tier::from_profit(Money::from_cents(0)), Tier::Bronze);
        assert_eq!(Tier::from_profit(Money::from_cents(199_999)), Tier::Bronze);
        assert_eq!(Tier::from_profit(Money::from_cents(200_000)), Tier::Silver);
        assert_eq!(Tier::from_profit(Money::from_cents(499_999)), Tier::Silver);
        assert_eq!(Tier::from_profit(Money::from_cents(500_000)), Tier::Gold);
        assert_eq!(Tier::from_profit(Money::from_cents(999_999)), Tier::Gold);
        assert_eq!(
            Tier::from_profit(Money::from_cents(1_000_000)),
            Tier::Platinum
        );
        assert_eq!(
            Tier::from_profit(Money::from_cents(1_000_001)),
            Tier::Platinum
        );
    }

    #[test]
    fn test_tier_is_monotonic() {
        let mut last = Tier::Bronze;
        for cents in (0..1_200_000).step_by(50_000) {
            let tier = Tier::from_profit(Money::from_cents(cents));
            assert!(tier >= last, "tier regressed at {} cents", cents);
            last = tier;
        }
    }

    #[test]
    fn test_negative_profit_is_bronze() {
        assert_eq!(Tier::from_profit(Money::from_cents(-5000)), Tier::Bronze);
    }

    #[test]
    fn test_discount_rates() {
        assert_eq!(Tier::Bronze.discount_bps(), 0);
        assert_eq!(Tier::Silver.discount_bps(), 500);
        assert_eq!(Tier::Gold.discount_bps(), 1000);
        assert_eq!(Tier::Platinum.discount_bps(), 1500);
    }

    #[test]
    fn test_tier_from_str_case_insensitive() {
        assert_eq!("Silver".parse::<Tier>(), Ok(Tier::Silver));
        assert_eq!("PLATINUM".parse::<Tier>(), Ok(Tier::Platinum));
        assert_eq!(" gold ".parse::<Tier>(), Ok(Tier::Gold));
        assert!("diamond".parse::<Tier>().is_err());
    }

    #[test]
    fn test_broadcast_target_parse() {
        assert_eq!(BroadcastTarget::parse("all"), BroadcastTarget::All);
        assert_eq!(
            BroadcastTarget::parse("Users_Only"),
            BroadcastTarget::CustomersOnly
        );
        assert_eq!(
            BroadcastTarget::parse("bronze"),
            BroadcastTarget::Tier(Tier::Bronze)
        );
        // Unrecognized input falls back to All
        assert_eq!(BroadcastTarget::parse("vip"), BroadcastTarget::All);
        assert_eq!(BroadcastTarget::parse(""), BroadcastTarget::All);
    }
}
