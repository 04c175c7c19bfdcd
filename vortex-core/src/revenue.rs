//! Revenue Distribution
//!
//! Splits a marketplace sale into the seller's proceeds and the 15%
//! marketplace commission, then breaks the commission down:
//!
//! ```text
//! sale ─┬─ seller (85%)
//!       └─ commission (15%) ─┬─ creator fund (5%)
//!                            ├─ VORTEX Inc (7%)
//!                            └─ ecosystem (3%) ─┬─ grants (1%)
//!                                               ├─ exhibitions (1%)
//!                                               └─ artist support (1%)
//! ```
//!
//! All percentages are of the sale price. Amounts are rounded per bucket;
//! the last bucket of each level takes the remainder so every level sums
//! exactly to its parent.

use crate::error::{VortexError, VortexResult};
use crate::royalty::round_payout;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Allocation table (percent of sale price)
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RevenueAllocation {
    pub marketplace_commission: Decimal,
    pub creator: Decimal,
    pub vortex_inc: Decimal,
    pub ecosystem: Decimal,
    pub grants: Decimal,
    pub exhibitions: Decimal,
    pub artist_support: Decimal,
}

impl Default for RevenueAllocation {
    fn default() -> Self {
        Self {
            marketplace_commission: Decimal::new(15, 0),
            creator: Decimal::new(5, 0),
            vortex_inc: Decimal::new(7, 0),
            ecosystem: Decimal::new(3, 0),
            grants: Decimal::ONE,
            exhibitions: Decimal::ONE,
            artist_support: Decimal::ONE,
        }
    }
}

impl RevenueAllocation {
    /// Commission parts must add up to the commission, ecosystem parts to the ecosystem share
    pub fn validate(&self) -> VortexResult<()> {
        if self.creator + self.vortex_inc + self.ecosystem != self.marketplace_commission {
            return Err(VortexError::invalid(
                "revenue_allocation",
                "commission parts do not sum to the marketplace commission",
            ));
        }
        if self.grants + self.exhibitions + self.artist_support != self.ecosystem {
            return Err(VortexError::invalid(
                "revenue_allocation",
                "ecosystem parts do not sum to the ecosystem share",
            ));
        }
        if self.marketplace_commission > Decimal::ONE_HUNDRED {
            return Err(VortexError::invalid(
                "revenue_allocation",
                "commission exceeds 100%",
            ));
        }
        Ok(())
    }
}

/// Result of splitting one sale
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RevenueBreakdown {
    pub sale_price: Decimal,
    pub seller_amount: Decimal,
    pub marketplace_commission: Decimal,
    pub creator_amount: Decimal,
    pub vortex_inc_amount: Decimal,
    pub ecosystem_amount: Decimal,
    pub grants_amount: Decimal,
    pub exhibitions_amount: Decimal,
    pub artist_support_amount: Decimal,
}

/// Revenue split engine
#[derive(Clone, Debug, Default)]
pub struct RevenueSplitter {
    allocation: RevenueAllocation,
}

impl RevenueSplitter {
    /// Create with a validated allocation table
    pub fn new(allocation: RevenueAllocation) -> VortexResult<Self> {
        allocation.validate()?;
        Ok(Self { allocation })
    }

    pub fn allocation(&self) -> &RevenueAllocation {
        &self.allocation
    }

    fn pct(&self, sale_price: Decimal, pct: Decimal) -> Decimal {
        round_payout(sale_price * pct / Decimal::ONE_HUNDRED)
    }

    /// Split a sale
    pub fn split(&self, sale_price: Decimal) -> VortexResult<RevenueBreakdown> {
        if sale_price < Decimal::ZERO {
            return Err(VortexError::InvalidAmount {
                reason: "sale price must not be negative".to_string(),
            });
        }
        let a = &self.allocation;

        let commission = self.pct(sale_price, a.marketplace_commission);
        let creator = self.pct(sale_price, a.creator);
        let vortex_inc = self.pct(sale_price, a.vortex_inc);
        // Ecosystem absorbs rounding so the commission parts match exactly
        let ecosystem = commission - creator - vortex_inc;

        let grants = self.pct(sale_price, a.grants);
        let exhibitions = self.pct(sale_price, a.exhibitions);
        let artist_support = ecosystem - grants - exhibitions;

        Ok(RevenueBreakdown {
            sale_price,
            seller_amount: sale_price - commission,
            marketplace_commission: commission,
            creator_amount: creator,
            vortex_inc_amount: vortex_inc,
            ecosystem_amount: ecosystem,
            grants_amount: grants,
            exhibitions_amount: exhibitions,
            artist_support_amount: artist_support,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_allocation_is_valid() {
        assert!(RevenueAllocation::default().validate().is_ok());
    }

    #[test]
    fn test_invalid_allocation_rejected() {
        let allocation = RevenueAllocation {
            vortex_inc: Decimal::new(8, 0),
            ..Default::default()
        };
        assert!(RevenueSplitter::new(allocation).is_err());
    }

    #[test]
    fn test_split_round_price() {
        let splitter = RevenueSplitter::default();
        let b = splitter.split(Decimal::new(1000, 0)).unwrap();
        assert_eq!(b.seller_amount, Decimal::new(850, 0));
        assert_eq!(b.marketplace_commission, Decimal::new(150, 0));
        assert_eq!(b.creator_amount, Decimal::new(50, 0));
        assert_eq!(b.vortex_inc_amount, Decimal::new(70, 0));
        assert_eq!(b.ecosystem_amount, Decimal::new(30, 0));
        assert_eq!(b.grants_amount, Decimal::new(10, 0));
        assert_eq!(b.exhibitions_amount, Decimal::new(10, 0));
        assert_eq!(b.artist_support_amount, Decimal::new(10, 0));
    }

    #[test]
    fn test_split_levels_sum_exactly() {
        let splitter = RevenueSplitter::default();
        for raw in [1i64, 7, 333, 1_000_001, 123_456_789] {
            let price = Decimal::new(raw, 7);
            let b = splitter.split(price).unwrap();
            assert_eq!(b.seller_amount + b.marketplace_commission, b.sale_price);
            assert_eq!(
                b.creator_amount + b.vortex_inc_amount + b.ecosystem_amount,
                b.marketplace_commission
            );
            assert_eq!(
                b.grants_amount + b.exhibitions_amount + b.artist_support_amount,
                b.ecosystem_amount
            );
        }
    }

    #[test]
    fn test_negative_sale_rejected() {
        let err = RevenueSplitter::default().split(Decimal::new(-1, 0)).unwrap_err();
        assert_eq!(err.code(), "invalid_amount");
    }
}
