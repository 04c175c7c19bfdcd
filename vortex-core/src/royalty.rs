//! Royalty Calculation
//!
//! Royalty list assembly at mint time and per-sale payout math.

use crate::error::{VortexError, VortexResult};
use crate::types::{NftMetadata, RoyaltyDistribution, RoyaltyEntry};
use rust_decimal::{Decimal, RoundingStrategy};

/// Platform royalty share (percent)
pub const PLATFORM_ROYALTY_PERCENT: Decimal = Decimal::from_parts(3, 0, 0, false, 0);

/// Decimal places for payout amounts
pub const ROYALTY_PRECISION: u32 = 6;

/// Royalty percentage policy.
///
/// Percentages are accepted without a total cap unless `max_total_percentage`
/// is set.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RoyaltyPolicy {
    pub max_total_percentage: Option<Decimal>,
}

impl RoyaltyPolicy {
    /// Reject royalty lists whose total exceeds `cap`
    pub fn capped(cap: Decimal) -> Self {
        Self {
            max_total_percentage: Some(cap),
        }
    }

    /// Assemble the royalty list for a mint: platform share first, then the
    /// optional creator royalty, then every share with a wallet and a
    /// positive percentage.
    pub fn build_royalties(
        &self,
        platform_wallet: &str,
        metadata: &NftMetadata,
    ) -> VortexResult<Vec<RoyaltyEntry>> {
        let mut royalties = vec![RoyaltyEntry::new(platform_wallet, PLATFORM_ROYALTY_PERCENT)];

        if let Some(pct) = metadata.creator_royalty.filter(|p| *p > Decimal::ZERO) {
            royalties.push(RoyaltyEntry::new(metadata.creator_wallet.clone(), pct));
        }

        for share in &metadata.royalty_shares {
            match share.percentage {
                Some(pct) if !share.wallet.is_empty() && pct > Decimal::ZERO => {
                    royalties.push(RoyaltyEntry::new(share.wallet.clone(), pct));
                }
                _ => continue,
            }
        }

        let total: Decimal = royalties.iter().map(|r| r.percentage).sum();
        if let Some(cap) = self.max_total_percentage {
            if total > cap {
                return Err(VortexError::invalid(
                    "royalty_shares",
                    format!("total royalty {total}% exceeds {cap}%"),
                ));
            }
        } else if total > Decimal::ONE_HUNDRED {
            tracing::warn!(total = %total, "royalty percentages exceed 100%");
        }

        Ok(royalties)
    }
}

/// Round a payout the way the ledger displays it: 6 dp, half away from zero
pub fn round_payout(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(ROYALTY_PRECISION, RoundingStrategy::MidpointAwayFromZero)
}

/// Per-recipient payouts for a sale. Each entry is rounded on its own, so
/// the sum may differ from the unrounded total by rounding error.
pub fn calculate_distributions(
    royalties: &[RoyaltyEntry],
    sale_amount: Decimal,
) -> Vec<RoyaltyDistribution> {
    royalties
        .iter()
        .map(|r| RoyaltyDistribution {
            wallet: r.wallet.clone(),
            percentage: r.percentage,
            amount: round_payout(r.percentage / Decimal::ONE_HUNDRED * sale_amount),
        })
        .collect()
}
