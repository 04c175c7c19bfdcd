//! Fee Schedule
//!
//! Flat per-type fees and the sender/recipient split.
//!
//! | Type | Fee |
//! |------|-----|
//! | `nft_purchase` | [`TRANSACTION_FEE`] |
//! | `artist_swap` | [`SWAP_FEE`] |
//! | anything else | 0 |

use crate::types::{FeeArrangement, FeeBreakdown, TransactionType};
use rust_decimal::Decimal;

/// Flat fee for NFT purchases (TOLA)
pub const TRANSACTION_FEE: Decimal = Decimal::from_parts(89, 0, 0, false, 0);

/// Flat fee for artist swaps (TOLA): 3 per artist, two artists
pub const SWAP_FEE: Decimal = Decimal::from_parts(6, 0, 0, false, 0);

/// Static fee table
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FeeSchedule {
    pub transaction_fee: Decimal,
    pub swap_fee: Decimal,
}

impl Default for FeeSchedule {
    fn default() -> Self {
        Self {
            transaction_fee: TRANSACTION_FEE,
            swap_fee: SWAP_FEE,
        }
    }
}

impl FeeSchedule {
    /// Total fee for a transaction type
    pub fn fee_for(&self, tx_type: &TransactionType) -> Decimal {
        match tx_type {
            TransactionType::NftPurchase => self.transaction_fee,
            TransactionType::ArtistSwap => self.swap_fee,
            TransactionType::Other(_) => Decimal::ZERO,
        }
    }

    /// Fee lookup followed by the split
    pub fn compute(&self, tx_type: &TransactionType, arrangement: FeeArrangement) -> FeeBreakdown {
        split_fee(self.fee_for(tx_type), arrangement)
    }
}

/// Split a fee between sender and recipient.
///
/// For `Split` the sender pays `fee / 2` and the recipient pays the rest,
/// so the two parts always add back up to `fee`.
pub fn split_fee(fee: Decimal, arrangement: FeeArrangement) -> FeeBreakdown {
    let sender_fee = match arrangement {
        FeeArrangement::SenderPays => fee,
        FeeArrangement::RecipientPays => Decimal::ZERO,
        FeeArrangement::Split => fee / Decimal::TWO,
    };
    FeeBreakdown {
        fee,
        sender_fee,
        recipient_fee: fee - sender_fee,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fee_table() {
        let schedule = FeeSchedule::default();
        assert_eq!(schedule.fee_for(&TransactionType::NftPurchase), Decimal::new(89, 0));
        assert_eq!(schedule.fee_for(&TransactionType::ArtistSwap), Decimal::new(6, 0));
        for other in ["tip", "gift", "", "NFT_PURCHASE"] {
            assert_eq!(
                schedule.fee_for(&TransactionType::parse(other)),
                Decimal::ZERO,
                "type {other:?}"
            );
        }
    }

    #[test]
    fn test_split_even_fee() {
        let b = split_fee(Decimal::new(6, 0), FeeArrangement::Split);
        assert_eq!(b.sender_fee, Decimal::new(3, 0));
        assert_eq!(b.recipient_fee, Decimal::new(3, 0));
    }

    #[test]
    fn test_split_odd_fee_preserves_total() {
        let b = split_fee(TRANSACTION_FEE, FeeArrangement::Split);
        assert_eq!(b.sender_fee, Decimal::new(445, 1));
        assert_eq!(b.sender_fee + b.recipient_fee, TRANSACTION_FEE);
    }

    #[test]
    fn test_sum_invariant_all_arrangements() {
        let arrangements = [
            FeeArrangement::SenderPays,
            FeeArrangement::RecipientPays,
            FeeArrangement::Split,
        ];
        for fee in [0i64, 1, 6, 89, 1001] {
            for arrangement in arrangements {
                let b = split_fee(Decimal::new(fee, 0), arrangement);
                assert_eq!(b.sender_fee + b.recipient_fee, b.fee);
                assert!(b.sender_fee >= Decimal::ZERO && b.recipient_fee >= Decimal::ZERO);
            }
        }
    }

    #[test]
    fn test_sender_and_recipient_pays() {
        let s = split_fee(Decimal::new(89, 0), FeeArrangement::SenderPays);
        assert_eq!((s.sender_fee, s.recipient_fee), (Decimal::new(89, 0), Decimal::ZERO));
        let r = split_fee(Decimal::new(89, 0), FeeArrangement::RecipientPays);
        assert_eq!((r.sender_fee, r.recipient_fee), (Decimal::ZERO, Decimal::new(89, 0)));
    }
}
