use std::collections::HashMap;

use core_types::OpenPosition;
use exchange::Balance;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

/// Same tolerance the accountant uses for its disposal-quantity invariant;
/// float-free but decimal arithmetic still leaves rounding dust.
const EPSILON: Decimal = dec!(0.00000001);

/// An exchange balance not backed by any persisted open lot, per §4.6's
/// reconciliation sweep. `auto_closed` records which cleanup policy applied.
#[derive(Debug, Clone, PartialEq)]
pub struct OrphanCleanup {
    pub asset: String,
    pub quantity: Decimal,
    pub auto_closed: bool,
}

/// Compares tracked open-position quantity per base asset against live
/// exchange balances. Any balance exceeding what's tracked by more than
/// `EPSILON` is reported as an orphan; the caller decides whether to act on
/// `auto_close_orphans` (closing it as a `MANUAL` exit lot at the last
/// observed mid price) or merely to alert.
pub fn reconcile_open_lots(
    open_positions: &[OpenPosition],
    balances: &[Balance],
    auto_close_orphans: bool,
) -> Vec<OrphanCleanup> {
    let mut tracked: HashMap<&str, Decimal> = HashMap::new();
    for position in open_positions {
        *tracked.entry(position.pair.base.as_str()).or_insert(Decimal::ZERO) += position.amount;
    }

    let mut orphans = Vec::new();
    for balance in balances {
        let tracked_qty = tracked.get(balance.asset.as_str()).copied().unwrap_or(Decimal::ZERO);
        let untracked = balance.total - tracked_qty;
        if untracked > EPSILON {
            if auto_close_orphans {
                tracing::warn!(asset = %balance.asset, quantity = %untracked, "orphan position detected, auto-closing");
            } else {
                tracing::warn!(asset = %balance.asset, quantity = %untracked, "orphan position detected, alert only");
            }
            orphans.push(OrphanCleanup {
                asset: balance.asset.clone(),
                quantity: untracked,
                auto_closed: auto_close_orphans,
            });
        }
    }
    orphans
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use core_types::{ExchangeId, Pair};
    use uuid::Uuid;

    fn position(base: &str, amount: Decimal) -> OpenPosition {
        OpenPosition::new(
            Uuid::new_v4(),
            Pair::new(base, "USD", dec!(0.0001), dec!(0.0001), dec!(0.1)).unwrap(),
            ExchangeId::Kraken,
            amount,
            dec!(100),
            Utc::now(),
            dec!(0.02),
            dec!(0.04),
        )
    }

    fn balance(asset: &str, total: Decimal) -> Balance {
        Balance { asset: asset.to_string(), free: total, total }
    }

    #[test]
    fn balance_matching_a_tracked_position_is_not_an_orphan() {
        let positions = vec![position("BTC", dec!(0.5))];
        let balances = vec![balance("BTC", dec!(0.5))];
        let orphans = reconcile_open_lots(&positions, &balances, true);
        assert!(orphans.is_empty());
    }

    #[test]
    fn untracked_balance_is_reported_as_an_orphan() {
        let positions = vec![position("BTC", dec!(0.5))];
        let balances = vec![balance("BTC", dec!(0.8))];
        let orphans = reconcile_open_lots(&positions, &balances, false);
        assert_eq!(orphans.len(), 1);
        assert_eq!(orphans[0].quantity, dec!(0.3));
        assert!(!orphans[0].auto_closed);
    }

    #[test]
    fn asset_with_no_tracked_position_at_all_is_fully_orphaned() {
        let balances = vec![balance("ETH", dec!(1.0))];
        let orphans = reconcile_open_lots(&[], &balances, true);
        assert_eq!(orphans.len(), 1);
        assert_eq!(orphans[0].asset, "ETH");
        assert_eq!(orphans[0].quantity, dec!(1.0));
    }
}
