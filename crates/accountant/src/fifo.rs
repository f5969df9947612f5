use chrono::{DateTime, Utc};
use core_types::{Disposal, ExchangeId, Lot, OrderSide, TradeFill};
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::error::AccountantError;

/// Default tolerance below which a lot/disposal remainder is treated as
/// fully consumed, absorbing Decimal rounding noise.
pub const EPSILON: Decimal = rust_decimal_macros::dec!(0.00000001);

/// Result of matching one SELL fill against open inventory (§4.9).
#[derive(Debug, Clone)]
pub struct DisposalOutcome {
    pub disposals: Vec<Disposal>,
    /// Non-fatal notices — currently only short-disposal warnings.
    pub warnings: Vec<String>,
}

impl DisposalOutcome {
    pub fn total_gain_loss_eur(&self) -> Decimal {
        self.disposals.iter().map(|d| d.gain_loss_eur).sum()
    }

    /// Realized P&L excluding short disposals (`lot_id = None`), per the
    /// accountant's dual-total reporting.
    pub fn total_gain_loss_eur_excluding_shorts(&self) -> Decimal {
        self.disposals.iter().filter(|d| !d.is_short()).map(|d| d.gain_loss_eur).sum()
    }
}

/// Creates a new open `Lot` from a BUY fill.
///
/// `price_eur` is the fill's execution price already converted to EUR via
/// the external rate series; `fee_eur` is the fee converted the same way.
pub fn record_buy(fill: &TradeFill, price_eur: Decimal, fee_eur: Decimal) -> Lot {
    debug_assert_eq!(fill.side, OrderSide::Buy);
    let cost_eur = price_eur * fill.amount + fee_eur;
    let unit_cost_eur = cost_eur / fill.amount;
    Lot {
        lot_id: Uuid::new_v4(),
        pair: fill.pair.clone(),
        exchange: fill.exchange,
        acquired_at: fill.executed_at,
        quantity: fill.amount,
        remaining_qty: fill.amount,
        unit_cost_eur,
        cost_eur,
        fee_eur,
        is_closed: false,
    }
}

/// Matches a SELL fill against `open_lots` in strict FIFO order (earliest
/// `acquired_at` first; ties broken by the slice's existing order, which the
/// caller is expected to populate in lot-insertion order). Lots are mutated
/// in place as they're consumed.
///
/// A sell quantity exceeding total open inventory produces a short disposal
/// (`lot_id = None`) for the unmatched remainder and a warning; it does not
/// fail the match.
pub fn record_sell(
    fill: &TradeFill,
    price_eur: Decimal,
    fee_attribution_pct: Decimal,
    open_lots: &mut [Lot],
) -> DisposalOutcome {
    debug_assert_eq!(fill.side, OrderSide::Sell);

    let mut candidates: Vec<&mut Lot> = open_lots
        .iter_mut()
        .filter(|lot| lot.pair == fill.pair && lot.exchange == fill.exchange && !lot.is_closed)
        .collect();
    candidates.sort_by_key(|lot| lot.acquired_at);

    let mut remaining = fill.amount;
    let mut disposals = Vec::new();
    let mut warnings = Vec::new();

    for lot in candidates {
        if remaining <= EPSILON {
            break;
        }
        let consumed = lot.consume(remaining, EPSILON);
        if consumed.is_zero() {
            continue;
        }
        remaining -= consumed;
        disposals.push(build_disposal(fill, Some(lot.lot_id), consumed, lot.unit_cost_eur, price_eur, fee_attribution_pct));
    }

    if remaining > EPSILON {
        tracing::warn!(
            pair = %fill.pair,
            fill_id = %fill.fill_id,
            short_qty = %remaining,
            "accountant: sell exceeds known inventory, recording short disposal"
        );
        warnings.push(format!(
            "short disposal of {remaining} {} on fill {}: insufficient historical buy lots",
            fill.pair, fill.fill_id
        ));
        disposals.push(build_disposal(fill, None, remaining, Decimal::ZERO, price_eur, fee_attribution_pct));
    }

    DisposalOutcome { disposals, warnings }
}

fn build_disposal(
    fill: &TradeFill,
    lot_id: Option<Uuid>,
    quantity: Decimal,
    unit_cost_eur: Decimal,
    price_eur: Decimal,
    fee_attribution_pct: Decimal,
) -> Disposal {
    let cost_basis_eur = quantity * unit_cost_eur;
    let proceeds_eur = quantity * price_eur * (Decimal::ONE - fee_attribution_pct);
    Disposal {
        disposal_id: Uuid::new_v4(),
        sell_fill_id: fill.fill_id,
        lot_id,
        quantity,
        proceeds_eur,
        cost_basis_eur,
        gain_loss_eur: proceeds_eur - cost_basis_eur,
        disposed_at: fill.executed_at,
    }
}

/// Verifies that a sell fill's disposals sum to its fill quantity within
/// `EPSILON` — the invariant the accountant must never violate.
pub fn verify_disposal_invariant(fill: &TradeFill, outcome: &DisposalOutcome) -> Result<(), AccountantError> {
    let disposed_qty: Decimal = outcome.disposals.iter().map(|d| d.quantity).sum();
    if (disposed_qty - fill.amount).abs() > EPSILON {
        return Err(AccountantError::DisposalMismatch {
            fill_id: fill.fill_id,
            sell_qty: fill.amount,
            disposed_qty,
        });
    }
    Ok(())
}

/// Normalizes a non-trade income event (staking reward, conversion, lending
/// interest) into a synthetic BUY lot at a configured EUR valuation. Only
/// invoked by callers that have confirmed valuation is enabled for the
/// account — this function performs no gating of its own.
pub fn synthetic_buy(
    pair: impl Into<String>,
    exchange: ExchangeId,
    quantity: Decimal,
    valuation_eur_per_unit: Decimal,
    occurred_at: DateTime<Utc>,
) -> Result<Lot, AccountantError> {
    if valuation_eur_per_unit <= Decimal::ZERO {
        return Err(AccountantError::InvalidValuation(valuation_eur_per_unit));
    }
    let cost_eur = quantity * valuation_eur_per_unit;
    Ok(Lot {
        lot_id: Uuid::new_v4(),
        pair: pair.into(),
        exchange,
        acquired_at: occurred_at,
        quantity,
        remaining_qty: quantity,
        unit_cost_eur: valuation_eur_per_unit,
        cost_eur,
        fee_eur: Decimal::ZERO,
        is_closed: false,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn buy_fill(amount: Decimal, price: Decimal, executed_at: DateTime<Utc>) -> TradeFill {
        TradeFill {
            fill_id: Uuid::new_v4(),
            exchange: ExchangeId::Kraken,
            pair: "BTC/USD".to_string(),
            side: OrderSide::Buy,
            price,
            amount,
            cost: price * amount,
            fee_eur: dec!(0.5),
            executed_at,
            order_id: "order-1".to_string(),
            client_order_id: "client-1".to_string(),
            lot_id: None,
        }
    }

    fn sell_fill(amount: Decimal, price: Decimal, executed_at: DateTime<Utc>) -> TradeFill {
        TradeFill {
            side: OrderSide::Sell,
            ..buy_fill(amount, price, executed_at)
        }
    }

    #[test]
    fn two_buys_then_one_sell_consumes_fifo_order() {
        let t0: DateTime<Utc> = "2026-01-01T00:00:00Z".parse().unwrap();
        let t1: DateTime<Utc> = "2026-01-02T00:00:00Z".parse().unwrap();

        let first_buy = buy_fill(dec!(1), dec!(100), t0);
        let second_buy = buy_fill(dec!(1), dec!(200), t1);

        let mut lots = vec![
            record_buy(&first_buy, dec!(100), dec!(0.5)),
            record_buy(&second_buy, dec!(200), dec!(0.5)),
        ];

        let sell = sell_fill(dec!(1.5), dec!(250), "2026-01-03T00:00:00Z".parse().unwrap());
        let outcome = record_sell(&sell, dec!(250), dec!(0.001), &mut lots);

        verify_disposal_invariant(&sell, &outcome).unwrap();
        assert_eq!(outcome.disposals.len(), 2);
        assert_eq!(outcome.disposals[0].quantity, dec!(1));
        assert_eq!(outcome.disposals[0].lot_id, Some(lots[0].lot_id));
        assert_eq!(outcome.disposals[1].quantity, dec!(0.5));
        assert_eq!(outcome.disposals[1].lot_id, Some(lots[1].lot_id));
        assert!(lots[0].is_closed);
        assert!(!lots[1].is_closed);
        assert_eq!(lots[1].remaining_qty, dec!(0.5));
    }

    #[test]
    fn sell_exceeding_inventory_produces_short_disposal() {
        let t0: DateTime<Utc> = "2026-01-01T00:00:00Z".parse().unwrap();
        let buy = buy_fill(dec!(1), dec!(100), t0);
        let mut lots = vec![record_buy(&buy, dec!(100), dec!(0.5))];

        let sell = sell_fill(dec!(2), dec!(150), "2026-01-02T00:00:00Z".parse().unwrap());
        let outcome = record_sell(&sell, dec!(150), Decimal::ZERO, &mut lots);

        verify_disposal_invariant(&sell, &outcome).unwrap();
        assert_eq!(outcome.warnings.len(), 1);
        let short = outcome.disposals.iter().find(|d| d.is_short()).unwrap();
        assert_eq!(short.quantity, dec!(1));
        assert_eq!(short.cost_basis_eur, Decimal::ZERO);
    }

    #[test]
    fn short_disposals_excluded_from_the_non_short_total() {
        let t0: DateTime<Utc> = "2026-01-01T00:00:00Z".parse().unwrap();
        let buy = buy_fill(dec!(1), dec!(100), t0);
        let mut lots = vec![record_buy(&buy, dec!(100), dec!(0.5))];
        let sell = sell_fill(dec!(2), dec!(150), "2026-01-02T00:00:00Z".parse().unwrap());
        let outcome = record_sell(&sell, dec!(150), Decimal::ZERO, &mut lots);

        assert!(outcome.total_gain_loss_eur() != outcome.total_gain_loss_eur_excluding_shorts());
    }

    #[test]
    fn synthetic_buy_rejects_non_positive_valuation() {
        let result = synthetic_buy("ETH/USD", ExchangeId::Kraken, dec!(1), Decimal::ZERO, Utc::now());
        assert!(result.is_err());
    }
}
