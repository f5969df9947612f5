use configuration::{ExitConfig, RiskManagement};
use core_types::{Pair, RiskLevel};
use rust_decimal::Decimal;

use crate::error::RiskError;

/// Inputs to the fixed-fractional order sizing formula (§4.5).
#[derive(Debug, Clone)]
pub struct SizingInput {
    pub free_usd: Decimal,
    pub entry_price_estimate: Decimal,
    /// Estimated hidden venue spread from the dynamic markup tracker (§4.8).
    pub dynamic_markup_pct: Decimal,
    pub risk_level: RiskLevel,
    /// Additional multiplier from the strategy router (e.g. halved in a
    /// VOLATILE regime); `1` under normal conditions.
    pub regime_size_multiplier: Decimal,
}

/// Computes the risk-budgeted order quantity:
///
/// ```text
/// riskBudgetUsd = freeUsd × riskPerTradePct × regimeSizeMultiplier
/// rawQty = riskBudgetUsd / (entryPriceEstimate × stopLossPct)
/// effectivePrice = entryPriceEstimate × (1 + dynamicMarkupPct)
/// referenceMidAdjustment = entryPriceEstimate / effectivePrice
/// qty = roundDownToStep(rawQty × referenceMidAdjustment)
/// ```
///
/// `referenceMidAdjustment` discounts the raw quantity by the same factor
/// the effective price was marked up, so the USD amount actually risked
/// tracks the configured budget rather than drifting with the spread.
/// Rejects if the rounded quantity is below the pair's venue minimum.
pub fn size_order(
    input: &SizingInput,
    risk: &RiskManagement,
    exits: &ExitConfig,
    pair: &Pair,
) -> Result<Decimal, RiskError> {
    if input.entry_price_estimate <= Decimal::ZERO {
        return Err(RiskError::InvalidEntryPrice(input.entry_price_estimate));
    }

    let risk_per_trade_pct = risk.risk_per_trade_pct_for(input.risk_level);
    let risk_budget_usd = input.free_usd * risk_per_trade_pct * input.regime_size_multiplier;

    let raw_qty = risk_budget_usd / (input.entry_price_estimate * exits.stop_loss_pct);

    let effective_price = input.entry_price_estimate * (Decimal::ONE + input.dynamic_markup_pct);
    let reference_mid_adjustment = input.entry_price_estimate / effective_price;

    let qty = pair.round_down_to_step(raw_qty * reference_mid_adjustment);

    if qty < pair.min_order_size {
        return Err(RiskError::BelowMinimumOrderSize { qty, minimum: pair.min_order_size });
    }

    Ok(qty)
}

#[cfg(test)]
mod tests {
    use super::*;
    use configuration::ExitConfig;
    use rust_decimal_macros::dec;

    fn risk() -> RiskManagement {
        RiskManagement {
            risk_per_trade_pct: dec!(0.03),
            max_pair_exposure_pct: dec!(0.2),
            max_total_exposure_pct: dec!(0.6),
            daily_loss_limit_pct: dec!(0.05),
            cooldown_sec: 300,
        }
    }

    fn exits() -> ExitConfig {
        ExitConfig {
            stop_loss_pct: dec!(0.02),
            take_profit_pct: dec!(0.04),
            trailing_stop_enabled: true,
            trailing_arm_pct: dec!(0.015),
            trailing_distance_pct: dec!(0.01),
            be_arm_pct: dec!(0.01),
            be_lock_pct: dec!(0.002),
            stop_update_notify_min_interval_sec: 300,
        }
    }

    fn pair() -> Pair {
        Pair::new("BTC", "USD", dec!(0.0001), dec!(0.0001), dec!(0.1)).unwrap()
    }

    #[test]
    fn sizes_within_risk_budget() {
        let input = SizingInput {
            free_usd: dec!(10000),
            entry_price_estimate: dec!(50000),
            dynamic_markup_pct: dec!(0.001),
            risk_level: RiskLevel::Medium,
            regime_size_multiplier: Decimal::ONE,
        };
        let qty = size_order(&input, &risk(), &exits(), &pair()).unwrap();
        assert!(qty > Decimal::ZERO);
        // riskBudgetUsd = 10000 * 0.03 = 300; rawQty = 300 / (50000 * 0.02) = 0.3
        assert!(qty <= dec!(0.3));
    }

    #[test]
    fn volatile_regime_multiplier_halves_size() {
        let mut input = SizingInput {
            free_usd: dec!(10000),
            entry_price_estimate: dec!(50000),
            dynamic_markup_pct: Decimal::ZERO,
            risk_level: RiskLevel::Medium,
            regime_size_multiplier: Decimal::ONE,
        };
        let full_qty = size_order(&input, &risk(), &exits(), &pair()).unwrap();
        input.regime_size_multiplier = dec!(0.5);
        let halved_qty = size_order(&input, &risk(), &exits(), &pair()).unwrap();
        assert!(halved_qty > Decimal::ZERO && halved_qty < full_qty);
    }

    #[test]
    fn rejects_when_below_minimum() {
        let input = SizingInput {
            free_usd: dec!(1),
            entry_price_estimate: dec!(50000),
            dynamic_markup_pct: Decimal::ZERO,
            risk_level: RiskLevel::Medium,
            regime_size_multiplier: Decimal::ONE,
        };
        let result = size_order(&input, &risk(), &exits(), &pair());
        assert!(result.is_err());
    }
}
