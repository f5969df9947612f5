use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::enums::{Regime, Side, StrategyId};
use crate::pair::Pair;

/// Output of a strategy evaluation for a single tick.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Signal {
    pub pair: Pair,
    pub side: Side,
    /// Confidence in `[0, 100]`.
    pub confidence: Decimal,
    pub reason_text: String,
    pub satisfied_checks: u32,
    pub required_checks: u32,
    /// Additive bonus already folded into `confidence`, kept separately so
    /// callers can explain the breakdown.
    pub tf_align_bonus: Decimal,
    pub regime: Regime,
    pub regime_reason: String,
    pub strategy_label: StrategyId,
}

impl Signal {
    pub fn none(pair: Pair, regime: Regime, regime_reason: impl Into<String>) -> Self {
        Self {
            pair,
            side: Side::None,
            confidence: Decimal::ZERO,
            reason_text: "no qualifying setup".to_string(),
            satisfied_checks: 0,
            required_checks: 0,
            tf_align_bonus: Decimal::ZERO,
            regime,
            regime_reason: regime_reason.into(),
            strategy_label: StrategyId::Momentum,
        }
    }

    pub fn is_actionable(&self) -> bool {
        !matches!(self.side, Side::None)
    }
}
