use core_types::{FeatureVector, Pair, Regime, Side, Signal, StrategyId};
use rust_decimal::Decimal;

use crate::error::StrategyError;
use crate::Strategy;
use configuration::GridParams;

/// Places a ladder of buy levels spaced below the current price by multiples
/// of ATR, intended for range-bound markets. `evaluate` reports whether the
/// current price sits on (or below) the nearest unfilled level; the actual
/// per-level order set is materialized by the caller via `levels()`.
pub struct Grid {
    params: GridParams,
}

impl Grid {
    pub fn new(params: GridParams) -> Result<Self, StrategyError> {
        if params.levels == 0 {
            return Err(StrategyError::InvalidParameters("levels must be at least 1".to_string()));
        }
        if params.atr_spacing_multiplier <= Decimal::ZERO {
            return Err(StrategyError::InvalidParameters(
                "atr_spacing_multiplier must be positive".to_string(),
            ));
        }
        Ok(Self { params })
    }

    /// Returns the ladder of buy-level prices below `anchor`, spaced by
    /// `n * atr_spacing_multiplier * atr` for `n` in `1..=levels`.
    pub fn levels(&self, anchor: Decimal, atr: Decimal) -> Vec<Decimal> {
        (1..=self.params.levels)
            .map(|n| anchor - atr * self.params.atr_spacing_multiplier * Decimal::from(n))
            .collect()
    }
}

impl Strategy for Grid {
    fn evaluate(&self, pair: &Pair, features: &FeatureVector) -> Result<Signal, StrategyError> {
        let snap = &features.snapshot_1h;
        let close = features.last_close;
        let levels = self.levels(snap.bb_middle, snap.atr14);

        let nearest_level_hit = levels.iter().any(|level| close <= *level);
        let range_bound = matches!(features.regime, Regime::Range);

        const REQUIRED: u32 = 2;

        if nearest_level_hit && range_bound {
            let satisfied = nearest_level_hit as u32 + range_bound as u32;
            let confidence =
                (Decimal::from(100) * Decimal::from(satisfied) / Decimal::from(REQUIRED) + features.alignment_bonus())
                    .min(Decimal::from(100));
            return Ok(Signal {
                pair: pair.clone(),
                side: Side::Buy,
                confidence,
                reason_text: format!(
                    "price {close} reached a grid level below anchor {}",
                    snap.bb_middle
                ),
                satisfied_checks: satisfied,
                required_checks: REQUIRED,
                tf_align_bonus: features.alignment_bonus(),
                regime: features.regime,
                regime_reason: regime_reason(features.regime),
                strategy_label: StrategyId::Grid,
            });
        }

        Ok(Signal::none(pair.clone(), features.regime, "no grid level reached"))
    }

    fn id(&self) -> StrategyId {
        StrategyId::Grid
    }
}

fn regime_reason(regime: Regime) -> String {
    match regime {
        Regime::Trend => "adx above trend threshold".to_string(),
        Regime::Range => "adx low and bands narrow".to_string(),
        Regime::Volatile => "bands wide".to_string(),
        Regime::Unknown => "no regime threshold satisfied".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_types::IndicatorSnapshot;
    use rust_decimal_macros::dec;

    fn params() -> GridParams {
        GridParams {
            levels: 3,
            atr_spacing_multiplier: dec!(1),
        }
    }

    fn snap() -> IndicatorSnapshot {
        IndicatorSnapshot {
            ema9: dec!(100),
            ema21: dec!(100),
            ema50: dec!(100),
            macd: Decimal::ZERO,
            macd_signal: Decimal::ZERO,
            macd_histogram: Decimal::ZERO,
            macd_histogram_prev: Decimal::ZERO,
            rsi14: dec!(50),
            bb_upper: dec!(105),
            bb_middle: dec!(100),
            bb_lower: dec!(95),
            atr14: dec!(1),
            volume_sma20: dec!(10),
            adx14: dec!(10),
        }
    }

    #[test]
    fn generates_descending_levels() {
        let grid = Grid::new(params()).unwrap();
        let levels = grid.levels(dec!(100), dec!(1));
        assert_eq!(levels, vec![dec!(99), dec!(98), dec!(97)]);
    }

    #[test]
    fn price_at_level_in_range_regime_buys() {
        let pair = Pair::parse("BTC/USD").unwrap();
        let grid = Grid::new(params()).unwrap();
        let s = snap();
        let features = FeatureVector {
            snapshot_5m: s,
            snapshot_1h: s,
            snapshot_4h: s,
            last_close: dec!(98),
            last_volume: dec!(10),
            tf_aligned: false,
            regime: Regime::Range,
        };
        let signal = grid.evaluate(&pair, &features).unwrap();
        assert_eq!(signal.side, Side::Buy);
    }

    #[test]
    fn trending_regime_does_not_buy() {
        let pair = Pair::parse("BTC/USD").unwrap();
        let grid = Grid::new(params()).unwrap();
        let s = snap();
        let features = FeatureVector {
            snapshot_5m: s,
            snapshot_1h: s,
            snapshot_4h: s,
            last_close: dec!(98),
            last_volume: dec!(10),
            tf_aligned: false,
            regime: Regime::Trend,
        };
        let signal = grid.evaluate(&pair, &features).unwrap();
        assert_eq!(signal.side, Side::None);
    }
}
