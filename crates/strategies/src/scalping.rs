use core_types::{FeatureVector, Pair, Regime, Side, Signal, StrategyId};
use rust_decimal::Decimal;

use crate::error::StrategyError;
use crate::Strategy;
use configuration::ScalpingParams;

/// BUY on an EMA9/EMA21 bullish cross with ATR above a configured minimum
/// and volume confirmation; tight stop/target, intended for short holds.
pub struct Scalping {
    params: ScalpingParams,
}

impl Scalping {
    pub fn new(params: ScalpingParams) -> Result<Self, StrategyError> {
        if params.min_atr < Decimal::ZERO {
            return Err(StrategyError::InvalidParameters("min_atr must be non-negative".to_string()));
        }
        Ok(Self { params })
    }
}

impl Strategy for Scalping {
    fn evaluate(&self, pair: &Pair, features: &FeatureVector) -> Result<Signal, StrategyError> {
        let snap = &features.snapshot_5m;

        // A single-snapshot proxy for "just crossed": the 5m EMA9 sits on
        // the immediate bullish/bearish side of EMA21 while the ATR and
        // volume filters confirm there's enough movement to scalp.
        let bullish_cross = snap.ema9 > snap.ema21;
        let bearish_cross = snap.ema9 < snap.ema21;
        let atr_ok = snap.atr14 >= self.params.min_atr;
        let volume_ok = features.last_volume >= snap.volume_sma20;

        const REQUIRED: u32 = 3;

        if bullish_cross && atr_ok && volume_ok {
            let satisfied = bullish_cross as u32 + atr_ok as u32 + volume_ok as u32;
            return Ok(self.signal(pair, Side::Buy, satisfied, REQUIRED, features));
        }
        if bearish_cross && atr_ok && volume_ok {
            let satisfied = bearish_cross as u32 + atr_ok as u32 + volume_ok as u32;
            return Ok(self.signal(pair, Side::Sell, satisfied, REQUIRED, features));
        }

        Ok(Signal::none(pair.clone(), features.regime, "scalping conditions not met"))
    }

    fn id(&self) -> StrategyId {
        StrategyId::Scalping
    }
}

impl Scalping {
    fn signal(
        &self,
        pair: &Pair,
        side: Side,
        satisfied: u32,
        required: u32,
        features: &FeatureVector,
    ) -> Signal {
        let confidence = (Decimal::from(100) * Decimal::from(satisfied) / Decimal::from(required)
            + features.alignment_bonus())
        .min(Decimal::from(100));
        Signal {
            pair: pair.clone(),
            side,
            confidence,
            reason_text: format!(
                "scalping cross confirmed ({satisfied}/{required} checks), atr={}",
                features.snapshot_5m.atr14
            ),
            satisfied_checks: satisfied,
            required_checks: required,
            tf_align_bonus: features.alignment_bonus(),
            regime: features.regime,
            regime_reason: regime_reason(features.regime),
            strategy_label: StrategyId::Scalping,
        }
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

    fn snap(ema9: Decimal, ema21: Decimal, atr: Decimal) -> IndicatorSnapshot {
        IndicatorSnapshot {
            ema9,
            ema21,
            ema50: dec!(100),
            macd: Decimal::ZERO,
            macd_signal: Decimal::ZERO,
            macd_histogram: Decimal::ZERO,
            macd_histogram_prev: Decimal::ZERO,
            rsi14: dec!(50),
            bb_upper: dec!(105),
            bb_middle: dec!(100),
            bb_lower: dec!(95),
            atr14: atr,
            volume_sma20: dec!(10),
            adx14: dec!(20),
        }
    }

    #[test]
    fn bullish_cross_with_enough_atr_buys() {
        let pair = Pair::parse("BTC/USD").unwrap();
        let strategy = Scalping::new(ScalpingParams {
            min_confidence: dec!(50),
            min_atr: dec!(0.5),
            target_pct: dec!(0.3),
            stop_pct: dec!(0.15),
        })
        .unwrap();
        let s = snap(dec!(101), dec!(100), dec!(1));
        let features = FeatureVector {
            snapshot_5m: s,
            snapshot_1h: s,
            snapshot_4h: s,
            last_close: dec!(101),
            last_volume: dec!(15),
            tf_aligned: false,
            regime: Regime::Trend,
        };
        let signal = strategy.evaluate(&pair, &features).unwrap();
        assert_eq!(signal.side, Side::Buy);
    }

    #[test]
    fn insufficient_atr_produces_none() {
        let pair = Pair::parse("BTC/USD").unwrap();
        let strategy = Scalping::new(ScalpingParams {
            min_confidence: dec!(50),
            min_atr: dec!(5),
            target_pct: dec!(0.3),
            stop_pct: dec!(0.15),
        })
        .unwrap();
        let s = snap(dec!(101), dec!(100), dec!(1));
        let features = FeatureVector {
            snapshot_5m: s,
            snapshot_1h: s,
            snapshot_4h: s,
            last_close: dec!(101),
            last_volume: dec!(15),
            tf_aligned: false,
            regime: Regime::Trend,
        };
        let signal = strategy.evaluate(&pair, &features).unwrap();
        assert_eq!(signal.side, Side::None);
    }
}
