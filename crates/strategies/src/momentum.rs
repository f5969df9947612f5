use core_types::{FeatureVector, Pair, Regime, Side, Signal, StrategyId};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::error::StrategyError;
use crate::Strategy;
use configuration::MomentumParams;

/// BUY when EMA9>EMA21>EMA50, MACD histogram is rising, close is above
/// EMA21, and volume confirms; SELL on the mirrored inverse conditions.
pub struct Momentum {
    params: MomentumParams,
}

impl Momentum {
    pub fn new(params: MomentumParams) -> Result<Self, StrategyError> {
        if params.min_confidence < Decimal::ZERO || params.min_confidence > Decimal::from(100) {
            return Err(StrategyError::InvalidParameters(
                "min_confidence must be in [0, 100]".to_string(),
            ));
        }
        Ok(Self { params })
    }
}

impl Strategy for Momentum {
    fn evaluate(&self, pair: &Pair, features: &FeatureVector) -> Result<Signal, StrategyError> {
        let snap = &features.snapshot_1h;
        let close = features.last_close;

        let ema_stack_bullish = snap.ema9 > snap.ema21 && snap.ema21 > snap.ema50;
        let ema_stack_bearish = snap.ema9 < snap.ema21 && snap.ema21 < snap.ema50;
        let histogram_rising = snap.macd_histogram > snap.macd_histogram_prev;
        let histogram_falling = snap.macd_histogram < snap.macd_histogram_prev;
        let above_ema21 = close > snap.ema21;
        let below_ema21 = close < snap.ema21;
        let volume_ok = features.last_volume >= snap.volume_sma20 * self.params.volume_confirmation_ratio;

        tracing::debug!(
            pair = %pair,
            ema_stack_bullish,
            histogram_rising,
            above_ema21,
            "momentum: evaluated conditions"
        );

        const REQUIRED: u32 = 4;

        if ema_stack_bullish && histogram_rising && above_ema21 && volume_ok {
            let satisfied =
                ema_stack_bullish as u32 + histogram_rising as u32 + above_ema21 as u32 + volume_ok as u32;
            let confidence = (self.base_confidence(satisfied, REQUIRED) + features.alignment_bonus())
                .min(Decimal::from(100));
            return Ok(self.signal(pair, Side::Buy, confidence, satisfied, REQUIRED, features));
        }

        if ema_stack_bearish && histogram_falling && below_ema21 && volume_ok {
            let satisfied =
                ema_stack_bearish as u32 + histogram_falling as u32 + below_ema21 as u32 + volume_ok as u32;
            let confidence = (self.base_confidence(satisfied, REQUIRED) + features.alignment_bonus())
                .min(Decimal::from(100));
            return Ok(self.signal(pair, Side::Sell, confidence, satisfied, REQUIRED, features));
        }

        Ok(Signal::none(pair.clone(), features.regime, "momentum conditions not met"))
    }

    fn id(&self) -> StrategyId {
        StrategyId::Momentum
    }
}

impl Momentum {
    fn base_confidence(&self, satisfied: u32, required: u32) -> Decimal {
        Decimal::from(100) * Decimal::from(satisfied) / Decimal::from(required)
    }

    fn signal(
        &self,
        pair: &Pair,
        side: Side,
        confidence: Decimal,
        satisfied: u32,
        required: u32,
        features: &FeatureVector,
    ) -> Signal {
        let direction = if side == Side::Buy { "bullish" } else { "bearish" };
        Signal {
            pair: pair.clone(),
            side,
            confidence,
            reason_text: format!(
                "momentum {direction} stack confirmed ({satisfied}/{required} checks), tf_aligned={}",
                features.tf_aligned
            ),
            satisfied_checks: satisfied,
            required_checks: required,
            tf_align_bonus: features.alignment_bonus(),
            regime: features.regime,
            regime_reason: regime_reason(features.regime),
            strategy_label: StrategyId::Momentum,
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

    fn snap(ema9: Decimal, ema21: Decimal, ema50: Decimal, hist: Decimal, hist_prev: Decimal) -> IndicatorSnapshot {
        IndicatorSnapshot {
            ema9,
            ema21,
            ema50,
            macd: hist,
            macd_signal: Decimal::ZERO,
            macd_histogram: hist,
            macd_histogram_prev: hist_prev,
            rsi14: dec!(50),
            bb_upper: dec!(105),
            bb_middle: dec!(100),
            bb_lower: dec!(95),
            atr14: dec!(1),
            volume_sma20: dec!(10),
            adx14: dec!(30),
        }
    }

    fn params() -> MomentumParams {
        MomentumParams {
            min_confidence: dec!(60),
            volume_confirmation_ratio: dec!(0.5),
        }
    }

    #[test]
    fn bullish_stack_with_rising_histogram_buys() {
        let pair = Pair::parse("BTC/USD").unwrap();
        let strategy = Momentum::new(params()).unwrap();
        let s = snap(dec!(105), dec!(102), dec!(100), dec!(1), dec!(0.5));
        let features = FeatureVector {
            snapshot_5m: s,
            snapshot_1h: s,
            snapshot_4h: s,
            last_close: dec!(106),
            last_volume: dec!(10),
            tf_aligned: false,
            regime: Regime::Trend,
        };
        let signal = strategy.evaluate(&pair, &features).unwrap();
        assert_eq!(signal.side, Side::Buy);
        assert!(signal.confidence > Decimal::ZERO);
    }

    #[test]
    fn flat_stack_produces_none() {
        let pair = Pair::parse("BTC/USD").unwrap();
        let strategy = Momentum::new(params()).unwrap();
        let s = snap(dec!(100), dec!(100), dec!(100), dec!(0), dec!(0));
        let features = FeatureVector {
            snapshot_5m: s,
            snapshot_1h: s,
            snapshot_4h: s,
            last_close: dec!(100),
            last_volume: dec!(10),
            tf_aligned: false,
            regime: Regime::Unknown,
        };
        let signal = strategy.evaluate(&pair, &features).unwrap();
        assert_eq!(signal.side, Side::None);
    }
}
