use core_types::{FeatureVector, Pair, Regime, Side, Signal, StrategyId};
use rust_decimal::Decimal;

use crate::error::StrategyError;
use crate::Strategy;
use configuration::MeanReversionParams;

/// BUY when price is below the lower Bollinger band, RSI is oversold, and
/// the deviation from EMA50 exceeds the configured z-threshold; SELL on the
/// mirrored inverse (price above upper band, RSI overbought).
pub struct MeanReversion {
    params: MeanReversionParams,
}

impl MeanReversion {
    pub fn new(params: MeanReversionParams) -> Result<Self, StrategyError> {
        if params.deviation_z <= Decimal::ZERO {
            return Err(StrategyError::InvalidParameters(
                "deviation_z must be positive".to_string(),
            ));
        }
        Ok(Self { params })
    }

    fn ema50_deviation(&self, close: Decimal, ema50: Decimal) -> Decimal {
        if ema50.is_zero() {
            return Decimal::ZERO;
        }
        (close - ema50).abs() / ema50
    }
}

const RSI_OVERSOLD: Decimal = rust_decimal_macros::dec!(30);
const RSI_OVERBOUGHT: Decimal = rust_decimal_macros::dec!(70);

impl Strategy for MeanReversion {
    fn evaluate(&self, pair: &Pair, features: &FeatureVector) -> Result<Signal, StrategyError> {
        let snap = &features.snapshot_1h;
        let close = features.last_close;
        let deviation = self.ema50_deviation(close, snap.ema50);

        let below_lower_band = close < snap.bb_lower;
        let oversold = snap.rsi14 < RSI_OVERSOLD;
        let above_upper_band = close > snap.bb_upper;
        let overbought = snap.rsi14 > RSI_OVERBOUGHT;
        let deviation_ok = deviation > self.params.deviation_z;

        const REQUIRED: u32 = 3;

        if below_lower_band && oversold && deviation_ok {
            let satisfied = below_lower_band as u32 + oversold as u32 + deviation_ok as u32;
            return Ok(self.signal(pair, Side::Buy, satisfied, REQUIRED, features));
        }
        if above_upper_band && overbought && deviation_ok {
            let satisfied = above_upper_band as u32 + overbought as u32 + deviation_ok as u32;
            return Ok(self.signal(pair, Side::Sell, satisfied, REQUIRED, features));
        }

        Ok(Signal::none(pair.clone(), features.regime, "mean-reversion conditions not met"))
    }

    fn id(&self) -> StrategyId {
        StrategyId::MeanReversion
    }
}

impl MeanReversion {
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
                "mean-reversion setup confirmed ({satisfied}/{required} checks) against band at {}",
                features.snapshot_1h.bb_middle
            ),
            satisfied_checks: satisfied,
            required_checks: required,
            tf_align_bonus: features.alignment_bonus(),
            regime: features.regime,
            regime_reason: regime_reason(features.regime),
            strategy_label: StrategyId::MeanReversion,
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

    fn params() -> MeanReversionParams {
        MeanReversionParams {
            min_confidence: dec!(60),
            deviation_z: dec!(0.01),
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
            rsi14: dec!(20),
            bb_upper: dec!(105),
            bb_middle: dec!(100),
            bb_lower: dec!(95),
            atr14: dec!(1),
            volume_sma20: dec!(10),
            adx14: dec!(10),
        }
    }

    #[test]
    fn oversold_below_lower_band_buys() {
        let pair = Pair::parse("BTC/USD").unwrap();
        let strategy = MeanReversion::new(params()).unwrap();
        let s = snap();
        let features = FeatureVector {
            snapshot_5m: s,
            snapshot_1h: s,
            snapshot_4h: s,
            last_close: dec!(90),
            last_volume: dec!(10),
            tf_aligned: false,
            regime: Regime::Range,
        };
        let signal = strategy.evaluate(&pair, &features).unwrap();
        assert_eq!(signal.side, Side::Buy);
    }
}
