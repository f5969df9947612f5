use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::enums::Regime;

/// Derived values for one `(pair, interval)` pair, computed deterministically
/// over a window of closed candles.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IndicatorSnapshot {
    pub ema9: Decimal,
    pub ema21: Decimal,
    pub ema50: Decimal,
    pub macd: Decimal,
    pub macd_signal: Decimal,
    pub macd_histogram: Decimal,
    /// MACD histogram one candle prior, so strategies can detect a rising
    /// histogram without keeping their own state across ticks.
    pub macd_histogram_prev: Decimal,
    pub rsi14: Decimal,
    pub bb_upper: Decimal,
    pub bb_middle: Decimal,
    pub bb_lower: Decimal,
    pub atr14: Decimal,
    pub volume_sma20: Decimal,
    pub adx14: Decimal,
}

/// Aggregates 5m/1h/4h snapshots for a pair at tick time, plus the derived
/// multi-timeframe alignment flag used for confidence bonuses.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector {
    pub snapshot_5m: IndicatorSnapshot,
    pub snapshot_1h: IndicatorSnapshot,
    pub snapshot_4h: IndicatorSnapshot,
    pub last_close: Decimal,
    pub last_volume: Decimal,
    /// True when EMA-trend direction agrees across all three timeframes.
    pub tf_aligned: bool,
    pub regime: Regime,
}

impl FeatureVector {
    /// Additive confidence bonus applied when all three timeframes agree.
    pub fn alignment_bonus(&self) -> Decimal {
        if self.tf_aligned {
            Decimal::from(15)
        } else {
            Decimal::ZERO
        }
    }
}
