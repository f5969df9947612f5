use core_types::{FeatureVector, IndicatorSnapshot};
use rust_decimal::Decimal;

use crate::bollinger::bollinger_width_pct;
use crate::regime::classify;

/// EMA-trend direction: `1` bullish (9>21>50), `-1` bearish (9<21<50), `0`
/// mixed/flat.
fn ema_direction(snapshot: &IndicatorSnapshot) -> i8 {
    if snapshot.ema9 > snapshot.ema21 && snapshot.ema21 > snapshot.ema50 {
        1
    } else if snapshot.ema9 < snapshot.ema21 && snapshot.ema21 < snapshot.ema50 {
        -1
    } else {
        0
    }
}

/// Aggregates 5m/1h/4h snapshots into one feature vector, deriving the
/// multi-timeframe alignment flag and the current regime from the 1h
/// snapshot (the engine's primary decision timeframe).
pub fn build_feature_vector(
    snapshot_5m: IndicatorSnapshot,
    snapshot_1h: IndicatorSnapshot,
    snapshot_4h: IndicatorSnapshot,
    last_close: Decimal,
    last_volume: Decimal,
) -> FeatureVector {
    let dir_5m = ema_direction(&snapshot_5m);
    let dir_1h = ema_direction(&snapshot_1h);
    let dir_4h = ema_direction(&snapshot_4h);
    let tf_aligned = dir_5m != 0 && dir_5m == dir_1h && dir_1h == dir_4h;

    let bb_width = bollinger_width_pct(snapshot_1h.bb_upper, snapshot_1h.bb_lower, snapshot_1h.bb_middle);
    let (regime, _reason) = classify(snapshot_1h.adx14, bb_width);

    FeatureVector {
        snapshot_5m,
        snapshot_1h,
        snapshot_4h,
        last_close,
        last_volume,
        tf_aligned,
        regime,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn snapshot(ema9: Decimal, ema21: Decimal, ema50: Decimal) -> IndicatorSnapshot {
        IndicatorSnapshot {
            ema9,
            ema21,
            ema50,
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
    fn bullish_alignment_across_all_timeframes_is_aligned() {
        let bullish = snapshot(dec!(12), dec!(11), dec!(10));
        let fv = build_feature_vector(bullish, bullish, bullish, dec!(12), dec!(10));
        assert!(fv.tf_aligned);
        assert_eq!(fv.alignment_bonus(), dec!(15));
    }

    #[test]
    fn mismatched_direction_is_not_aligned() {
        let bullish = snapshot(dec!(12), dec!(11), dec!(10));
        let bearish = snapshot(dec!(10), dec!(11), dec!(12));
        let fv = build_feature_vector(bullish, bearish, bullish, dec!(12), dec!(10));
        assert!(!fv.tf_aligned);
    }
}
