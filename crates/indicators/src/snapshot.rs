use core_types::{Candle, IndicatorSnapshot};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::adx::adx_wilder;
use crate::atr::atr_wilder;
use crate::bollinger::bollinger;
use crate::ema::ema_latest;
use crate::error::IndicatorError;
use crate::macd::{macd, macd_histogram_series};
use crate::rsi::rsi_wilder;
use crate::sma::sma;

/// Builds the full indicator snapshot for one `(pair, interval)` series.
/// `candles` must be closed candles only, oldest first.
pub fn build_snapshot(candles: &[Candle]) -> Result<IndicatorSnapshot, IndicatorError> {
    let closes: Vec<Decimal> = candles.iter().map(|c| c.close).collect();
    let volumes: Vec<Decimal> = candles.iter().map(|c| c.volume).collect();

    let ema9 = ema_latest(&closes, 9)?;
    let ema21 = ema_latest(&closes, 21)?;
    let ema50 = ema_latest(&closes, 50)?;
    let (macd_v, macd_signal, macd_histogram) = macd(&closes, 12, 26, 9)?;
    let macd_histogram_prev = {
        let hist_series = macd_histogram_series(&closes, 12, 26, 9)?;
        if hist_series.len() >= 2 {
            hist_series[hist_series.len() - 2]
        } else {
            macd_histogram
        }
    };
    let rsi14 = rsi_wilder(&closes, 14)?;
    let (bb_upper, bb_middle, bb_lower) = bollinger(&closes, 20, dec!(2))?;
    let atr14 = atr_wilder(candles, 14)?;
    let volume_sma20 = sma(&volumes, 20)?;
    let adx14 = adx_wilder(candles, 14)?;

    Ok(IndicatorSnapshot {
        ema9,
        ema21,
        ema50,
        macd: macd_v,
        macd_signal,
        macd_histogram,
        macd_histogram_prev,
        rsi14,
        bb_upper,
        bb_middle,
        bb_lower,
        atr14,
        volume_sma20,
        adx14,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use core_types::Interval;

    fn synthetic_candles(n: usize) -> Vec<Candle> {
        (0..n)
            .map(|i| {
                let base = Decimal::from(100) + Decimal::from(i);
                Candle {
                    open_ts: Utc::now(),
                    interval: Interval::OneHour,
                    open: base,
                    high: base + dec!(1),
                    low: base - dec!(1),
                    close: base,
                    volume: dec!(10),
                    is_closed: true,
                }
            })
            .collect()
    }

    #[test]
    fn builds_snapshot_with_enough_history() {
        let candles = synthetic_candles(80);
        let snapshot = build_snapshot(&candles).unwrap();
        assert!(snapshot.ema9 > snapshot.ema50);
    }

    #[test]
    fn rejects_short_history() {
        let candles = synthetic_candles(10);
        assert!(build_snapshot(&candles).is_err());
    }
}
