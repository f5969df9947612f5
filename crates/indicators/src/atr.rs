use core_types::Candle;
use rust_decimal::Decimal;

use crate::error::IndicatorError;

fn true_range(prev_close: Decimal, high: Decimal, low: Decimal) -> Decimal {
    let hl = high - low;
    let hc = (high - prev_close).abs();
    let lc = (low - prev_close).abs();
    hl.max(hc).max(lc)
}

/// ATR(period) using Wilder smoothing of the true range series.
pub fn atr_wilder(candles: &[Candle], period: usize) -> Result<Decimal, IndicatorError> {
    if period == 0 {
        return Err(IndicatorError::InvalidPeriod(period));
    }
    if candles.len() < period + 1 {
        return Err(IndicatorError::InsufficientData {
            needed: period + 1,
            got: candles.len(),
        });
    }

    let tr: Vec<Decimal> = candles
        .windows(2)
        .map(|w| true_range(w[0].close, w[1].high, w[1].low))
        .collect();

    let mut atr = tr[..period].iter().sum::<Decimal>() / Decimal::from(period);
    for value in &tr[period..] {
        atr = (atr * Decimal::from(period - 1) + value) / Decimal::from(period);
    }
    Ok(atr)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use core_types::Interval;
    use rust_decimal_macros::dec;

    fn candle(high: Decimal, low: Decimal, close: Decimal) -> Candle {
        Candle {
            open_ts: Utc::now(),
            interval: Interval::OneHour,
            open: close,
            high,
            low,
            close,
            volume: dec!(1),
            is_closed: true,
        }
    }

    #[test]
    fn atr_of_flat_candles_is_zero() {
        let candles: Vec<Candle> = (0..20).map(|_| candle(dec!(100), dec!(100), dec!(100))).collect();
        let atr = atr_wilder(&candles, 14).unwrap();
        assert_eq!(atr, Decimal::ZERO);
    }

    #[test]
    fn atr_reflects_nonzero_range() {
        let candles: Vec<Candle> = (0..20).map(|_| candle(dec!(105), dec!(95), dec!(100))).collect();
        let atr = atr_wilder(&candles, 14).unwrap();
        assert!(atr > Decimal::ZERO);
    }
}
