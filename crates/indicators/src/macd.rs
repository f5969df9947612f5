use rust_decimal::Decimal;

use crate::ema::ema_series;
use crate::error::IndicatorError;

/// `(macd, signal, histogram)` using the standard 12/26/9 construction:
/// `macd = EMA(fast) - EMA(slow)`, `signal = EMA(signal_period)` of the MACD
/// series, `histogram = macd - signal`.
pub fn macd(
    closes: &[Decimal],
    fast: usize,
    slow: usize,
    signal_period: usize,
) -> Result<(Decimal, Decimal, Decimal), IndicatorError> {
    let fast_series = ema_series(closes, fast)?;
    let slow_series = ema_series(closes, slow)?;

    // Align the two series on their trailing ends: ema_series(fast) is longer
    // than ema_series(slow) by (slow - fast) elements.
    let offset = fast_series.len() - slow_series.len();
    let macd_series: Vec<Decimal> = slow_series
        .iter()
        .enumerate()
        .map(|(i, slow_v)| fast_series[i + offset] - slow_v)
        .collect();

    let signal_series = ema_series(&macd_series, signal_period)?;
    let macd_offset = macd_series.len() - signal_series.len();

    let macd_last = *macd_series.last().expect("non-empty macd series");
    let signal_last = *signal_series.last().expect("non-empty signal series");
    let histogram = macd_last - signal_last;
    let _ = macd_offset;

    Ok((macd_last, signal_last, histogram))
}

/// The full MACD-histogram series, used by strategies that need to detect a
/// "rising" histogram rather than just its latest value.
pub fn macd_histogram_series(
    closes: &[Decimal],
    fast: usize,
    slow: usize,
    signal_period: usize,
) -> Result<Vec<Decimal>, IndicatorError> {
    let fast_series = ema_series(closes, fast)?;
    let slow_series = ema_series(closes, slow)?;
    let offset = fast_series.len() - slow_series.len();
    let macd_series: Vec<Decimal> = slow_series
        .iter()
        .enumerate()
        .map(|(i, slow_v)| fast_series[i + offset] - slow_v)
        .collect();
    let signal_series = ema_series(&macd_series, signal_period)?;
    let macd_offset = macd_series.len() - signal_series.len();

    Ok(macd_series[macd_offset..]
        .iter()
        .zip(signal_series.iter())
        .map(|(m, s)| *m - *s)
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn macd_of_flat_series_is_zero() {
        let closes: Vec<Decimal> = std::iter::repeat(Decimal::from(100)).take(60).collect();
        let (macd_v, signal_v, hist) = macd(&closes, 12, 26, 9).unwrap();
        assert_eq!(macd_v, Decimal::ZERO);
        assert_eq!(signal_v, Decimal::ZERO);
        assert_eq!(hist, Decimal::ZERO);
    }
}
