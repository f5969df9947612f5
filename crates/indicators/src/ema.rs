use rust_decimal::Decimal;

use crate::error::IndicatorError;

/// Full EMA series over `closes`. Seed is the SMA of the first `period`
/// closes; subsequent values use `alpha = 2 / (period + 1)`.
pub fn ema_series(closes: &[Decimal], period: usize) -> Result<Vec<Decimal>, IndicatorError> {
    if period == 0 {
        return Err(IndicatorError::InvalidPeriod(period));
    }
    if closes.len() < period {
        return Err(IndicatorError::InsufficientData {
            needed: period,
            got: closes.len(),
        });
    }

    let seed_sum: Decimal = closes[..period].iter().sum();
    let seed = seed_sum / Decimal::from(period);
    let alpha = Decimal::from(2) / Decimal::from(period + 1);

    let mut series = Vec::with_capacity(closes.len() - period + 1);
    series.push(seed);
    let mut prev = seed;
    for close in &closes[period..] {
        let next = (*close - prev) * alpha + prev;
        series.push(next);
        prev = next;
    }
    Ok(series)
}

/// The most recent EMA value over `closes`.
pub fn ema_latest(closes: &[Decimal], period: usize) -> Result<Decimal, IndicatorError> {
    let series = ema_series(closes, period)?;
    Ok(*series.last().expect("non-empty after successful ema_series"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn seed_is_simple_average() {
        let closes = vec![dec!(10), dec!(20), dec!(30)];
        let series = ema_series(&closes, 3).unwrap();
        assert_eq!(series[0], dec!(20));
    }

    #[test]
    fn rejects_insufficient_window() {
        let closes = vec![dec!(10), dec!(20)];
        assert!(ema_series(&closes, 3).is_err());
    }

    #[test]
    fn tracks_rising_series() {
        let closes: Vec<Decimal> = (1..=30).map(Decimal::from).collect();
        let last = ema_latest(&closes, 9).unwrap();
        assert!(last > dec!(20) && last < dec!(30));
    }
}
