use rust_decimal::Decimal;
use rust_decimal::MathematicalOps as _;

use crate::error::IndicatorError;

/// `(upper, middle, lower)` Bollinger bands using population standard
/// deviation (divide by `period`, not `period - 1`).
pub fn bollinger(closes: &[Decimal], period: usize, k: Decimal) -> Result<(Decimal, Decimal, Decimal), IndicatorError> {
    if period == 0 {
        return Err(IndicatorError::InvalidPeriod(period));
    }
    if closes.len() < period {
        return Err(IndicatorError::InsufficientData {
            needed: period,
            got: closes.len(),
        });
    }
    let window = &closes[closes.len() - period..];
    let mean: Decimal = window.iter().sum::<Decimal>() / Decimal::from(period);
    let variance: Decimal = window.iter().map(|c| (*c - mean) * (*c - mean)).sum::<Decimal>()
        / Decimal::from(period);
    let stdev = variance.sqrt().unwrap_or(Decimal::ZERO);

    Ok((mean + k * stdev, mean, mean - k * stdev))
}

/// Normalized band width, used by regime classification to distinguish a
/// compressing (range-bound) market from an expanding (volatile) one.
pub fn bollinger_width_pct(upper: Decimal, lower: Decimal, middle: Decimal) -> Decimal {
    if middle.is_zero() {
        return Decimal::ZERO;
    }
    (upper - lower) / middle * Decimal::from(100)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn flat_series_has_zero_width() {
        let closes: Vec<Decimal> = std::iter::repeat(dec!(100)).take(20).collect();
        let (upper, middle, lower) = bollinger(&closes, 20, dec!(2)).unwrap();
        assert_eq!(upper, middle);
        assert_eq!(lower, middle);
    }
}
