use rust_decimal::Decimal;

use crate::error::IndicatorError;

/// RSI(period) using Wilder smoothing of average gains/losses.
pub fn rsi_wilder(closes: &[Decimal], period: usize) -> Result<Decimal, IndicatorError> {
    if period == 0 {
        return Err(IndicatorError::InvalidPeriod(period));
    }
    if closes.len() < period + 1 {
        return Err(IndicatorError::InsufficientData {
            needed: period + 1,
            got: closes.len(),
        });
    }

    let deltas: Vec<Decimal> = closes.windows(2).map(|w| w[1] - w[0]).collect();

    let seed_gains: Decimal = deltas[..period].iter().filter(|d| **d > Decimal::ZERO).sum();
    let seed_losses: Decimal = deltas[..period]
        .iter()
        .filter(|d| **d < Decimal::ZERO)
        .map(|d| -*d)
        .sum();

    let mut avg_gain = seed_gains / Decimal::from(period);
    let mut avg_loss = seed_losses / Decimal::from(period);

    for delta in &deltas[period..] {
        let gain = if *delta > Decimal::ZERO { *delta } else { Decimal::ZERO };
        let loss = if *delta < Decimal::ZERO { -*delta } else { Decimal::ZERO };
        avg_gain = (avg_gain * Decimal::from(period - 1) + gain) / Decimal::from(period);
        avg_loss = (avg_loss * Decimal::from(period - 1) + loss) / Decimal::from(period);
    }

    if avg_loss.is_zero() {
        return Ok(Decimal::from(100));
    }
    let rs = avg_gain / avg_loss;
    let rsi = Decimal::from(100) - (Decimal::from(100) / (Decimal::ONE + rs));
    Ok(rsi)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn all_gains_saturates_to_100() {
        let closes: Vec<Decimal> = (1..=20).map(Decimal::from).collect();
        let rsi = rsi_wilder(&closes, 14).unwrap();
        assert_eq!(rsi, dec!(100));
    }

    #[test]
    fn all_losses_approaches_zero() {
        let closes: Vec<Decimal> = (1..=20).rev().map(Decimal::from).collect();
        let rsi = rsi_wilder(&closes, 14).unwrap();
        assert_eq!(rsi, Decimal::ZERO);
    }
}
