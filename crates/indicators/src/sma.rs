use rust_decimal::Decimal;

use crate::error::IndicatorError;

/// Simple moving average of the last `period` values.
pub fn sma(values: &[Decimal], period: usize) -> Result<Decimal, IndicatorError> {
    if period == 0 {
        return Err(IndicatorError::InvalidPeriod(period));
    }
    if values.len() < period {
        return Err(IndicatorError::InsufficientData {
            needed: period,
            got: values.len(),
        });
    }
    let window = &values[values.len() - period..];
    Ok(window.iter().sum::<Decimal>() / Decimal::from(period))
}
