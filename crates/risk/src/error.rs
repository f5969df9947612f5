use rust_decimal::Decimal;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RiskError {
    #[error("Risk parameters from configuration are invalid: {0}")]
    InvalidParameters(String),

    #[error("The provided entry price ({0}) is zero or negative.")]
    InvalidEntryPrice(Decimal),

    #[error("Computed order quantity {qty} is below the pair minimum {minimum}")]
    BelowMinimumOrderSize { qty: Decimal, minimum: Decimal },
}
