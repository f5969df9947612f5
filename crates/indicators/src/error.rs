use thiserror::Error;

#[derive(Error, Debug)]
pub enum IndicatorError {
    #[error("insufficient candles: need at least {needed}, got {got}")]
    InsufficientData { needed: usize, got: usize },

    #[error("invalid period: {0}")]
    InvalidPeriod(usize),
}
