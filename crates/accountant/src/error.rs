use thiserror::Error;

#[derive(Error, Debug)]
pub enum AccountantError {
    #[error("Sell fill {fill_id} quantity {sell_qty} does not match disposed quantity {disposed_qty} (epsilon exceeded)")]
    DisposalMismatch {
        fill_id: uuid::Uuid,
        sell_qty: rust_decimal::Decimal,
        disposed_qty: rust_decimal::Decimal,
    },

    #[error("Synthetic buy valuation must be positive, got {0}")]
    InvalidValuation(rust_decimal::Decimal),
}
