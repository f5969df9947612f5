use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExecutorError {
    #[error("exchange error: {0}")]
    Exchange(#[from] exchange::ExchangeError),

    #[error("duplicate client order id: {0}")]
    DuplicateClientOrderId(String),

    #[error("nonce retries exhausted")]
    NonceRetriesExhausted,
}
