use thiserror::Error;

/// Error taxonomy surfaced by every `Exchange` implementation (§4.1/§7).
/// The engine matches on these variants to decide whether to retry, cool
/// down the affected pair, or disable the venue outright.
#[derive(Error, Debug)]
pub enum ExchangeError {
    #[error("exchange credentials invalid or missing: {0}")]
    Auth(String),

    /// Retryable with a fresh nonce, up to 3 attempts (§4.1).
    #[error("nonce rejected by venue (attempt {attempt})")]
    Nonce { attempt: u8 },

    #[error("rate limited, retry after {retry_after_sec}s")]
    RateLimit { retry_after_sec: u64 },

    /// Terminal for the current attempt; the caller cools the pair down.
    #[error("insufficient funds for this order")]
    InsufficientFunds,

    #[error("market is closed for this pair")]
    MarketClosed,

    /// Retryable with exponential backoff, capped at 30s by the caller.
    #[error("transient failure, retry with backoff: {0}")]
    Transient(String),

    /// No retry; the order or request is permanently invalid.
    #[error("permanently rejected: {0}")]
    PermanentReject(String),

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("failed to deserialize exchange response: {0}")]
    Deserialization(String),

    #[error("operation not supported by this venue: {0}")]
    Unsupported(String),
}
