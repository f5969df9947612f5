use thiserror::Error;

#[derive(Error, Debug)]
pub enum NotifierError {
    #[error("telegram API request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("telegram API returned an error: {0}")]
    Api(String),

    #[error("notifier is not configured: missing bot token")]
    NotConfigured,

    #[error("message context rejected: {0}")]
    InvalidContext(String),

    #[error("suppressed by dedupe/throttle: {0}")]
    Suppressed(String),

    #[error("advisory lock error: {0}")]
    Lock(#[from] sqlx::Error),
}
