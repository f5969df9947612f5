use thiserror::Error;

#[derive(Error, Debug)]
pub enum DbError {
    #[error("failed to load environment variables for database connection: {0}")]
    ConnectionConfigError(String),

    #[error("database error: {0}")]
    Sql(#[from] sqlx::Error),

    #[error("database migration failed: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("JSON serialization/deserialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("unrecognized enum value persisted in column: {0}")]
    InvalidEnumValue(String),

    #[error("the requested row was not found")]
    NotFound,
}
