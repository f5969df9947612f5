use thiserror::Error;

#[derive(Error, Debug)]
pub enum SchedulerError {
    #[error("database error: {0}")]
    Database(#[from] database::DbError),

    #[error("exchange error: {0}")]
    Exchange(#[from] exchange::ExchangeError),

    #[error("accountant error: {0}")]
    Accountant(#[from] accountant::AccountantError),
}
