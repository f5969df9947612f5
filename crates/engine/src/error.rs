use thiserror::Error;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("exchange error: {0}")]
    Exchange(#[from] exchange::ExchangeError),

    #[error("database error: {0}")]
    Database(#[from] database::DbError),

    #[error("indicator error: {0}")]
    Indicator(#[from] indicators::IndicatorError),

    #[error("strategy error: {0}")]
    Strategy(#[from] strategies::StrategyError),

    #[error("risk management error: {0}")]
    Risk(#[from] risk::RiskError),

    #[error("order execution error: {0}")]
    Executor(#[from] executor::ExecutorError),

    #[error("accountant error: {0}")]
    Accountant(#[from] accountant::AccountantError),

    #[error("pair '{0}' is not configured with venue precision facts")]
    UnknownPair(String),
}
