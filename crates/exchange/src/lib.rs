//! The uniform exchange capability set (§4.1). The factory elsewhere keeps
//! two logical roles decoupled from implementation: a **trading** exchange
//! (changeable at runtime) and a **data** exchange (hardcoded to Kraken,
//! since its candle API is authoritative). Both roles are just instances of
//! the same `Exchange` trait.

pub mod auth;
pub mod error;
pub mod kraken;
pub mod types;

pub use error::ExchangeError;
pub use kraken::{KrakenCredentials, KrakenExchange};
pub use types::{Balance, OrderAck, OrderBook, OrderBookLevel, OrderStatus, OrderStatusKind, SubmitOrderRequest, Ticker};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use core_types::{Candle, ExchangeId, Interval, Pair, TradeFill};
use rust_decimal::Decimal;

/// Common interface every venue implements. Each implementation declares its
/// own fee schedule; `get_order_book` is optional and defaults to
/// `ExchangeError::Unsupported` for venues that don't expose depth.
#[async_trait]
pub trait Exchange: Send + Sync {
    fn id(&self) -> ExchangeId;
    fn taker_fee_pct(&self) -> Decimal;
    fn maker_fee_pct(&self) -> Decimal;

    async fn get_ticker(&self, pair: &Pair) -> Result<Ticker, ExchangeError>;
    async fn get_ohlc(&self, pair: &Pair, interval: Interval, limit: u32) -> Result<Vec<Candle>, ExchangeError>;
    async fn get_balance(&self) -> Result<Vec<Balance>, ExchangeError>;

    async fn get_order_book(&self, pair: &Pair) -> Result<OrderBook, ExchangeError> {
        let _ = pair;
        Err(ExchangeError::Unsupported("order book depth".to_string()))
    }

    async fn submit_order(&self, request: SubmitOrderRequest) -> Result<OrderAck, ExchangeError>;
    async fn get_order_status(&self, order_id: &str) -> Result<OrderStatus, ExchangeError>;
    async fn cancel_order(&self, order_id: &str) -> Result<(), ExchangeError>;
    async fn list_fills(&self, since: DateTime<Utc>) -> Result<Vec<TradeFill>, ExchangeError>;
}
