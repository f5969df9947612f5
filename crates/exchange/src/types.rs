use core_types::{OrderSide, OrderType, Pair};
use rust_decimal::Decimal;

/// Best bid/ask/last snapshot for a pair.
#[derive(Debug, Clone, PartialEq)]
pub struct Ticker {
    pub pair: Pair,
    pub bid: Decimal,
    pub ask: Decimal,
    pub last: Decimal,
}

impl Ticker {
    pub fn mid(&self) -> Decimal {
        (self.bid + self.ask) / Decimal::from(2)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrderBookLevel {
    pub price: Decimal,
    pub quantity: Decimal,
}

/// Optional per §4.1; venues that don't expose depth return
/// `ExchangeError::Unsupported` instead of implementing this.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderBook {
    pub bids: Vec<OrderBookLevel>,
    pub asks: Vec<OrderBookLevel>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Balance {
    pub asset: String,
    pub free: Decimal,
    pub total: Decimal,
}

/// The uniform submission shape per §4.1: `{pair, side, type, amount, price?,
/// clientOrderId}`.
#[derive(Debug, Clone, PartialEq)]
pub struct SubmitOrderRequest {
    pub pair: Pair,
    pub side: OrderSide,
    pub order_type: OrderType,
    pub amount: Decimal,
    pub price: Option<Decimal>,
    pub client_order_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderAck {
    pub order_id: String,
    pub client_order_id: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderStatusKind {
    Open,
    Filled,
    PartiallyFilled,
    Canceled,
    Rejected,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OrderStatus {
    pub order_id: String,
    pub status: OrderStatusKind,
    pub filled_qty: Decimal,
    pub average_price: Decimal,
}
