use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::enums::ExchangeId;
use crate::pair::Pair;

/// Engine in-memory view of an open position. Mirrors the persisted lot plus
/// live exit-management fields; evicted from memory on close.
///
/// Invariant: `amount > 0` implies the backing lot is open. The engine holds
/// at most one logical BUY-in-flight per `(pair, exchange)` at a time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpenPosition {
    pub lot_id: Uuid,
    pub pair: Pair,
    pub exchange: ExchangeId,
    pub amount: Decimal,
    pub entry_price: Decimal,
    pub opened_at: DateTime<Utc>,
    pub be_armed: bool,
    pub trailing_armed: bool,
    pub trailing_high_water_mark: Decimal,
    pub stop_price: Decimal,
    pub take_profit_price: Decimal,
}

impl OpenPosition {
    /// Establishes the initial exit invariants on entry per the stop-loss and
    /// take-profit percentages configured for the pair.
    pub fn new(
        lot_id: Uuid,
        pair: Pair,
        exchange: ExchangeId,
        amount: Decimal,
        entry_price: Decimal,
        opened_at: DateTime<Utc>,
        stop_loss_pct: Decimal,
        take_profit_pct: Decimal,
    ) -> Self {
        Self {
            lot_id,
            pair,
            exchange,
            amount,
            entry_price,
            opened_at,
            be_armed: false,
            trailing_armed: false,
            trailing_high_water_mark: entry_price,
            stop_price: entry_price * (Decimal::ONE - stop_loss_pct),
            take_profit_price: entry_price * (Decimal::ONE + take_profit_pct),
        }
    }
}
