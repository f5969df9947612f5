use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::enums::ExchangeId;

/// An open or partially-open BUY-side inventory unit.
///
/// Ownership: created on a BUY fill; mutated only by the accountant, which
/// decrements `remaining_qty` as sells are matched against it in FIFO order.
/// `pair` is stored as the canonical `BASE/QUOTE` symbol rather than the full
/// `Pair` type, matching how the row is actually persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Lot {
    pub lot_id: Uuid,
    pub pair: String,
    pub exchange: ExchangeId,
    pub acquired_at: DateTime<Utc>,
    pub quantity: Decimal,
    pub remaining_qty: Decimal,
    pub unit_cost_eur: Decimal,
    pub cost_eur: Decimal,
    pub fee_eur: Decimal,
    pub is_closed: bool,
}

impl Lot {
    /// Consumes up to `qty` from this lot's remaining quantity, returning the
    /// amount actually consumed (never more than what was open).
    pub fn consume(&mut self, qty: Decimal, epsilon: Decimal) -> Decimal {
        let consumed = qty.min(self.remaining_qty);
        self.remaining_qty -= consumed;
        if self.remaining_qty <= epsilon {
            self.remaining_qty = Decimal::ZERO;
            self.is_closed = true;
        }
        consumed
    }
}
