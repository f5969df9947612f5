use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::enums::{ExchangeId, OrderSide};

/// Append-only record of an executed (or in-flight) exchange fill.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct TradeFill {
    pub fill_id: Uuid,
    pub exchange: ExchangeId,
    pub pair: String,
    pub side: OrderSide,
    pub price: Decimal,
    pub amount: Decimal,
    pub cost: Decimal,
    pub fee_eur: Decimal,
    pub executed_at: DateTime<Utc>,
    pub order_id: String,
    pub client_order_id: String,
    pub lot_id: Option<Uuid>,
}
