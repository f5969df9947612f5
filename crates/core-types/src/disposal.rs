use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A SELL-side match against one lot, in FIFO order. Append-only once
/// created; a single SELL fill relates to N disposals.
///
/// `lot_id = None` marks a short disposal: a sell with insufficient
/// historical buy history to fully back it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Disposal {
    pub disposal_id: Uuid,
    pub sell_fill_id: Uuid,
    pub lot_id: Option<Uuid>,
    pub quantity: Decimal,
    pub proceeds_eur: Decimal,
    pub cost_basis_eur: Decimal,
    pub gain_loss_eur: Decimal,
    pub disposed_at: DateTime<Utc>,
}

impl Disposal {
    pub fn is_short(&self) -> bool {
        self.lot_id.is_none()
    }
}
