use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Per-pair EMA of the observed hidden spread between executed BUY price and
/// reference mid, used to correct reservation sizing on venues whose quoted
/// price embeds a markup. See the markup tracker for the update rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarkupSample {
    pub pair: String,
    pub ema_pct: Decimal,
    pub sample_count: u32,
}

impl MarkupSample {
    pub fn seed(pair: impl Into<String>, fallback_pct: Decimal) -> Self {
        Self {
            pair: pair.into(),
            ema_pct: fallback_pct,
            sample_count: 0,
        }
    }
}
