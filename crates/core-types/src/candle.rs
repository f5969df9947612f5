use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::enums::Interval;

/// A closed (or, for the most recent one, possibly still-forming) OHLCV bar.
///
/// Invariant: the latest candle for a `(pair, interval)` series may be
/// partial; indicator code must exclude it until `is_closed` is true.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    pub open_ts: DateTime<Utc>,
    pub interval: Interval,
    pub open: Decimal,
    pub high: Decimal,
    pub low: Decimal,
    pub close: Decimal,
    pub volume: Decimal,
    pub is_closed: bool,
}

impl Candle {
    pub fn close_ts(&self) -> DateTime<Utc> {
        self.open_ts + chrono::Duration::seconds(self.interval.seconds())
    }
}
