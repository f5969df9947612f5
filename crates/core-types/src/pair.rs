use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// A symbolic asset quoted against fiat/stable, e.g. `BTC/USD`.
///
/// Invariant: `base`/`quote` are always upper-cased, and `min_order_size`,
/// `qty_step`, `price_step` are obtained from the trading exchange rather
/// than guessed — they are venue-specific precision facts, not constants.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pair {
    pub base: String,
    pub quote: String,
    pub min_order_size: Decimal,
    pub qty_step: Decimal,
    pub price_step: Decimal,
}

impl Pair {
    pub fn new(
        base: &str,
        quote: &str,
        min_order_size: Decimal,
        qty_step: Decimal,
        price_step: Decimal,
    ) -> Result<Self, CoreError> {
        if base.is_empty() || quote.is_empty() {
            return Err(CoreError::InvalidPair(format!("{base}/{quote}")));
        }
        Ok(Self {
            base: base.to_uppercase(),
            quote: quote.to_uppercase(),
            min_order_size,
            qty_step,
            price_step,
        })
    }

    /// Parses the canonical `BASE/QUOTE` string form. Precision facts default
    /// to zero and must be populated from the trading exchange before use in
    /// sizing; this constructor only establishes the symbolic identity.
    pub fn parse(symbol: &str) -> Result<Self, CoreError> {
        let (base, quote) = symbol
            .split_once('/')
            .ok_or_else(|| CoreError::InvalidPair(symbol.to_string()))?;
        Self::new(base, quote, Decimal::ZERO, Decimal::ZERO, Decimal::ZERO)
    }

    /// The canonical `BASE/QUOTE` form used as a map key and in logs.
    pub fn symbol(&self) -> String {
        format!("{}/{}", self.base, self.quote)
    }

    /// Rounds a raw quantity down to the pair's step size.
    pub fn round_down_to_step(&self, qty: Decimal) -> Decimal {
        if self.qty_step.is_zero() {
            return qty;
        }
        (qty / self.qty_step).floor() * self.qty_step
    }

    /// Rounds a raw price to the pair's tick size.
    pub fn round_to_price_step(&self, price: Decimal) -> Decimal {
        if self.price_step.is_zero() {
            return price;
        }
        (price / self.price_step).round() * self.price_step
    }
}

impl std::fmt::Display for Pair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn parses_canonical_symbol() {
        let pair = Pair::parse("BTC/USD").unwrap();
        assert_eq!(pair.base, "BTC");
        assert_eq!(pair.quote, "USD");
        assert_eq!(pair.symbol(), "BTC/USD");
    }

    #[test]
    fn rejects_malformed_symbol() {
        assert!(Pair::parse("BTCUSD").is_err());
    }

    #[test]
    fn rounds_quantity_down_to_step() {
        let pair = Pair::new("BTC", "USD", dec!(0.0001), dec!(0.0001), dec!(0.1)).unwrap();
        assert_eq!(pair.round_down_to_step(dec!(0.00019)), dec!(0.0001));
    }
}
