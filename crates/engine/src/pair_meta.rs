use core_types::Pair;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::error::EngineError;

/// `Pair::new` requires venue precision facts the `Exchange` trait does not
/// expose as a dedicated call (Kraken/RevolutX both publish asset-pair
/// metadata through a separate, non-uniform endpoint outside §4.1's
/// capability set). Rather than grow the trait for a concern every
/// implementation would answer identically for our configured universe,
/// precision is a small static table here, keyed by base asset, with a
/// conservative default for anything unlisted.
fn precision_for(base: &str) -> (Decimal, Decimal, Decimal) {
    match base {
        "BTC" => (dec!(0.0001), dec!(0.00001), dec!(0.1)),
        "ETH" => (dec!(0.001), dec!(0.0001), dec!(0.01)),
        _ => (dec!(0.01), dec!(0.001), dec!(0.0001)),
    }
}

/// Builds a fully precision-populated `Pair` from its canonical `BASE/QUOTE`
/// symbol.
pub fn resolve_pair(symbol: &str) -> Result<Pair, EngineError> {
    let (base, quote) = symbol
        .split_once('/')
        .ok_or_else(|| EngineError::UnknownPair(symbol.to_string()))?;
    let (min_order_size, qty_step, price_step) = precision_for(base);
    Pair::new(base, quote, min_order_size, qty_step, price_step)
        .map_err(|_| EngineError::UnknownPair(symbol.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_known_base_asset_precision() {
        let pair = resolve_pair("BTC/USD").unwrap();
        assert_eq!(pair.min_order_size, dec!(0.0001));
    }

    #[test]
    fn falls_back_to_conservative_defaults_for_unlisted_assets() {
        let pair = resolve_pair("DOGE/USD").unwrap();
        assert_eq!(pair.min_order_size, dec!(0.01));
    }

    #[test]
    fn rejects_malformed_symbol() {
        assert!(resolve_pair("BTCUSD").is_err());
    }
}
