use core_types::OrderSide;
use core_types::Pair;

/// Derives a `clientOrderId` from `{pair, side, tickId}` per §4.6. Identical
/// inputs always produce the identical id, which is what makes duplicate
/// submission detection (and Kraken's `userref` hashing downstream) possible.
pub fn derive_client_order_id(pair: &Pair, side: OrderSide, tick_id: u64) -> String {
    let side_label = match side {
        OrderSide::Buy => "buy",
        OrderSide::Sell => "sell",
    };
    format!("{}-{}-{}", pair.symbol().replace('/', ""), side_label, tick_id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_inputs_produce_the_same_id() {
        let pair = Pair::parse("BTC/USD").unwrap();
        let a = derive_client_order_id(&pair, OrderSide::Buy, 42);
        let b = derive_client_order_id(&pair, OrderSide::Buy, 42);
        assert_eq!(a, b);
    }

    #[test]
    fn different_ticks_produce_different_ids() {
        let pair = Pair::parse("BTC/USD").unwrap();
        let a = derive_client_order_id(&pair, OrderSide::Buy, 42);
        let b = derive_client_order_id(&pair, OrderSide::Buy, 43);
        assert_ne!(a, b);
    }
}
