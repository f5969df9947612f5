use exchange::{Exchange, ExchangeError, OrderAck, SubmitOrderRequest};

use crate::error::ExecutorError;

/// Per §4.6/§7: on `NonceError`, retry with a fresh nonce up to this many
/// times before escalating.
pub const MAX_NONCE_RETRIES: u8 = 3;

/// Submits an order, transparently retrying on `ExchangeError::Nonce` up to
/// `MAX_NONCE_RETRIES` times. The exchange implementation is responsible for
/// drawing a fresh nonce on every call, so simply calling `submit_order`
/// again is sufficient. Returns the ack plus the number of retries consumed,
/// so the caller can emit a single consolidated `NONCE_RETRY` notification
/// rather than one per attempt.
pub async fn submit_with_nonce_retry(
    exchange_client: &dyn Exchange,
    request: SubmitOrderRequest,
) -> Result<(OrderAck, u8), ExecutorError> {
    let mut retries = 0u8;
    loop {
        match exchange_client.submit_order(request.clone()).await {
            Ok(ack) => return Ok((ack, retries)),
            Err(ExchangeError::Nonce { attempt }) if retries < MAX_NONCE_RETRIES => {
                retries += 1;
                tracing::warn!(
                    client_order_id = %request.client_order_id,
                    attempt,
                    retries,
                    "nonce rejected by exchange, retrying with a fresh nonce"
                );
            }
            Err(ExchangeError::Nonce { .. }) => {
                tracing::error!(
                    client_order_id = %request.client_order_id,
                    "nonce retries exhausted, escalating"
                );
                return Err(ExecutorError::NonceRetriesExhausted);
            }
            Err(other) => return Err(ExecutorError::Exchange(other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::{DateTime, Utc};
    use core_types::{Candle, ExchangeId, Interval, Pair, TradeFill};
    use exchange::{Balance, OrderBook, OrderStatus, OrderStatusKind, Ticker};
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;
    use std::sync::atomic::{AtomicU8, Ordering};

    struct FlakyExchange {
        nonce_failures_remaining: AtomicU8,
    }

    #[async_trait]
    impl Exchange for FlakyExchange {
        fn id(&self) -> ExchangeId {
            ExchangeId::Kraken
        }
        fn taker_fee_pct(&self) -> Decimal {
            dec!(0.0026)
        }
        fn maker_fee_pct(&self) -> Decimal {
            dec!(0.0016)
        }
        async fn get_ticker(&self, _pair: &Pair) -> Result<Ticker, ExchangeError> {
            unimplemented!()
        }
        async fn get_ohlc(&self, _pair: &Pair, _interval: Interval, _limit: u32) -> Result<Vec<Candle>, ExchangeError> {
            unimplemented!()
        }
        async fn get_balance(&self) -> Result<Vec<Balance>, ExchangeError> {
            unimplemented!()
        }
        async fn get_order_book(&self, _pair: &Pair) -> Result<OrderBook, ExchangeError> {
            unimplemented!()
        }
        async fn submit_order(&self, request: SubmitOrderRequest) -> Result<OrderAck, ExchangeError> {
            let remaining = self.nonce_failures_remaining.load(Ordering::SeqCst);
            if remaining > 0 {
                self.nonce_failures_remaining.store(remaining - 1, Ordering::SeqCst);
                return Err(ExchangeError::Nonce { attempt: remaining });
            }
            Ok(OrderAck {
                order_id: "OID-1".to_string(),
                client_order_id: request.client_order_id,
            })
        }
        async fn get_order_status(&self, _order_id: &str) -> Result<OrderStatus, ExchangeError> {
            unimplemented!()
        }
        async fn cancel_order(&self, _order_id: &str) -> Result<(), ExchangeError> {
            unimplemented!()
        }
        async fn list_fills(&self, _since: DateTime<Utc>) -> Result<Vec<TradeFill>, ExchangeError> {
            unimplemented!()
        }
    }

    fn request() -> SubmitOrderRequest {
        SubmitOrderRequest {
            pair: Pair::parse("BTC/USD").unwrap(),
            side: core_types::OrderSide::Buy,
            order_type: core_types::OrderType::Market,
            amount: dec!(0.01),
            price: None,
            client_order_id: "btcusd-buy-1".to_string(),
        }
    }

    #[tokio::test]
    async fn succeeds_immediately_with_no_nonce_failures() {
        let exchange_client = FlakyExchange { nonce_failures_remaining: AtomicU8::new(0) };
        let (ack, retries) = submit_with_nonce_retry(&exchange_client, request()).await.unwrap();
        assert_eq!(ack.order_id, "OID-1");
        assert_eq!(retries, 0);
    }

    #[tokio::test]
    async fn recovers_after_two_nonce_rejections() {
        let exchange_client = FlakyExchange { nonce_failures_remaining: AtomicU8::new(2) };
        let (ack, retries) = submit_with_nonce_retry(&exchange_client, request()).await.unwrap();
        assert_eq!(ack.order_id, "OID-1");
        assert_eq!(retries, 2);
    }

    #[tokio::test]
    async fn escalates_once_retries_are_exhausted() {
        let exchange_client = FlakyExchange { nonce_failures_remaining: AtomicU8::new(10) };
        let result = submit_with_nonce_retry(&exchange_client, request()).await;
        assert!(matches!(result, Err(ExecutorError::NonceRetriesExhausted)));
    }
}
