use std::time::Duration;

use exchange::{Exchange, OrderStatus, OrderStatusKind};
use tokio::time::Instant;

use crate::error::ExecutorError;

/// Outcome of polling an order to one of its terminal states, per §4.6:
/// `filled`, `partiallyFilled`, `canceled`, or `rejected`. A submission still
/// open past `orderTimeoutSec` is canceled and reported as `TimedOut`.
#[derive(Debug, Clone)]
pub enum PollOutcome {
    Filled(OrderStatus),
    PartiallyFilled(OrderStatus),
    Canceled,
    Rejected,
    TimedOut,
}

/// Polls `getOrderStatus` with exponential backoff (doubling each attempt,
/// capped at `max_interval`) until a terminal status is reached or
/// `timeout` elapses, in which case the order is canceled.
pub async fn poll_until_terminal(
    exchange_client: &dyn Exchange,
    order_id: &str,
    timeout: Duration,
    initial_interval: Duration,
    max_interval: Duration,
) -> Result<PollOutcome, ExecutorError> {
    let deadline = Instant::now() + timeout;
    let mut interval = initial_interval;

    loop {
        let status = exchange_client.get_order_status(order_id).await?;
        match status.status {
            OrderStatusKind::Filled => return Ok(PollOutcome::Filled(status)),
            OrderStatusKind::PartiallyFilled => return Ok(PollOutcome::PartiallyFilled(status)),
            OrderStatusKind::Canceled => return Ok(PollOutcome::Canceled),
            OrderStatusKind::Rejected => return Ok(PollOutcome::Rejected),
            OrderStatusKind::Open => {
                if Instant::now() >= deadline {
                    tracing::warn!(order_id, "order still open past timeout, canceling");
                    exchange_client.cancel_order(order_id).await?;
                    return Ok(PollOutcome::TimedOut);
                }
                tokio::time::sleep(interval).await;
                interval = (interval * 2).min(max_interval);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::{DateTime, Utc};
    use core_types::{Candle, ExchangeId, Interval, Pair, TradeFill};
    use exchange::{Balance, ExchangeError, OrderAck, OrderBook, SubmitOrderRequest, Ticker};
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;
    use std::sync::atomic::{AtomicU32, Ordering};

    struct SlowFillExchange {
        polls_until_filled: AtomicU32,
    }

    #[async_trait]
    impl Exchange for SlowFillExchange {
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
        async fn submit_order(&self, _request: SubmitOrderRequest) -> Result<OrderAck, ExchangeError> {
            unimplemented!()
        }
        async fn get_order_status(&self, _order_id: &str) -> Result<OrderStatus, ExchangeError> {
            let remaining = self.polls_until_filled.load(Ordering::SeqCst);
            if remaining == 0 {
                Ok(OrderStatus {
                    order_id: "OID-1".to_string(),
                    status: OrderStatusKind::Filled,
                    filled_qty: dec!(0.01),
                    average_price: dec!(50000),
                })
            } else {
                self.polls_until_filled.store(remaining - 1, Ordering::SeqCst);
                Ok(OrderStatus {
                    order_id: "OID-1".to_string(),
                    status: OrderStatusKind::Open,
                    filled_qty: Decimal::ZERO,
                    average_price: Decimal::ZERO,
                })
            }
        }
        async fn cancel_order(&self, _order_id: &str) -> Result<(), ExchangeError> {
            unimplemented!()
        }
        async fn list_fills(&self, _since: DateTime<Utc>) -> Result<Vec<TradeFill>, ExchangeError> {
            unimplemented!()
        }
    }

    struct NeverFillsExchange;

    #[async_trait]
    impl Exchange for NeverFillsExchange {
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
        async fn submit_order(&self, _request: SubmitOrderRequest) -> Result<OrderAck, ExchangeError> {
            unimplemented!()
        }
        async fn get_order_status(&self, _order_id: &str) -> Result<OrderStatus, ExchangeError> {
            Ok(OrderStatus {
                order_id: "OID-1".to_string(),
                status: OrderStatusKind::Open,
                filled_qty: Decimal::ZERO,
                average_price: Decimal::ZERO,
            })
        }
        async fn cancel_order(&self, _order_id: &str) -> Result<(), ExchangeError> {
            Ok(())
        }
        async fn list_fills(&self, _since: DateTime<Utc>) -> Result<Vec<TradeFill>, ExchangeError> {
            unimplemented!()
        }
    }

    #[tokio::test]
    async fn returns_filled_once_the_venue_reports_it() {
        let exchange_client = SlowFillExchange { polls_until_filled: AtomicU32::new(2) };
        let outcome = poll_until_terminal(
            &exchange_client,
            "OID-1",
            Duration::from_secs(10),
            Duration::from_millis(1),
            Duration::from_millis(5),
        )
        .await
        .unwrap();
        assert!(matches!(outcome, PollOutcome::Filled(_)));
    }

    #[tokio::test]
    async fn cancels_and_reports_timed_out_past_the_deadline() {
        let exchange_client = NeverFillsExchange;
        let outcome = poll_until_terminal(
            &exchange_client,
            "OID-1",
            Duration::from_millis(5),
            Duration::from_millis(1),
            Duration::from_millis(2),
        )
        .await
        .unwrap();
        assert!(matches!(outcome, PollOutcome::TimedOut));
    }
}
