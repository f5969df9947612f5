use std::collections::HashSet;
use std::sync::Mutex;

/// In-process guard against submitting the same `clientOrderId` twice within
/// a single engine run. This is a defense-in-depth measure alongside the
/// database's unique constraint on `trade_fills.client_order_id` — the guard
/// catches the duplicate before a network round-trip, the constraint catches
/// it if two processes race.
#[derive(Debug, Default)]
pub struct IdempotencyGuard {
    seen: Mutex<HashSet<String>>,
}

impl IdempotencyGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reserves `client_order_id`. Returns `true` if this is the first time
    /// it has been seen, `false` if it was already reserved.
    pub fn try_reserve(&self, client_order_id: &str) -> bool {
        let mut seen = self.seen.lock().expect("idempotency guard mutex poisoned");
        seen.insert(client_order_id.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_reservation_succeeds_second_is_rejected() {
        let guard = IdempotencyGuard::new();
        assert!(guard.try_reserve("btcusd-buy-1"));
        assert!(!guard.try_reserve("btcusd-buy-1"));
    }

    #[test]
    fn distinct_ids_do_not_collide() {
        let guard = IdempotencyGuard::new();
        assert!(guard.try_reserve("btcusd-buy-1"));
        assert!(guard.try_reserve("btcusd-buy-2"));
    }
}
