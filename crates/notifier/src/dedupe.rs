use std::collections::{hash_map::DefaultHasher, HashMap};
use std::hash::{Hash, Hasher};
use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::contexts::{MessageContext, NotificationType};

/// One row of the §4.10 dedupe/throttle table.
#[derive(Debug, Clone, Copy)]
pub struct ThrottleRule {
    /// Minimum gap between two sends carrying the same rendered content.
    pub min_interval: Duration,
    /// Minimum gap between any two sends of this type, regardless of content.
    pub type_throttle: Duration,
    /// Ceiling on sends of this type within a rolling 1-hour window.
    pub max_per_hour: u32,
}

const fn rule(min_interval_secs: u64, type_throttle_secs: u64, max_per_hour: u32) -> ThrottleRule {
    ThrottleRule {
        min_interval: Duration::from_secs(min_interval_secs),
        type_throttle: Duration::from_secs(type_throttle_secs),
        max_per_hour,
    }
}

pub fn rule_for(notification_type: NotificationType) -> ThrottleRule {
    match notification_type {
        NotificationType::PositionsUpdate => rule(300, 120, 12),
        NotificationType::Heartbeat => rule(6 * 3600, 3600, 2),
        NotificationType::DailyReport => rule(12 * 3600, 6 * 3600, 2),
        NotificationType::EntryIntent => rule(900, 300, 8),
        NotificationType::TradeBuy => rule(10, 5, 60),
        NotificationType::TradeSell => rule(10, 5, 60),
        NotificationType::Error => rule(300, 60, 20),
        NotificationType::RegimeChange => rule(300, 180, 10),
        // Not named in the spec's table; these fire rarely (startup, daily
        // fiscal sync), so a conservative one-per-hour ceiling is plenty.
        NotificationType::BotStarted => rule(3600, 60, 5),
        NotificationType::FiscoSyncSummary => rule(3600, 300, 4),
        NotificationType::FiscoReportGenerated => rule(3600, 300, 4),
    }
}

fn content_hash(body: &str) -> u64 {
    let mut hasher = DefaultHasher::new();
    body.hash(&mut hasher);
    hasher.finish()
}

#[derive(Debug, Clone)]
struct TypeState {
    last_sent_at: Option<DateTime<Utc>>,
    last_content_hash: Option<u64>,
    last_content_sent_at: Option<DateTime<Utc>>,
    sent_at: Vec<DateTime<Utc>>,
}

impl TypeState {
    fn new() -> Self {
        Self { last_sent_at: None, last_content_hash: None, last_content_sent_at: None, sent_at: Vec::new() }
    }
}

/// Owned exclusively by the notifier worker, per §5's concurrency model —
/// there is exactly one writer, so no internal locking is needed here.
pub struct DedupeState {
    by_type: HashMap<&'static str, TypeState>,
    entry_intent_buckets: HashMap<(String, String, i64), DateTime<Utc>>,
}

/// Why a context was allowed through or suppressed, useful for logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Send,
    SuppressedIdenticalContent,
    SuppressedTypeThrottle,
    SuppressedHourlyCap,
    SuppressedEntryIntentBucket,
}

impl DedupeState {
    pub fn new() -> Self {
        Self { by_type: HashMap::new(), entry_intent_buckets: HashMap::new() }
    }

    /// Evaluates whether `context` (already rendered to `body`) should be
    /// sent at `now`. Records the send immediately when the decision is
    /// `Send` — callers must not call this twice for the same attempt.
    pub fn evaluate(&mut self, context: &MessageContext, body: &str, now: DateTime<Utc>) -> Decision {
        self.gc(now);

        let notification_type = context.notification_type();
        let rule = rule_for(notification_type);
        let hash = content_hash(body);

        if let MessageContext::EntryIntent { pair, side, .. } = context {
            let bucket = now.timestamp() / 900;
            let key = (pair.clone(), format!("{side:?}"), bucket);
            if self.entry_intent_buckets.contains_key(&key) {
                return Decision::SuppressedEntryIntentBucket;
            }
            self.entry_intent_buckets.insert(key, now);
        }

        let state = self.by_type.entry(notification_type.key()).or_insert_with(TypeState::new);

        if let (Some(last_hash), Some(last_at)) = (state.last_content_hash, state.last_content_sent_at) {
            if last_hash == hash && now - last_at < chrono::Duration::from_std(rule.min_interval).unwrap() {
                return Decision::SuppressedIdenticalContent;
            }
        }

        if let Some(last_at) = state.last_sent_at {
            if now - last_at < chrono::Duration::from_std(rule.type_throttle).unwrap() {
                return Decision::SuppressedTypeThrottle;
            }
        }

        let window_start = now - chrono::Duration::hours(1);
        let count_in_window = state.sent_at.iter().filter(|t| **t >= window_start).count() as u32;
        if count_in_window >= rule.max_per_hour {
            return Decision::SuppressedHourlyCap;
        }

        state.last_sent_at = Some(now);
        state.last_content_hash = Some(hash);
        state.last_content_sent_at = Some(now);
        state.sent_at.push(now);

        Decision::Send
    }

    /// Drops bookkeeping older than 24h, per §4.10.
    fn gc(&mut self, now: DateTime<Utc>) {
        let cutoff = now - chrono::Duration::hours(24);
        for state in self.by_type.values_mut() {
            state.sent_at.retain(|t| *t >= cutoff);
        }
        self.entry_intent_buckets.retain(|_, t| *t >= cutoff);
    }
}

impl Default for DedupeState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_types::StrategyId;
    use rust_decimal_macros::dec;

    fn buy(pair: &str) -> MessageContext {
        MessageContext::TradeBuy {
            pair: pair.to_string(),
            price: dec!(100),
            quantity: dec!(1),
            strategy: StrategyId::Momentum,
        }
    }

    #[test]
    fn identical_content_within_min_interval_is_suppressed() {
        let mut state = DedupeState::new();
        let now = Utc::now();
        let ctx = buy("BTC/USD");
        let body = ctx.render();

        assert_eq!(state.evaluate(&ctx, &body, now), Decision::Send);
        assert_eq!(
            state.evaluate(&ctx, &body, now + chrono::Duration::seconds(2)),
            Decision::SuppressedIdenticalContent
        );
    }

    #[test]
    fn different_content_respects_type_throttle_not_min_interval() {
        let mut state = DedupeState::new();
        let now = Utc::now();
        let ctx_a = buy("BTC/USD");
        let ctx_b = buy("ETH/USD");

        assert_eq!(state.evaluate(&ctx_a, &ctx_a.render(), now), Decision::Send);
        // trade_buy type_throttle is 5s; 2s later a different body still throttles.
        assert_eq!(
            state.evaluate(&ctx_b, &ctx_b.render(), now + chrono::Duration::seconds(2)),
            Decision::SuppressedTypeThrottle
        );
    }

    #[test]
    fn hourly_cap_is_enforced() {
        let mut state = DedupeState::new();
        let now = Utc::now();
        for i in 0..60 {
            let ctx = buy("BTC/USD");
            let body = format!("{}-{i}", ctx.render());
            let sent_at = now + chrono::Duration::seconds(i * 11);
            let decision = state.evaluate(&ctx, &body, sent_at);
            if i < 60 {
                assert_eq!(decision, Decision::Send, "send #{i} should succeed");
            }
        }
        let ctx = buy("BTC/USD");
        let body = format!("{}-overflow", ctx.render());
        let decision = state.evaluate(&ctx, &body, now + chrono::Duration::seconds(60 * 11));
        assert_eq!(decision, Decision::SuppressedHourlyCap);
    }

    #[test]
    fn entry_intent_dedupes_within_the_same_fifteen_minute_bucket() {
        use core_types::Side;

        let mut state = DedupeState::new();
        let now = Utc::now();
        let ctx = MessageContext::EntryIntent {
            pair: "BTC/USD".to_string(),
            side: Side::Buy,
            confidence: dec!(0.8),
            reason: "momentum breakout".to_string(),
        };

        assert_eq!(state.evaluate(&ctx, &ctx.render(), now), Decision::Send);
        assert_eq!(
            state.evaluate(&ctx, &ctx.render(), now + chrono::Duration::minutes(5)),
            Decision::SuppressedEntryIntentBucket
        );
    }
}
