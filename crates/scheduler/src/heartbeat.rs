use std::time::Duration;

use core_types::{BotEvent, BotEventLevel};
use events::EngineEvent;
use tokio::sync::mpsc::Sender;

/// Per §4.11: a throttled heartbeat every 12 hours. The notifier's own
/// dedupe table additionally throttles this to at most 2/hour and 1 per 6h
/// of identical content, so this interval only needs to be roughly right.
pub const INTERVAL: Duration = Duration::from_secs(12 * 3600);

pub async fn run(tx: Sender<EngineEvent>) {
    let mut ticker = tokio::time::interval(INTERVAL);
    // `interval` fires immediately on first `tick()`; `BotStarted` already
    // announces startup, so the first heartbeat should wait a full period.
    ticker.tick().await;
    loop {
        ticker.tick().await;
        let event = BotEvent::new(BotEventLevel::Info, "HEARTBEAT", "engine heartbeat");
        if tx.send(EngineEvent::Bot(event)).await.is_err() {
            tracing::warn!("heartbeat: event channel closed, stopping");
            return;
        }
    }
}
