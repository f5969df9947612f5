use std::sync::Arc;

use chrono::{DateTime, NaiveTime, Utc};
use core_types::{BotEvent, BotEventLevel, OrderSide, SyncMode, SyncRun};
use database::DbRepository;
use events::EngineEvent;
use exchange::Exchange;
use serde_json::json;
use tokio::sync::mpsc::Sender;

use crate::clock::seconds_until_next;
use crate::error::SchedulerError;

/// 08:00 in the operator's configured timezone, per §4.11.
pub fn fire_time() -> NaiveTime {
    NaiveTime::from_hms_opt(8, 0, 0).expect("08:00:00 is always a valid time")
}

/// Fires once a day, fetching fills since the last completed sync run per
/// exchange and re-running the FIFO matcher over the new tail.
pub async fn run(exchanges: Vec<Arc<dyn Exchange>>, repository: DbRepository, tz_offset_hours: i32, tx: Sender<EngineEvent>) {
    loop {
        let wait_secs = seconds_until_next(Utc::now(), fire_time(), tz_offset_hours);
        tokio::time::sleep(std::time::Duration::from_secs(wait_secs as u64)).await;

        match run_once(&exchanges, &repository).await {
            Ok(run) => {
                let event = BotEvent::new(
                    BotEventLevel::Info,
                    "FISCO_SYNC_COMPLETE",
                    format!("sync run {} completed across {} exchange(s)", run.run_id, exchanges.len()),
                );
                if tx.send(EngineEvent::Bot(event)).await.is_err() {
                    tracing::warn!("daily sync: event channel closed, stopping");
                    return;
                }
            }
            Err(err) => {
                tracing::error!(error = %err, "daily FIFO sync failed");
                let event = BotEvent::new(BotEventLevel::Error, "FISCO_SYNC_FAILED", err.to_string());
                let _ = tx.send(EngineEvent::Bot(event)).await;
            }
        }
    }
}

async fn run_once(exchanges: &[Arc<dyn Exchange>], repository: &DbRepository) -> Result<SyncRun, SchedulerError> {
    let mut run = SyncRun::start(SyncMode::Auto, "scheduler");
    repository.insert_sync_run(&run).await?;

    let mut per_exchange = serde_json::Map::new();
    for exchange_client in exchanges {
        let exchange_id = exchange_client.id();
        let since = last_completed_watermark(repository).await?;
        let summary = sync_one_exchange(exchange_client.as_ref(), repository, since).await?;
        per_exchange.insert(exchange_id.label().to_string(), summary);
    }

    run.complete(serde_json::Value::Object(per_exchange));
    repository.update_sync_run(&run).await?;
    Ok(run)
}

async fn sync_one_exchange(
    exchange_client: &dyn Exchange,
    repository: &DbRepository,
    since: DateTime<Utc>,
) -> Result<serde_json::Value, SchedulerError> {
    let fills = exchange_client.list_fills(since).await?;
    let mut new_lots = 0u32;
    let mut new_disposals = 0u32;

    for fill in &fills {
        match fill.side {
            OrderSide::Buy => {
                let lot = accountant::record_buy(fill, fill.price, fill.fee_eur);
                repository.insert_lot(&lot).await?;
                new_lots += 1;
            }
            OrderSide::Sell => {
                let mut open_lots = repository.open_lots(&fill.pair, fill.exchange).await?;
                let outcome =
                    accountant::record_sell(fill, fill.price, exchange_client.taker_fee_pct(), &mut open_lots);
                accountant::verify_disposal_invariant(fill, &outcome)?;
                for lot in &open_lots {
                    repository.update_lot_remaining(lot.lot_id, lot.remaining_qty, lot.is_closed).await?;
                }
                for disposal in &outcome.disposals {
                    repository.insert_disposal(disposal).await?;
                    new_disposals += 1;
                }
            }
        }
    }

    Ok(json!({
        "fills_processed": fills.len(),
        "new_lots": new_lots,
        "new_disposals": new_disposals,
    }))
}

async fn last_completed_watermark(repository: &DbRepository) -> Result<DateTime<Utc>, SchedulerError> {
    let recent = repository.recent_sync_runs(1).await?;
    Ok(recent
        .into_iter()
        .next()
        .and_then(|run| run.completed_at)
        .unwrap_or_else(|| Utc::now() - chrono::Duration::hours(25)))
}
