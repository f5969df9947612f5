use chrono::{FixedOffset, NaiveTime, Utc};
use core_types::{BotEvent, BotEventLevel};
use database::DbRepository;
use events::EngineEvent;
use tokio::sync::mpsc::Sender;

use crate::clock::seconds_until_next;
use crate::error::SchedulerError;

/// 14:00 in the operator's configured timezone, per §4.11.
pub fn fire_time() -> NaiveTime {
    NaiveTime::from_hms_opt(14, 0, 0).expect("14:00:00 is always a valid time")
}

const EVENT_TYPE: &str = "DAILY_REPORT_SENT";

/// Fires once a day at [`fire_time`] local time, guarded against double-send
/// across restarts by checking `bot_events` for today's guard event before
/// emitting — rather than a dedicated "last report date" column, the
/// existing bounded-retention event log already records this cheaply.
pub async fn run(repository: DbRepository, tz_offset_hours: i32, tx: Sender<EngineEvent>) {
    loop {
        let wait_secs = seconds_until_next(Utc::now(), fire_time(), tz_offset_hours);
        tokio::time::sleep(std::time::Duration::from_secs(wait_secs as u64)).await;

        match already_sent_today(&repository, tz_offset_hours).await {
            Ok(true) => {
                tracing::debug!("daily report already sent today, skipping");
                continue;
            }
            Ok(false) => {}
            Err(err) => {
                tracing::error!(error = %err, "daily report guard check failed, skipping this cycle");
                continue;
            }
        }

        let guard_event = BotEvent::new(BotEventLevel::Info, EVENT_TYPE, "daily report emitted");
        if let Err(err) = repository.insert_bot_event(&guard_event).await {
            tracing::error!(error = %err, "failed to persist daily report guard event");
        }
        if tx.send(EngineEvent::Bot(guard_event)).await.is_err() {
            tracing::warn!("daily report: event channel closed, stopping");
            return;
        }
    }
}

async fn already_sent_today(repository: &DbRepository, tz_offset_hours: i32) -> Result<bool, SchedulerError> {
    let offset = FixedOffset::east_opt(tz_offset_hours * 3600).expect("tz_offset_hours in range");
    let today = Utc::now().with_timezone(&offset).date_naive();

    let recent = repository.recent_bot_events(20).await?;
    Ok(recent
        .iter()
        .any(|event| event.event_type == EVENT_TYPE && event.ts.with_timezone(&offset).date_naive() == today))
}
