//! The three periodic jobs that run independently of the engine's own tick
//! cadence (§4.11): a heartbeat, a daily operator report, and a daily FIFO
//! sync against each exchange. The engine worker itself owns tick cadence
//! and overlap-skipping (§5); this crate never drives the tick loop.

use std::sync::Arc;

use database::DbRepository;
use events::EngineEvent;
use exchange::Exchange;
use tokio::sync::mpsc::Sender;
use tokio::task::JoinHandle;

pub mod clock;
pub mod daily_report;
pub mod daily_sync;
pub mod error;
pub mod heartbeat;

pub use error::SchedulerError;

/// Handles to the three spawned background jobs, kept alive for the
/// lifetime of the process.
pub struct ScheduledJobs {
    pub heartbeat: JoinHandle<()>,
    pub daily_report: JoinHandle<()>,
    pub daily_sync: JoinHandle<()>,
}

/// Spawns the heartbeat, daily report, and daily FIFO sync jobs onto the
/// current Tokio runtime.
pub fn spawn(
    repository: DbRepository,
    exchanges: Vec<Arc<dyn Exchange>>,
    operator_tz_offset_hours: i32,
    tx: Sender<EngineEvent>,
) -> ScheduledJobs {
    let heartbeat = tokio::spawn(heartbeat::run(tx.clone()));
    let daily_report = tokio::spawn(daily_report::run(repository.clone(), operator_tz_offset_hours, tx.clone()));
    let daily_sync = tokio::spawn(daily_sync::run(exchanges, repository, operator_tz_offset_hours, tx));

    ScheduledJobs { heartbeat, daily_report, daily_sync }
}
