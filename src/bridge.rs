//! Bridges `events::EngineEvent`s produced by the engine/scheduler workers
//! into the notifier's typed `MessageContext` inbox, and persists every
//! `Bot` event into the bounded-retention `bot_events` archive along the
//! way (§4.10).
//!
//! `Fill` events are persisted upstream by the engine itself; this bridge
//! does not re-derive a `TradeBuy`/`TradeSell` card from them, since a raw
//! `TradeFill` carries neither the originating strategy nor a trade's
//! realized gain/loss. The engine's own `POSITION_CLOSED`/`ENTRY_*` `Bot`
//! events already carry operator-readable text and are forwarded as error
//! alerts when they indicate a problem. A richer per-trade card is a
//! natural follow-up once the engine emits a dedicated trade-context event.

use chrono::{DateTime, Utc};
use database::DbRepository;
use events::EngineEvent;
use notifier::MessageContext;
use tokio::sync::mpsc::{Receiver, Sender};

use crate::commands::TickCache;

const DAILY_REPORT_EVENT_TYPE: &str = "DAILY_REPORT_SENT";
const HEARTBEAT_EVENT_TYPE: &str = "HEARTBEAT";

/// Drains `events_rx` until the channel closes, persisting every `Bot`
/// event, mirroring every `Tick` diagnostic into `tick_cache` (so `/estado`
/// and `/exposicion` have something to read), and forwarding a subset of
/// events to `notifier_tx` as rendered `MessageContext`s.
pub async fn run(
    mut events_rx: Receiver<EngineEvent>,
    notifier_tx: Sender<MessageContext>,
    repository: DbRepository,
    tick_cache: TickCache,
    env_tag: String,
    started_at: DateTime<Utc>,
) {
    while let Some(event) = events_rx.recv().await {
        match event {
            EngineEvent::Bot(bot_event) => {
                if let Err(err) = repository.insert_bot_event(&bot_event).await {
                    tracing::error!(error = %err, "failed to archive bot event");
                }

                let context = match bot_event.event_type.as_str() {
                    HEARTBEAT_EVENT_TYPE => Some(MessageContext::Heartbeat {
                        env_tag: env_tag.clone(),
                        uptime_sec: (Utc::now() - started_at).num_seconds().max(0) as u64,
                    }),
                    DAILY_REPORT_EVENT_TYPE => daily_report_context(&repository, &env_tag).await,
                    _ if bot_event.level >= core_types::BotEventLevel::Warn => Some(MessageContext::ErrorAlert {
                        source: bot_event.event_type.clone(),
                        message: bot_event.message.clone(),
                    }),
                    _ => None,
                };

                if let Some(context) = context {
                    send(&notifier_tx, context).await;
                }
            }
            EngineEvent::Positions(snapshot) => {
                send(&notifier_tx, MessageContext::PositionsUpdate { snapshot }).await;
            }
            EngineEvent::Fill(fill) => {
                tracing::info!(pair = %fill.pair, side = ?fill.side, amount = %fill.amount, price = %fill.price, "fill recorded");
            }
            EngineEvent::Tick(diagnostic) => {
                tick_cache.lock().expect("tick cache mutex poisoned").insert(diagnostic.pair.clone(), diagnostic);
            }
            EngineEvent::Connected => {}
        }
    }

    tracing::info!("event bridge shutting down: engine event channel closed");
}

async fn send(tx: &Sender<MessageContext>, context: MessageContext) {
    let notification_type = context.notification_type();
    if let Err(err) = context.validate() {
        tracing::warn!(?notification_type, error = ?err, "bridge built an invalid message context");
        return;
    }
    if tx.send(context).await.is_err() {
        tracing::warn!(?notification_type, "bridge: notifier inbox closed, dropping message");
    }
}

async fn daily_report_context(repository: &DbRepository, env_tag: &str) -> Option<MessageContext> {
    let today_start = Utc::now().date_naive().and_hms_opt(0, 0, 0)?.and_utc();
    let realized_pnl_eur = repository.realized_pnl_eur_since(today_start).await.ok()?;
    let trades_today = repository.disposal_count_since(today_start).await.ok()? as u32;
    let open_positions = repository.all_open_lots().await.ok()?.len() as u32;

    Some(MessageContext::DailyReport { env_tag: env_tag.to_string(), realized_pnl_eur, open_positions, trades_today })
}
