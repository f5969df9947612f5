//! Dispatches inbound Telegram commands (§4.10) to the repository and the
//! live tick-diagnostic cache, rendering a plain-text reply. This is
//! intentionally a binary-level concern rather than `notifier`'s: a full
//! answer needs state from `database`, the exchange, and the engine's last
//! tick, which no single crate in the workspace owns together.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::Utc;
use core_types::ExchangeId;
use database::DbRepository;
use events::TickDiagnostic;
use notifier::Command;

/// Shared, lock-protected cache of the most recent per-pair tick diagnostic,
/// updated by the event bridge and read by `/estado` and `/exposicion`.
pub type TickCache = Arc<Mutex<HashMap<String, TickDiagnostic>>>;

pub fn new_tick_cache() -> TickCache {
    Arc::new(Mutex::new(HashMap::new()))
}

pub struct CommandContext {
    pub repository: DbRepository,
    pub tick_cache: TickCache,
    pub started_at: chrono::DateTime<Utc>,
    pub env_tag: String,
}

/// Renders a plain-text reply for `command`. Never panics on bad/missing
/// data — a query failure becomes an apologetic reply rather than a dropped
/// message, since this runs inside the singleton inbound poller loop.
pub async fn dispatch(command: Command, ctx: &CommandContext) -> String {
    match command {
        Command::Estado => render_estado(ctx).await,
        Command::Balance { exchange } => render_balance(ctx, exchange).await,
        Command::Cartera => render_cartera(ctx).await,
        Command::Posiciones => render_posiciones(ctx).await,
        Command::Ganancias => render_ganancias(ctx).await,
        Command::Exposicion => render_exposicion(ctx).await,
        Command::Ultimas { n, exchange } => render_ultimas(ctx, n, exchange).await,
        Command::Logs { n, level, kind, page } => render_logs(ctx, n, level, kind, page).await,
        Command::Log { id } => render_log(ctx, id).await,
        Command::Config => render_config(ctx).await,
        Command::Uptime => render_uptime(ctx),
        Command::Menu | Command::Ayuda => render_menu(),
        Command::Channels => render_channels(ctx).await,
        Command::Pausar => set_dry_run(ctx, true).await,
        Command::Reanudar => set_dry_run(ctx, false).await,
        Command::InformeFiscal => render_informe_fiscal(ctx).await,
        Command::RefreshCommands => "Command list refreshed.".to_string(),
    }
}

async fn render_estado(ctx: &CommandContext) -> String {
    let config = match ctx.repository.get_bot_config().await {
        Ok(config) => config,
        Err(err) => return format!("Could not read bot config: {err}"),
    };
    let cache = ctx.tick_cache.lock().expect("tick cache mutex poisoned");
    format!(
        "Status: {}\nStrategy: {:?}\nRisk level: {:?}\nPairs tracked: {}\nPairs with a live diagnostic: {}",
        if config.dry_run_mode { "PAUSED (dry run)" } else { "RUNNING" },
        config.strategy,
        config.risk_level,
        config.active_pairs.len(),
        cache.len(),
    )
}

async fn render_balance(ctx: &CommandContext, exchange: Option<String>) -> String {
    let target = match exchange.as_deref() {
        Some("revolutx") => ExchangeId::RevolutX,
        _ => ExchangeId::Kraken,
    };
    match ctx.repository.all_open_lots().await {
        Ok(lots) => {
            let total: rust_decimal::Decimal =
                lots.iter().filter(|lot| lot.exchange == target).map(|lot| lot.remaining_qty * lot.unit_cost_eur).sum();
            format!("Open-lot cost basis on {}: {:.2} EUR", target.label(), total)
        }
        Err(err) => format!("Could not read balances: {err}"),
    }
}

async fn render_cartera(ctx: &CommandContext) -> String {
    match ctx.repository.all_open_lots().await {
        Ok(lots) => {
            let total_cost: rust_decimal::Decimal = lots.iter().map(|lot| lot.remaining_qty * lot.unit_cost_eur).sum();
            format!("Portfolio: {} open lot(s), {:.2} EUR cost basis", lots.len(), total_cost)
        }
        Err(err) => format!("Could not read portfolio: {err}"),
    }
}

async fn render_posiciones(ctx: &CommandContext) -> String {
    match ctx.repository.all_open_lots().await {
        Ok(lots) if lots.is_empty() => "No open positions.".to_string(),
        Ok(lots) => lots
            .iter()
            .map(|lot| format!("{} {} @ {:.8} (opened {})", lot.remaining_qty, lot.pair, lot.unit_cost_eur, lot.acquired_at))
            .collect::<Vec<_>>()
            .join("\n"),
        Err(err) => format!("Could not read positions: {err}"),
    }
}

async fn render_ganancias(ctx: &CommandContext) -> String {
    let since = Utc::now() - chrono::Duration::days(30);
    match ctx.repository.realized_pnl_eur_since(since).await {
        Ok(pnl) => format!("Realized P&L over the last 30 days: {pnl:.2} EUR"),
        Err(err) => format!("Could not read realized P&L: {err}"),
    }
}

async fn render_exposicion(ctx: &CommandContext) -> String {
    let cache = ctx.tick_cache.lock().expect("tick cache mutex poisoned").clone();
    if cache.is_empty() {
        return "No tick diagnostics recorded yet.".to_string();
    }
    cache
        .values()
        .map(|diag| format!("{}: exposure available {:.2}, position {:.2} USD", diag.pair, diag.exposure_available, diag.position_usd))
        .collect::<Vec<_>>()
        .join("\n")
}

async fn render_ultimas(ctx: &CommandContext, n: Option<u32>, exchange: Option<String>) -> String {
    let limit = n.unwrap_or(5).min(50) as i64;
    let _ = exchange; // per-exchange filtering needs a dedicated fills query; not yet wired.
    match ctx.repository.recent_bot_events(limit).await {
        Ok(events) if events.is_empty() => "No recent activity.".to_string(),
        Ok(events) => events.iter().map(|e| format!("[{}] {}: {}", e.ts.format("%H:%M:%S"), e.event_type, e.message)).collect::<Vec<_>>().join("\n"),
        Err(err) => format!("Could not read recent activity: {err}"),
    }
}

async fn render_logs(ctx: &CommandContext, n: Option<u32>, level: Option<String>, kind: Option<String>, page: Option<u32>) -> String {
    let limit = n.unwrap_or(20).min(100) as i64;
    let page = page.unwrap_or(1).max(1);
    match ctx.repository.recent_bot_events(limit * page as i64).await {
        Ok(events) => {
            let filtered: Vec<_> = events
                .into_iter()
                .filter(|e| level.as_deref().is_none_or(|l| e.level.label().eq_ignore_ascii_case(l)))
                .filter(|e| kind.as_deref().is_none_or(|k| e.event_type.eq_ignore_ascii_case(k)))
                .skip(((page as i64 - 1) * limit).max(0) as usize)
                .take(limit as usize)
                .collect();
            if filtered.is_empty() {
                return "No matching log entries.".to_string();
            }
            filtered.iter().map(|e| format!("{} [{}] {}: {}", e.id, e.event_type, e.level.label(), e.message)).collect::<Vec<_>>().join("\n")
        }
        Err(err) => format!("Could not read logs: {err}"),
    }
}

async fn render_log(ctx: &CommandContext, id: String) -> String {
    let Ok(target) = id.parse::<uuid::Uuid>() else {
        return "Invalid log id.".to_string();
    };
    match ctx.repository.recent_bot_events(200).await {
        Ok(events) => events
            .into_iter()
            .find(|e| e.id == target)
            .map(|e| format!("[{}] {}\n{}\nmeta: {}", e.ts, e.event_type, e.message, e.meta))
            .unwrap_or_else(|| "Log entry not found in the recent window.".to_string()),
        Err(err) => format!("Could not read logs: {err}"),
    }
}

async fn render_config(ctx: &CommandContext) -> String {
    match ctx.repository.get_bot_config().await {
        Ok(config) => format!(
            "strategy: {:?}\nrisk_level: {:?}\nactive_pairs: {}\ndry_run_mode: {}\nrouter_enabled: {}\nposition_mode: {:?}",
            config.strategy, config.risk_level, config.active_pairs.join(", "), config.dry_run_mode, config.router_enabled, config.position_mode,
        ),
        Err(err) => format!("Could not read configuration: {err}"),
    }
}

fn render_uptime(ctx: &CommandContext) -> String {
    let uptime = Utc::now() - ctx.started_at;
    format!("[{}] Uptime: {}", ctx.env_tag, humanize_duration(uptime.to_std().unwrap_or(Duration::ZERO)))
}

fn humanize_duration(duration: Duration) -> String {
    let total_secs = duration.as_secs();
    format!("{}h {}m {}s", total_secs / 3600, (total_secs % 3600) / 60, total_secs % 60)
}

fn render_menu() -> String {
    "/estado /balance /cartera /posiciones /ganancias /exposicion /ultimas /logs /log /config /uptime /channels /pausar /reanudar /informe_fiscal".to_string()
}

async fn render_channels(ctx: &CommandContext) -> String {
    match ctx.repository.list_telegram_chats().await {
        Ok(chats) if chats.is_empty() => "No chats registered.".to_string(),
        Ok(chats) => chats.iter().map(|c| c.chat_id.clone()).collect::<Vec<_>>().join("\n"),
        Err(err) => format!("Could not list channels: {err}"),
    }
}

async fn set_dry_run(ctx: &CommandContext, dry_run_mode: bool) -> String {
    let mut config = match ctx.repository.get_bot_config().await {
        Ok(config) => config,
        Err(err) => return format!("Could not read bot config: {err}"),
    };
    config.dry_run_mode = dry_run_mode;
    match ctx.repository.upsert_bot_config(&config).await {
        Ok(()) => if dry_run_mode { "Bot paused: entries/exits will log only, no orders submitted.".to_string() } else { "Bot resumed: live order submission re-enabled.".to_string() },
        Err(err) => format!("Could not update bot config: {err}"),
    }
}

async fn render_informe_fiscal(ctx: &CommandContext) -> String {
    match ctx.repository.recent_sync_runs(1).await {
        Ok(runs) if runs.is_empty() => "No fiscal sync has run yet; the daily job runs at 08:00.".to_string(),
        Ok(runs) => {
            let run = &runs[0];
            format!("Last fiscal sync: {} ({:?}) at {}\n{}", run.run_id, run.status, run.started_at, run.results_json)
        }
        Err(err) => format!("Could not read sync history: {err}"),
    }
}
