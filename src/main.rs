use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::Utc;
use clap::Parser;
use configuration::cli::Commands;
use configuration::Cli;
use core_types::ExchangeId;
use database::{connect, run_migrations, BotConfigRow, DbRepository};
use engine::TradingEngine;
use events::EngineEvent;
use exchange::{Exchange, KrakenCredentials, KrakenExchange};
use notifier::{parse_command, PollerLock, TelegramClient};
use rust_decimal_macros::dec;
use tokio::sync::mpsc;

mod bridge;
mod commands;

/// Kraken's public tier fee schedule (§4.1). Not yet operator-configurable;
/// a per-exchange fee override belongs in `configuration::RiskManagement`
/// once a second venue is wired in.
const KRAKEN_TAKER_FEE_PCT: rust_decimal::Decimal = dec!(0.0026);
const KRAKEN_MAKER_FEE_PCT: rust_decimal::Decimal = dec!(0.0016);

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let config = configuration::load_config().context("loading config.toml")?;
    let _tracing_guard = configuration::init_tracing(&config.logging).context("initializing tracing")?;

    let cli = Cli::parse();
    tracing::info!(command = ?cli.command, "starting");

    let pool = connect().await.context("connecting to postgres")?;
    run_migrations(&pool).await.context("running database migrations")?;
    let repository = DbRepository::new(pool);

    match cli.command {
        Commands::Migrate => {
            tracing::info!("migrations applied, exiting");
            Ok(())
        }
        Commands::DryRunTick => run_dry_run_tick(config, repository).await,
        Commands::Run => run_forever(config, repository).await,
    }
}

fn build_trading_exchange() -> Result<Arc<dyn Exchange>> {
    let exchange: Arc<dyn Exchange> = match KrakenCredentials::from_env("KRAKEN") {
        Ok(credentials) => {
            tracing::info!("kraken credentials found, trading in authenticated mode");
            Arc::new(KrakenExchange::authenticated(credentials, KRAKEN_TAKER_FEE_PCT, KRAKEN_MAKER_FEE_PCT))
        }
        Err(_) => {
            tracing::warn!("no KRAKEN_API_KEY/KRAKEN_API_SECRET in environment, trading client is public-data-only");
            Arc::new(KrakenExchange::public(KRAKEN_TAKER_FEE_PCT, KRAKEN_MAKER_FEE_PCT))
        }
    };
    Ok(exchange)
}

/// Seeds `bot_config` from `config.toml` on first run, so `/estado` and the
/// daily report have something to read before any `/pausar`-style mutation.
async fn seed_bot_config(repository: &DbRepository, config: &configuration::Config) -> Result<()> {
    match repository.get_bot_config().await {
        Ok(_) => Ok(()),
        Err(database::DbError::NotFound) => {
            let row = BotConfigRow {
                strategy: config.bot.strategy,
                risk_level: config.bot.risk_level,
                active_pairs: config.bot.active_pairs.clone(),
                dry_run_mode: config.bot.dry_run_mode,
                router_enabled: config.bot.router_enabled,
                position_mode: config.bot.position_mode,
                updated_at: Utc::now(),
            };
            repository.upsert_bot_config(&row).await.context("seeding bot_config")
        }
        Err(err) => Err(err.into()),
    }
}

/// Rebuilds in-memory open positions from persisted open lots so a restart
/// doesn't orphan live inventory. The exit ladder (stop/take-profit) is
/// re-derived fresh from the configured percentages rather than restored
/// exactly — any BE-arm/trailing progress from before the restart is lost,
/// which is an accepted simplification (see DESIGN.md).
async fn adopt_persisted_positions(
    engine: &mut TradingEngine,
    repository: &DbRepository,
    config: &configuration::Config,
    exchange_id: ExchangeId,
) -> Result<()> {
    for pair_symbol in &config.bot.active_pairs {
        let lots = repository.open_lots(pair_symbol, exchange_id).await.context("loading open lots")?;
        let Some(lot) = lots.into_iter().find(|lot| !lot.is_closed) else { continue };
        let pair = engine::resolve_pair(pair_symbol).context("resolving pair precision facts")?;
        let position = core_types::OpenPosition::new(
            lot.lot_id,
            pair,
            exchange_id,
            lot.remaining_qty,
            lot.unit_cost_eur,
            lot.acquired_at,
            config.exits.stop_loss_pct,
            config.exits.take_profit_pct,
        );
        engine.adopt_position(pair_symbol.clone(), position);
    }
    Ok(())
}

async fn run_dry_run_tick(config: configuration::Config, repository: DbRepository) -> Result<()> {
    let exchange = build_trading_exchange()?;
    let exchange_id = exchange.id();
    let mut engine = TradingEngine::new(config.clone(), exchange, repository.clone())?;
    adopt_persisted_positions(&mut engine, &repository, &config, exchange_id).await?;

    let events = engine.run_tick().await.context("running dry-run tick")?;
    for event in events {
        println!("{}", serde_json::to_string_pretty(&event)?);
    }
    Ok(())
}

async fn run_forever(config: configuration::Config, repository: DbRepository) -> Result<()> {
    let started_at = Utc::now();
    seed_bot_config(&repository, &config).await?;

    let exchange = build_trading_exchange()?;
    let exchange_id = exchange.id();
    let mut engine = TradingEngine::new(config.clone(), Arc::clone(&exchange), repository.clone())?;
    adopt_persisted_positions(&mut engine, &repository, &config, exchange_id).await?;

    let (events_tx, events_rx) = mpsc::channel::<EngineEvent>(1024);
    let (notifier_tx, notifier_rx) = mpsc::channel(256);
    let tick_cache = commands::new_tick_cache();

    events_tx.send(EngineEvent::Connected).await.ok();

    // Engine tick worker: ticks never overlap (§5) — a tick that runs long
    // simply delays the next `interval.tick()`, it never spawns a second
    // concurrent tick.
    let tick_interval = Duration::from_millis(config.bot.tick_interval_ms);
    let engine_events_tx = events_tx.clone();
    let engine_task = tokio::spawn(async move {
        let mut ticker = tokio::time::interval(tick_interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        loop {
            ticker.tick().await;
            match engine.run_tick().await {
                Ok(events) => {
                    for event in events {
                        if engine_events_tx.send(event).await.is_err() {
                            tracing::warn!("engine: event channel closed, stopping tick loop");
                            return;
                        }
                    }
                }
                Err(err) => tracing::error!(error = %err, "tick failed"),
            }
        }
    });

    let bridge_task = tokio::spawn(bridge::run(
        events_rx,
        notifier_tx.clone(),
        repository.clone(),
        tick_cache.clone(),
        config.notifications.env_tag.clone(),
        started_at,
    ));

    let scheduler_jobs = scheduler::spawn(
        repository.clone(),
        vec![exchange],
        config.bot.operator_tz_offset_hours,
        events_tx.clone(),
    );

    let bot_token = std::env::var(&config.notifications.bot_token_env).unwrap_or_default();
    let notifier_task = match TelegramClient::new(bot_token.clone()) {
        Ok(client) => {
            let repo = repository.clone();
            Some(tokio::spawn(notifier::run_notifier_worker(notifier_rx, client, repo)))
        }
        Err(_) => {
            tracing::warn!("no Telegram bot token configured, notifier worker disabled");
            None
        }
    };

    let poller_task = match TelegramClient::new(bot_token.clone()) {
        Ok(client) => Some(tokio::spawn(run_inbound_poller(
            client,
            PollerLock::new(repository.pool(), &config.notifications.env_tag, &bot_token),
            repository.clone(),
            tick_cache.clone(),
            started_at,
            config.notifications.env_tag.clone(),
        ))),
        Err(_) => None,
    };

    notifier_tx
        .send(notifier::MessageContext::BotStarted { env_tag: config.notifications.env_tag.clone(), version: env!("CARGO_PKG_VERSION").to_string() })
        .await
        .ok();

    engine_task.await.ok();
    bridge_task.await.ok();
    scheduler_jobs.heartbeat.abort();
    scheduler_jobs.daily_report.abort();
    scheduler_jobs.daily_sync.abort();
    if let Some(task) = notifier_task {
        task.abort();
    }
    if let Some(task) = poller_task {
        task.abort();
    }

    Ok(())
}

/// The singleton inbound command poller (§4.10). Acquires `lock` before
/// calling `get_updates`; on a 409 conflict (another replica holds it) it
/// releases and backs off rather than retrying immediately.
async fn run_inbound_poller(
    mut client: TelegramClient,
    mut lock: PollerLock,
    repository: DbRepository,
    tick_cache: commands::TickCache,
    started_at: chrono::DateTime<Utc>,
    env_tag: String,
) {
    let ctx = commands::CommandContext { repository, tick_cache, started_at, env_tag };

    loop {
        match lock.try_acquire().await {
            Ok(true) => {}
            Ok(false) => {
                tokio::time::sleep(Duration::from_secs(5)).await;
                continue;
            }
            Err(err) => {
                tracing::error!(error = %err, "poller lock check failed");
                tokio::time::sleep(Duration::from_secs(5)).await;
                continue;
            }
        }

        match client.get_updates(30).await {
            Ok(updates) => {
                for update in updates {
                    let Some(message) = update.message else { continue };
                    let Some(text) = message.text else { continue };
                    let Some(command) = parse_command(&text) else { continue };
                    let reply = commands::dispatch(command, &ctx).await;
                    if let Err(err) = client.send_message(message.chat.id, &reply).await {
                        tracing::error!(error = %err, "failed to reply to telegram command");
                    }
                }
            }
            Err(notifier::NotifierError::Api(message)) if message.contains("409") => {
                if let Ok(wait) = lock.release_and_backoff().await {
                    tokio::time::sleep(wait).await;
                }
            }
            Err(err) => {
                tracing::error!(error = %err, "telegram getUpdates failed");
                tokio::time::sleep(Duration::from_secs(5)).await;
            }
        }
    }
}

