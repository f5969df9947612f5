use chrono::{DateTime, Utc};
use core_types::{BotEvent, Disposal, ExchangeId, Lot, MarkupSample, PositionMode, RiskLevel, SyncRun, TradeFill};
use rust_decimal::Decimal;
use serde_json::Value as JsonValue;
use sqlx::postgres::PgPool;
use sqlx::Row;
use uuid::Uuid;

use crate::error::DbError;

/// The `DbRepository` is the application's single point of contact with
/// Postgres. One repository wraps one pool, following the
/// one-repository-per-bounded-context convention: every logical table from
/// the external interfaces table gets its own set of methods here rather
/// than ad hoc queries scattered through the engine/notifier crates.
#[derive(Debug, Clone)]
pub struct DbRepository {
    pool: PgPool,
}

/// The single configuration row persisted in `bot_config`.
#[derive(Debug, Clone, PartialEq)]
pub struct BotConfigRow {
    pub strategy: core_types::StrategyId,
    pub risk_level: RiskLevel,
    pub active_pairs: Vec<String>,
    pub dry_run_mode: bool,
    pub router_enabled: bool,
    pub position_mode: PositionMode,
    pub updated_at: DateTime<Utc>,
}

/// A registered Telegram chat and its per-alert-type preferences.
#[derive(Debug, Clone, PartialEq)]
pub struct TelegramChatRow {
    pub chat_id: String,
    pub alert_flags: JsonValue,
    pub preferences: JsonValue,
    pub created_at: DateTime<Utc>,
}

/// Controls whether staking/lending income is normalized into synthetic buy
/// lots, and at what EUR valuation, per SPEC_FULL.md §11.
#[derive(Debug, Clone, PartialEq)]
pub struct FiscoAlertConfigRow {
    pub valuation_enabled: bool,
    pub eur_valuation_per_unit: Option<Decimal>,
    pub updated_at: DateTime<Utc>,
}

fn risk_level_to_str(level: RiskLevel) -> &'static str {
    match level {
        RiskLevel::Low => "low",
        RiskLevel::Medium => "medium",
        RiskLevel::High => "high",
    }
}

fn risk_level_from_str(s: &str) -> Result<RiskLevel, DbError> {
    match s {
        "low" => Ok(RiskLevel::Low),
        "medium" => Ok(RiskLevel::Medium),
        "high" => Ok(RiskLevel::High),
        other => Err(DbError::InvalidEnumValue(other.to_string())),
    }
}

fn position_mode_to_str(mode: PositionMode) -> &'static str {
    match mode {
        PositionMode::Single => "single",
        PositionMode::SmartGuard => "smart_guard",
    }
}

fn position_mode_from_str(s: &str) -> Result<PositionMode, DbError> {
    match s {
        "single" => Ok(PositionMode::Single),
        "smart_guard" => Ok(PositionMode::SmartGuard),
        other => Err(DbError::InvalidEnumValue(other.to_string())),
    }
}

impl DbRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Exposes the underlying pool for callers that need a raw connection
    /// outside the repository's own methods, e.g. a Postgres advisory lock.
    pub fn pool(&self) -> PgPool {
        self.pool.clone()
    }

    // --- trade_fills -------------------------------------------------

    /// Persists a `TradeFill` in its initial `pending` state, immediately
    /// after submission, per §4.6. Rejects a duplicate `client_order_id`
    /// instead of silently double-inserting (the column carries a unique
    /// constraint), giving idempotent submission a database-level backstop.
    pub async fn insert_pending_fill(&self, fill: &TradeFill) -> Result<(), DbError> {
        sqlx::query(
            r#"
            INSERT INTO trade_fills
                (fill_id, exchange, pair, side, price, amount, cost, fee_eur, executed_at, order_id, client_order_id, lot_id, status)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, 'pending')
            "#,
        )
        .bind(fill.fill_id)
        .bind(fill.exchange)
        .bind(&fill.pair)
        .bind(fill.side)
        .bind(fill.price)
        .bind(fill.amount)
        .bind(fill.cost)
        .bind(fill.fee_eur)
        .bind(fill.executed_at)
        .bind(&fill.order_id)
        .bind(&fill.client_order_id)
        .bind(fill.lot_id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Updates a fill with its executed price/amount/fee once the order
    /// watcher observes a terminal `filled`/`partiallyFilled` status.
    pub async fn mark_fill_executed(
        &self,
        fill_id: Uuid,
        price: Decimal,
        amount: Decimal,
        fee_eur: Decimal,
        lot_id: Option<Uuid>,
        status: &str,
    ) -> Result<(), DbError> {
        sqlx::query(
            "UPDATE trade_fills SET price = $2, amount = $3, fee_eur = $4, lot_id = $5, status = $6 WHERE fill_id = $1",
        )
        .bind(fill_id)
        .bind(price)
        .bind(amount)
        .bind(fee_eur)
        .bind(lot_id)
        .bind(status)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn fills_since(&self, exchange: ExchangeId, since: DateTime<Utc>) -> Result<Vec<TradeFill>, DbError> {
        let rows = sqlx::query_as::<_, TradeFill>(
            "SELECT fill_id, exchange, pair, side, price, amount, cost, fee_eur, executed_at, order_id, client_order_id, lot_id FROM trade_fills WHERE exchange = $1 AND executed_at > $2 ORDER BY executed_at ASC",
        )
        .bind(exchange)
        .bind(since)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    // --- lots ----------------------------------------------------------

    pub async fn insert_lot(&self, lot: &Lot) -> Result<(), DbError> {
        sqlx::query(
            r#"
            INSERT INTO lots (lot_id, pair, exchange, acquired_at, quantity, remaining_qty, unit_cost_eur, cost_eur, fee_eur, is_closed)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(lot.lot_id)
        .bind(&lot.pair)
        .bind(lot.exchange)
        .bind(lot.acquired_at)
        .bind(lot.quantity)
        .bind(lot.remaining_qty)
        .bind(lot.unit_cost_eur)
        .bind(lot.cost_eur)
        .bind(lot.fee_eur)
        .bind(lot.is_closed)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Persists the FIFO accountant's mutation of a lot's remaining quantity.
    pub async fn update_lot_remaining(&self, lot_id: Uuid, remaining_qty: Decimal, is_closed: bool) -> Result<(), DbError> {
        sqlx::query("UPDATE lots SET remaining_qty = $2, is_closed = $3 WHERE lot_id = $1")
            .bind(lot_id)
            .bind(remaining_qty)
            .bind(is_closed)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Fetches open lots for a `(pair, exchange)`, ordered earliest-first —
    /// exactly the order the FIFO matcher walks them in.
    pub async fn open_lots(&self, pair: &str, exchange: ExchangeId) -> Result<Vec<Lot>, DbError> {
        let rows = sqlx::query_as::<_, Lot>(
            "SELECT lot_id, pair, exchange, acquired_at, quantity, remaining_qty, unit_cost_eur, cost_eur, fee_eur, is_closed FROM lots WHERE pair = $1 AND exchange = $2 AND NOT is_closed ORDER BY acquired_at ASC",
        )
        .bind(pair)
        .bind(exchange)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    /// Fetches every open lot across all pairs/exchanges, for operator
    /// introspection commands that need a portfolio-wide view rather than
    /// one pair at a time.
    pub async fn all_open_lots(&self) -> Result<Vec<Lot>, DbError> {
        let rows = sqlx::query_as::<_, Lot>(
            "SELECT lot_id, pair, exchange, acquired_at, quantity, remaining_qty, unit_cost_eur, cost_eur, fee_eur, is_closed FROM lots WHERE NOT is_closed ORDER BY acquired_at ASC",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    // --- disposals -------------------------------------------------------

    pub async fn insert_disposal(&self, disposal: &Disposal) -> Result<(), DbError> {
        sqlx::query(
            r#"
            INSERT INTO disposals (disposal_id, sell_fill_id, lot_id, quantity, proceeds_eur, cost_basis_eur, gain_loss_eur, disposed_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(disposal.disposal_id)
        .bind(disposal.sell_fill_id)
        .bind(disposal.lot_id)
        .bind(disposal.quantity)
        .bind(disposal.proceeds_eur)
        .bind(disposal.cost_basis_eur)
        .bind(disposal.gain_loss_eur)
        .bind(disposal.disposed_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Sums realized gain/loss across every disposal recorded since `since`,
    /// for the daily report and `/ganancias` (§4.10).
    pub async fn realized_pnl_eur_since(&self, since: DateTime<Utc>) -> Result<Decimal, DbError> {
        let total: Option<Decimal> =
            sqlx::query_scalar("SELECT SUM(gain_loss_eur) FROM disposals WHERE disposed_at >= $1")
                .bind(since)
                .fetch_one(&self.pool)
                .await?;
        Ok(total.unwrap_or(Decimal::ZERO))
    }

    /// Counts disposals recorded since `since`, a cheap proxy for "trades
    /// closed today" used by the daily report.
    pub async fn disposal_count_since(&self, since: DateTime<Utc>) -> Result<i64, DbError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM disposals WHERE disposed_at >= $1")
            .bind(since)
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    // --- bot_events --------------------------------------------------------

    pub async fn insert_bot_event(&self, event: &BotEvent) -> Result<(), DbError> {
        sqlx::query("INSERT INTO bot_events (id, ts, level, event_type, message, meta) VALUES ($1, $2, $3, $4, $5, $6)")
            .bind(event.id)
            .bind(event.ts)
            .bind(event.level)
            .bind(&event.event_type)
            .bind(&event.message)
            .bind(&event.meta)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Most recent events first, bounded by `limit`, for `/logs` and the UI
    /// snapshot-on-connect.
    pub async fn recent_bot_events(&self, limit: i64) -> Result<Vec<BotEvent>, DbError> {
        let rows = sqlx::query_as::<_, BotEvent>(
            "SELECT id, ts, level, event_type, message, meta FROM bot_events ORDER BY ts DESC LIMIT $1",
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    /// Prunes retention past `keep`, enforcing the bounded-retention
    /// invariant on the append-only event log.
    pub async fn prune_bot_events(&self, keep: i64) -> Result<u64, DbError> {
        let result = sqlx::query(
            "DELETE FROM bot_events WHERE id NOT IN (SELECT id FROM bot_events ORDER BY ts DESC LIMIT $1)",
        )
        .bind(keep)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }

    // --- bot_config (single row) --------------------------------------------

    pub async fn get_bot_config(&self) -> Result<BotConfigRow, DbError> {
        let row = sqlx::query(
            "SELECT strategy, risk_level, active_pairs, dry_run_mode, router_enabled, position_mode, updated_at FROM bot_config WHERE id = 1",
        )
        .fetch_optional(&self.pool)
        .await?
        .ok_or(DbError::NotFound)?;

        let strategy_str: String = row.try_get("strategy")?;
        let strategy = match strategy_str.as_str() {
            "momentum" => core_types::StrategyId::Momentum,
            "mean_reversion" => core_types::StrategyId::MeanReversion,
            "scalping" => core_types::StrategyId::Scalping,
            "grid" => core_types::StrategyId::Grid,
            other => return Err(DbError::InvalidEnumValue(other.to_string())),
        };

        Ok(BotConfigRow {
            strategy,
            risk_level: risk_level_from_str(row.try_get::<String, _>("risk_level")?.as_str())?,
            active_pairs: row.try_get("active_pairs")?,
            dry_run_mode: row.try_get("dry_run_mode")?,
            router_enabled: row.try_get("router_enabled")?,
            position_mode: position_mode_from_str(row.try_get::<String, _>("position_mode")?.as_str())?,
            updated_at: row.try_get("updated_at")?,
        })
    }

    pub async fn upsert_bot_config(&self, config: &BotConfigRow) -> Result<(), DbError> {
        sqlx::query(
            r#"
            INSERT INTO bot_config (id, strategy, risk_level, active_pairs, dry_run_mode, router_enabled, position_mode, updated_at)
            VALUES (1, $1, $2, $3, $4, $5, $6, now())
            ON CONFLICT (id) DO UPDATE SET
                strategy = EXCLUDED.strategy,
                risk_level = EXCLUDED.risk_level,
                active_pairs = EXCLUDED.active_pairs,
                dry_run_mode = EXCLUDED.dry_run_mode,
                router_enabled = EXCLUDED.router_enabled,
                position_mode = EXCLUDED.position_mode,
                updated_at = now()
            "#,
        )
        .bind(config.strategy.label())
        .bind(risk_level_to_str(config.risk_level))
        .bind(&config.active_pairs)
        .bind(config.dry_run_mode)
        .bind(config.router_enabled)
        .bind(position_mode_to_str(config.position_mode))
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    // --- telegram_chats ------------------------------------------------

    pub async fn upsert_telegram_chat(&self, chat_id: &str, alert_flags: &JsonValue, preferences: &JsonValue) -> Result<(), DbError> {
        sqlx::query(
            r#"
            INSERT INTO telegram_chats (chat_id, alert_flags, preferences)
            VALUES ($1, $2, $3)
            ON CONFLICT (chat_id) DO UPDATE SET alert_flags = EXCLUDED.alert_flags, preferences = EXCLUDED.preferences
            "#,
        )
        .bind(chat_id)
        .bind(alert_flags)
        .bind(preferences)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn list_telegram_chats(&self) -> Result<Vec<TelegramChatRow>, DbError> {
        let rows = sqlx::query("SELECT chat_id, alert_flags, preferences, created_at FROM telegram_chats")
            .fetch_all(&self.pool)
            .await?;
        rows.into_iter()
            .map(|row| {
                Ok(TelegramChatRow {
                    chat_id: row.try_get("chat_id")?,
                    alert_flags: row.try_get("alert_flags")?,
                    preferences: row.try_get("preferences")?,
                    created_at: row.try_get("created_at")?,
                })
            })
            .collect()
    }

    // --- fisco_alert_config (single row) --------------------------------

    pub async fn get_fisco_alert_config(&self) -> Result<FiscoAlertConfigRow, DbError> {
        let row = sqlx::query("SELECT valuation_enabled, eur_valuation_per_unit, updated_at FROM fisco_alert_config WHERE id = 1")
            .fetch_optional(&self.pool)
            .await?
            .ok_or(DbError::NotFound)?;
        Ok(FiscoAlertConfigRow {
            valuation_enabled: row.try_get("valuation_enabled")?,
            eur_valuation_per_unit: row.try_get("eur_valuation_per_unit")?,
            updated_at: row.try_get("updated_at")?,
        })
    }

    pub async fn upsert_fisco_alert_config(&self, config: &FiscoAlertConfigRow) -> Result<(), DbError> {
        sqlx::query(
            r#"
            INSERT INTO fisco_alert_config (id, valuation_enabled, eur_valuation_per_unit, updated_at)
            VALUES (1, $1, $2, now())
            ON CONFLICT (id) DO UPDATE SET
                valuation_enabled = EXCLUDED.valuation_enabled,
                eur_valuation_per_unit = EXCLUDED.eur_valuation_per_unit,
                updated_at = now()
            "#,
        )
        .bind(config.valuation_enabled)
        .bind(config.eur_valuation_per_unit)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    // --- fisco_sync_history ---------------------------------------------

    pub async fn insert_sync_run(&self, run: &SyncRun) -> Result<(), DbError> {
        sqlx::query(
            r#"
            INSERT INTO fisco_sync_history (run_id, mode, triggered_by, started_at, completed_at, status, results_json, error_json)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(run.run_id)
        .bind(run.mode)
        .bind(&run.triggered_by)
        .bind(run.started_at)
        .bind(run.completed_at)
        .bind(run.status)
        .bind(&run.results_json)
        .bind(&run.error_json)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn update_sync_run(&self, run: &SyncRun) -> Result<(), DbError> {
        sqlx::query(
            "UPDATE fisco_sync_history SET completed_at = $2, status = $3, results_json = $4, error_json = $5 WHERE run_id = $1",
        )
        .bind(run.run_id)
        .bind(run.completed_at)
        .bind(run.status)
        .bind(&run.results_json)
        .bind(&run.error_json)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn recent_sync_runs(&self, limit: i64) -> Result<Vec<SyncRun>, DbError> {
        let rows = sqlx::query_as::<_, SyncRun>(
            "SELECT run_id, mode, triggered_by, started_at, completed_at, status, results_json, error_json FROM fisco_sync_history ORDER BY started_at DESC LIMIT $1",
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    // --- markup_samples --------------------------------------------------

    pub async fn get_markup_sample(&self, pair: &str) -> Result<Option<MarkupSample>, DbError> {
        let row = sqlx::query_as::<_, (String, Decimal, i32)>(
            "SELECT pair, ema_pct, sample_count FROM markup_samples WHERE pair = $1",
        )
        .bind(pair)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(|(pair, ema_pct, sample_count)| MarkupSample { pair, ema_pct, sample_count: sample_count as u32 }))
    }

    pub async fn upsert_markup_sample(&self, sample: &MarkupSample) -> Result<(), DbError> {
        sqlx::query(
            r#"
            INSERT INTO markup_samples (pair, ema_pct, sample_count)
            VALUES ($1, $2, $3)
            ON CONFLICT (pair) DO UPDATE SET ema_pct = EXCLUDED.ema_pct, sample_count = EXCLUDED.sample_count
            "#,
        )
        .bind(&sample.pair)
        .bind(sample.ema_pct)
        .bind(sample.sample_count as i32)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}
