use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use core_types::{BotEvent, BotEventLevel, FeatureVector, Interval, OpenPosition, OrderSide, OrderType, Side, StrategyId, TradeFill};
use events::{EngineEvent, PositionsSnapshot, TickDiagnostic};
use exchange::{Exchange, SubmitOrderRequest};
use executor::{derive_client_order_id, poll_until_terminal, reconcile_open_lots, submit_with_nonce_retry, IdempotencyGuard, PollOutcome};
use indicators::{build_feature_vector, build_snapshot};
use risk::{check_admission, size_order, AdmissionInput, SizingInput};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use strategies::{route, Strategy};
use uuid::Uuid;

use configuration::Config;
use database::DbRepository;

use crate::error::EngineError;
use crate::exits;
use crate::markup;
use crate::pair_meta::resolve_pair;

const ORDER_TIMEOUT_POLL_INITIAL: std::time::Duration = std::time::Duration::from_millis(500);
const ORDER_TIMEOUT_POLL_MAX: std::time::Duration = std::time::Duration::from_secs(5);

/// The trading engine's in-memory state (§4.2, §4.5–§4.7), rebuilt from
/// persisted lots on startup by the caller before the first tick.
///
/// `referenceMid` values used for fee/markup accounting are sourced from the
/// trading exchange's own ticker; converting quote-currency proceeds into
/// the EUR reporting currency for the accountant requires an external rate
/// series the engine does not own (see DESIGN.md) — a unit rate is used
/// here as the integration seam.
pub struct TradingEngine {
    config: Config,
    exchange: Arc<dyn Exchange>,
    repository: DbRepository,
    strategies: HashMap<StrategyId, Box<dyn Strategy>>,
    idempotency: IdempotencyGuard,
    open_positions: HashMap<String, OpenPosition>,
    cooldowns: HashMap<String, DateTime<Utc>>,
    daily_realized_loss_usd: Decimal,
    daily_loss_reset_date: NaiveDate,
    tick_id: u64,
}

impl TradingEngine {
    pub fn new(config: Config, exchange: Arc<dyn Exchange>, repository: DbRepository) -> Result<Self, EngineError> {
        let strategies =
            strategies::factory::create_all(&config.strategies).map_err(EngineError::Strategy)?;
        Ok(Self {
            config,
            exchange,
            repository,
            strategies,
            idempotency: IdempotencyGuard::new(),
            open_positions: HashMap::new(),
            cooldowns: HashMap::new(),
            daily_realized_loss_usd: Decimal::ZERO,
            daily_loss_reset_date: Utc::now().date_naive(),
            tick_id: 0,
        })
    }

    /// Seeds in-memory open positions from persisted lots, called once at
    /// startup before the tick loop begins.
    pub fn adopt_position(&mut self, pair_symbol: String, position: OpenPosition) {
        self.open_positions.insert(pair_symbol, position);
    }

    fn roll_daily_loss_window(&mut self, now: DateTime<Utc>) {
        let today = now.date_naive();
        if today != self.daily_loss_reset_date {
            self.daily_loss_reset_date = today;
            self.daily_realized_loss_usd = Decimal::ZERO;
        }
    }

    /// Runs one full tick: the reconciliation sweep, then a per-pair
    /// scan evaluating exits before entries, per §4.6/§4.7.
    pub async fn run_tick(&mut self) -> Result<Vec<EngineEvent>, EngineError> {
        self.tick_id += 1;
        let now = Utc::now();
        self.roll_daily_loss_window(now);

        let mut events = Vec::new();
        self.reconcile(&mut events).await?;

        let pairs = self.config.bot.active_pairs.clone();
        for pair_symbol in &pairs {
            if let Err(err) = self.process_pair(pair_symbol, now, &mut events).await {
                tracing::error!(pair = %pair_symbol, error = %err, "tick: pair evaluation failed");
                events.push(EngineEvent::Bot(BotEvent::new(
                    BotEventLevel::Error,
                    "PAIR_EVALUATION_FAILED",
                    format!("{pair_symbol}: {err}"),
                )));
            }
        }

        events.push(EngineEvent::Positions(self.positions_snapshot(now).await?));
        Ok(events)
    }

    async fn reconcile(&mut self, events: &mut Vec<EngineEvent>) -> Result<(), EngineError> {
        let balances = self.exchange.get_balance().await?;
        let positions: Vec<OpenPosition> = self.open_positions.values().cloned().collect();
        let orphans = reconcile_open_lots(&positions, &balances, self.config.reconciliation.auto_close_orphans);
        for orphan in orphans {
            events.push(EngineEvent::Bot(BotEvent::new(
                BotEventLevel::Warn,
                "ORPHAN_POSITION_CLEANED",
                format!("{} {} untracked (auto_closed={})", orphan.quantity, orphan.asset, orphan.auto_closed),
            )));
        }
        Ok(())
    }

    async fn positions_snapshot(&self, now: DateTime<Utc>) -> Result<PositionsSnapshot, EngineError> {
        let balances = self.exchange.get_balance().await?;
        let free_usd = balances
            .iter()
            .find(|b| b.asset == "USD")
            .map(|b| b.free)
            .unwrap_or(Decimal::ZERO);
        let positions: Vec<OpenPosition> = self.open_positions.values().cloned().collect();
        let positions_value: Decimal = positions.iter().map(|p| p.amount * p.entry_price).sum();
        Ok(PositionsSnapshot {
            timestamp: now,
            free_usd,
            total_equity_usd: free_usd + positions_value,
            positions,
        })
    }

    async fn fetch_features(&self, pair_symbol: &str) -> Result<(FeatureVector, Decimal, Decimal), EngineError> {
        let pair = resolve_pair(pair_symbol)?;
        let ticker = self.exchange.get_ticker(&pair).await?;

        let candles_5m = self.exchange.get_ohlc(&pair, Interval::FiveMinutes, 60).await?;
        let candles_1h = self.exchange.get_ohlc(&pair, Interval::OneHour, 60).await?;
        let candles_4h = self.exchange.get_ohlc(&pair, Interval::FourHours, 60).await?;

        let snapshot_5m = build_snapshot(&candles_5m)?;
        let snapshot_1h = build_snapshot(&candles_1h)?;
        let snapshot_4h = build_snapshot(&candles_4h)?;

        let last_close = candles_5m.last().map(|c| c.close).unwrap_or(ticker.last);
        let last_volume = candles_5m.last().map(|c| c.volume).unwrap_or(Decimal::ZERO);

        let features = build_feature_vector(snapshot_5m, snapshot_1h, snapshot_4h, last_close, last_volume);
        Ok((features, ticker.mid(), ticker.last))
    }

    async fn process_pair(
        &mut self,
        pair_symbol: &str,
        now: DateTime<Utc>,
        events: &mut Vec<EngineEvent>,
    ) -> Result<(), EngineError> {
        let (features, reference_mid, last_price) = self.fetch_features(pair_symbol).await?;

        if let Some(mut position) = self.open_positions.remove(pair_symbol) {
            let (trigger, stop_update) = exits::evaluate(&mut position, last_price, &self.config.exits);

            if let Some(trigger) = trigger {
                self.submit_exit(pair_symbol, &position, trigger.exit_type, last_price, now, events).await?;
            } else {
                if matches!(stop_update, exits::StopUpdate::Raised) {
                    events.push(EngineEvent::Bot(BotEvent::new(
                        BotEventLevel::Info,
                        "STOP_UPDATED",
                        format!("{pair_symbol} stop raised to {}", position.stop_price),
                    )));
                }
                events.push(EngineEvent::Tick(self.diagnostic(pair_symbol, &position, &features)));
                self.open_positions.insert(pair_symbol.to_string(), position);
            }
            return Ok(());
        }

        let routed = route(&resolve_pair(pair_symbol)?, &features, &self.strategies, &self.config.router)
            .map_err(EngineError::Strategy)?;

        if !routed.signal.is_actionable() || !matches!(routed.signal.side, Side::Buy) {
            events.push(EngineEvent::Tick(TickDiagnostic {
                pair: pair_symbol.to_string(),
                signal: routed.signal.side,
                reason: routed.signal.reason_text,
                cooldown_sec: self.remaining_cooldown(pair_symbol, now),
                exposure_available: Decimal::ZERO,
                has_position: false,
                position_usd: Decimal::ZERO,
                regime: features.regime,
            }));
            return Ok(());
        }

        self.try_enter(pair_symbol, reference_mid, now, events).await
    }

    fn remaining_cooldown(&self, pair_symbol: &str, now: DateTime<Utc>) -> i64 {
        match self.cooldowns.get(pair_symbol) {
            Some(started_at) => {
                let elapsed = (now - *started_at).num_seconds().max(0);
                (self.config.risk_management.cooldown_sec as i64 - elapsed).max(0)
            }
            None => 0,
        }
    }

    fn diagnostic(&self, pair_symbol: &str, position: &OpenPosition, features: &FeatureVector) -> TickDiagnostic {
        TickDiagnostic {
            pair: pair_symbol.to_string(),
            signal: Side::None,
            reason: "position open, monitoring exit".to_string(),
            cooldown_sec: 0,
            exposure_available: Decimal::ZERO,
            has_position: true,
            position_usd: position.amount * position.entry_price,
            regime: features.regime,
        }
    }

    async fn try_enter(
        &mut self,
        pair_symbol: &str,
        reference_mid: Decimal,
        now: DateTime<Utc>,
        events: &mut Vec<EngineEvent>,
    ) -> Result<(), EngineError> {
        let pair = resolve_pair(pair_symbol)?;
        let balances = self.exchange.get_balance().await?;
        let free_usd = balances.iter().find(|b| b.asset == pair.quote).map(|b| b.free).unwrap_or(Decimal::ZERO);

        let positions: Vec<&OpenPosition> = self.open_positions.values().collect();
        let total_exposure_usd: Decimal = positions.iter().map(|p| p.amount * p.entry_price).sum();
        let pair_exposure_usd = self
            .open_positions
            .get(pair_symbol)
            .map(|p| p.amount * p.entry_price)
            .unwrap_or(Decimal::ZERO);
        let total_equity_usd = free_usd + total_exposure_usd;

        let markup_sample = self.repository.get_markup_sample(pair_symbol).await?;
        let markup_pct = markup::estimate(markup_sample.as_ref(), dec!(0.20)) / dec!(100);

        let sizing_input = SizingInput {
            free_usd,
            entry_price_estimate: reference_mid,
            dynamic_markup_pct: markup_pct,
            risk_level: self.config.bot.risk_level,
            regime_size_multiplier: Decimal::ONE,
        };
        let qty = match size_order(&sizing_input, &self.config.risk_management, &self.config.exits, &pair) {
            Ok(qty) => qty,
            Err(err) => {
                tracing::debug!(pair = %pair_symbol, error = %err, "sizing rejected candidate entry");
                return Ok(());
            }
        };

        let admission_input = AdmissionInput {
            pair: pair.clone(),
            now,
            cooldown_started_at: self.cooldowns.get(pair_symbol).copied(),
            pair_exposure_usd,
            total_exposure_usd,
            total_equity_usd,
            daily_realized_loss_usd: self.daily_realized_loss_usd,
            has_pending_buy: false,
            candidate_qty: qty,
        };
        let decision = check_admission(&admission_input, &self.config.risk_management, self.config.bot.risk_level);
        if !decision.is_admitted() {
            if let risk::AdmissionDecision::Denied(reason) = decision {
                tracing::debug!(pair = %pair_symbol, reason = %reason, "admission denied");
            }
            return Ok(());
        }

        if self.config.bot.dry_run_mode {
            events.push(EngineEvent::Bot(BotEvent::new(
                BotEventLevel::Info,
                "DRY_RUN_ENTRY",
                format!("[DRY_RUN] would BUY {qty} {pair_symbol} at ~{reference_mid}"),
            )));
            return Ok(());
        }

        let client_order_id = derive_client_order_id(&pair, OrderSide::Buy, self.tick_id);
        if !self.idempotency.try_reserve(&client_order_id) {
            return Err(EngineError::Configuration(format!("duplicate client order id {client_order_id}")));
        }

        let request = SubmitOrderRequest {
            pair: pair.clone(),
            side: OrderSide::Buy,
            order_type: OrderType::Market,
            amount: qty,
            price: None,
            client_order_id: client_order_id.clone(),
        };

        let (ack, retries) = submit_with_nonce_retry(self.exchange.as_ref(), request).await?;
        if retries > 0 {
            events.push(EngineEvent::Bot(BotEvent::new(
                BotEventLevel::Warn,
                "NONCE_RETRY",
                format!("{pair_symbol} BUY required {retries} nonce retries"),
            )));
        }

        let outcome = poll_until_terminal(
            self.exchange.as_ref(),
            &ack.order_id,
            std::time::Duration::from_secs(self.config.bot.order_timeout_sec),
            ORDER_TIMEOUT_POLL_INITIAL,
            ORDER_TIMEOUT_POLL_MAX,
        )
        .await?;

        self.cooldowns.insert(pair_symbol.to_string(), now);

        match outcome {
            PollOutcome::Filled(status) | PollOutcome::PartiallyFilled(status) => {
                let fill = TradeFill {
                    fill_id: Uuid::new_v4(),
                    exchange: self.exchange.id(),
                    pair: pair_symbol.to_string(),
                    side: OrderSide::Buy,
                    price: status.average_price,
                    amount: status.filled_qty,
                    cost: status.average_price * status.filled_qty,
                    fee_eur: status.average_price * status.filled_qty * self.exchange.taker_fee_pct(),
                    executed_at: now,
                    order_id: status.order_id.clone(),
                    client_order_id: client_order_id.clone(),
                    lot_id: None,
                };
                self.repository.insert_pending_fill(&fill).await?;
                let lot = accountant::record_buy(&fill, fill.price, fill.fee_eur);
                self.repository.insert_lot(&lot).await?;
                self.repository
                    .mark_fill_executed(fill.fill_id, fill.price, fill.amount, fill.fee_eur, Some(lot.lot_id), "filled")
                    .await?;

                let mut sample = markup_sample.unwrap_or_else(|| core_types::MarkupSample::seed(pair_symbol, dec!(0.20)));
                markup::update(&mut sample, fill.price, reference_mid);
                self.repository.upsert_markup_sample(&sample).await?;

                let position = OpenPosition::new(
                    lot.lot_id,
                    pair,
                    self.exchange.id(),
                    fill.amount,
                    fill.price,
                    now,
                    self.config.exits.stop_loss_pct,
                    self.config.exits.take_profit_pct,
                );
                self.open_positions.insert(pair_symbol.to_string(), position);
                events.push(EngineEvent::Fill(fill));
            }
            PollOutcome::Canceled | PollOutcome::TimedOut => {
                events.push(EngineEvent::Bot(BotEvent::new(
                    BotEventLevel::Warn,
                    "ENTRY_CANCELED",
                    format!("{pair_symbol} BUY canceled before fill"),
                )));
            }
            PollOutcome::Rejected => {
                events.push(EngineEvent::Bot(BotEvent::new(
                    BotEventLevel::Error,
                    "ENTRY_REJECTED",
                    format!("{pair_symbol} BUY rejected by venue"),
                )));
            }
        }

        Ok(())
    }

    async fn submit_exit(
        &mut self,
        pair_symbol: &str,
        position: &OpenPosition,
        exit_type: core_types::ExitType,
        last_price: Decimal,
        now: DateTime<Utc>,
        events: &mut Vec<EngineEvent>,
    ) -> Result<(), EngineError> {
        let client_order_id = derive_client_order_id(&position.pair, OrderSide::Sell, self.tick_id);
        self.idempotency.try_reserve(&client_order_id);

        if self.config.bot.dry_run_mode {
            events.push(EngineEvent::Bot(BotEvent::new(
                BotEventLevel::Info,
                "DRY_RUN_EXIT",
                format!("[DRY_RUN] would SELL {} {pair_symbol} ({:?})", position.amount, exit_type),
            )));
            return Ok(());
        }

        let request = SubmitOrderRequest {
            pair: position.pair.clone(),
            side: OrderSide::Sell,
            order_type: OrderType::Market,
            amount: position.amount,
            price: None,
            client_order_id: client_order_id.clone(),
        };
        let (ack, _retries) = submit_with_nonce_retry(self.exchange.as_ref(), request).await?;
        let outcome = poll_until_terminal(
            self.exchange.as_ref(),
            &ack.order_id,
            std::time::Duration::from_secs(self.config.bot.order_timeout_sec),
            ORDER_TIMEOUT_POLL_INITIAL,
            ORDER_TIMEOUT_POLL_MAX,
        )
        .await?;

        if let PollOutcome::Filled(status) | PollOutcome::PartiallyFilled(status) = outcome {
            let fill = TradeFill {
                fill_id: Uuid::new_v4(),
                exchange: self.exchange.id(),
                pair: pair_symbol.to_string(),
                side: OrderSide::Sell,
                price: status.average_price,
                amount: status.filled_qty,
                cost: status.average_price * status.filled_qty,
                fee_eur: status.average_price * status.filled_qty * self.exchange.taker_fee_pct(),
                executed_at: now,
                order_id: status.order_id.clone(),
                client_order_id,
                lot_id: Some(position.lot_id),
            };
            self.repository.insert_pending_fill(&fill).await?;

            let mut lots = self.repository.open_lots(pair_symbol, self.exchange.id()).await?;
            let outcome = accountant::record_sell(&fill, fill.price, self.exchange.taker_fee_pct(), &mut lots);
            accountant::verify_disposal_invariant(&fill, &outcome).map_err(EngineError::Accountant)?;
            for lot in &lots {
                self.repository.update_lot_remaining(lot.lot_id, lot.remaining_qty, lot.is_closed).await?;
            }
            for disposal in &outcome.disposals {
                self.repository.insert_disposal(disposal).await?;
            }
            self.repository
                .mark_fill_executed(fill.fill_id, fill.price, fill.amount, fill.fee_eur, Some(position.lot_id), "filled")
                .await?;

            let realized = outcome.total_gain_loss_eur();
            if realized < Decimal::ZERO {
                self.daily_realized_loss_usd += realized.abs();
            }
            self.cooldowns.insert(pair_symbol.to_string(), now);

            events.push(EngineEvent::Bot(BotEvent::new(
                BotEventLevel::Info,
                "POSITION_CLOSED",
                format!("{pair_symbol} closed via {:?} at {}", exit_type, status.average_price),
            )));
            events.push(EngineEvent::Fill(fill));
        } else {
            tracing::warn!(pair = %pair_symbol, "exit order did not reach a filled terminal state, re-arming position");
            self.open_positions.insert(pair_symbol.to_string(), position.clone());
        }

        Ok(())
    }
}
