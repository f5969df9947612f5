use core_types::{PositionMode, RiskLevel, StrategyId};
use rust_decimal::Decimal;
use serde::Deserialize;

/// The root configuration structure for the entire application, assembled
/// from `config.toml` plus the `.env`-sourced secrets loaded separately by
/// `load_config`.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub bot: BotConfig,
    pub risk_management: RiskManagement,
    pub exits: ExitConfig,
    pub router: RouterConfig,
    pub strategies: Strategies,
    pub notifications: NotificationConfig,
    #[serde(default)]
    pub reconciliation: ReconciliationConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Top-level bot behavior: which strategy/pairs/cadence to run.
#[derive(Debug, Clone, Deserialize)]
pub struct BotConfig {
    /// Default strategy used when the router is disabled.
    pub strategy: StrategyId,
    pub risk_level: RiskLevel,
    pub active_pairs: Vec<String>,
    pub tick_interval_ms: u64,
    pub order_timeout_sec: u64,
    /// When true, no order submission occurs; every other code path runs,
    /// including event emission tagged `[DRY_RUN]`.
    pub dry_run_mode: bool,
    pub position_mode: PositionMode,
    pub router_enabled: bool,
    /// Fixed UTC offset (hours) the 14:00/08:00 scheduled jobs fire against
    /// (§4.11). A single configured constant rather than an IANA zone, since
    /// the operator's timezone doesn't itself observe DST mid-run.
    #[serde(default)]
    pub operator_tz_offset_hours: i32,
}

/// Trade-level sizing and admission-control parameters.
#[derive(Debug, Clone, Deserialize)]
pub struct RiskManagement {
    /// Fraction of free balance risked per trade (e.g. 0.03 for 3%).
    pub risk_per_trade_pct: Decimal,
    pub max_pair_exposure_pct: Decimal,
    pub max_total_exposure_pct: Decimal,
    /// Hard daily realized-loss kill-switch, as a fraction of equity.
    pub daily_loss_limit_pct: Decimal,
    /// Per-pair cooldown after a fill or a rejection.
    pub cooldown_sec: u64,
}

impl RiskManagement {
    /// `riskPerTradePct` and the daily loss cap scale with the configured
    /// risk level; low/medium/high map to 0.5x/1x/1.5x the base values.
    pub fn risk_per_trade_pct_for(&self, level: RiskLevel) -> Decimal {
        self.risk_per_trade_pct * Self::level_multiplier(level)
    }

    pub fn daily_loss_limit_pct_for(&self, level: RiskLevel) -> Decimal {
        self.daily_loss_limit_pct * Self::level_multiplier(level)
    }

    fn level_multiplier(level: RiskLevel) -> Decimal {
        match level {
            RiskLevel::Low => Decimal::new(5, 1),
            RiskLevel::Medium => Decimal::ONE,
            RiskLevel::High => Decimal::new(15, 1),
        }
    }
}

/// Position exit state machine parameters (§4.7).
#[derive(Debug, Clone, Deserialize)]
pub struct ExitConfig {
    pub stop_loss_pct: Decimal,
    pub take_profit_pct: Decimal,
    pub trailing_stop_enabled: bool,
    pub trailing_arm_pct: Decimal,
    pub trailing_distance_pct: Decimal,
    pub be_arm_pct: Decimal,
    pub be_lock_pct: Decimal,
    /// Minimum interval between `stop_updated` notifications for the same pair.
    pub stop_update_notify_min_interval_sec: u64,
}

/// Regime-router thresholds. Per the design note on ambiguous VOLATILE
/// thresholds, these are configuration rather than hardcoded constants.
#[derive(Debug, Clone, Deserialize)]
pub struct RouterConfig {
    pub volatile_confidence_bump: Decimal,
    pub volatile_size_cut_pct: Decimal,
    pub unknown_confidence_floor: Decimal,
}

/// Parameter sets for all available strategies.
#[derive(Debug, Clone, Deserialize)]
pub struct Strategies {
    pub momentum: MomentumParams,
    pub mean_reversion: MeanReversionParams,
    pub scalping: ScalpingParams,
    pub grid: GridParams,
}

/// Parameters for the Momentum strategy (§4.3).
#[derive(Debug, Clone, Deserialize)]
pub struct MomentumParams {
    pub min_confidence: Decimal,
    pub volume_confirmation_ratio: Decimal,
}

/// Parameters for the Mean-reversion strategy (§4.3).
#[derive(Debug, Clone, Deserialize)]
pub struct MeanReversionParams {
    pub min_confidence: Decimal,
    /// Minimum price deviation from EMA50, expressed as a z-score-like ratio.
    pub deviation_z: Decimal,
}

/// Parameters for the Scalping strategy (§4.3).
#[derive(Debug, Clone, Deserialize)]
pub struct ScalpingParams {
    pub min_confidence: Decimal,
    pub min_atr: Decimal,
    pub target_pct: Decimal,
    pub stop_pct: Decimal,
}

/// Parameters for the Grid strategy's level-ladder generation (§4.3).
#[derive(Debug, Clone, Deserialize)]
pub struct GridParams {
    pub levels: u32,
    pub atr_spacing_multiplier: Decimal,
}

/// Telegram notification orchestrator configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct NotificationConfig {
    pub bot_token_env: String,
    pub env_tag: String,
    /// Per-event-type throttle overrides layered on top of the built-in
    /// dedupe/throttle table.
    #[serde(default)]
    pub notif_cooldown_overrides: std::collections::HashMap<String, u64>,
}

/// Reconciliation sweep policy (§4.6's balance-vs-ledger comparison).
#[derive(Debug, Clone, Deserialize)]
pub struct ReconciliationConfig {
    /// When true, an untracked exchange balance is closed out as a synthetic
    /// lot automatically. When false, it is only reported via a `BotEvent`
    /// and left for operator review.
    pub auto_close_orphans: bool,
}

impl Default for ReconciliationConfig {
    fn default() -> Self {
        Self { auto_close_orphans: false }
    }
}

/// Console/file logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    pub file_enabled: bool,
    pub file_directory: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file_enabled: false,
            file_directory: "logs".to_string(),
        }
    }
}
