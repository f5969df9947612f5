use serde::{Deserialize, Serialize};

/// Identifies which strategy produced a `Signal`, or was selected by the router.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "snake_case")]
pub enum StrategyId {
    Momentum,
    MeanReversion,
    Scalping,
    Grid,
}

impl StrategyId {
    pub fn label(&self) -> &'static str {
        match self {
            StrategyId::Momentum => "momentum",
            StrategyId::MeanReversion => "mean_reversion",
            StrategyId::Scalping => "scalping",
            StrategyId::Grid => "grid",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "UPPERCASE")]
pub enum OrderSide {
    Buy,
    Sell,
}

impl serde::Serialize for OrderSide {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        match self {
            OrderSide::Buy => serializer.serialize_str("BUY"),
            OrderSide::Sell => serializer.serialize_str("SELL"),
        }
    }
}

impl<'de> serde::Deserialize<'de> for OrderSide {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        match s.to_uppercase().as_str() {
            "BUY" => Ok(OrderSide::Buy),
            "SELL" => Ok(OrderSide::Sell),
            _ => Err(serde::de::Error::custom(format!(
                "unknown variant `{}`, expected `BUY` or `SELL`",
                s
            ))),
        }
    }
}

impl OrderSide {
    /// Returns the opposite side of the order.
    pub fn opposite(&self) -> Self {
        match self {
            OrderSide::Buy => OrderSide::Sell,
            OrderSide::Sell => OrderSide::Buy,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderType {
    Market,
    Limit,
}

/// Candle interval. Ordered coarsest-last so multi-timeframe aggregation code
/// can iterate in a stable order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Interval {
    OneMinute,
    FiveMinutes,
    FifteenMinutes,
    OneHour,
    FourHours,
    OneDay,
}

impl Interval {
    pub fn as_str(&self) -> &'static str {
        match self {
            Interval::OneMinute => "1m",
            Interval::FiveMinutes => "5m",
            Interval::FifteenMinutes => "15m",
            Interval::OneHour => "1h",
            Interval::FourHours => "4h",
            Interval::OneDay => "1d",
        }
    }

    pub fn seconds(&self) -> i64 {
        match self {
            Interval::OneMinute => 60,
            Interval::FiveMinutes => 300,
            Interval::FifteenMinutes => 900,
            Interval::OneHour => 3_600,
            Interval::FourHours => 14_400,
            Interval::OneDay => 86_400,
        }
    }
}

/// Coarse market-state classification driving strategy routing. Stateless on
/// each tick — derived fresh from the current indicator snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Regime {
    Trend,
    Range,
    Volatile,
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "snake_case")]
pub enum Side {
    Buy,
    Sell,
    None,
}

/// Why a position was sold, recorded on the `TradeFill` and surfaced in
/// notifications.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "snake_case")]
pub enum ExitType {
    StopLoss,
    TakeProfit,
    TrailingStop,
    Manual,
}

impl ExitType {
    pub fn label(&self) -> &'static str {
        match self {
            ExitType::StopLoss => "STOP_LOSS",
            ExitType::TakeProfit => "TAKE_PROFIT",
            ExitType::TrailingStop => "TRAILING_STOP",
            ExitType::Manual => "MANUAL",
        }
    }
}

/// Position exit state machine states. Transitions are monotonic: a position
/// never regresses to an earlier state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "snake_case")]
pub enum PositionState {
    Active,
    BeArmed,
    Trailing,
    Closed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PositionMode {
    Single,
    SmartGuard,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "snake_case")]
pub enum BotEventLevel {
    Info,
    Warn,
    Error,
}

impl BotEventLevel {
    pub fn label(&self) -> &'static str {
        match self {
            BotEventLevel::Info => "info",
            BotEventLevel::Warn => "warn",
            BotEventLevel::Error => "error",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "snake_case")]
pub enum SyncMode {
    Auto,
    Manual,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "snake_case")]
pub enum SyncStatus {
    Running,
    Completed,
    Failed,
}

/// Identifies the venue an `Exchange` implementation talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "snake_case")]
pub enum ExchangeId {
    Kraken,
    RevolutX,
}

impl ExchangeId {
    pub fn label(&self) -> &'static str {
        match self {
            ExchangeId::Kraken => "kraken",
            ExchangeId::RevolutX => "revolutx",
        }
    }
}

/// Which logical role an exchange is playing. The data role is always
/// `Kraken` per spec; the trading role is configurable at runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExchangeRole {
    Trading,
    Data,
}
