use chrono::{DateTime, Utc};
use core_types::{BotEvent, OpenPosition, Regime, Side, TradeFill};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Per-pair diagnostic record emitted once per tick, consumed by whatever
/// surface renders live engine state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TickDiagnostic {
    pub pair: String,
    pub signal: Side,
    pub reason: String,
    pub cooldown_sec: i64,
    pub exposure_available: Decimal,
    pub has_position: bool,
    pub position_usd: Decimal,
    pub regime: Regime,
}

/// A full snapshot of currently open positions, broadcast after every tick
/// and on demand (e.g. a `/posiciones` style command).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PositionsSnapshot {
    pub timestamp: DateTime<Utc>,
    pub free_usd: Decimal,
    pub total_equity_usd: Decimal,
    pub positions: Vec<OpenPosition>,
}

/// The top-level event stream emitted by the engine. Any downstream consumer
/// (notifier, persistence mirror, an external dashboard) matches on this enum
/// rather than parsing untyped JSON.
///
/// The `#[serde(tag = "type", content = "payload")]` attribute serializes the
/// enum into a flat, discriminated JSON object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload")]
pub enum EngineEvent {
    /// A bounded-retention diagnostic event.
    Bot(BotEvent),
    /// Snapshot of open positions and account equity.
    Positions(PositionsSnapshot),
    /// A fill was recorded (pending, partial, or final).
    Fill(TradeFill),
    /// Per-pair per-tick diagnostic.
    Tick(TickDiagnostic),
    /// Sent once after the engine worker starts accepting ticks.
    Connected,
}
