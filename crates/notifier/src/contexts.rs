use core_types::{ExitType, Side, StrategyId};
use events::PositionsSnapshot;
use rust_decimal::Decimal;

use crate::error::NotifierError;

/// One entry per message kind named in §4.10, used as the key into the
/// dedupe/throttle table. `key()` matches the table's `type` column verbatim
/// so configuration overrides (`notifCooldown*`) can address it by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NotificationType {
    PositionsUpdate,
    Heartbeat,
    DailyReport,
    EntryIntent,
    TradeBuy,
    TradeSell,
    Error,
    RegimeChange,
    BotStarted,
    FiscoSyncSummary,
    FiscoReportGenerated,
}

impl NotificationType {
    pub fn key(&self) -> &'static str {
        match self {
            NotificationType::PositionsUpdate => "positions_update",
            NotificationType::Heartbeat => "heartbeat",
            NotificationType::DailyReport => "daily_report",
            NotificationType::EntryIntent => "entry_intent",
            NotificationType::TradeBuy => "trade_buy",
            NotificationType::TradeSell => "trade_sell",
            NotificationType::Error => "error",
            NotificationType::RegimeChange => "regime_change",
            NotificationType::BotStarted => "bot_started",
            NotificationType::FiscoSyncSummary => "fisco_sync_summary",
            NotificationType::FiscoReportGenerated => "fisco_report_generated",
        }
    }
}

/// A typed, pre-validated message to send. Every variant corresponds to one
/// of the ten contexts named in §4.10; the pipeline never renders an
/// untyped/free-form string.
#[derive(Debug, Clone, PartialEq)]
pub enum MessageContext {
    DailyReport { env_tag: String, realized_pnl_eur: Decimal, open_positions: u32, trades_today: u32 },
    BotStarted { env_tag: String, version: String },
    Heartbeat { env_tag: String, uptime_sec: u64 },
    TradeBuy { pair: String, price: Decimal, quantity: Decimal, strategy: StrategyId },
    TradeSell { pair: String, price: Decimal, quantity: Decimal, gain_loss_eur: Decimal, exit_type: ExitType },
    PositionsUpdate { snapshot: PositionsSnapshot },
    EntryIntent { pair: String, side: Side, confidence: Decimal, reason: String },
    ErrorAlert { source: String, message: String },
    FiscoSyncSummary { run_id: String, matched_disposals: u32, short_disposals: u32 },
    FiscoReportGenerated { report_path: String },
}

/// `"-"` is the placeholder the pipeline treats as equivalent to
/// null/undefined/empty, per §4.10's "never emits placeholders" rule.
fn reject_placeholder(field: &str, value: &str) -> Result<(), NotifierError> {
    if value.trim().is_empty() || value.trim() == "-" {
        return Err(NotifierError::InvalidContext(format!("field `{field}` is empty or a placeholder")));
    }
    Ok(())
}

impl MessageContext {
    pub fn notification_type(&self) -> NotificationType {
        match self {
            MessageContext::DailyReport { .. } => NotificationType::DailyReport,
            MessageContext::BotStarted { .. } => NotificationType::BotStarted,
            MessageContext::Heartbeat { .. } => NotificationType::Heartbeat,
            MessageContext::TradeBuy { .. } => NotificationType::TradeBuy,
            MessageContext::TradeSell { .. } => NotificationType::TradeSell,
            MessageContext::PositionsUpdate { .. } => NotificationType::PositionsUpdate,
            MessageContext::EntryIntent { .. } => NotificationType::EntryIntent,
            MessageContext::ErrorAlert { .. } => NotificationType::Error,
            MessageContext::FiscoSyncSummary { .. } => NotificationType::FiscoSyncSummary,
            MessageContext::FiscoReportGenerated { .. } => NotificationType::FiscoReportGenerated,
        }
    }

    /// Rejects any context carrying a null/empty/placeholder value before it
    /// ever reaches rendering or the dedupe table.
    pub fn validate(&self) -> Result<(), NotifierError> {
        match self {
            MessageContext::DailyReport { env_tag, .. } => reject_placeholder("env_tag", env_tag),
            MessageContext::BotStarted { env_tag, version } => {
                reject_placeholder("env_tag", env_tag)?;
                reject_placeholder("version", version)
            }
            MessageContext::Heartbeat { env_tag, .. } => reject_placeholder("env_tag", env_tag),
            MessageContext::TradeBuy { pair, .. } => reject_placeholder("pair", pair),
            MessageContext::TradeSell { pair, .. } => reject_placeholder("pair", pair),
            MessageContext::PositionsUpdate { .. } => Ok(()),
            MessageContext::EntryIntent { pair, reason, .. } => {
                reject_placeholder("pair", pair)?;
                reject_placeholder("reason", reason)
            }
            MessageContext::ErrorAlert { source, message } => {
                reject_placeholder("source", source)?;
                reject_placeholder("message", message)
            }
            MessageContext::FiscoSyncSummary { run_id, .. } => reject_placeholder("run_id", run_id),
            MessageContext::FiscoReportGenerated { report_path } => reject_placeholder("report_path", report_path),
        }
    }

    /// Renders the context into the plain-text body actually sent to
    /// Telegram. Content hashing for dedupe operates over this rendered
    /// body, after substitution, per §4.10.
    pub fn render(&self) -> String {
        match self {
            MessageContext::DailyReport { env_tag, realized_pnl_eur, open_positions, trades_today } => format!(
                "[{env_tag}] Daily report\nRealized P&L: {realized_pnl_eur} EUR\nOpen positions: {open_positions}\nTrades today: {trades_today}"
            ),
            MessageContext::BotStarted { env_tag, version } => format!("[{env_tag}] Bot started (v{version})"),
            MessageContext::Heartbeat { env_tag, uptime_sec } => format!("[{env_tag}] Heartbeat — uptime {uptime_sec}s"),
            MessageContext::TradeBuy { pair, price, quantity, strategy } => format!(
                "BUY {pair} qty={quantity} @ {price} (strategy: {})",
                strategy.label()
            ),
            MessageContext::TradeSell { pair, price, quantity, gain_loss_eur, exit_type } => format!(
                "SELL {pair} qty={quantity} @ {price} — P&L {gain_loss_eur} EUR ({})",
                exit_type.label()
            ),
            MessageContext::PositionsUpdate { snapshot } => format!(
                "Positions: {} open, equity {} USD, free {} USD",
                snapshot.positions.len(),
                snapshot.total_equity_usd,
                snapshot.free_usd
            ),
            MessageContext::EntryIntent { pair, side, confidence, reason } => format!(
                "Entry intent {pair} side={side:?} confidence={confidence} reason={reason}"
            ),
            MessageContext::ErrorAlert { source, message } => format!("ERROR [{source}] {message}"),
            MessageContext::FiscoSyncSummary { run_id, matched_disposals, short_disposals } => format!(
                "FIFO sync {run_id} complete — {matched_disposals} matched, {short_disposals} short disposals"
            ),
            MessageContext::FiscoReportGenerated { report_path } => format!("Fiscal report generated: {report_path}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn placeholder_pair_is_rejected() {
        let ctx = MessageContext::TradeBuy {
            pair: "-".to_string(),
            price: Decimal::ONE,
            quantity: Decimal::ONE,
            strategy: StrategyId::Momentum,
        };
        assert!(ctx.validate().is_err());
    }

    #[test]
    fn well_formed_context_validates() {
        let ctx = MessageContext::TradeBuy {
            pair: "BTC/USD".to_string(),
            price: Decimal::ONE,
            quantity: Decimal::ONE,
            strategy: StrategyId::Momentum,
        };
        assert!(ctx.validate().is_ok());
        assert!(ctx.render().contains("BTC/USD"));
    }
}
