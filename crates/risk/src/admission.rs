use chrono::{DateTime, Utc};
use configuration::RiskManagement;
use core_types::{Pair, RiskLevel};
use rust_decimal::Decimal;

/// Everything the admission check needs to know about the current state of
/// a pair and the portfolio, gathered by the engine before it asks whether a
/// BUY may proceed (§4.5).
#[derive(Debug, Clone)]
pub struct AdmissionInput {
    pub pair: Pair,
    pub now: DateTime<Utc>,
    /// The later of the pair's last fill and last rejection; `None` if
    /// neither has ever happened.
    pub cooldown_started_at: Option<DateTime<Utc>>,
    pub pair_exposure_usd: Decimal,
    pub total_exposure_usd: Decimal,
    pub total_equity_usd: Decimal,
    /// Realized loss so far in the current UTC day, as a positive number.
    pub daily_realized_loss_usd: Decimal,
    pub has_pending_buy: bool,
    pub candidate_qty: Decimal,
}

/// The outcome of an admission check, always carrying a human-readable
/// reason so the caller can surface it on the tick diagnostic record.
#[derive(Debug, Clone, PartialEq)]
pub enum AdmissionDecision {
    Admitted,
    Denied(String),
}

impl AdmissionDecision {
    pub fn is_admitted(&self) -> bool {
        matches!(self, AdmissionDecision::Admitted)
    }
}

/// Runs every admission gate in the order spec'd, short-circuiting on the
/// first failure so the reason reported is always the first blocking one.
pub fn check_admission(input: &AdmissionInput, risk: &RiskManagement, risk_level: RiskLevel) -> AdmissionDecision {
    if let Some(cooldown_started_at) = input.cooldown_started_at {
        let elapsed = (input.now - cooldown_started_at).num_seconds().max(0) as u64;
        if elapsed < risk.cooldown_sec {
            return AdmissionDecision::Denied(format!(
                "pair {} in cooldown for {} more seconds",
                input.pair,
                risk.cooldown_sec - elapsed
            ));
        }
    }

    if input.has_pending_buy {
        return AdmissionDecision::Denied(format!("pending BUY already open for {}", input.pair));
    }

    if input.total_equity_usd > Decimal::ZERO {
        let pair_exposure_pct = input.pair_exposure_usd / input.total_equity_usd;
        if pair_exposure_pct >= risk.max_pair_exposure_pct {
            return AdmissionDecision::Denied(format!(
                "pair exposure {pair_exposure_pct} exceeds max_pair_exposure_pct {}",
                risk.max_pair_exposure_pct
            ));
        }

        let total_exposure_pct = input.total_exposure_usd / input.total_equity_usd;
        if total_exposure_pct >= risk.max_total_exposure_pct {
            return AdmissionDecision::Denied(format!(
                "total exposure {total_exposure_pct} exceeds max_total_exposure_pct {}",
                risk.max_total_exposure_pct
            ));
        }

        let daily_loss_limit = risk.daily_loss_limit_pct_for(risk_level);
        let daily_loss_pct = input.daily_realized_loss_usd / input.total_equity_usd;
        if daily_loss_pct >= daily_loss_limit {
            return AdmissionDecision::Denied(format!(
                "daily realized loss {daily_loss_pct} reached the kill-switch limit {daily_loss_limit}"
            ));
        }
    }

    if input.candidate_qty < input.pair.min_order_size {
        return AdmissionDecision::Denied(format!(
            "candidate quantity {} below venue minimum {}",
            input.candidate_qty, input.pair.min_order_size
        ));
    }

    AdmissionDecision::Admitted
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn risk() -> RiskManagement {
        RiskManagement {
            risk_per_trade_pct: dec!(0.03),
            max_pair_exposure_pct: dec!(0.2),
            max_total_exposure_pct: dec!(0.6),
            daily_loss_limit_pct: dec!(0.05),
            cooldown_sec: 300,
        }
    }

    fn pair() -> Pair {
        Pair::new("BTC", "USD", dec!(0.0001), dec!(0.0001), dec!(0.1)).unwrap()
    }

    fn base_input() -> AdmissionInput {
        AdmissionInput {
            pair: pair(),
            now: "2026-01-01T12:00:00Z".parse().unwrap(),
            cooldown_started_at: None,
            pair_exposure_usd: Decimal::ZERO,
            total_exposure_usd: Decimal::ZERO,
            total_equity_usd: dec!(10000),
            daily_realized_loss_usd: Decimal::ZERO,
            has_pending_buy: false,
            candidate_qty: dec!(0.01),
        }
    }

    #[test]
    fn admits_when_all_gates_pass() {
        let decision = check_admission(&base_input(), &risk(), RiskLevel::Medium);
        assert_eq!(decision, AdmissionDecision::Admitted);
    }

    #[test]
    fn denies_within_cooldown_window() {
        let mut input = base_input();
        input.cooldown_started_at = Some(input.now - chrono::Duration::seconds(60));
        let decision = check_admission(&input, &risk(), RiskLevel::Medium);
        assert!(!decision.is_admitted());
    }

    #[test]
    fn admits_once_cooldown_window_elapses() {
        let mut input = base_input();
        input.cooldown_started_at = Some(input.now - chrono::Duration::seconds(301));
        let decision = check_admission(&input, &risk(), RiskLevel::Medium);
        assert!(decision.is_admitted());
    }

    #[test]
    fn denies_when_pair_exposure_cap_exceeded() {
        let mut input = base_input();
        input.pair_exposure_usd = dec!(2100);
        let decision = check_admission(&input, &risk(), RiskLevel::Medium);
        assert!(!decision.is_admitted());
    }

    #[test]
    fn denies_when_daily_loss_limit_reached() {
        let mut input = base_input();
        input.daily_realized_loss_usd = dec!(600);
        let decision = check_admission(&input, &risk(), RiskLevel::Medium);
        assert!(!decision.is_admitted());
    }

    #[test]
    fn denies_when_pending_buy_already_open() {
        let mut input = base_input();
        input.has_pending_buy = true;
        let decision = check_admission(&input, &risk(), RiskLevel::Medium);
        assert!(!decision.is_admitted());
    }

    #[test]
    fn denies_below_venue_minimum() {
        let mut input = base_input();
        input.candidate_qty = dec!(0.00001);
        let decision = check_admission(&input, &risk(), RiskLevel::Medium);
        assert!(!decision.is_admitted());
    }
}
