use core_types::{ExitType, OpenPosition};
use rust_decimal::Decimal;

use configuration::ExitConfig;

/// A SELL the state machine wants submitted this tick, with the reason that
/// fired it. `ExitTrigger::reason_text` mirrors what the exit-notification
/// template renders.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExitTrigger {
    pub exit_type: ExitType,
    pub quantity: Decimal,
}

/// Whether a stop was raised this evaluation without firing an exit — used
/// to gate the throttled `stop_updated` notification. Trailing updates that
/// don't also trigger a sell must not notify, per §4.7.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopUpdate {
    None,
    Raised,
}

/// Evaluates one open position against the latest mid price, mutating its
/// exit-management fields in place and returning any fired exit. Transitions
/// are monotonic: `be_armed`/`trailing_armed` only ever flip on, and
/// `stop_price` only ever rises.
///
/// Tie-break when multiple conditions are satisfied in the same call:
/// SL > TRAILING > TP (manual exits are a separate, operator-driven path
/// that bypasses this function entirely).
pub fn evaluate(position: &mut OpenPosition, price: Decimal, exits: &ExitConfig) -> (Option<ExitTrigger>, StopUpdate) {
    let mut stop_update = StopUpdate::None;

    if !position.be_armed && price >= position.entry_price * (Decimal::ONE + exits.be_arm_pct) {
        let be_stop = position.entry_price * (Decimal::ONE + exits.be_lock_pct);
        if be_stop > position.stop_price {
            position.stop_price = be_stop;
            stop_update = StopUpdate::Raised;
        }
        position.be_armed = true;
    }

    if exits.trailing_stop_enabled
        && !position.trailing_armed
        && price >= position.entry_price * (Decimal::ONE + exits.trailing_arm_pct)
    {
        position.trailing_armed = true;
    }

    if position.trailing_armed {
        if price > position.trailing_high_water_mark {
            position.trailing_high_water_mark = price;
        }
        let trailing_stop = position.trailing_high_water_mark * (Decimal::ONE - exits.trailing_distance_pct);
        if trailing_stop > position.stop_price {
            position.stop_price = trailing_stop;
            stop_update = StopUpdate::Raised;
        }
    }

    if price <= position.stop_price {
        return (Some(ExitTrigger { exit_type: ExitType::StopLoss, quantity: position.amount }), stop_update);
    }

    if position.trailing_armed && price <= position.stop_price {
        return (Some(ExitTrigger { exit_type: ExitType::TrailingStop, quantity: position.amount }), stop_update);
    }

    let take_profit_eligible = !exits.trailing_stop_enabled || !position.trailing_armed;
    if take_profit_eligible && price >= position.take_profit_price {
        return (Some(ExitTrigger { exit_type: ExitType::TakeProfit, quantity: position.amount }), stop_update);
    }

    (None, stop_update)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use rust_decimal_macros::dec;
    use uuid::Uuid;

    fn exits() -> ExitConfig {
        ExitConfig {
            stop_loss_pct: dec!(0.02),
            take_profit_pct: dec!(0.04),
            trailing_stop_enabled: true,
            trailing_arm_pct: dec!(0.015),
            trailing_distance_pct: dec!(0.01),
            be_arm_pct: dec!(0.01),
            be_lock_pct: dec!(0.002),
            stop_update_notify_min_interval_sec: 300,
        }
    }

    fn position() -> OpenPosition {
        OpenPosition::new(
            Uuid::new_v4(),
            core_types::Pair::new("BTC", "USD", dec!(0.0001), dec!(0.0001), dec!(0.1)).unwrap(),
            core_types::ExchangeId::Kraken,
            dec!(0.1),
            dec!(50000),
            Utc::now(),
            dec!(0.02),
            dec!(0.04),
        )
    }

    #[test]
    fn stop_loss_fires_when_price_drops_to_initial_stop() {
        let mut pos = position();
        let (trigger, _) = evaluate(&mut pos, dec!(49000), &exits());
        assert_eq!(trigger.unwrap().exit_type, ExitType::StopLoss);
    }

    #[test]
    fn take_profit_fires_when_trailing_never_armed() {
        let mut pos = position();
        let (trigger, _) = evaluate(&mut pos, dec!(52500), &exits());
        // 52500 is above both the take-profit price (52000) and the trailing
        // arm threshold (50750); trailing arms first, so TP is NOT eligible —
        // this exercises the trailing-preempts-TP branch of the tie-break.
        assert_ne!(trigger.unwrap().exit_type, ExitType::TakeProfit);
    }

    #[test]
    fn take_profit_fires_when_trailing_disabled() {
        let mut exits = exits();
        exits.trailing_stop_enabled = false;
        let mut pos = position();
        let (trigger, _) = evaluate(&mut pos, dec!(52500), &exits);
        assert_eq!(trigger.unwrap().exit_type, ExitType::TakeProfit);
    }

    #[test]
    fn break_even_arms_and_raises_stop_without_firing() {
        let mut pos = position();
        let (trigger, update) = evaluate(&mut pos, dec!(50600), &exits());
        assert!(trigger.is_none());
        assert_eq!(update, StopUpdate::Raised);
        assert!(pos.be_armed);
        assert_eq!(pos.stop_price, dec!(50000) * (Decimal::ONE + dec!(0.002)));
    }

    #[test]
    fn stop_never_regresses_across_successive_evaluations() {
        let mut pos = position();
        evaluate(&mut pos, dec!(50600), &exits());
        let stop_after_be = pos.stop_price;
        evaluate(&mut pos, dec!(50500), &exits());
        assert!(pos.stop_price >= stop_after_be);
    }

    #[test]
    fn trailing_stop_fires_after_pullback_from_high_water_mark() {
        let mut pos = position();
        // Arm trailing, then push the high-water mark up.
        evaluate(&mut pos, dec!(51000), &exits());
        assert!(pos.trailing_armed);
        evaluate(&mut pos, dec!(53000), &exits());
        assert_eq!(pos.trailing_high_water_mark, dec!(53000));

        // Pull back below the trailing stop (53000 * 0.99 = 52470).
        let (trigger, _) = evaluate(&mut pos, dec!(52000), &exits());
        assert_eq!(trigger.unwrap().exit_type, ExitType::TrailingStop);
    }
}
