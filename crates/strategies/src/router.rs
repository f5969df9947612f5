use std::collections::HashMap;

use core_types::{FeatureVector, Pair, Regime, Signal, StrategyId};
use rust_decimal::Decimal;

use crate::error::StrategyError;
use crate::Strategy;
use configuration::RouterConfig;

/// A signal chosen by the router plus the position-size multiplier to apply
/// on top of the engine's base sizing (e.g. cut in half for VOLATILE regimes).
pub struct RoutedSignal {
    pub signal: Signal,
    pub size_multiplier: Decimal,
}

/// Regime-aware dispatch (§4.4): TREND prefers momentum, RANGE prefers
/// mean-reversion with grid as a fallback, VOLATILE raises the confidence
/// bar and cuts size on every strategy, UNKNOWN runs momentum against a
/// stricter floor. A gated or non-actionable outcome is reported as NONE
/// with reason `"regime-gated"` rather than silently falling through to a
/// different strategy.
pub fn route(
    pair: &Pair,
    features: &FeatureVector,
    strategies: &HashMap<StrategyId, Box<dyn Strategy>>,
    router_config: &RouterConfig,
) -> Result<RoutedSignal, StrategyError> {
    let (primary, secondary, size_multiplier, min_confidence) = match features.regime {
        Regime::Trend => (StrategyId::Momentum, None, Decimal::ONE, None),
        Regime::Range => (StrategyId::MeanReversion, Some(StrategyId::Grid), Decimal::ONE, None),
        Regime::Volatile => (
            StrategyId::Momentum,
            None,
            Decimal::ONE - router_config.volatile_size_cut_pct,
            Some(Decimal::from(50) + router_config.volatile_confidence_bump),
        ),
        Regime::Unknown => (StrategyId::Momentum, None, Decimal::ONE, Some(router_config.unknown_confidence_floor)),
    };

    let signal = evaluate(pair, features, strategies, primary)?;
    let signal = if signal.is_actionable() {
        signal
    } else if let Some(secondary_id) = secondary {
        evaluate(pair, features, strategies, secondary_id)?
    } else {
        signal
    };

    if !signal.is_actionable() {
        return Ok(gated(pair, features.regime));
    }

    if let Some(floor) = min_confidence {
        if signal.confidence < floor {
            tracing::debug!(pair = %pair, confidence = %signal.confidence, floor = %floor, "router: signal gated below regime floor");
            return Ok(gated(pair, features.regime));
        }
    }

    Ok(RoutedSignal { signal, size_multiplier })
}

fn evaluate(
    pair: &Pair,
    features: &FeatureVector,
    strategies: &HashMap<StrategyId, Box<dyn Strategy>>,
    id: StrategyId,
) -> Result<Signal, StrategyError> {
    let strategy = strategies
        .get(&id)
        .ok_or_else(|| StrategyError::StrategyNotFound(id.label().to_string()))?;
    strategy.evaluate(pair, features)
}

fn gated(pair: &Pair, regime: Regime) -> RoutedSignal {
    RoutedSignal {
        signal: Signal::none(pair.clone(), regime, "regime-gated"),
        size_multiplier: Decimal::ONE,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_types::{IndicatorSnapshot, Side};
    use rust_decimal_macros::dec;

    struct AlwaysBuy(StrategyId, Decimal);
    impl Strategy for AlwaysBuy {
        fn evaluate(&self, pair: &Pair, features: &FeatureVector) -> Result<Signal, StrategyError> {
            Ok(Signal {
                pair: pair.clone(),
                side: Side::Buy,
                confidence: self.1,
                reason_text: "stub".to_string(),
                satisfied_checks: 1,
                required_checks: 1,
                tf_align_bonus: Decimal::ZERO,
                regime: features.regime,
                regime_reason: "stub".to_string(),
                strategy_label: self.0,
            })
        }
        fn id(&self) -> StrategyId {
            self.0
        }
    }

    struct AlwaysNone(StrategyId);
    impl Strategy for AlwaysNone {
        fn evaluate(&self, pair: &Pair, features: &FeatureVector) -> Result<Signal, StrategyError> {
            Ok(Signal::none(pair.clone(), features.regime, "stub none"))
        }
        fn id(&self) -> StrategyId {
            self.0
        }
    }

    fn router_config() -> RouterConfig {
        RouterConfig {
            volatile_confidence_bump: dec!(10),
            volatile_size_cut_pct: dec!(0.5),
            unknown_confidence_floor: dec!(70),
        }
    }

    fn features(regime: Regime) -> FeatureVector {
        let snap = IndicatorSnapshot {
            ema9: dec!(100),
            ema21: dec!(100),
            ema50: dec!(100),
            macd: Decimal::ZERO,
            macd_signal: Decimal::ZERO,
            macd_histogram: Decimal::ZERO,
            macd_histogram_prev: Decimal::ZERO,
            rsi14: dec!(50),
            bb_upper: dec!(105),
            bb_middle: dec!(100),
            bb_lower: dec!(95),
            atr14: dec!(1),
            volume_sma20: dec!(10),
            adx14: dec!(10),
        };
        FeatureVector {
            snapshot_5m: snap,
            snapshot_1h: snap,
            snapshot_4h: snap,
            last_close: dec!(100),
            last_volume: dec!(10),
            tf_aligned: false,
            regime,
        }
    }

    #[test]
    fn trend_regime_routes_to_momentum() {
        let pair = Pair::parse("BTC/USD").unwrap();
        let mut strategies: HashMap<StrategyId, Box<dyn Strategy>> = HashMap::new();
        strategies.insert(StrategyId::Momentum, Box::new(AlwaysBuy(StrategyId::Momentum, dec!(80))));
        let routed = route(&pair, &features(Regime::Trend), &strategies, &router_config()).unwrap();
        assert_eq!(routed.signal.strategy_label, StrategyId::Momentum);
        assert_eq!(routed.size_multiplier, Decimal::ONE);
    }

    #[test]
    fn range_regime_falls_back_to_grid_when_mean_reversion_is_none() {
        let pair = Pair::parse("BTC/USD").unwrap();
        let mut strategies: HashMap<StrategyId, Box<dyn Strategy>> = HashMap::new();
        strategies.insert(StrategyId::MeanReversion, Box::new(AlwaysNone(StrategyId::MeanReversion)));
        strategies.insert(StrategyId::Grid, Box::new(AlwaysBuy(StrategyId::Grid, dec!(60))));
        let routed = route(&pair, &features(Regime::Range), &strategies, &router_config()).unwrap();
        assert_eq!(routed.signal.strategy_label, StrategyId::Grid);
    }

    #[test]
    fn volatile_regime_gates_signal_below_bumped_threshold() {
        let pair = Pair::parse("BTC/USD").unwrap();
        let mut strategies: HashMap<StrategyId, Box<dyn Strategy>> = HashMap::new();
        strategies.insert(StrategyId::Momentum, Box::new(AlwaysBuy(StrategyId::Momentum, dec!(55))));
        let routed = route(&pair, &features(Regime::Volatile), &strategies, &router_config()).unwrap();
        assert_eq!(routed.signal.side, Side::None);
        assert_eq!(routed.signal.regime_reason, "regime-gated");
    }

    #[test]
    fn volatile_regime_admits_signal_above_bumped_threshold_with_size_cut() {
        let pair = Pair::parse("BTC/USD").unwrap();
        let mut strategies: HashMap<StrategyId, Box<dyn Strategy>> = HashMap::new();
        strategies.insert(StrategyId::Momentum, Box::new(AlwaysBuy(StrategyId::Momentum, dec!(90))));
        let routed = route(&pair, &features(Regime::Volatile), &strategies, &router_config()).unwrap();
        assert_eq!(routed.signal.side, Side::Buy);
        assert_eq!(routed.size_multiplier, dec!(0.5));
    }
}
