use std::collections::HashMap;

use core_types::StrategyId;

use crate::error::StrategyError;
use crate::grid::Grid;
use crate::mean_reversion::MeanReversion;
use crate::momentum::Momentum;
use crate::scalping::Scalping;
use crate::Strategy;
use configuration::Strategies;

/// Constructs a single strategy from its parameter set in `config`.
pub fn create_strategy(id: StrategyId, config: &Strategies) -> Result<Box<dyn Strategy>, StrategyError> {
    let strategy: Box<dyn Strategy> = match id {
        StrategyId::Momentum => Box::new(Momentum::new(config.momentum.clone())?),
        StrategyId::MeanReversion => Box::new(MeanReversion::new(config.mean_reversion.clone())?),
        StrategyId::Scalping => Box::new(Scalping::new(config.scalping.clone())?),
        StrategyId::Grid => Box::new(Grid::new(config.grid.clone())?),
    };
    Ok(strategy)
}

/// Constructs every strategy, keyed by its `StrategyId`, for the router to
/// dispatch against.
pub fn create_all(config: &Strategies) -> Result<HashMap<StrategyId, Box<dyn Strategy>>, StrategyError> {
    let mut strategies: HashMap<StrategyId, Box<dyn Strategy>> = HashMap::new();
    for id in [StrategyId::Momentum, StrategyId::MeanReversion, StrategyId::Scalping, StrategyId::Grid] {
        strategies.insert(id, create_strategy(id, config)?);
    }
    Ok(strategies)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn config() -> Strategies {
        Strategies {
            momentum: configuration::MomentumParams {
                min_confidence: dec!(60),
                volume_confirmation_ratio: dec!(0.5),
            },
            mean_reversion: configuration::MeanReversionParams {
                min_confidence: dec!(60),
                deviation_z: dec!(0.01),
            },
            scalping: configuration::ScalpingParams {
                min_confidence: dec!(50),
                min_atr: dec!(0.1),
                target_pct: dec!(0.3),
                stop_pct: dec!(0.15),
            },
            grid: configuration::GridParams {
                levels: 3,
                atr_spacing_multiplier: dec!(1),
            },
        }
    }

    #[test]
    fn builds_every_strategy_id() {
        let cfg = config();
        for id in [StrategyId::Momentum, StrategyId::MeanReversion, StrategyId::Scalping, StrategyId::Grid] {
            let strategy = create_strategy(id, &cfg).unwrap();
            assert_eq!(strategy.id(), id);
        }
    }

    #[test]
    fn create_all_populates_every_variant() {
        let strategies = create_all(&config()).unwrap();
        assert_eq!(strategies.len(), 4);
    }
}
