//! Core trading logic. This is a pure logic crate: no knowledge of exchanges,
//! persistence, or execution. It depends only on `core-types`, `indicators`,
//! and `configuration`.
//!
//! Adding a new strategy means creating a new module, implementing the
//! `Strategy` trait, and adding it to `StrategyId` and the `router`/`factory`.

pub mod error;
pub mod factory;
pub mod grid;
pub mod mean_reversion;
pub mod momentum;
pub mod router;
pub mod scalping;

pub use core_types::StrategyId;
pub use error::StrategyError;
pub use factory::create_strategy;
pub use grid::Grid;
pub use mean_reversion::MeanReversion;
pub use momentum::Momentum;
pub use router::{route, RoutedSignal};
pub use scalping::Scalping;

use core_types::{FeatureVector, Pair, Signal};

/// Common interface for all trading strategies.
///
/// Strategies are pure functions of a pair's current feature vector; they
/// hold no state of their own across ticks (the regime is recomputed fresh
/// on every call per §4.2).
pub trait Strategy: Send + Sync {
    /// Evaluates the strategy for `pair` given its current feature vector.
    /// Always returns a `Signal`; a non-actionable tick returns
    /// `Signal::none` rather than `Option::None`, so every evaluation has a
    /// `reasonText` to surface on the diagnostic record.
    fn evaluate(&self, pair: &Pair, features: &FeatureVector) -> Result<Signal, StrategyError>;

    fn id(&self) -> StrategyId;
}
