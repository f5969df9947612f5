pub mod candle;
pub mod disposal;
pub mod enums;
pub mod error;
pub mod event;
pub mod fill;
pub mod indicator;
pub mod lot;
pub mod markup;
pub mod pair;
pub mod position;
pub mod signal;
pub mod sync;

pub use candle::Candle;
pub use disposal::Disposal;
pub use enums::{
    BotEventLevel, ExchangeId, ExchangeRole, ExitType, Interval, OrderSide, OrderType,
    PositionMode, PositionState, Regime, RiskLevel, Side, StrategyId, SyncMode, SyncStatus,
};
pub use error::CoreError;
pub use event::BotEvent;
pub use fill::TradeFill;
pub use indicator::{FeatureVector, IndicatorSnapshot};
pub use lot::Lot;
pub use markup::MarkupSample;
pub use pair::Pair;
pub use position::OpenPosition;
pub use signal::Signal;
pub use sync::SyncRun;
