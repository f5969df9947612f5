//! The trading engine: wires strategies, risk, execution, the FIFO
//! accountant, and persistence into the per-tick orchestration loop
//! (§4.2, §4.5–§4.8). Everything downstream (the notifier, the scheduler,
//! the binary) consumes the `events::EngineEvent`s a tick returns rather
//! than reaching into engine internals directly.

pub mod error;
pub mod exits;
pub mod markup;
pub mod pair_meta;
pub mod tick;

pub use error::EngineError;
pub use pair_meta::resolve_pair;
pub use tick::TradingEngine;
