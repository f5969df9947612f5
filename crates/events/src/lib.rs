//! Real-time event structures broadcast by the trading engine to whatever
//! process consumes it (notifier, persistence mirror, an external surface).
//!
//! As a Layer 0 crate it depends only on `core-types` and provides the
//! definitive vocabulary for all live state synchronization.

pub mod error;
pub mod messages;

pub use error::EventsError;
pub use messages::{EngineEvent, PositionsSnapshot, TickDiagnostic};
