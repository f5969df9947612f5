//! Deterministic FIFO lot/disposal matching and realized P&L in EUR (§4.9).
//! Pure logic: the caller owns fetching fills, persisting lots/disposals, and
//! sourcing the USD→EUR rate series.

pub mod error;
pub mod fifo;

pub use error::AccountantError;
pub use fifo::{record_buy, record_sell, synthetic_buy, verify_disposal_invariant, DisposalOutcome, EPSILON};
