//! Admission control and position sizing (§4.5). Pure logic: no knowledge of
//! exchanges or persistence, consistent with `strategies`.

pub mod admission;
pub mod error;
pub mod sizing;

pub use admission::{check_admission, AdmissionDecision, AdmissionInput};
pub use error::RiskError;
pub use sizing::{size_order, SizingInput};
