//! Order submission and reconciliation (§4.6): idempotent `clientOrderId`
//! derivation, nonce-retry submission, backoff polling to a terminal order
//! status, and the per-tick reconciliation sweep against exchange balances.
//!
//! ## Public API
//!
//! - `derive_client_order_id`: deterministic `{pair, side, tickId}` id.
//! - `IdempotencyGuard`: in-process duplicate-submission guard.
//! - `submit_with_nonce_retry`: submission with up-to-3 nonce retries.
//! - `poll_until_terminal`: backoff polling to a terminal `OrderStatus`.
//! - `reconcile_open_lots`: orphan-balance detection.

pub mod client_order_id;
pub mod error;
pub mod idempotency;
pub mod reconciliation;
pub mod submission;
pub mod watcher;

pub use client_order_id::derive_client_order_id;
pub use error::ExecutorError;
pub use idempotency::IdempotencyGuard;
pub use reconciliation::{reconcile_open_lots, OrphanCleanup};
pub use submission::{submit_with_nonce_retry, MAX_NONCE_RETRIES};
pub use watcher::{poll_until_terminal, PollOutcome};
