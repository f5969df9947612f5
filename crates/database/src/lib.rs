//! The system's permanent archive: a thin, typed wrapper over the Postgres
//! tables named in the external interfaces layout — fills, lots, disposals,
//! bot events, the single-row bot config, Telegram chat registrations, and
//! the fiscal-accounting alert/sync-history tables.
//!
//! ## Architectural Principles
//!
//! - **Layer 3 Adapter:** encapsulates all SQL; the rest of the workspace
//!   only sees `DbRepository` methods and typed row structs.
//! - **Asynchronous & Pooled:** every operation is async over a shared
//!   `PgPool`.
//!
//! ## Public API
//!
//! - `connect` / `run_migrations`: pool setup and embedded schema migration.
//! - `DbRepository`: the single entry point for all persistence operations.
//! - `DbError`: this crate's error type.

pub mod connection;
pub mod error;
pub mod repository;

pub use connection::{connect, run_migrations};
pub use error::DbError;
pub use repository::{BotConfigRow, DbRepository, FiscoAlertConfigRow, TelegramChatRow};
