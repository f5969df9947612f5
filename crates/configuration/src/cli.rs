use clap::{Parser, Subcommand};

/// Operator-facing entry points. There is no end-user CLI surface; trading
/// commands are issued exclusively through Telegram (see `notifier`).
#[derive(Debug, Parser)]
#[command(name = "meridian", about = "Autonomous crypto trading engine")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Runs the trading engine's main loop.
    Run,
    /// Applies pending database migrations and exits.
    Migrate,
    /// Executes a single engine tick against live data without looping, for
    /// operator smoke-testing. Respects `dryRunMode`.
    DryRunTick,
}
