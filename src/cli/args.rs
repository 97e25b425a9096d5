use crate::core::BankConfig;
use clap::Parser;
use std::time::Duration;

/// Simulate a bank whose cashiers process transactions concurrently
#[derive(Parser, Debug)]
#[command(name = "bank-simulator")]
#[command(
    about = "Simulate a bank whose cashiers process transactions concurrently",
    long_about = "Reads commands from stdin, one per line:\n  \
                  add_client <id> <currency>\n  \
                  deposit <id> <amount>\n  \
                  withdraw <id> <amount>\n  \
                  transfer <sender> <receiver> <amount>\n  \
                  exchange <id> <from> <to> <amount>\n  \
                  clear"
)]
pub struct CliArgs {
    /// Cashiers started before the first command
    #[arg(
        long = "initial-workers",
        value_name = "COUNT",
        help = "Cashiers started before the first command (default: 1)"
    )]
    pub initial_workers: Option<usize>,

    /// Upper bound on the cashier pool
    #[arg(
        long = "max-workers",
        value_name = "COUNT",
        help = "Upper bound on the cashier pool (default: 4 x CPU cores)"
    )]
    pub max_workers: Option<usize>,

    /// Queued transactions per cashier before the pool grows
    #[arg(
        long = "backlog-ratio",
        value_name = "RATIO",
        help = "Queued transactions per cashier before the pool grows (default: 3)"
    )]
    pub backlog_ratio: Option<usize>,

    /// Seconds between exchange rate refreshes
    #[arg(
        long = "rate-refresh-secs",
        value_name = "SECS",
        help = "Seconds between exchange rate refreshes (default: 3600)"
    )]
    pub rate_refresh_secs: Option<u64>,

    /// Milliseconds an idle cashier waits before checking for shutdown
    #[arg(
        long = "poll-interval-ms",
        value_name = "MS",
        help = "Milliseconds an idle cashier waits before checking for shutdown (default: 100)"
    )]
    pub poll_interval_ms: Option<u64>,

    /// Reject exchanges larger than the balance
    #[arg(long = "strict-exchange")]
    pub strict_exchange: bool,

    /// Do not print `Log:` lines for bank events
    #[arg(long = "quiet-events")]
    pub quiet_events: bool,
}

impl CliArgs {
    /// Create a BankConfig from CLI arguments
    ///
    /// Options that were not given take their default value. Invalid values
    /// (zeros) are replaced by defaults with a warning.
    pub fn to_bank_config(&self) -> BankConfig {
        let default = BankConfig::default();
        BankConfig::new(
            self.initial_workers.unwrap_or(default.initial_workers),
            self.max_workers.unwrap_or(default.max_workers),
            self.backlog_ratio.unwrap_or(default.backlog_ratio),
            self.rate_refresh_secs
                .map(Duration::from_secs)
                .unwrap_or(default.rate_refresh_interval),
            self.poll_interval_ms
                .map(Duration::from_millis)
                .unwrap_or(default.poll_interval),
            self.strict_exchange,
        )
    }
}
