//! Bank Simulator CLI
//!
//! Interactive front end reading bank commands from stdin.
//!
//! # Usage
//!
//! ```bash
//! cargo run
//! cargo run -- --max-workers 16 --backlog-ratio 3 < commands.txt
//! RUST_LOG=debug cargo run -- --quiet-events
//! ```
//!
//! Replies and `Log:` event lines go to stdout; diagnostics go to stderr.
//! At the end of input the program waits for queued transactions to finish
//! and exits.
//!
//! # Exit Codes
//!
//! - 0: Success
//! - 1: Error (runtime could not start, I/O failure on stdin/stdout)

use bank_simulator::cli;
use bank_simulator::core::{Bank, ConsoleLogger, TracingObserver};
use bank_simulator::io::console;
use std::io::{self, BufWriter};
use std::process;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(io::stderr)
        .init();

    let args = cli::parse_args();
    let config = args.to_bank_config();

    let bank = match Bank::new(config) {
        Ok(bank) => bank,
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    };

    bank.subscribe(Arc::new(TracingObserver));
    if !args.quiet_events {
        bank.subscribe(Arc::new(ConsoleLogger::new(BufWriter::new(io::stdout()))));
    }

    let stdin = io::stdin();
    let mut stdout = io::stdout();
    let result = console::run(&bank, stdin.lock(), &mut stdout);

    while !bank.wait_idle(Duration::from_secs(1)) {
        debug!(depth = bank.queue_depth(), "waiting for cashiers to finish");
    }
    bank.shutdown();

    match result {
        Ok(stats) => info!(
            accepted = stats.accepted,
            unknown = stats.unknown,
            malformed = stats.malformed,
            "session finished"
        ),
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    }
}
