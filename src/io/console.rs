//! Interactive command session
//!
//! Reads commands line by line, feeds them to a [`Bank`] and writes the
//! user-facing replies. Before each command the cashier pool is given a chance
//! to grow with the backlog.
//!
//! ```
//! use bank_simulator::core::{Bank, BankConfig};
//! use bank_simulator::io::console;
//! use rust_decimal::Decimal;
//! use std::time::Duration;
//!
//! let bank = Bank::with_fixed_rates(BankConfig::default(), [("USD", Decimal::ONE_HUNDRED)]).unwrap();
//! let script = "add_client 1 USD\ndeposit 1 50\nfly away\n";
//! let mut output = Vec::new();
//!
//! let stats = console::run(&bank, script.as_bytes(), &mut output).unwrap();
//! assert!(bank.wait_idle(Duration::from_secs(5)));
//!
//! assert_eq!(stats.unknown, 1);
//! assert_eq!(String::from_utf8(output).unwrap(), "Unknown command.\n");
//! assert_eq!(bank.account(1).unwrap().balance, Decimal::from(50));
//! ```
//!
//! # Error Handling
//!
//! - Unknown verbs print `Unknown command.`
//! - Missing or malformed arguments print `Wrong command format`
//! - Neither stops the session; only I/O errors on input or output do

use crate::core::Bank;
use crate::io::command::Command;
use crate::types::BankError;
use std::io::{BufRead, Write};
use tracing::{debug, warn};

pub const UNKNOWN_COMMAND: &str = "Unknown command.";
pub const WRONG_FORMAT: &str = "Wrong command format";

const CLEAR_LINES: usize = 50;

/// Counters for one session
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SessionStats {
    /// Commands parsed and executed
    pub accepted: usize,
    /// Lines with an unknown verb
    pub unknown: usize,
    /// Lines with missing or malformed arguments
    pub malformed: usize,
}

/// Run commands from `input` until it is exhausted
///
/// Blank lines are skipped. Bytes that are not valid UTF-8 are replaced before
/// parsing, so such a line is rejected like any other malformed one. Only a
/// failing read or write ends the session early. Returns once the input ends;
/// transactions may still be in flight, use [`Bank::wait_idle`] to wait for
/// them.
pub fn run<R, W>(bank: &Bank, mut input: R, output: &mut W) -> Result<SessionStats, BankError>
where
    R: BufRead,
    W: Write + ?Sized,
{
    let mut stats = SessionStats::default();
    let mut buf = Vec::new();

    loop {
        buf.clear();
        if input.read_until(b'\n', &mut buf)? == 0 {
            break;
        }
        // Invalid UTF-8 is replaced, so the line fails to parse like any other typo
        let line = String::from_utf8_lossy(&buf);
        let line = line.trim_end_matches(['\n', '\r']);
        if line.trim().is_empty() {
            continue;
        }

        if let Err(error) = bank.scale() {
            warn!(%error, "cashier pool could not grow");
        }

        match line.parse::<Command>() {
            Ok(command) => {
                execute(bank, command, output)?;
                stats.accepted += 1;
            }
            Err(error @ BankError::UnknownCommand { .. }) => {
                debug!(%error, "rejected command");
                writeln!(output, "{}", UNKNOWN_COMMAND)?;
                stats.unknown += 1;
            }
            Err(error) => {
                debug!(%error, line, "rejected command");
                writeln!(output, "{}", WRONG_FORMAT)?;
                stats.malformed += 1;
            }
        }
        output.flush()?;
    }

    Ok(stats)
}

fn execute<W>(bank: &Bank, command: Command, output: &mut W) -> Result<(), BankError>
where
    W: Write + ?Sized,
{
    match command {
        // Rejections reach the user as events
        Command::AddClient { client, currency } => {
            let _ = bank.add_client(client, &currency);
        }
        Command::Clear => {
            for _ in 0..CLEAR_LINES {
                writeln!(output)?;
            }
        }
        command => {
            if let Some(transaction) = command.into_transaction() {
                bank.submit(transaction);
            }
        }
    }
    Ok(())
}
