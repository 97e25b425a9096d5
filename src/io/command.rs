//! Command line parsing
//!
//! Turns one line of user input into a [`Command`]. The verb is
//! case-insensitive, arguments are separated by whitespace, and trailing
//! arguments beyond those a command needs are ignored.
//!
//! | Verb         | Arguments                          |
//! |--------------|------------------------------------|
//! | `add_client` | `<id> <currency>`                  |
//! | `deposit`    | `<id> <amount>`                    |
//! | `withdraw`   | `<id> <amount>`                    |
//! | `transfer`   | `<sender> <receiver> <amount>`     |
//! | `exchange`   | `<id> <from> <to> <amount>`        |
//! | `clear`      |                                    |
//!
//! All functions are pure (no I/O) for easy testing.

use crate::types::{BankError, ClientId, Currency, Transaction};
use rust_decimal::Decimal;
use std::str::FromStr;

/// A parsed console command
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    AddClient { client: ClientId, currency: Currency },
    Deposit { client: ClientId, amount: Decimal },
    Withdraw { client: ClientId, amount: Decimal },
    Transfer {
        sender: ClientId,
        receiver: ClientId,
        amount: Decimal,
    },
    Exchange {
        client: ClientId,
        from: Currency,
        to: Currency,
        amount: Decimal,
    },
    Clear,
}

impl Command {
    /// The transaction this command queues, if any
    pub fn into_transaction(self) -> Option<Transaction> {
        match self {
            Command::Deposit { client, amount } => Some(Transaction::Deposit { client, amount }),
            Command::Withdraw { client, amount } => Some(Transaction::Withdrawal {
                client,
                amount,
                forced: false,
            }),
            Command::Transfer {
                sender,
                receiver,
                amount,
            } => Some(Transaction::Transfer {
                sender,
                receiver,
                amount,
            }),
            Command::Exchange {
                client,
                from,
                to,
                amount,
            } => Some(Transaction::CurrencyExchange {
                client,
                from,
                to,
                amount,
            }),
            Command::AddClient { .. } | Command::Clear => None,
        }
    }
}

impl FromStr for Command {
    type Err = BankError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let mut parts = line.split_whitespace();
        let verb = parts.next().unwrap_or_default().to_lowercase();
        let args = Args {
            command: &verb,
            values: parts.collect(),
        };

        match verb.as_str() {
            "add_client" => Ok(Command::AddClient {
                client: args.client(1)?,
                currency: args.text(2)?.to_string(),
            }),
            "deposit" => Ok(Command::Deposit {
                client: args.client(1)?,
                amount: args.amount(2)?,
            }),
            "withdraw" => Ok(Command::Withdraw {
                client: args.client(1)?,
                amount: args.amount(2)?,
            }),
            "transfer" => Ok(Command::Transfer {
                sender: args.client(1)?,
                receiver: args.client(2)?,
                amount: args.amount(3)?,
            }),
            "exchange" => Ok(Command::Exchange {
                client: args.client(1)?,
                from: args.text(2)?.to_string(),
                to: args.text(3)?.to_string(),
                amount: args.amount(4)?,
            }),
            "clear" => Ok(Command::Clear),
            _ => Err(BankError::unknown_command(&verb)),
        }
    }
}

/// Positional arguments of one command, 1-based
struct Args<'a> {
    command: &'a str,
    values: Vec<&'a str>,
}

impl<'a> Args<'a> {
    fn text(&self, position: usize) -> Result<&'a str, BankError> {
        self.values
            .get(position - 1)
            .copied()
            .ok_or_else(|| BankError::missing_argument(self.command, position))
    }

    fn client(&self, position: usize) -> Result<ClientId, BankError> {
        let value = self.text(position)?;
        value
            .parse()
            .map_err(|_| BankError::invalid_client_id(value))
    }

    fn amount(&self, position: usize) -> Result<Decimal, BankError> {
        let value = self.text(position)?;
        parse_amount(value)
    }
}

/// Parse a non-negative decimal amount
///
/// Accepts plain (`12.50`) and scientific (`1e3`) notation.
pub fn parse_amount(value: &str) -> Result<Decimal, BankError> {
    let amount = Decimal::from_str(value)
        .or_else(|_| Decimal::from_scientific(value))
        .map_err(|_| BankError::invalid_amount(value))?;

    if amount.is_sign_negative() && !amount.is_zero() {
        return Err(BankError::negative_amount(value));
    }
    Ok(amount)
}
