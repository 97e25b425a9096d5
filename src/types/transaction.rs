//! Transaction-related types for the bank simulator
//!
//! Transactions are immutable requests created by the command intake, queued,
//! and consumed exactly once by a cashier.

use rust_decimal::Decimal;
use std::fmt;

/// Client identifier; any 32-bit integer, negative ids included
pub type ClientId = i32;

/// Currency code, e.g. `USD`
pub type Currency = String;

/// A queued request to change account state
#[derive(Debug, Clone, PartialEq)]
pub enum Transaction {
    /// Credit `amount` to the client's balance
    Deposit { client: ClientId, amount: Decimal },

    /// Debit `amount` from the client's balance
    ///
    /// Requires sufficient funds. `forced` marks a withdrawal that records
    /// the residual of a currency exchange; it only changes the emitted
    /// message.
    Withdrawal {
        client: ClientId,
        amount: Decimal,
        forced: bool,
    },

    /// Convert the client's holding from one currency to another
    CurrencyExchange {
        client: ClientId,
        from: Currency,
        to: Currency,
        amount: Decimal,
    },

    /// Move `amount` between two accounts sharing a currency
    Transfer {
        sender: ClientId,
        receiver: ClientId,
        amount: Decimal,
    },
}

impl Transaction {
    /// Short lowercase name of the transaction kind, used in diagnostics
    pub fn kind(&self) -> &'static str {
        match self {
            Transaction::Deposit { .. } => "deposit",
            Transaction::Withdrawal { .. } => "withdrawal",
            Transaction::CurrencyExchange { .. } => "exchange",
            Transaction::Transfer { .. } => "transfer",
        }
    }
}

impl fmt::Display for Transaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Transaction::Deposit { client, amount } => {
                write!(f, "deposit {} to client {}", amount, client)
            }
            Transaction::Withdrawal {
                client,
                amount,
                forced,
            } => {
                write!(f, "withdrawal {} from client {}", amount, client)?;
                if *forced {
                    write!(f, " (forced)")?;
                }
                Ok(())
            }
            Transaction::CurrencyExchange {
                client,
                from,
                to,
                amount,
            } => write!(f, "exchange {} {} to {} for client {}", amount, from, to, client),
            Transaction::Transfer {
                sender,
                receiver,
                amount,
            } => write!(f, "transfer {} from client {} to client {}", amount, sender, receiver),
        }
    }
}
