//! Error types for the bank simulator
//!
//! This module defines all error types that can occur while accepting commands
//! and running the cashier pool. Errors are designed to be descriptive for log
//! output; the user console only distinguishes unknown commands from badly
//! formatted ones.
//!
//! # Error Categories
//!
//! - **Input Errors**: Unknown command verb, missing or malformed arguments
//! - **Registration Errors**: Duplicate client, currency without a rate
//! - **Arithmetic Errors**: Overflow in balance calculations
//! - **Runtime Errors**: Worker threads or the rate refresher could not start
//!
//! Business rejections inside cashiers (insufficient funds, currency
//! mismatch) are not errors. They are reported as events.

use crate::types::ClientId;
use thiserror::Error;

/// Main error type for the bank simulator
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BankError {
    /// The command verb is not recognised
    ///
    /// This is a recoverable error - the line is reported and skipped.
    #[error("Unknown command '{command}'")]
    UnknownCommand {
        /// The verb as typed by the user
        command: String,
    },

    /// A required argument is missing
    ///
    /// This is a recoverable error - the line is reported and skipped.
    #[error("{command} requires argument {position}")]
    MissingArgument {
        /// Command that lacks the argument
        command: String,
        /// 1-based position of the missing argument
        position: usize,
    },

    /// A client id could not be parsed
    #[error("Invalid client id '{value}'")]
    InvalidClientId {
        /// The offending text
        value: String,
    },

    /// An amount could not be parsed
    #[error("Invalid amount '{value}'")]
    InvalidAmount {
        /// The offending text
        value: String,
    },

    /// An amount parsed but is below zero
    #[error("Amount must not be negative, got '{value}'")]
    NegativeAmount {
        /// The offending text
        value: String,
    },

    /// A client with this id already exists
    #[error("Duplicate client {client}")]
    DuplicateClient {
        /// Client ID that is duplicated
        client: ClientId,
    },

    /// The currency has no exchange rate
    #[error("Unknown currency '{currency}'")]
    UnknownCurrency {
        /// The currency code without a rate
        currency: String,
    },

    /// Arithmetic overflow would occur
    ///
    /// The transaction is rejected to maintain account integrity.
    #[error("Arithmetic overflow in {operation} for user({client})")]
    ArithmeticOverflow {
        /// Operation that would overflow
        operation: String,
        /// Client ID
        client: ClientId,
    },

    /// A cashier thread could not be spawned
    #[error("Failed to spawn cashier {worker}: {message}")]
    WorkerSpawn {
        /// Id the cashier would have had
        worker: usize,
        /// Description of the failure
        message: String,
    },

    /// The rate refresher runtime could not be started
    #[error("Runtime error: {message}")]
    Runtime {
        /// Description of the failure
        message: String,
    },

    /// I/O error while reading commands or writing replies
    #[error("I/O error: {message}")]
    Io {
        /// Description of the I/O error
        message: String,
    },
}

impl From<std::io::Error> for BankError {
    fn from(error: std::io::Error) -> Self {
        BankError::Io {
            message: error.to_string(),
        }
    }
}

impl BankError {
    /// Create an UnknownCommand error
    pub fn unknown_command(command: &str) -> Self {
        BankError::UnknownCommand {
            command: command.to_string(),
        }
    }

    /// Create a MissingArgument error
    pub fn missing_argument(command: &str, position: usize) -> Self {
        BankError::MissingArgument {
            command: command.to_string(),
            position,
        }
    }

    /// Create an InvalidClientId error
    pub fn invalid_client_id(value: &str) -> Self {
        BankError::InvalidClientId {
            value: value.to_string(),
        }
    }

    /// Create an InvalidAmount error
    pub fn invalid_amount(value: &str) -> Self {
        BankError::InvalidAmount {
            value: value.to_string(),
        }
    }

    /// Create a NegativeAmount error
    pub fn negative_amount(value: &str) -> Self {
        BankError::NegativeAmount {
            value: value.to_string(),
        }
    }

    /// Create a DuplicateClient error
    pub fn duplicate_client(client: ClientId) -> Self {
        BankError::DuplicateClient { client }
    }

    /// Create an UnknownCurrency error
    pub fn unknown_currency(currency: &str) -> Self {
        BankError::UnknownCurrency {
            currency: currency.to_string(),
        }
    }

    /// Create an ArithmeticOverflow error
    pub fn arithmetic_overflow(operation: &str, client: ClientId) -> Self {
        BankError::ArithmeticOverflow {
            operation: operation.to_string(),
            client,
        }
    }

    /// Whether this error comes from malformed user input
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            BankError::UnknownCommand { .. }
                | BankError::MissingArgument { .. }
                | BankError::InvalidClientId { .. }
                | BankError::InvalidAmount { .. }
                | BankError::NegativeAmount { .. }
        )
    }
}
