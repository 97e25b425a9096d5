//! Types module
//!
//! Contains core data structures used throughout the application.
//! This module organizes types into logical submodules:
//! - `account`: Account state held by the account store
//! - `transaction`: Queued transaction requests and identifiers
//! - `event`: Wording of the events emitted to observers
//! - `error`: Error types for the bank simulator

pub mod account;
pub mod error;
pub mod event;
pub mod transaction;

pub use account::Account;
pub use error::BankError;
pub use transaction::{ClientId, Currency, Transaction};
