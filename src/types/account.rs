//! Account-related types for the bank simulator
//!
//! This module defines the Account structure held by the account store.

use super::transaction::{ClientId, Currency};
use rust_decimal::Decimal;

/// Client account state
///
/// An account carries a single balance denominated in one currency. The
/// currency changes only when the client exchanges their whole holding into
/// another currency.
#[derive(Debug, Clone, PartialEq)]
pub struct Account {
    /// The client ID
    pub client: ClientId,

    /// Current balance in `currency`
    ///
    /// Withdrawals and transfers never take this below zero. A non-strict
    /// currency exchange can.
    pub balance: Decimal,

    /// Currency code the balance is held in (e.g. `USD`)
    pub currency: Currency,
}

impl Account {
    /// Create a new account with a zero balance
    pub fn new(client: ClientId, currency: impl Into<Currency>) -> Self {
        Account {
            client,
            balance: Decimal::ZERO,
            currency: currency.into(),
        }
    }
}
