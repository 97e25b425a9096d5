//! Core traits at the seams of the bank
//!
//! These traits let cashiers read exchange rates and emit events without
//! knowing where rates come from or who listens.

use rust_decimal::Decimal;

/// Receives every event published by the notification hub
///
/// Observers are called synchronously from cashier threads, possibly from
/// several threads at once, so implementations must be thread-safe and should
/// return quickly.
pub trait Observer: Send + Sync {
    /// Handle one event message
    fn notify(&self, message: &str);
}

/// Supplies exchange rates by currency code
pub trait RateSource: Send + Sync {
    /// Current rate for `currency`, or `None` when the currency is unknown
    fn rate(&self, currency: &str) -> Option<Decimal>;

    /// Rates for both sides of an exchange
    ///
    /// Implementations that refresh their table should answer from a single
    /// snapshot so both rates come from the same refresh.
    fn quote(&self, from: &str, to: &str) -> Option<(Decimal, Decimal)> {
        Some((self.rate(from)?, self.rate(to)?))
    }
}
