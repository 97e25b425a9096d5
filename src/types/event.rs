//! Event messages emitted to observers
//!
//! Every observable outcome of the bank is a human-readable line. Keeping the
//! wording in one place lets cashiers, the bank facade and tests agree on it.

use super::transaction::ClientId;
use rust_decimal::Decimal;

/// Suffix appended to withdrawals recorded as exchange residuals
pub const FORCED_SUFFIX: &str = ", which were extra after the currency exchange";

pub fn deposited(amount: Decimal, currency: &str, client: ClientId) -> String {
    format!("Added {} {} to user({}) balance", amount, currency, client)
}

pub fn withdrawn(amount: Decimal, currency: &str, client: ClientId, forced: bool) -> String {
    let mut message = format!("Withdraw {} {} from user({})", amount, currency, client);
    if forced {
        message.push_str(FORCED_SUFFIX);
    }
    message
}

pub fn insufficient_funds(client: ClientId, balance: Decimal) -> String {
    format!(
        "Not enough funds to withdraw at user({}) balance, current balance is: {}",
        client, balance
    )
}

pub fn exchanged(
    amount: Decimal,
    from: &str,
    final_amount: Decimal,
    to: &str,
    rate: Decimal,
) -> String {
    format!(
        "Exchanged {} {} to {} {} with rate: {}",
        amount,
        from,
        final_amount.normalize(),
        to,
        rate.normalize()
    )
}

pub fn wrong_currency_names() -> String {
    "Wrong currency names".to_string()
}

pub fn sent(amount: Decimal, currency: &str, sender: ClientId, receiver: ClientId) -> String {
    format!(
        "Sent {} {} from user({}) to user({})",
        amount, currency, sender, receiver
    )
}

pub fn unable_to_send() -> String {
    "Unable to send due to some reasons".to_string()
}

pub fn no_such_currency() -> String {
    "No such currency".to_string()
}

pub fn duplicate_client(client: ClientId) -> String {
    format!("Duplicate client {}", client)
}
