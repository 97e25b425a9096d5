//! Cashier worker loop and transaction rules
//!
//! A cashier takes one transaction at a time from the shared queue, applies it
//! to the account store and publishes the outcome through the notification
//! hub. Every check-then-mutate sequence runs while holding the lock of each
//! account involved, so no other cashier can observe or change those accounts
//! half-way through a transaction.
//!
//! Events are built under the account lock but published after it is released,
//! so observers never run while an account is locked.
//!
//! # Rejections
//!
//! Business rejections (insufficient funds, unknown currency, currency
//! mismatch) are ordinary outcomes. They emit an event and leave every account
//! untouched. Transactions for unknown clients are dropped silently, except
//! transfers which always report.

use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Duration;

use rust_decimal::Decimal;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use crate::core::account_store::AccountStore;
use crate::core::notification::NotificationHub;
use crate::core::traits::RateSource;
use crate::core::transaction_queue::TransactionQueue;
use crate::types::{event, Account, BankError, ClientId, Transaction};

/// State shared by every cashier
#[derive(Clone)]
pub struct CashierContext {
    pub accounts: Arc<AccountStore>,
    pub rates: Arc<dyn RateSource>,
    pub hub: Arc<NotificationHub>,
    pub strict_exchange: bool,
}

/// A single worker applying transactions
#[derive(Clone)]
pub struct Cashier {
    id: usize,
    context: CashierContext,
}

impl Cashier {
    pub fn new(id: usize, context: CashierContext) -> Self {
        Self { id, context }
    }

    pub fn id(&self) -> usize {
        self.id
    }

    /// Serve `queue` until `token` is cancelled
    ///
    /// The token is checked once per iteration; an idle cashier notices
    /// cancellation within `poll_interval`. A panic while applying a
    /// transaction is logged and the loop carries on with the next one.
    pub fn run(&self, queue: &TransactionQueue, token: &CancellationToken, poll_interval: Duration) {
        info!(cashier = self.id, "cashier started");

        while !token.is_cancelled() {
            let Some(transaction) = queue.pop_timeout(poll_interval) else {
                continue;
            };

            debug!(cashier = self.id, %transaction, "processing");
            let outcome = panic::catch_unwind(AssertUnwindSafe(|| self.process(&transaction)));
            queue.mark_done();

            if let Err(payload) = outcome {
                error!(
                    cashier = self.id,
                    %transaction,
                    panic = panic_message(payload.as_ref()),
                    "transaction processing panicked"
                );
            }
        }

        info!(cashier = self.id, "cashier stopped");
    }

    /// Apply one transaction and publish its events
    pub fn process(&self, transaction: &Transaction) {
        let events = match transaction {
            Transaction::Deposit { client, amount } => self.deposit(*client, *amount),
            Transaction::Withdrawal {
                client,
                amount,
                forced,
            } => self.withdraw(*client, *amount, *forced),
            Transaction::CurrencyExchange {
                client,
                from,
                to,
                amount,
            } => self.exchange(*client, from, to, *amount),
            Transaction::Transfer {
                sender,
                receiver,
                amount,
            } => self.transfer(*sender, *receiver, *amount),
        };

        for message in events {
            self.context.hub.publish(&message);
        }
    }

    fn deposit(&self, client: ClientId, amount: Decimal) -> Vec<String> {
        self.context
            .accounts
            .update(client, |account| match account.balance.checked_add(amount) {
                Some(balance) => {
                    account.balance = balance;
                    vec![event::deposited(amount, &account.currency, client)]
                }
                None => vec![BankError::arithmetic_overflow("deposit", client).to_string()],
            })
            .unwrap_or_else(|| ignored(client, "deposit"))
    }

    fn withdraw(&self, client: ClientId, amount: Decimal, forced: bool) -> Vec<String> {
        self.context
            .accounts
            .update(client, |account| {
                if amount > account.balance {
                    return vec![event::insufficient_funds(client, account.balance)];
                }
                account.balance -= amount;
                vec![event::withdrawn(amount, &account.currency, client, forced)]
            })
            .unwrap_or_else(|| ignored(client, "withdrawal"))
    }

    /// Convert the holding at `rate(from) / rate(to)`
    ///
    /// The debit of `amount` is recorded as a forced withdrawal event. It is
    /// not checked against the balance unless strict exchange is enabled.
    fn exchange(&self, client: ClientId, from: &str, to: &str, amount: Decimal) -> Vec<String> {
        if !self.context.accounts.contains(client) {
            return ignored(client, "exchange");
        }

        let Some((rate_from, rate_to)) = self.context.rates.quote(from, to) else {
            return vec![event::wrong_currency_names()];
        };

        let converted = rate_from
            .checked_div(rate_to)
            .and_then(|rate| amount.checked_mul(rate).map(|final_amount| (rate, final_amount)));
        let Some((rate, final_amount)) = converted else {
            return vec![BankError::arithmetic_overflow("exchange", client).to_string()];
        };

        let strict = self.context.strict_exchange;
        self.context
            .accounts
            .update(client, |account| {
                if strict && amount > account.balance {
                    return vec![event::insufficient_funds(client, account.balance)];
                }
                apply_exchange(account, to, amount, final_amount).map_or_else(
                    || vec![BankError::arithmetic_overflow("exchange", client).to_string()],
                    |previous_currency| {
                        vec![
                            event::withdrawn(amount, &previous_currency, client, true),
                            event::exchanged(amount, from, final_amount, to, rate),
                        ]
                    },
                )
            })
            .unwrap_or_else(|| ignored(client, "exchange"))
    }

    fn transfer(&self, sender: ClientId, receiver: ClientId, amount: Decimal) -> Vec<String> {
        let outcome = if sender == receiver {
            // Debit and credit cancel out; only sufficiency matters
            self.context.accounts.update(sender, |account| {
                (account.balance >= amount)
                    .then(|| event::sent(amount, &account.currency, sender, receiver))
            })
        } else {
            self.context
                .accounts
                .update_pair(sender, receiver, |from, to| {
                    if from.balance < amount || from.currency != to.currency {
                        return None;
                    }
                    let credited = to.balance.checked_add(amount)?;
                    from.balance -= amount;
                    to.balance = credited;
                    Some(event::sent(amount, &from.currency, sender, receiver))
                })
        };

        vec![outcome.flatten().unwrap_or_else(event::unable_to_send)]
    }
}

/// Debit `amount`, credit `final_amount` and switch the account to `to`
///
/// Returns the previous currency, or `None` on overflow with the account
/// unchanged.
fn apply_exchange(
    account: &mut Account,
    to: &str,
    amount: Decimal,
    final_amount: Decimal,
) -> Option<String> {
    let balance = account
        .balance
        .checked_sub(amount)?
        .checked_add(final_amount)?;
    account.balance = balance;
    Some(std::mem::replace(&mut account.currency, to.to_string()))
}

fn ignored(client: ClientId, kind: &str) -> Vec<String> {
    debug!(client, kind, "transaction for unknown client ignored");
    Vec::new()
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> &str {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.as_str()
    } else {
        "unknown panic"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::exchange_rates::ExchangeRates;
    use crate::core::notification::EventRecorder;
    use crate::core::traits::Observer;
    use rstest::rstest;
    use std::thread;

    fn dec(value: i64) -> Decimal {
        Decimal::new(value, 0)
    }

    struct Fixture {
        cashier: Cashier,
        accounts: Arc<AccountStore>,
        recorder: Arc<EventRecorder>,
    }

    fn fixture(strict_exchange: bool) -> Fixture {
        let rates = Arc::new(ExchangeRates::with_rates([
            ("USD", dec(100)),
            ("EUR", dec(125)),
            ("GBP", dec(150)),
        ]));
        let accounts = Arc::new(AccountStore::new());
        for (client, currency) in [(1, "USD"), (2, "USD"), (3, "EUR")] {
            accounts.create(client, currency, rates.as_ref()).unwrap();
        }
        let hub = Arc::new(NotificationHub::new());
        let recorder = Arc::new(EventRecorder::new());
        hub.subscribe(recorder.clone());

        let cashier = Cashier::new(
            0,
            CashierContext {
                accounts: Arc::clone(&accounts),
                rates,
                hub,
                strict_exchange,
            },
        );

        Fixture {
            cashier,
            accounts,
            recorder,
        }
    }

    impl Fixture {
        fn run(&self, transaction: Transaction) {
            self.cashier.process(&transaction);
        }

        fn fund(&self, client: ClientId, amount: i64) {
            self.run(Transaction::Deposit {
                client,
                amount: dec(amount),
            });
        }

        fn balance(&self, client: ClientId) -> Decimal {
            self.accounts.get(client).unwrap().balance
        }
    }

    #[test]
    fn test_deposit_credits_and_reports() {
        let f = fixture(false);

        f.fund(1, 500);

        assert_eq!(f.balance(1), dec(500));
        assert_eq!(f.recorder.events(), vec!["Added 500 USD to user(1) balance"]);
    }

    #[test]
    fn test_deposit_to_unknown_client_is_silent() {
        let f = fixture(false);

        f.fund(99, 500);

        assert!(f.recorder.events().is_empty());
        assert!(f.accounts.get(99).is_none());
    }

    #[test]
    fn test_deposit_then_withdraw_restores_balance() {
        let f = fixture(false);
        f.fund(1, 40);

        f.run(Transaction::Deposit {
            client: 1,
            amount: Decimal::new(1234, 2),
        });
        f.run(Transaction::Withdrawal {
            client: 1,
            amount: Decimal::new(1234, 2),
            forced: false,
        });

        assert_eq!(f.balance(1), dec(40));
    }

    #[rstest]
    #[case::regular(false, "Withdraw 30 USD from user(1)")]
    #[case::forced(true, "Withdraw 30 USD from user(1), which were extra after the currency exchange")]
    fn test_withdrawal_message(#[case] forced: bool, #[case] expected: &str) {
        let f = fixture(false);
        f.fund(1, 100);

        f.run(Transaction::Withdrawal {
            client: 1,
            amount: dec(30),
            forced,
        });

        assert_eq!(f.balance(1), dec(70));
        assert!(f.recorder.contains(expected));
    }

    #[test]
    fn test_withdrawal_over_balance_is_rejected() {
        let f = fixture(false);
        f.fund(1, 10);

        f.run(Transaction::Withdrawal {
            client: 1,
            amount: dec(11),
            forced: false,
        });

        assert_eq!(f.balance(1), dec(10));
        assert!(f.recorder.contains(
            "Not enough funds to withdraw at user(1) balance, current balance is: 10"
        ));
    }

    #[test]
    fn test_withdrawal_of_whole_balance_succeeds() {
        let f = fixture(false);
        f.fund(1, 10);

        f.run(Transaction::Withdrawal {
            client: 1,
            amount: dec(10),
            forced: false,
        });

        assert_eq!(f.balance(1), Decimal::ZERO);
    }

    #[test]
    fn test_exchange_at_equal_rates_keeps_balance() {
        let f = fixture(false);
        f.accounts
            .update(1, |account| account.balance = dec(300))
            .unwrap();
        let rates = Arc::new(ExchangeRates::with_rates([("USD", dec(100)), ("EUR", dec(100))]));
        let cashier = Cashier::new(
            1,
            CashierContext {
                rates,
                ..f.cashier.context.clone()
            },
        );

        cashier.process(&Transaction::CurrencyExchange {
            client: 1,
            from: "USD".to_string(),
            to: "EUR".to_string(),
            amount: dec(100),
        });

        let account = f.accounts.get(1).unwrap();
        assert_eq!(account.balance, dec(300));
        assert_eq!(account.currency, "EUR");
        assert_eq!(
            f.recorder.events(),
            vec![
                "Withdraw 100 USD from user(1), which were extra after the currency exchange",
                "Exchanged 100 USD to 100 EUR with rate: 1",
            ]
        );
    }

    #[test]
    fn test_exchange_converts_at_rate_ratio() {
        let f = fixture(false);
        f.fund(1, 200);

        f.run(Transaction::CurrencyExchange {
            client: 1,
            from: "USD".to_string(),
            to: "EUR".to_string(),
            amount: dec(100),
        });

        // 200 - 100 + 100 * (100 / 125)
        let account = f.accounts.get(1).unwrap();
        assert_eq!(account.balance, dec(180));
        assert_eq!(account.currency, "EUR");
        assert!(f.recorder.contains("Exchanged 100 USD to 80 EUR with rate: 0.8"));
    }

    #[test]
    fn test_exchange_debit_may_overdraw_by_default() {
        let f = fixture(false);

        f.run(Transaction::CurrencyExchange {
            client: 1,
            from: "GBP".to_string(),
            to: "USD".to_string(),
            amount: dec(100),
        });

        // 0 - 100 + 100 * 1.5
        assert_eq!(f.balance(1), dec(50));

        f.run(Transaction::CurrencyExchange {
            client: 2,
            from: "USD".to_string(),
            to: "EUR".to_string(),
            amount: dec(100),
        });

        // 0 - 100 + 100 * 0.8
        assert_eq!(f.balance(2), dec(-20));
    }

    #[test]
    fn test_strict_exchange_rejects_overdraw() {
        let f = fixture(true);
        f.fund(1, 50);

        f.run(Transaction::CurrencyExchange {
            client: 1,
            from: "USD".to_string(),
            to: "EUR".to_string(),
            amount: dec(100),
        });

        let account = f.accounts.get(1).unwrap();
        assert_eq!(account.balance, dec(50));
        assert_eq!(account.currency, "USD");
        assert!(f.recorder.contains(
            "Not enough funds to withdraw at user(1) balance, current balance is: 50"
        ));
    }

    #[rstest]
    #[case::unknown_from("JPY", "EUR")]
    #[case::unknown_to("USD", "JPY")]
    fn test_exchange_with_unknown_currency(#[case] from: &str, #[case] to: &str) {
        let f = fixture(false);
        f.fund(1, 100);

        f.run(Transaction::CurrencyExchange {
            client: 1,
            from: from.to_string(),
            to: to.to_string(),
            amount: dec(10),
        });

        let account = f.accounts.get(1).unwrap();
        assert_eq!(account.balance, dec(100));
        assert_eq!(account.currency, "USD");
        assert!(f.recorder.contains("Wrong currency names"));
    }

    #[test]
    fn test_exchange_for_unknown_client_is_silent() {
        let f = fixture(false);

        f.run(Transaction::CurrencyExchange {
            client: 42,
            from: "JPY".to_string(),
            to: "EUR".to_string(),
            amount: dec(10),
        });

        assert!(f.recorder.events().is_empty());
    }

    #[rstest]
    #[case::partial(60)]
    #[case::nothing(0)]
    #[case::everything(100)]
    #[case::too_much(101)]
    fn test_transfer_between_same_currency(#[case] amount: i64) {
        let f = fixture(false);
        f.fund(1, 100);

        f.run(Transaction::Transfer {
            sender: 1,
            receiver: 2,
            amount: dec(amount),
        });

        if amount <= 100 {
            assert_eq!(f.balance(1), dec(100 - amount));
            assert_eq!(f.balance(2), dec(amount));
            assert!(f.recorder.contains(&format!(
                "Sent {} USD from user(1) to user(2)",
                amount
            )));
        } else {
            assert_eq!(f.balance(1), dec(100));
            assert_eq!(f.balance(2), Decimal::ZERO);
            assert!(f.recorder.contains("Unable to send due to some reasons"));
        }
    }

    #[test]
    fn test_transfer_across_currencies_is_rejected() {
        let f = fixture(false);
        f.fund(1, 100);
        f.fund(3, 100);

        f.run(Transaction::Transfer {
            sender: 1,
            receiver: 3,
            amount: dec(10),
        });

        assert_eq!(f.balance(1), dec(100));
        assert_eq!(f.balance(3), dec(100));
        assert!(f.recorder.contains("Unable to send due to some reasons"));
    }

    #[rstest]
    #[case::unknown_receiver(1, 99)]
    #[case::unknown_sender(99, 1)]
    fn test_transfer_with_unknown_party_is_rejected(
        #[case] sender: ClientId,
        #[case] receiver: ClientId,
    ) {
        let f = fixture(false);
        f.fund(1, 100);

        f.run(Transaction::Transfer {
            sender,
            receiver,
            amount: dec(10),
        });

        assert_eq!(f.balance(1), dec(100));
        assert!(f.recorder.contains("Unable to send due to some reasons"));
    }

    #[test]
    fn test_transfer_to_self_keeps_balance() {
        let f = fixture(false);
        f.fund(1, 100);

        f.run(Transaction::Transfer {
            sender: 1,
            receiver: 1,
            amount: dec(40),
        });
        f.run(Transaction::Transfer {
            sender: 1,
            receiver: 1,
            amount: dec(400),
        });

        assert_eq!(f.balance(1), dec(100));
        assert!(f.recorder.contains("Sent 40 USD from user(1) to user(1)"));
        assert!(f.recorder.contains("Unable to send due to some reasons"));
    }

    #[test]
    fn test_run_survives_panicking_observer_and_stops_on_cancel() {
        struct Exploding;

        impl Observer for Exploding {
            fn notify(&self, message: &str) {
                if message.contains("user(1)") {
                    panic!("observer failure");
                }
            }
        }

        let f = fixture(false);
        f.cashier.context.hub.subscribe(Arc::new(Exploding));

        let queue = Arc::new(TransactionQueue::new());
        let token = CancellationToken::new();
        let worker = {
            let cashier = f.cashier.clone();
            let queue = Arc::clone(&queue);
            let token = token.clone();
            thread::spawn(move || cashier.run(&queue, &token, Duration::from_millis(10)))
        };

        queue.push(Transaction::Deposit {
            client: 1,
            amount: dec(5),
        });
        queue.push(Transaction::Deposit {
            client: 2,
            amount: dec(7),
        });

        assert!(queue.wait_drained(Duration::from_secs(5)));
        assert_eq!(f.balance(1), dec(5));
        assert_eq!(f.balance(2), dec(7));

        token.cancel();
        worker.join().unwrap();
    }
}
