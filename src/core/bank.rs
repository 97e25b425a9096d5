//! Bank facade
//!
//! `Bank` wires the account store, exchange rates, notification hub,
//! transaction queue and cashier pool together and is the only type the
//! command intake talks to.
//!
//! # Architecture
//!
//! ```text
//! Bank
//!     ├── Arc<AccountStore>       (per-account locked state)
//!     ├── Arc<ExchangeRates>      (atomically swapped rate table)
//!     ├── Arc<NotificationHub>    (event fan-out)
//!     ├── Arc<TransactionQueue>   (pending transactions)
//!     ├── CashierPool             (worker threads + PoolScaler)
//!     └── RateRefresher           (optional periodic rate refresh)
//! ```
//!
//! All worker threads share one cancellation token. [`Bank::shutdown`]
//! cancels it and joins every thread; dropping the bank does the same.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use rust_decimal::Decimal;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::core::account_store::AccountStore;
use crate::core::cashier::CashierContext;
use crate::core::config::BankConfig;
use crate::core::exchange_rates::{ExchangeRates, RandomRateGenerator, RateTable};
use crate::core::notification::NotificationHub;
use crate::core::pool::{CashierPool, PoolScaler};
use crate::core::rate_refresher::RateRefresher;
use crate::core::traits::{Observer, RateSource};
use crate::core::transaction_queue::TransactionQueue;
use crate::types::{event, Account, BankError, ClientId, Transaction};

/// In-memory bank processing transactions on a cashier pool
#[derive(Debug)]
pub struct Bank {
    accounts: Arc<AccountStore>,
    rates: Arc<ExchangeRates>,
    hub: Arc<NotificationHub>,
    queue: Arc<TransactionQueue>,
    pool: CashierPool,
    refresher: Mutex<Option<RateRefresher>>,
    token: CancellationToken,
}

impl Bank {
    /// Start a bank with randomly generated, periodically refreshed rates
    ///
    /// The rate table is seeded before this returns.
    pub fn new(config: BankConfig) -> Result<Self, BankError> {
        let generator = RandomRateGenerator::default();
        let rates = Arc::new(ExchangeRates::new());
        rates.replace(generator.generate());

        let bank = Self::start(&config, rates)?;
        let refresher = RateRefresher::spawn(
            Arc::clone(&bank.rates),
            generator,
            config.rate_refresh_interval,
            bank.token.clone(),
        )?;
        *bank.refresher.lock() = Some(refresher);
        Ok(bank)
    }

    /// Start a bank whose rates only change through [`Bank::refresh_rates`]
    pub fn with_fixed_rates<I, K>(config: BankConfig, rates: I) -> Result<Self, BankError>
    where
        I: IntoIterator<Item = (K, Decimal)>,
        K: Into<String>,
    {
        Self::start(&config, Arc::new(ExchangeRates::with_rates(rates)))
    }

    fn start(config: &BankConfig, rates: Arc<ExchangeRates>) -> Result<Self, BankError> {
        let accounts = Arc::new(AccountStore::new());
        let hub = Arc::new(NotificationHub::new());
        let queue = Arc::new(TransactionQueue::new());
        let token = CancellationToken::new();

        let context = CashierContext {
            accounts: Arc::clone(&accounts),
            rates: Arc::clone(&rates) as Arc<dyn RateSource>,
            hub: Arc::clone(&hub),
            strict_exchange: config.strict_exchange,
        };
        let pool = CashierPool::new(
            context,
            Arc::clone(&queue),
            PoolScaler::new(config.backlog_ratio, config.max_workers),
            config.poll_interval,
            token.clone(),
        );

        let bank = Self {
            accounts,
            rates,
            hub,
            queue,
            pool,
            refresher: Mutex::new(None),
            token,
        };
        bank.pool.start(config.initial_workers)?;
        info!(
            workers = bank.pool.size(),
            max_workers = config.max_workers,
            "bank started"
        );
        Ok(bank)
    }

    /// Register an observer for every later event
    pub fn subscribe(&self, observer: Arc<dyn Observer>) {
        self.hub.subscribe(observer);
    }

    /// Open an account with a zero balance
    ///
    /// Rejections are also published as events.
    ///
    /// # Errors
    ///
    /// - `UnknownCurrency` if the currency has no rate
    /// - `DuplicateClient` if the id is taken
    pub fn add_client(&self, client: ClientId, currency: &str) -> Result<(), BankError> {
        let result = self.accounts.create(client, currency, self.rates.as_ref());
        match &result {
            Ok(()) => info!(client, currency, "client added"),
            Err(BankError::UnknownCurrency { .. }) => self.hub.publish(&event::no_such_currency()),
            Err(BankError::DuplicateClient { client }) => {
                self.hub.publish(&event::duplicate_client(*client))
            }
            Err(error) => warn!(%error, "add_client failed"),
        }
        result
    }

    /// Queue a transaction for the cashiers; never blocks
    pub fn submit(&self, transaction: Transaction) {
        self.queue.push(transaction);
    }

    /// Grow the cashier pool to match the backlog
    pub fn scale(&self) -> Result<usize, BankError> {
        self.pool.scale()
    }

    pub fn account(&self, client: ClientId) -> Option<Account> {
        self.accounts.get(client)
    }

    /// All accounts sorted by client id
    pub fn accounts(&self) -> Vec<Account> {
        self.accounts.snapshot()
    }

    pub fn client_count(&self) -> usize {
        self.accounts.len()
    }

    /// Current rate for `currency`
    pub fn rate(&self, currency: &str) -> Option<Decimal> {
        self.rates.rate(currency)
    }

    /// Replace the whole rate table
    pub fn refresh_rates(&self, table: RateTable) {
        self.rates.replace(table);
    }

    pub fn worker_count(&self) -> usize {
        self.pool.size()
    }

    pub fn queue_depth(&self) -> usize {
        self.queue.depth()
    }

    /// Wait until every submitted transaction has been applied
    ///
    /// Returns `false` if `timeout` elapsed first.
    pub fn wait_idle(&self, timeout: Duration) -> bool {
        self.queue.wait_drained(timeout)
    }

    /// Stop the cashiers and the rate refresher and join their threads
    ///
    /// Queued transactions not yet taken by a cashier are dropped. Safe to
    /// call more than once.
    pub fn shutdown(&self) {
        if !self.token.is_cancelled() {
            info!(
                pending = self.queue.outstanding(),
                "bank shutting down"
            );
        }
        self.pool.shutdown();
        if let Some(mut refresher) = self.refresher.lock().take() {
            refresher.join();
        }
    }
}

impl Drop for Bank {
    fn drop(&mut self) {
        self.shutdown();
    }
}
