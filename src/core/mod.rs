//! Core business logic module
//!
//! This module contains the concurrent transaction-processing components:
//! - `traits` - Observer and rate source abstractions
//! - `config` - Pool sizing and behaviour switches
//! - `account_store` - Per-account locked account state
//! - `exchange_rates` - Atomically swapped rate table and random rate generation
//! - `rate_refresher` - Periodic rate refresh on a tokio timer
//! - `notification` - Event fan-out and the stock observers
//! - `transaction_queue` - Unbounded FIFO shared by producers and cashiers
//! - `cashier` - Worker loop and per-transaction rules
//! - `pool` - Elastic cashier pool and its scaling policy
//! - `bank` - Facade wiring everything together

pub mod account_store;
pub mod bank;
pub mod cashier;
pub mod config;
pub mod exchange_rates;
pub mod notification;
pub mod pool;
pub mod rate_refresher;
pub mod traits;
pub mod transaction_queue;

pub use account_store::AccountStore;
pub use bank::Bank;
pub use cashier::{Cashier, CashierContext};
pub use config::BankConfig;
pub use exchange_rates::{ExchangeRates, RandomRateGenerator, RateTable};
pub use notification::{ConsoleLogger, EventRecorder, NotificationHub, TracingObserver};
pub use pool::{CashierPool, PoolScaler};
pub use rate_refresher::RateRefresher;
pub use traits::{Observer, RateSource};
pub use transaction_queue::TransactionQueue;
