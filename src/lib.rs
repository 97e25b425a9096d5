//! Bank Simulator Library
//! # Overview
//!
//! This library provides an in-memory bank that accepts client-management and
//! transaction commands, queues transactions and applies them concurrently on
//! an elastic pool of cashier threads.
//!
//! # Architecture
//!
//! The system is organized into several key components:
//!
//! - [`types`] - Core data types (Account, Transaction, events, errors)
//! - [`cli`] - CLI arguments parsing
//! - [`core`] - Concurrent processing components:
//!   - [`core::account_store`] - Per-account locked account state
//!   - [`core::transaction_queue`] - Shared FIFO of pending transactions
//!   - [`core::cashier`] - Worker loop and transaction rules
//!   - [`core::pool`] - Elastic cashier pool and scaling policy
//!   - [`core::notification`] - Event fan-out to observers
//!   - [`core::exchange_rates`] - Atomically swapped exchange rate table
//!   - [`core::bank`] - Facade wiring everything together
//! - [`io`] - Command parsing and the console session
//!
//! # Transaction Types
//!
//! - **Deposit**: Credit funds to an account
//! - **Withdrawal**: Debit funds from an account (requires sufficient balance)
//! - **CurrencyExchange**: Convert the holding into another currency at the
//!   ratio of the two exchange rates
//! - **Transfer**: Move funds between two accounts of the same currency
//!
//! # Concurrency
//!
//! Transactions are taken from the queue in FIFO order but may complete in any
//! order across cashiers. Every transaction runs its checks and mutations while
//! holding the locks of the accounts it touches, taken in ascending client id
//! order.

// Module declarations
pub mod cli;
pub mod core;
pub mod io;
pub mod types;

pub use core::{Bank, BankConfig, EventRecorder, NotificationHub, Observer};
pub use types::{Account, BankError, ClientId, Currency, Transaction};
