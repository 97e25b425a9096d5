//! Shared FIFO of pending transactions
//!
//! `TransactionQueue` is an unbounded multi-producer, multi-consumer channel.
//! Producers never block; cashiers wait for work. Each transaction is received
//! by exactly one cashier.
//!
//! Besides the channel the queue tracks how many transactions were pushed but
//! not yet finished. Cashiers report completion with [`TransactionQueue::mark_done`],
//! which lets callers wait until everything submitted so far has been applied.

use crate::types::Transaction;
use crossbeam::channel::{self, Receiver, RecvTimeoutError, Sender};
use parking_lot::{Condvar, Mutex};
use std::time::Duration;
use tracing::warn;

#[derive(Debug)]
pub struct TransactionQueue {
    sender: Sender<Transaction>,
    receiver: Receiver<Transaction>,
    outstanding: Mutex<usize>,
    drained: Condvar,
}

impl Default for TransactionQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl TransactionQueue {
    pub fn new() -> Self {
        let (sender, receiver) = channel::unbounded();
        Self {
            sender,
            receiver,
            outstanding: Mutex::new(0),
            drained: Condvar::new(),
        }
    }

    /// Append a transaction; never blocks
    pub fn push(&self, transaction: Transaction) {
        *self.outstanding.lock() += 1;
        // The queue owns a receiver, so the channel cannot be disconnected
        if let Err(err) = self.sender.send(transaction) {
            warn!(transaction = %err.0, "transaction queue disconnected, dropping");
            self.mark_done();
        }
    }

    /// Take the oldest transaction, waiting as long as needed
    ///
    /// Returns `None` only if the channel is disconnected.
    pub fn pop(&self) -> Option<Transaction> {
        self.receiver.recv().ok()
    }

    /// Take the oldest transaction, waiting at most `timeout`
    pub fn pop_timeout(&self, timeout: Duration) -> Option<Transaction> {
        match self.receiver.recv_timeout(timeout) {
            Ok(transaction) => Some(transaction),
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => None,
        }
    }

    /// Approximate number of transactions waiting to be taken
    ///
    /// Concurrent pushes and pops may make the value stale immediately; it is
    /// meant for scaling heuristics only.
    pub fn depth(&self) -> usize {
        self.receiver.len()
    }

    /// Transactions pushed but not yet marked done
    pub fn outstanding(&self) -> usize {
        *self.outstanding.lock()
    }

    /// Record that one popped transaction has been fully handled
    pub fn mark_done(&self) {
        let mut outstanding = self.outstanding.lock();
        *outstanding = outstanding.saturating_sub(1);
        if *outstanding == 0 {
            self.drained.notify_all();
        }
    }

    /// Wait until every pushed transaction has been marked done
    ///
    /// Returns `false` if `timeout` elapsed first.
    pub fn wait_drained(&self, timeout: Duration) -> bool {
        let mut outstanding = self.outstanding.lock();
        self.drained
            .wait_while_for(&mut outstanding, |count| *count > 0, timeout);
        *outstanding == 0
    }
}
