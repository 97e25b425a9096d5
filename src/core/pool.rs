//! Elastic cashier pool
//!
//! `CashierPool` owns the cashier threads. It grows under backlog pressure and
//! never shrinks; threads run until the shared cancellation token fires.
//!
//! The growth rule lives in [`PoolScaler`]: a cashier is added while
//! `depth / backlog_ratio` exceeds the number of cashiers, up to `max_workers`.
//! Depth is read fresh on every step, so a draining queue may stop growth
//! early and a filling one may cause an extra spawn. Both are acceptable.

use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use parking_lot::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use crate::core::cashier::{Cashier, CashierContext};
use crate::core::transaction_queue::TransactionQueue;
use crate::types::BankError;

/// Backlog-proportional growth policy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolScaler {
    backlog_ratio: usize,
    max_workers: usize,
}

impl PoolScaler {
    /// `backlog_ratio` of zero is treated as one
    pub fn new(backlog_ratio: usize, max_workers: usize) -> Self {
        Self {
            backlog_ratio: backlog_ratio.max(1),
            max_workers,
        }
    }

    /// Whether one more cashier should be started
    pub fn should_grow(&self, depth: usize, workers: usize) -> bool {
        workers < self.max_workers && depth / self.backlog_ratio > workers
    }

    pub fn max_workers(&self) -> usize {
        self.max_workers
    }
}

struct Worker {
    id: usize,
    handle: Option<JoinHandle<()>>,
}

/// Set of running cashiers sharing one queue
pub struct CashierPool {
    context: CashierContext,
    queue: Arc<TransactionQueue>,
    scaler: PoolScaler,
    poll_interval: Duration,
    token: CancellationToken,
    workers: Mutex<Vec<Worker>>,
}

impl CashierPool {
    pub fn new(
        context: CashierContext,
        queue: Arc<TransactionQueue>,
        scaler: PoolScaler,
        poll_interval: Duration,
        token: CancellationToken,
    ) -> Self {
        Self {
            context,
            queue,
            scaler,
            poll_interval,
            token,
            workers: Mutex::new(Vec::new()),
        }
    }

    /// Number of cashiers ever started
    pub fn size(&self) -> usize {
        self.workers.lock().len()
    }

    /// Start cashiers until the pool holds `count`, bounded by `max_workers`
    ///
    /// Does nothing once the pool has been shut down.
    pub fn start(&self, count: usize) -> Result<usize, BankError> {
        let mut workers = self.workers.lock();
        if self.token.is_cancelled() {
            return Ok(0);
        }
        let target = count.min(self.scaler.max_workers());
        let mut spawned = 0;
        while workers.len() < target {
            self.spawn_into(&mut workers)?;
            spawned += 1;
        }
        Ok(spawned)
    }

    /// Grow the pool to match the current backlog
    ///
    /// Returns how many cashiers were started; always zero after shutdown.
    pub fn scale(&self) -> Result<usize, BankError> {
        let mut workers = self.workers.lock();
        if self.token.is_cancelled() {
            return Ok(0);
        }
        let before = workers.len();

        while self.scaler.should_grow(self.queue.depth(), workers.len()) {
            self.spawn_into(&mut workers)?;
        }

        let spawned = workers.len() - before;
        if spawned > 0 {
            info!(
                from = before,
                to = workers.len(),
                depth = self.queue.depth(),
                "cashier pool grown"
            );
        }
        Ok(spawned)
    }

    /// Cancel the token and wait for every cashier to exit
    ///
    /// Transactions still queued are left unprocessed. Safe to call twice.
    pub fn shutdown(&self) {
        self.token.cancel();

        let handles: Vec<(usize, JoinHandle<()>)> = self
            .workers
            .lock()
            .iter_mut()
            .filter_map(|worker| worker.handle.take().map(|handle| (worker.id, handle)))
            .collect();

        for (id, handle) in handles {
            if handle.join().is_err() {
                error!(cashier = id, "cashier thread panicked");
            }
        }
    }

    fn spawn_into(&self, workers: &mut Vec<Worker>) -> Result<(), BankError> {
        let id = workers.len();
        let cashier = Cashier::new(id, self.context.clone());
        let queue = Arc::clone(&self.queue);
        let token = self.token.clone();
        let poll_interval = self.poll_interval;

        let handle = thread::Builder::new()
            .name(format!("cashier-{}", id))
            .spawn(move || cashier.run(&queue, &token, poll_interval))
            .map_err(|e| BankError::WorkerSpawn {
                worker: id,
                message: e.to_string(),
            })?;

        workers.push(Worker {
            id,
            handle: Some(handle),
        });
        Ok(())
    }
}

impl std::fmt::Debug for CashierPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CashierPool")
            .field("size", &self.size())
            .field("scaler", &self.scaler)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::account_store::AccountStore;
    use crate::core::exchange_rates::ExchangeRates;
    use crate::core::notification::NotificationHub;
    use crate::types::Transaction;
    use rstest::rstest;
    use rust_decimal::Decimal;

    #[rstest]
    #[case::empty_queue(0, 1, false)]
    #[case::below_ratio(5, 1, false)]
    #[case::ratio_equals_pool(3, 1, false)]
    #[case::ratio_exceeds_pool(6, 1, true)]
    #[case::large_backlog(30, 9, true)]
    #[case::at_max(300, 8, false)]
    fn test_should_grow(#[case] depth: usize, #[case] workers: usize, #[case] expected: bool) {
        let scaler = PoolScaler::new(3, 8);
        assert_eq!(scaler.should_grow(depth, workers), expected);
    }

    #[test]
    fn test_zero_ratio_is_clamped() {
        let scaler = PoolScaler::new(0, 4);
        assert!(scaler.should_grow(2, 1));
    }

    fn pool(max_workers: usize) -> (CashierPool, Arc<TransactionQueue>) {
        let rates = Arc::new(ExchangeRates::with_rates([("USD", Decimal::ONE)]));
        let accounts = Arc::new(AccountStore::new());
        accounts.create(1, "USD", rates.as_ref()).unwrap();
        let context = CashierContext {
            accounts,
            rates,
            hub: Arc::new(NotificationHub::new()),
            strict_exchange: false,
        };
        let queue = Arc::new(TransactionQueue::new());
        let pool = CashierPool::new(
            context,
            Arc::clone(&queue),
            PoolScaler::new(3, max_workers),
            Duration::from_millis(10),
            CancellationToken::new(),
        );
        (pool, queue)
    }

    #[test]
    fn test_scale_grows_with_backlog_and_never_shrinks() {
        let (pool, queue) = pool(64);

        // Nothing pops until a cashier exists, so depth stays at 30
        for _ in 0..30 {
            queue.push(Transaction::Deposit {
                client: 1,
                amount: Decimal::ONE,
            });
        }
        let spawned = pool.scale().unwrap();
        assert!(spawned >= 1);
        let grown = pool.size();
        assert!(grown <= 10);

        assert!(queue.wait_drained(Duration::from_secs(5)));
        assert_eq!(pool.scale().unwrap(), 0);
        assert_eq!(pool.size(), grown);

        pool.shutdown();
        assert_eq!(pool.size(), grown);
    }

    #[test]
    fn test_scale_respects_max_workers() {
        let (pool, queue) = pool(2);
        for _ in 0..3000 {
            queue.push(Transaction::Deposit {
                client: 1,
                amount: Decimal::ONE,
            });
        }

        pool.scale().unwrap();

        assert_eq!(pool.size(), 2);
        pool.shutdown();
    }

    #[test]
    fn test_no_cashiers_started_after_shutdown() {
        let (pool, queue) = pool(8);
        pool.start(1).unwrap();
        pool.shutdown();

        for _ in 0..30 {
            queue.push(Transaction::Deposit {
                client: 1,
                amount: Decimal::ONE,
            });
        }

        assert_eq!(pool.scale().unwrap(), 0);
        assert_eq!(pool.start(4).unwrap(), 0);
        assert_eq!(pool.size(), 1);
    }

    #[test]
    fn test_start_is_bounded_and_idempotent() {
        let (pool, _queue) = pool(3);

        assert_eq!(pool.start(5).unwrap(), 3);
        assert_eq!(pool.start(2).unwrap(), 0);
        assert_eq!(pool.size(), 3);

        pool.shutdown();
        pool.shutdown();
    }
}
