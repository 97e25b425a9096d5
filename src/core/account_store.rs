//! Thread-safe account storage
//!
//! This module provides the `AccountStore` struct, which owns every client
//! account and serializes all mutations of a given account.
//!
//! # Design
//!
//! Accounts live in a `DashMap` keyed by client id, each behind its own
//! `parking_lot::Mutex`. The map shard lock is held only long enough to clone
//! the account handle; the read-modify-write itself runs under the account
//! mutex. This keeps two-account operations free of shard self-deadlock and
//! lets cashiers working on different accounts proceed in parallel.
//!
//! # Lock Ordering
//!
//! Operations touching two accounts lock them in ascending client id order,
//! so two opposite transfers between the same pair can never deadlock.

use crate::core::traits::RateSource;
use crate::types::{Account, BankError, ClientId};
use dashmap::DashMap;
use parking_lot::Mutex;
use std::sync::Arc;

type AccountHandle = Arc<Mutex<Account>>;

/// Concurrent map of client id to account
#[derive(Debug, Default)]
pub struct AccountStore {
    accounts: DashMap<ClientId, AccountHandle>,
}

impl AccountStore {
    /// Create an empty AccountStore
    pub fn new() -> Self {
        Self {
            accounts: DashMap::new(),
        }
    }

    /// Open an account with a zero balance
    ///
    /// The currency is validated against `rates` before the id is checked for
    /// duplicates.
    ///
    /// # Errors
    ///
    /// - `UnknownCurrency` if `rates` has no rate for `currency`
    /// - `DuplicateClient` if an account with this id already exists
    pub fn create(
        &self,
        client: ClientId,
        currency: &str,
        rates: &dyn RateSource,
    ) -> Result<(), BankError> {
        if rates.rate(currency).is_none() {
            return Err(BankError::unknown_currency(currency));
        }

        let mut created = false;
        self.accounts.entry(client).or_insert_with(|| {
            created = true;
            Arc::new(Mutex::new(Account::new(client, currency)))
        });

        if created {
            Ok(())
        } else {
            Err(BankError::duplicate_client(client))
        }
    }

    /// Snapshot of one account, taken under its lock
    pub fn get(&self, client: ClientId) -> Option<Account> {
        self.handle(client).map(|handle| handle.lock().clone())
    }

    /// Whether an account exists for `client`
    pub fn contains(&self, client: ClientId) -> bool {
        self.accounts.contains_key(&client)
    }

    /// Number of accounts
    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }

    /// Snapshots of all accounts sorted by client id
    pub fn snapshot(&self) -> Vec<Account> {
        let handles: Vec<AccountHandle> = self
            .accounts
            .iter()
            .map(|entry| Arc::clone(entry.value()))
            .collect();

        let mut accounts: Vec<Account> = handles.iter().map(|h| h.lock().clone()).collect();
        accounts.sort_by_key(|account| account.client);
        accounts
    }

    /// Run `f` on one account while holding its lock
    ///
    /// Returns `None` without calling `f` when the account does not exist.
    pub fn update<F, R>(&self, client: ClientId, f: F) -> Option<R>
    where
        F: FnOnce(&mut Account) -> R,
    {
        let handle = self.handle(client)?;
        let mut account = handle.lock();
        Some(f(&mut *account))
    }

    /// Run `f` on two distinct accounts while holding both locks
    ///
    /// Locks are taken in ascending id order. `f` receives the accounts in
    /// argument order. Returns `None` when either account is missing or when
    /// `first == second`; callers handle self-referencing operations with
    /// [`AccountStore::update`].
    pub fn update_pair<F, R>(&self, first: ClientId, second: ClientId, f: F) -> Option<R>
    where
        F: FnOnce(&mut Account, &mut Account) -> R,
    {
        if first == second {
            return None;
        }

        let first_handle = self.handle(first)?;
        let second_handle = self.handle(second)?;

        if first < second {
            let mut a = first_handle.lock();
            let mut b = second_handle.lock();
            Some(f(&mut *a, &mut *b))
        } else {
            let mut b = second_handle.lock();
            let mut a = first_handle.lock();
            Some(f(&mut *a, &mut *b))
        }
    }

    fn handle(&self, client: ClientId) -> Option<AccountHandle> {
        self.accounts
            .get(&client)
            .map(|entry| Arc::clone(entry.value()))
    }
}
