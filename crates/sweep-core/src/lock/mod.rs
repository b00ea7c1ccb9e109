//! In-process single-run-per-account reservation.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, PoisonError};

use tracing::debug;

/// Set of accounts with a run in flight.
#[derive(Clone, Default)]
pub struct AccountLocks {
    held: Arc<Mutex<HashSet<String>>>,
}

/// Reservation for one account; released on drop.
#[must_use = "the reservation is released as soon as the lease is dropped"]
pub struct AccountLease {
    account_id: String,
    held: Arc<Mutex<HashSet<String>>>,
}

impl AccountLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reserve `account_id`, or `None` when another run holds it.
    pub fn try_acquire(&self, account_id: &str) -> Option<AccountLease> {
        let mut held = self.held.lock().unwrap_or_else(PoisonError::into_inner);
        if !held.insert(account_id.to_string()) {
            return None;
        }
        debug!(event = "core.lock.acquired", account_id = account_id);
        Some(AccountLease {
            account_id: account_id.to_string(),
            held: Arc::clone(&self.held),
        })
    }

    pub fn is_held(&self, account_id: &str) -> bool {
        self.held
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(account_id)
    }
}

impl AccountLease {
    pub fn account_id(&self) -> &str {
        &self.account_id
    }
}

impl Drop for AccountLease {
    fn drop(&mut self) {
        self.held
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.account_id);
        debug!(event = "core.lock.released", account_id = %self.account_id);
    }
}
