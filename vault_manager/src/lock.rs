//! Reentrancy lock
//!
//! Every vault operation runs while holding this lock. A nested call made
//! while the lock is held (for instance by a strategy adapter calling back
//! into the vault) is rejected with [`VaultError::Reentrant`] before it can
//! observe or touch any state.
//!
//! ```plain
//! Lock State Machine:
//!
//!              ┌──────────┐
//!         ┌────► Unlocked │
//!         │    └──────────┘
//!         │         │
//!    guard drop   try_lock
//!         │         │
//!         │         ▼
//!         │    ┌─────────┐
//!         └────┤ Locked  ├──── try_lock ──► Err(Reentrant)
//!              └─────────┘
//! ```
//!
//! The lock is released when the returned [`LockGuard`] goes out of scope, so
//! every exit path of an operation, including `?` on an error, unlocks it.

use std::cell::Cell;

use crate::{
    access::Operation,
    utils::error::{VaultError, VaultResult},
};

#[derive(Debug, Default)]
pub struct Lock {
    /// Operation currently holding the lock
    holder: Cell<Option<Operation>>,
}

impl Lock {
    /// Acquires the lock on behalf of `operation`.
    ///
    /// # Returns
    /// * `Ok(LockGuard)` - Lock acquired, released when the guard is dropped
    /// * `Err(VaultError::Reentrant)` - Another operation is in progress
    pub fn try_lock(&self, operation: Operation) -> VaultResult<LockGuard<'_>> {
        if self.holder.get().is_some() {
            return Err(VaultError::Reentrant);
        }
        self.holder.set(Some(operation));
        Ok(LockGuard { lock: self })
    }

    pub fn is_locked(&self) -> bool {
        self.holder.get().is_some()
    }

    /// Operation currently in progress, if any.
    pub fn holder(&self) -> Option<Operation> {
        self.holder.get()
    }

    /// Returns `Err(VaultError::Reentrant)` while an operation is in progress.
    pub fn ensure_unlocked(&self) -> VaultResult<()> {
        if self.is_locked() {
            return Err(VaultError::Reentrant);
        }
        Ok(())
    }
}

/// Scoped lock ownership
#[derive(Debug)]
pub struct LockGuard<'a> {
    lock: &'a Lock,
}

impl Drop for LockGuard<'_> {
    fn drop(&mut self) {
        self.lock.holder.set(None);
    }
}
