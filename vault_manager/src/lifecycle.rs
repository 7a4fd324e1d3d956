//! Strategy lifecycle
//!
//! ```plain
//!               pause (Guardian+)
//!   ┌────────┐ ─────────────────► ┌────────┐
//!   │ Active │                    │ Paused │
//!   └────────┘ ◄───────────────── └────────┘
//!     │   ▲      unpause (Admin+)     │
//!     │   │                           │
//!     │   │ unpause (Admin+)          │ panic (Guardian+)
//!     │   │                           ▼
//!     │   └──────────────────── ┌──────────┐
//!     └───────────────────────► │ Panicked │ ◄─┐ panic
//!          panic (Guardian+)    └──────────┘ ──┘
//! ```
//!
//! Pausing is cheap to trigger and resuming is deliberate: a guardian can stop
//! the strategy but only an admin can bring it back.

use alloy_primitives::Address;
use candid::CandidType;
use serde::{Deserialize, Serialize};

use crate::{
    access::{AccessRegistry, Operation},
    utils::error::{VaultError, VaultResult},
};

/// Operational status of the active strategy
#[derive(Clone, Copy, CandidType, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub enum LifecycleStatus {
    /// Deposits, sweeps and harvests are allowed
    Active,
    /// Stopped by a guardian or admin. Capital stays in the strategy.
    Paused,
    /// Emergency stop. All capital was recalled from the strategy.
    Panicked {
        /// Timestamp of the panic, denominated in seconds.
        panicked_at: u64,
    },
}

impl Default for LifecycleStatus {
    fn default() -> Self {
        Self::Active
    }
}

/// Lifecycle state machine of the active strategy.
///
/// Every transition checks the caller against the registry first, and only
/// changes the status once every precondition holds.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct StrategyLifecycle {
    status: LifecycleStatus,
}

impl StrategyLifecycle {
    pub fn status(&self) -> LifecycleStatus {
        self.status
    }

    /// Returns `true` if the status is explicitly set to `Active`.
    pub fn is_active(&self) -> bool {
        self.status == LifecycleStatus::Active
    }

    /// Returns `Err(VaultError::NotActive)` unless the strategy is `Active`.
    pub fn ensure_active(&self) -> VaultResult<()> {
        if !self.is_active() {
            return Err(VaultError::NotActive);
        }
        Ok(())
    }

    /// Active -> Paused
    pub fn pause(&mut self, registry: &AccessRegistry, caller: &Address) -> VaultResult<()> {
        self.check_pause(registry, caller)?;
        self.status = LifecycleStatus::Paused;
        Ok(())
    }

    pub fn check_pause(&self, registry: &AccessRegistry, caller: &Address) -> VaultResult<()> {
        registry.require(caller, Operation::Pause)?;
        self.ensure_active()
    }

    /// Paused | Panicked -> Active
    pub fn unpause(&mut self, registry: &AccessRegistry, caller: &Address) -> VaultResult<()> {
        self.check_unpause(registry, caller)?;
        self.status = LifecycleStatus::Active;
        Ok(())
    }

    pub fn check_unpause(&self, registry: &AccessRegistry, caller: &Address) -> VaultResult<()> {
        registry.require(caller, Operation::Unpause)?;
        if self.is_active() {
            return Err(VaultError::AlreadyActive);
        }
        Ok(())
    }

    /// Any -> Panicked.
    /// Only the status transition; recalling capital is up to the caller.
    pub fn panic(
        &mut self,
        registry: &AccessRegistry,
        caller: &Address,
        now: u64,
    ) -> VaultResult<()> {
        self.check_panic(registry, caller)?;
        self.status = LifecycleStatus::Panicked { panicked_at: now };
        Ok(())
    }

    pub fn check_panic(&self, registry: &AccessRegistry, caller: &Address) -> VaultResult<()> {
        registry.require(caller, Operation::Panic)
    }
}
