//! Strategy adapter interface
//!
//! A strategy holds the capital the vault deploys and generates yield with it.
//! How yield is generated is up to the adapter; the vault only relies on this
//! trait, so any conforming implementation can be plugged in.

#[cfg(test)]
use mockall::automock;

use alloy_primitives::U256;

use crate::utils::error::VaultResult;

pub mod hold;

pub use hold::HoldStrategy;

#[cfg_attr(test, automock)]
pub trait Strategy {
    /// Capital currently managed by the strategy.
    fn balance_of(&self) -> U256;

    /// Takes `amount` of idle capital from the vault into the strategy.
    fn deposit(&mut self, amount: U256) -> VaultResult<()>;

    /// Returns up to `amount` to the vault and reports the amount actually returned.
    fn withdraw(&mut self, amount: U256) -> VaultResult<U256>;

    /// Realizes accrued yield into the managed balance and reports its size.
    fn harvest(&mut self) -> VaultResult<U256>;

    /// Returns all managed capital to the vault and reports the amount returned.
    fn panic(&mut self) -> VaultResult<U256>;
}
