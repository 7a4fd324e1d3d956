//! Strategy that simply holds the capital it receives.
//!
//! Rewards are paid into the strategy's custody account from outside, the way
//! a farming protocol would. They only become part of the managed balance when
//! the vault harvests.

use alloy_primitives::{Address, U256};

use super::Strategy;
use crate::{
    asset::{AssetLedger, TokenAccount},
    utils::error::{arithmetic_err, VaultError, VaultResult},
};

#[derive(Clone, Debug)]
pub struct HoldStrategy {
    /// The strategy's own custody account
    account: TokenAccount,
    /// Vault that owns the managed capital
    vault: Address,
    /// Capital accounted for as of the last deposit, withdrawal or harvest
    managed: U256,
}

impl HoldStrategy {
    pub fn new(account: TokenAccount, vault: Address) -> Self {
        Self {
            account,
            vault,
            managed: U256::ZERO,
        }
    }

    pub fn address(&self) -> Address {
        self.account.custodian()
    }

    /// Rewards received since the last harvest.
    pub fn pending_yield(&self) -> U256 {
        self.held().saturating_sub(self.managed)
    }

    fn held(&self) -> U256 {
        self.account.balance_of(&self.address())
    }
}

impl Strategy for HoldStrategy {
    fn balance_of(&self) -> U256 {
        self.managed
    }

    fn deposit(&mut self, amount: U256) -> VaultResult<()> {
        let managed = self
            .managed
            .checked_add(amount)
            .ok_or_else(|| arithmetic_err("Managed capital overflowed."))?;
        let vault = self.vault;
        self.account
            .transfer_from(&vault, amount)
            .map_err(|err| VaultError::Strategy(err.to_string()))?;
        self.managed = managed;
        Ok(())
    }

    fn withdraw(&mut self, amount: U256) -> VaultResult<U256> {
        let returned = amount.min(self.managed);
        if !returned.is_zero() {
            let vault = self.vault;
            self.account
                .transfer(&vault, returned)
                .map_err(|err| VaultError::Strategy(err.to_string()))?;
            self.managed -= returned;
        }
        Ok(returned)
    }

    fn harvest(&mut self) -> VaultResult<U256> {
        let realized = self.pending_yield();
        self.managed += realized;
        Ok(realized)
    }

    fn panic(&mut self) -> VaultResult<U256> {
        self.withdraw(self.managed)
    }
}
