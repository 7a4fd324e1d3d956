//! Underlying asset transfers
//!
//! The vault never holds token balances itself: it moves the underlying asset
//! through an [`AssetLedger`] bound to its custody account.

use std::{cell::RefCell, collections::HashMap, rc::Rc};

use alloy_primitives::{Address, U256};

use crate::utils::error::{VaultError, VaultResult};

/// Token operations the vault needs, seen from its custody account.
pub trait AssetLedger {
    /// Balance held by `owner`.
    fn balance_of(&self, owner: &Address) -> U256;

    /// Moves `amount` from the custody account to `to`.
    fn transfer(&mut self, to: &Address, amount: U256) -> VaultResult<()>;

    /// Pulls `amount` from `owner` into the custody account.
    fn transfer_from(&mut self, owner: &Address, amount: U256) -> VaultResult<()>;
}

/// Shared in-memory fungible token.
/// Clones point to the same balances.
#[derive(Clone, Debug, Default)]
pub struct Token {
    balances: Rc<RefCell<HashMap<Address, U256>>>,
}

impl Token {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn balance_of(&self, owner: &Address) -> U256 {
        self.balances
            .borrow()
            .get(owner)
            .copied()
            .unwrap_or(U256::ZERO)
    }

    /// Creates `amount` new tokens for `to`.
    pub fn mint(&self, to: &Address, amount: U256) {
        let mut balances = self.balances.borrow_mut();
        let balance = balances.entry(*to).or_insert(U256::ZERO);
        *balance = balance.saturating_add(amount);
    }

    pub fn move_tokens(&self, from: &Address, to: &Address, amount: U256) -> VaultResult<()> {
        let mut balances = self.balances.borrow_mut();
        let from_balance = balances.get(from).copied().unwrap_or(U256::ZERO);
        if from_balance < amount {
            return Err(VaultError::Asset(format!(
                "{} holds {} but {} was requested.",
                from, from_balance, amount
            )));
        }
        balances.insert(*from, from_balance - amount);
        let to_balance = balances.entry(*to).or_insert(U256::ZERO);
        *to_balance = to_balance.saturating_add(amount);
        Ok(())
    }

    /// An [`AssetLedger`] view of this token bound to `custodian`.
    pub fn account(&self, custodian: Address) -> TokenAccount {
        TokenAccount {
            token: self.clone(),
            custodian,
        }
    }
}

/// A [`Token`] seen from one custody account
#[derive(Clone, Debug)]
pub struct TokenAccount {
    token: Token,
    custodian: Address,
}

impl TokenAccount {
    pub fn custodian(&self) -> Address {
        self.custodian
    }

    pub fn token(&self) -> &Token {
        &self.token
    }
}

impl AssetLedger for TokenAccount {
    fn balance_of(&self, owner: &Address) -> U256 {
        self.token.balance_of(owner)
    }

    fn transfer(&mut self, to: &Address, amount: U256) -> VaultResult<()> {
        self.token.move_tokens(&self.custodian, to, amount)
    }

    fn transfer_from(&mut self, owner: &Address, amount: U256) -> VaultResult<()> {
        self.token.move_tokens(owner, &self.custodian, amount)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accounts_share_balances() {
        let token = Token::new();
        let vault = Address::repeat_byte(0xaa);
        let user = Address::repeat_byte(0x01);
        token.mint(&user, U256::from(100u64));

        let mut account = token.account(vault);
        account.transfer_from(&user, U256::from(60u64)).unwrap();
        assert_eq!(token.balance_of(&vault), U256::from(60u64));
        assert_eq!(account.balance_of(&user), U256::from(40u64));

        account.transfer(&user, U256::from(10u64)).unwrap();
        assert_eq!(token.balance_of(&user), U256::from(50u64));
        assert_eq!(account.custodian(), vault);
    }

    #[test]
    fn overdraft_is_rejected_without_side_effects() {
        let token = Token::new();
        let vault = Address::repeat_byte(0xaa);
        let user = Address::repeat_byte(0x01);
        token.mint(&user, U256::from(5u64));

        let mut account = token.account(vault);
        assert!(matches!(
            account.transfer_from(&user, U256::from(6u64)),
            Err(VaultError::Asset(_))
        ));
        assert_eq!(token.balance_of(&user), U256::from(5u64));
        assert_eq!(token.balance_of(&vault), U256::ZERO);
    }
}
