//! Share accounting
//!
//! Holders own shares of the pooled asset. The ledger never stores a share
//! price: conversions always take the current total underlying value, so a
//! price can not go stale.
//!
//! All conversions round down, which favors the vault over the individual
//! holder and keeps rounding dust with the remaining holders.

use std::collections::HashMap;

use alloy_primitives::{Address, U256};

use crate::{
    constants::scale,
    utils::{
        common::mul_div,
        error::{arithmetic_err, VaultError, VaultResult},
    },
};

#[derive(Clone, Debug, Default, PartialEq)]
pub struct ShareLedger {
    balances: HashMap<Address, U256>,
    total_shares: U256,
}

impl ShareLedger {
    pub fn total_shares(&self) -> U256 {
        self.total_shares
    }

    pub fn shares_of(&self, holder: &Address) -> U256 {
        self.balances.get(holder).copied().unwrap_or(U256::ZERO)
    }

    /// Iterates over all holders with a non-zero balance.
    pub fn holders(&self) -> impl Iterator<Item = (&Address, &U256)> {
        self.balances.iter()
    }

    /// Value of one full share (1e18 units), scaled by 1e18.
    /// An empty ledger prices shares at exactly 1e18.
    pub fn price_per_full_share(&self, total_value: U256) -> VaultResult<U256> {
        if self.total_shares.is_zero() {
            return Ok(scale());
        }
        mul_div(total_value, scale(), self.total_shares)
    }

    /// Shares minted for `amount` when the pool is worth `total_value`.
    /// The first deposit is minted 1:1.
    pub fn preview_deposit(&self, amount: U256, total_value: U256) -> VaultResult<U256> {
        if self.total_shares.is_zero() {
            return Ok(amount);
        }
        if total_value.is_zero() {
            return Err(arithmetic_err(
                "Outstanding shares are backed by a zero pool value.",
            ));
        }
        mul_div(amount, self.total_shares, total_value)
    }

    /// Underlying amount that `shares` of `holder` are worth when the pool is worth `total_value`.
    pub fn preview_withdraw(
        &self,
        holder: &Address,
        shares: U256,
        total_value: U256,
    ) -> VaultResult<U256> {
        if shares.is_zero() {
            return Err(VaultError::ZeroShares);
        }
        if self.shares_of(holder) < shares {
            return Err(VaultError::InsufficientShares);
        }
        mul_div(shares, total_value, self.total_shares)
    }

    /// Validates a deposit of `amount` and returns the shares it would mint.
    ///
    /// `cap` bounds the total underlying value after the whole `amount` is
    /// added. Shares are minted for `amount - fee` only.
    pub fn check_deposit(
        &self,
        amount: U256,
        fee: U256,
        total_value: U256,
        cap: Option<U256>,
    ) -> VaultResult<U256> {
        if amount.is_zero() {
            return Err(VaultError::ZeroAmount);
        }
        if let Some(cap) = cap {
            let value_after = total_value
                .checked_add(amount)
                .ok_or_else(|| arithmetic_err("Total value overflowed."))?;
            if value_after > cap {
                return Err(VaultError::CapExceeded);
            }
        }
        let net = amount
            .checked_sub(fee)
            .ok_or_else(|| arithmetic_err("Deposit fee exceeds the deposit."))?;
        let shares = self.preview_deposit(net, total_value)?;
        if shares.is_zero() {
            return Err(VaultError::ZeroShares);
        }
        self.total_shares
            .checked_add(shares)
            .ok_or_else(|| arithmetic_err("Total shares overflowed."))?;
        Ok(shares)
    }

    /// Mints shares for a deposit of `amount`, `fee` of which does not buy shares.
    /// Returns the minted amount.
    pub fn deposit(
        &mut self,
        holder: Address,
        amount: U256,
        fee: U256,
        total_value: U256,
        cap: Option<U256>,
    ) -> VaultResult<U256> {
        let shares = self.check_deposit(amount, fee, total_value, cap)?;
        self.mint(holder, shares)?;
        Ok(shares)
    }

    /// Burns `shares` of `holder` and returns the underlying amount they were worth.
    /// Withdrawal fees are applied by the caller.
    pub fn withdraw(
        &mut self,
        holder: &Address,
        shares: U256,
        total_value: U256,
    ) -> VaultResult<U256> {
        let amount = self.preview_withdraw(holder, shares, total_value)?;
        self.burn(holder, shares)?;
        Ok(amount)
    }

    pub fn mint(&mut self, holder: Address, shares: U256) -> VaultResult<()> {
        let total_shares = self
            .total_shares
            .checked_add(shares)
            .ok_or_else(|| arithmetic_err("Total shares overflowed."))?;
        let balance = self.balances.entry(holder).or_insert(U256::ZERO);
        *balance += shares;
        self.total_shares = total_shares;
        Ok(())
    }

    pub fn burn(&mut self, holder: &Address, shares: U256) -> VaultResult<()> {
        let balance = self.shares_of(holder);
        if balance < shares {
            return Err(VaultError::InsufficientShares);
        }
        let remaining = balance - shares;
        if remaining.is_zero() {
            self.balances.remove(holder);
        } else {
            self.balances.insert(*holder, remaining);
        }
        self.total_shares -= shares;
        Ok(())
    }

    /// Moves shares between holders. Total shares are unchanged.
    pub fn transfer(&mut self, from: &Address, to: Address, shares: U256) -> VaultResult<()> {
        if shares.is_zero() {
            return Err(VaultError::ZeroShares);
        }
        self.burn(from, shares)?;
        self.mint(to, shares)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn holder(byte: u8) -> Address {
        Address::repeat_byte(byte)
    }

    fn sum_of_balances(ledger: &ShareLedger) -> U256 {
        ledger
            .holders()
            .fold(U256::ZERO, |acc, (_, balance)| acc + *balance)
    }

    #[test]
    fn empty_ledger_prices_at_one() {
        let ledger = ShareLedger::default();
        assert_eq!(ledger.price_per_full_share(U256::ZERO).unwrap(), scale());
        assert_eq!(
            ledger.price_per_full_share(U256::from(1_000u64)).unwrap(),
            scale()
        );
    }

    #[test]
    fn first_deposit_mints_one_to_one() {
        let mut ledger = ShareLedger::default();
        let shares = ledger
            .deposit(holder(1), U256::from(500u64), U256::ZERO, U256::ZERO, None)
            .unwrap();
        assert_eq!(shares, U256::from(500u64));
        assert_eq!(ledger.total_shares(), U256::from(500u64));
    }

    #[test]
    fn deposit_after_yield_rounds_down() {
        let mut ledger = ShareLedger::default();
        ledger
            .deposit(holder(1), U256::from(1_000u64), U256::ZERO, U256::ZERO, None)
            .unwrap();

        // pool grew to 3000 through yield: 1000 * 1000 / 3000 = 333.33
        let shares = ledger
            .deposit(holder(2), U256::from(1_000u64), U256::ZERO, U256::from(3_000u64), None)
            .unwrap();
        assert_eq!(shares, U256::from(333u64));
    }

    #[test]
    fn deposit_respects_cap() {
        let mut ledger = ShareLedger::default();
        let cap = Some(U256::from(1_000u64));

        ledger
            .deposit(holder(1), U256::from(600u64), U256::ZERO, U256::ZERO, cap)
            .unwrap();
        let before = ledger.clone();

        let result = ledger.deposit(
            holder(2),
            U256::from(401u64),
            U256::ZERO,
            U256::from(600u64),
            cap,
        );
        assert_eq!(result, Err(VaultError::CapExceeded));
        assert_eq!(ledger, before);

        ledger
            .deposit(holder(2), U256::from(400u64), U256::ZERO, U256::from(600u64), cap)
            .unwrap();
    }

    #[test]
    fn cap_applies_to_the_whole_deposit_but_the_fee_buys_no_shares() {
        let mut ledger = ShareLedger::default();
        let cap = Some(U256::from(1_000u64));

        let shares = ledger
            .deposit(holder(1), U256::from(1_000u64), U256::from(10u64), U256::ZERO, cap)
            .unwrap();
        assert_eq!(shares, U256::from(990u64));

        let result =
            ledger.check_deposit(U256::from(20u64), U256::ZERO, U256::from(990u64), cap);
        assert_eq!(result, Err(VaultError::CapExceeded));
        assert_eq!(
            ledger.check_deposit(U256::from(10u64), U256::ZERO, U256::from(990u64), cap),
            Ok(U256::from(10u64))
        );
        assert_eq!(ledger.total_shares(), U256::from(990u64));
    }

    #[test]
    fn dust_deposit_into_expensive_pool_is_rejected() {
        let mut ledger = ShareLedger::default();
        ledger
            .deposit(holder(1), U256::from(1u64), U256::ZERO, U256::ZERO, None)
            .unwrap();
        let result = ledger.deposit(
            holder(2),
            U256::from(1u64),
            U256::ZERO,
            U256::from(10u64),
            None,
        );
        assert_eq!(result, Err(VaultError::ZeroShares));
    }

    #[test]
    fn withdraw_more_than_owned_changes_nothing() {
        let mut ledger = ShareLedger::default();
        ledger
            .deposit(holder(1), U256::from(100u64), U256::ZERO, U256::ZERO, None)
            .unwrap();
        let before = ledger.clone();

        let result = ledger.withdraw(&holder(1), U256::from(101u64), U256::from(100u64));
        assert_eq!(result, Err(VaultError::InsufficientShares));
        assert_eq!(ledger, before);
    }

    #[test]
    fn transfer_moves_claims() {
        let mut ledger = ShareLedger::default();
        ledger
            .deposit(holder(1), U256::from(100u64), U256::ZERO, U256::ZERO, None)
            .unwrap();
        ledger
            .transfer(&holder(1), holder(2), U256::from(40u64))
            .unwrap();

        assert_eq!(ledger.shares_of(&holder(1)), U256::from(60u64));
        assert_eq!(ledger.shares_of(&holder(2)), U256::from(40u64));
        assert_eq!(ledger.total_shares(), U256::from(100u64));
        assert_eq!(
            ledger.transfer(&holder(2), holder(1), U256::from(41u64)),
            Err(VaultError::InsufficientShares)
        );
    }

    proptest! {
        #[test]
        fn balances_always_sum_to_total(
            deposits in prop::collection::vec((1u8..6, 1u64..1_000_000_000), 1..20),
        ) {
            let mut ledger = ShareLedger::default();
            let mut pool = U256::ZERO;
            for (who, amount) in deposits {
                let amount = U256::from(amount);
                ledger.deposit(holder(who), amount, U256::ZERO, pool, None).unwrap();
                pool += amount;
            }
            prop_assert_eq!(sum_of_balances(&ledger), ledger.total_shares());

            let holders: Vec<(Address, U256)> = ledger.holders().map(|(a, b)| (*a, *b)).collect();
            for (who, balance) in holders {
                let half = balance / U256::from(2u64);
                if !half.is_zero() {
                    let amount = ledger.withdraw(&who, half, pool).unwrap();
                    pool -= amount;
                }
            }
            prop_assert_eq!(sum_of_balances(&ledger), ledger.total_shares());
        }

        #[test]
        fn full_withdrawal_returns_the_deposit_without_yield(
            others in prop::collection::vec((2u8..6, 1u64..1_000_000_000), 0..10),
            amount in 1u64..1_000_000_000,
        ) {
            let mut ledger = ShareLedger::default();
            let mut pool = U256::ZERO;
            for (who, other) in others.iter().copied() {
                let other = U256::from(other);
                ledger.deposit(holder(who), other, U256::ZERO, pool, None).unwrap();
                pool += other;
            }

            let amount = U256::from(amount);
            let shares = ledger.deposit(holder(1), amount, U256::ZERO, pool, None).unwrap();
            pool += amount;

            // other holders come and go before the withdrawal
            for (who, _) in others {
                let balance = ledger.shares_of(&holder(who));
                if !balance.is_zero() {
                    pool -= ledger.withdraw(&holder(who), balance, pool).unwrap();
                }
            }

            let returned = ledger.withdraw(&holder(1), shares, pool).unwrap();
            prop_assert_eq!(returned, amount);
        }
    }
}
