//! Vault state and operation logic
//!
//! Operations check every precondition they can before calling the strategy
//! or the asset ledger, and write local state only once those calls returned.
//! A failed precondition therefore leaves the vault untouched.

use std::collections::HashMap;

use alloy_primitives::{Address, U256};

use super::query::{HarvestOutcome, VaultSnapshot};
use crate::{
    access::{AccessRegistry, Operation, Role},
    asset::AssetLedger,
    config::{check_fee, VaultConfig},
    harvest::{HarvestRecord, HarvestTracker},
    ledger::ShareLedger,
    lifecycle::StrategyLifecycle,
    strategy::Strategy,
    utils::{
        common::{apply_bps, u256_to_nat},
        error::{arithmetic_err, VaultError, VaultResult},
    },
};

pub(crate) struct VaultState<S, A> {
    pub(crate) config: VaultConfig,
    pub(crate) registry: AccessRegistry,
    pub(crate) ledger: ShareLedger,
    pub(crate) lifecycle: StrategyLifecycle,
    pub(crate) harvests: HarvestTracker,
    pub(crate) strategy: S,
    pub(crate) asset: A,
    /// Underlying asset held by the vault on behalf of the share holders
    pub(crate) idle: U256,
    /// Collected fees waiting to be paid out to the treasury.
    /// Held in custody but not part of the vault balance.
    pub(crate) fee_pool: U256,
    pub(crate) deposited: HashMap<Address, U256>,
    pub(crate) withdrawn: HashMap<Address, U256>,
}

impl<S: Strategy, A: AssetLedger> VaultState<S, A> {
    pub(crate) fn new(
        config: VaultConfig,
        registry: AccessRegistry,
        strategy: S,
        asset: A,
        now: u64,
    ) -> VaultResult<Self> {
        config.validate()?;
        let harvests = HarvestTracker::new(
            config.harvest_log_capacity,
            config.harvest_log_cadence,
            now,
        )?;

        Ok(Self {
            config,
            registry,
            ledger: ShareLedger::default(),
            lifecycle: StrategyLifecycle::default(),
            harvests,
            strategy,
            asset,
            idle: U256::ZERO,
            fee_pool: U256::ZERO,
            deposited: HashMap::new(),
            withdrawn: HashMap::new(),
        })
    }

    /// Idle balance plus the capital managed by the strategy.
    pub(crate) fn balance(&self) -> VaultResult<U256> {
        self.idle
            .checked_add(self.strategy.balance_of())
            .ok_or_else(|| arithmetic_err("Vault balance overflowed."))
    }

    pub(crate) fn price_per_full_share(&self) -> VaultResult<U256> {
        self.ledger.price_per_full_share(self.balance()?)
    }

    pub(crate) fn cumulative_deposits(&self, holder: &Address) -> U256 {
        self.deposited.get(holder).copied().unwrap_or(U256::ZERO)
    }

    pub(crate) fn cumulative_withdrawals(&self, holder: &Address) -> U256 {
        self.withdrawn.get(holder).copied().unwrap_or(U256::ZERO)
    }

    /// Pulls `amount` from the caller and mints shares for it, net of the deposit fee.
    pub(crate) fn deposit(&mut self, caller: &Address, amount: U256) -> VaultResult<U256> {
        self.registry.require(caller, Operation::Deposit)?;
        self.lifecycle.ensure_active()?;

        let total_value = self.balance()?;
        let fee = apply_bps(amount, self.config.deposit_fee_bps)?;
        let cap = self.config.tvl_cap;
        self.ledger.check_deposit(amount, fee, total_value, cap)?;
        let idle = self
            .idle
            .checked_add(amount - fee)
            .ok_or_else(|| arithmetic_err("Idle balance overflowed."))?;
        let fee_pool = self
            .fee_pool
            .checked_add(fee)
            .ok_or_else(|| arithmetic_err("Fee pool overflowed."))?;
        if self.asset.balance_of(caller) < amount {
            return Err(VaultError::InsufficientBalance);
        }

        self.asset.transfer_from(caller, amount)?;

        let shares = self.ledger.deposit(*caller, amount, fee, total_value, cap)?;
        self.idle = idle;
        self.fee_pool = fee_pool;
        credit(&mut self.deposited, caller, amount);
        Ok(shares)
    }

    /// Burns `shares` of the caller and pays out what they are worth, net of the security fee.
    ///
    /// When the idle balance can not cover the withdrawal, exactly the shortfall
    /// is recalled from the strategy. If the strategy returns less, the holder
    /// receives what is available.
    pub(crate) fn withdraw(&mut self, caller: &Address, shares: U256) -> VaultResult<U256> {
        self.registry.require(caller, Operation::Withdraw)?;
        let total_value = self.balance()?;
        let mut amount = self.ledger.preview_withdraw(caller, shares, total_value)?;

        if amount > self.idle {
            let shortfall = amount - self.idle;
            let returned = self.strategy.withdraw(shortfall)?;
            // recalled capital is idle whether or not the payout below succeeds
            self.idle = self.idle.saturating_add(returned);
            amount = amount.min(self.idle);
        }

        let fee = apply_bps(amount, self.config.security_fee_bps)?;
        let payout = amount - fee;
        let fee_pool = self
            .fee_pool
            .checked_add(fee)
            .ok_or_else(|| arithmetic_err("Fee pool overflowed."))?;

        if !payout.is_zero() {
            self.asset.transfer(caller, payout)?;
        }

        // valued at the pre-recall total, like the preview above
        self.ledger.withdraw(caller, shares, total_value)?;
        self.idle -= amount;
        self.fee_pool = fee_pool;
        credit(&mut self.withdrawn, caller, payout);
        Ok(payout)
    }

    pub(crate) fn transfer_shares(
        &mut self,
        caller: &Address,
        to: Address,
        shares: U256,
    ) -> VaultResult<()> {
        self.registry.require(caller, Operation::TransferShares)?;
        self.ledger.transfer(caller, to, shares)
    }

    /// Moves idle capital above the sweep threshold into the strategy.
    pub(crate) fn sweep(&mut self, caller: &Address) -> VaultResult<U256> {
        self.registry.require(caller, Operation::Sweep)?;
        self.lifecycle.ensure_active()?;

        let amount = self.idle.saturating_sub(self.config.sweep_threshold);
        if amount.is_zero() {
            return Ok(U256::ZERO);
        }
        self.strategy.deposit(amount)?;
        self.idle -= amount;
        Ok(amount)
    }

    /// Realizes the strategy's yield, takes the performance fee out of it and logs the harvest.
    pub(crate) fn harvest(&mut self, caller: &Address, now: u64) -> VaultResult<HarvestOutcome> {
        self.registry.require(caller, Operation::Harvest)?;
        self.lifecycle.ensure_active()?;
        self.harvests.check_cadence(now)?;
        let interval = self.harvests.interval_until(now)?;
        let vault_balance = self.balance()?;

        let yield_amount = self.strategy.harvest()?;
        let fee = apply_bps(yield_amount, self.config.performance_fee_bps)?;
        // yield realized while no shares are outstanding has no owner, the fee pool takes all of it
        let owed = if self.ledger.total_shares().is_zero() {
            yield_amount
        } else {
            fee
        };
        let performance_fee = if owed.is_zero() {
            U256::ZERO
        } else {
            self.strategy.withdraw(owed)?
        };
        let caller_fee = apply_bps(fee.min(performance_fee), self.config.caller_fee_bps)?;

        // the fee is in custody now, the caller's part leaves it below
        self.fee_pool = self.fee_pool.saturating_add(performance_fee);
        if !caller_fee.is_zero() {
            self.asset.transfer(caller, caller_fee)?;
            self.fee_pool -= caller_fee;
        }

        let net_yield = yield_amount.saturating_sub(performance_fee);
        self.harvests.record_harvest(HarvestRecord {
            timestamp: now,
            yield_amount: net_yield,
            caller_fee_amount: caller_fee,
            vault_balance,
            interval,
        })?;

        Ok(HarvestOutcome {
            yield_amount,
            performance_fee,
            caller_fee,
            net_yield,
        })
    }

    pub(crate) fn pause(&mut self, caller: &Address) -> VaultResult<()> {
        self.lifecycle.pause(&self.registry, caller)
    }

    pub(crate) fn unpause(&mut self, caller: &Address) -> VaultResult<()> {
        self.lifecycle.unpause(&self.registry, caller)
    }

    /// Recalls all capital from the strategy and marks it `Panicked`.
    pub(crate) fn panic(&mut self, caller: &Address, now: u64) -> VaultResult<U256> {
        self.lifecycle.check_panic(&self.registry, caller)?;
        let returned = self.strategy.panic()?;
        self.idle = self.idle.saturating_add(returned);
        self.lifecycle.panic(&self.registry, caller, now)?;
        Ok(returned)
    }

    pub(crate) fn update_harvest_log_cadence(
        &mut self,
        caller: &Address,
        seconds: u64,
    ) -> VaultResult<()> {
        self.registry.require(caller, Operation::UpdateHarvestLogCadence)?;
        self.harvests.set_cadence(seconds);
        self.config.harvest_log_cadence(seconds);
        Ok(())
    }

    pub(crate) fn update_security_fee(&mut self, caller: &Address, bps: u16) -> VaultResult<()> {
        self.registry.require(caller, Operation::UpdateSecurityFee)?;
        check_fee("security_fee_bps", bps)?;
        self.config.security_fee_bps(bps);
        Ok(())
    }

    pub(crate) fn update_deposit_fee(&mut self, caller: &Address, bps: u16) -> VaultResult<()> {
        self.registry.require(caller, Operation::UpdateDepositFee)?;
        check_fee("deposit_fee_bps", bps)?;
        self.config.deposit_fee_bps(bps);
        Ok(())
    }

    pub(crate) fn update_performance_fee(
        &mut self,
        caller: &Address,
        bps: u16,
    ) -> VaultResult<()> {
        self.registry.require(caller, Operation::UpdatePerformanceFee)?;
        check_fee("performance_fee_bps", bps)?;
        self.config.performance_fee_bps(bps);
        Ok(())
    }

    pub(crate) fn update_tvl_cap(
        &mut self,
        caller: &Address,
        cap: Option<U256>,
    ) -> VaultResult<()> {
        self.registry.require(caller, Operation::UpdateTvlCap)?;
        self.config.tvl_cap(cap);
        Ok(())
    }

    pub(crate) fn update_sweep_threshold(
        &mut self,
        caller: &Address,
        threshold: U256,
    ) -> VaultResult<()> {
        self.registry.require(caller, Operation::UpdateSweepThreshold)?;
        self.config.sweep_threshold(threshold);
        Ok(())
    }

    /// Pays the fee pool out to the treasury.
    pub(crate) fn collect_fees(&mut self, caller: &Address) -> VaultResult<U256> {
        self.registry.require(caller, Operation::CollectFees)?;
        let amount = self.fee_pool;
        if amount.is_zero() {
            return Ok(U256::ZERO);
        }
        let treasury = self.config.treasury;
        self.asset.transfer(&treasury, amount)?;
        self.fee_pool = U256::ZERO;
        Ok(amount)
    }

    pub(crate) fn grant_role(
        &mut self,
        caller: &Address,
        actor: Address,
        role: Role,
    ) -> VaultResult<()> {
        self.registry.grant(caller, actor, role)
    }

    pub(crate) fn revoke_role(&mut self, caller: &Address, actor: &Address) -> VaultResult<Role> {
        self.registry.revoke(caller, actor)
    }

    /// Swaps in a new strategy once the current one has been emptied.
    pub(crate) fn replace_strategy(&mut self, caller: &Address, strategy: S) -> VaultResult<S> {
        self.registry.require(caller, Operation::ReplaceStrategy)?;
        if !self.strategy.balance_of().is_zero() {
            return Err(VaultError::StrategyNotRetired);
        }
        Ok(std::mem::replace(&mut self.strategy, strategy))
    }

    pub(crate) fn snapshot(&self) -> VaultResult<VaultSnapshot> {
        let balance = self.balance()?;
        Ok(VaultSnapshot {
            total_shares: u256_to_nat(&self.ledger.total_shares()),
            balance: u256_to_nat(&balance),
            available: u256_to_nat(&self.idle),
            strategy_balance: u256_to_nat(&self.strategy.balance_of()),
            price_per_full_share: u256_to_nat(&self.ledger.price_per_full_share(balance)?),
            fee_pool: u256_to_nat(&self.fee_pool),
            tvl_cap: self.config.tvl_cap.as_ref().map(u256_to_nat),
            status: self.lifecycle.status(),
            harvest_count: self.harvests.len() as u64,
            last_harvest: self.harvests.last_harvest(),
            average_apr_bps: u256_to_nat(&self.harvests.average_apr(self.harvests.capacity())?),
        })
    }
}

fn credit(totals: &mut HashMap<Address, U256>, holder: &Address, amount: U256) {
    let total = totals.entry(*holder).or_insert(U256::ZERO);
    *total = total.saturating_add(amount);
}
