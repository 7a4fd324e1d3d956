//! The public vault
//!
//! Every state changing operation goes through [`Vault::execute`], which
//!
//! 1. acquires the reentrancy lock, rejecting nested calls with [`VaultError::Reentrant`],
//! 2. reads the clock once, so the whole operation sees a single timestamp,
//! 3. runs the operation against the vault state,
//! 4. journals the outcome, success or failure.
//!
//! Views refuse to run while an operation is in progress, so a strategy
//! calling back into the vault can not observe it mid-mutation.

use std::cell::RefCell;

use alloy_primitives::{Address, U256};

use crate::{
    access::{AccessRegistry, Operation, Role},
    asset::AssetLedger,
    clock::Clock,
    config::VaultConfig,
    harvest::HarvestRecord,
    journal::{Journal, JournalEntry, LogType},
    lifecycle::LifecycleStatus,
    lock::Lock,
    strategy::Strategy,
    utils::error::{VaultError, VaultResult},
};

mod state;
pub mod query;

use self::state::VaultState;
pub use query::{HarvestOutcome, VaultSnapshot};

pub struct Vault<S, A> {
    lock: Lock,
    state: RefCell<VaultState<S, A>>,
    journal: RefCell<Journal>,
    clock: Box<dyn Clock>,
}

impl<S: Strategy, A: AssetLedger> Vault<S, A> {
    /// Creates an empty, active vault.
    /// The harvest cadence is measured from the creation time.
    pub fn new(
        config: VaultConfig,
        registry: AccessRegistry,
        strategy: S,
        asset: A,
        clock: Box<dyn Clock>,
    ) -> VaultResult<Self> {
        let now = clock.now();
        let mut journal = Journal::new(config.journal_capacity);
        let state = VaultState::new(config, registry, strategy, asset, now)?;

        JournalEntry::new(now, Ok(()), LogType::Info)
            .actor(&state.registry.super_admin())
            .note("Vault initialized.")
            .commit(&mut journal);

        Ok(Self {
            lock: Lock::default(),
            state: RefCell::new(state),
            journal: RefCell::new(journal),
            clock,
        })
    }

    fn execute<T, F>(&self, operation: Operation, caller: &Address, run: F) -> VaultResult<T>
    where
        F: FnOnce(&mut VaultState<S, A>, u64) -> VaultResult<(T, String)>,
    {
        let _guard = self.lock.try_lock(operation).map_err(|err| {
            tracing::warn!(
                operation = ?operation,
                actor = %caller,
                in_progress = ?self.lock.holder(),
                "Rejected nested call."
            );
            err
        })?;

        let now = self.clock.now();
        let result = {
            let mut state = self
                .state
                .try_borrow_mut()
                .map_err(|_| VaultError::Reentrant)?;
            run(&mut state, now)
        };

        let log_type = match operation {
            Operation::Pause | Operation::Unpause | Operation::Panic => LogType::Emergency,
            _ => LogType::Operation,
        };
        let mut entry = JournalEntry::new(
            now,
            result.as_ref().map(|_| ()).map_err(Clone::clone),
            log_type,
        );
        entry.operation(operation).actor(caller);
        if let Ok((_, note)) = &result {
            entry.note(note);
        }
        entry.commit(&mut self.journal.borrow_mut());

        result.map(|(value, _)| value)
    }

    fn view<T, F>(&self, read: F) -> VaultResult<T>
    where
        F: FnOnce(&VaultState<S, A>) -> VaultResult<T>,
    {
        self.lock.ensure_unlocked()?;
        let state = self.state.try_borrow().map_err(|_| VaultError::Reentrant)?;
        read(&state)
    }

    /// Deposits `amount` of the underlying asset and returns the minted shares.
    pub fn deposit(&self, caller: &Address, amount: U256) -> VaultResult<U256> {
        self.execute(Operation::Deposit, caller, |state, _| {
            let shares = state.deposit(caller, amount)?;
            Ok((shares, format!("Deposited {} for {} shares.", amount, shares)))
        })
    }

    /// Deposits the caller's whole asset balance.
    pub fn deposit_all(&self, caller: &Address) -> VaultResult<U256> {
        self.execute(Operation::Deposit, caller, |state, _| {
            let amount = state.asset.balance_of(caller);
            let shares = state.deposit(caller, amount)?;
            Ok((shares, format!("Deposited {} for {} shares.", amount, shares)))
        })
    }

    /// Redeems `shares` and returns the amount paid out after the security fee.
    pub fn withdraw(&self, caller: &Address, shares: U256) -> VaultResult<U256> {
        self.execute(Operation::Withdraw, caller, |state, _| {
            let payout = state.withdraw(caller, shares)?;
            Ok((payout, format!("Redeemed {} shares for {}.", shares, payout)))
        })
    }

    /// Redeems every share the caller holds.
    pub fn withdraw_all(&self, caller: &Address) -> VaultResult<U256> {
        self.execute(Operation::Withdraw, caller, |state, _| {
            let shares = state.ledger.shares_of(caller);
            let payout = state.withdraw(caller, shares)?;
            Ok((payout, format!("Redeemed {} shares for {}.", shares, payout)))
        })
    }

    pub fn transfer_shares(&self, caller: &Address, to: Address, shares: U256) -> VaultResult<()> {
        self.execute(Operation::TransferShares, caller, |state, _| {
            state.transfer_shares(caller, to, shares)?;
            Ok(((), format!("Transferred {} shares to {}.", shares, to)))
        })
    }

    /// Moves idle capital above the sweep threshold into the strategy.
    /// Returns the amount moved.
    pub fn sweep(&self, caller: &Address) -> VaultResult<U256> {
        self.execute(Operation::Sweep, caller, |state, _| {
            let amount = state.sweep(caller)?;
            Ok((amount, format!("Swept {} into the strategy.", amount)))
        })
    }

    pub fn harvest(&self, caller: &Address) -> VaultResult<HarvestOutcome> {
        self.execute(Operation::Harvest, caller, |state, now| {
            let outcome = state.harvest(caller, now)?;
            let note = format!(
                "Harvested {} with a performance fee of {} ({} to the caller).",
                outcome.yield_amount, outcome.performance_fee, outcome.caller_fee
            );
            Ok((outcome, note))
        })
    }

    pub fn pause(&self, caller: &Address) -> VaultResult<()> {
        self.execute(Operation::Pause, caller, |state, _| {
            state.pause(caller)?;
            Ok(((), "Strategy paused.".to_string()))
        })
    }

    pub fn unpause(&self, caller: &Address) -> VaultResult<()> {
        self.execute(Operation::Unpause, caller, |state, _| {
            state.unpause(caller)?;
            Ok(((), "Strategy reactivated.".to_string()))
        })
    }

    /// Recalls all capital from the strategy and stops deposits until an admin reactivates it.
    /// Returns the amount recalled.
    pub fn panic(&self, caller: &Address) -> VaultResult<U256> {
        self.execute(Operation::Panic, caller, |state, now| {
            let returned = state.panic(caller, now)?;
            Ok((returned, format!("Panicked, recalled {}.", returned)))
        })
    }

    pub fn update_harvest_log_cadence(&self, caller: &Address, seconds: u64) -> VaultResult<()> {
        self.execute(Operation::UpdateHarvestLogCadence, caller, |state, _| {
            state.update_harvest_log_cadence(caller, seconds)?;
            Ok(((), format!("Harvest cadence set to {}s.", seconds)))
        })
    }

    pub fn update_security_fee(&self, caller: &Address, bps: u16) -> VaultResult<()> {
        self.execute(Operation::UpdateSecurityFee, caller, |state, _| {
            state.update_security_fee(caller, bps)?;
            Ok(((), format!("Security fee set to {} bps.", bps)))
        })
    }

    pub fn update_deposit_fee(&self, caller: &Address, bps: u16) -> VaultResult<()> {
        self.execute(Operation::UpdateDepositFee, caller, |state, _| {
            state.update_deposit_fee(caller, bps)?;
            Ok(((), format!("Deposit fee set to {} bps.", bps)))
        })
    }

    pub fn update_performance_fee(&self, caller: &Address, bps: u16) -> VaultResult<()> {
        self.execute(Operation::UpdatePerformanceFee, caller, |state, _| {
            state.update_performance_fee(caller, bps)?;
            Ok(((), format!("Performance fee set to {} bps.", bps)))
        })
    }

    /// `None` removes the cap.
    pub fn update_tvl_cap(&self, caller: &Address, cap: Option<U256>) -> VaultResult<()> {
        self.execute(Operation::UpdateTvlCap, caller, |state, _| {
            state.update_tvl_cap(caller, cap)?;
            Ok(((), format!("TVL cap set to {:?}.", cap)))
        })
    }

    pub fn update_sweep_threshold(&self, caller: &Address, threshold: U256) -> VaultResult<()> {
        self.execute(Operation::UpdateSweepThreshold, caller, |state, _| {
            state.update_sweep_threshold(caller, threshold)?;
            Ok(((), format!("Sweep threshold set to {}.", threshold)))
        })
    }

    /// Pays accumulated fees out to the treasury and returns the amount paid.
    pub fn collect_fees(&self, caller: &Address) -> VaultResult<U256> {
        self.execute(Operation::CollectFees, caller, |state, _| {
            let amount = state.collect_fees(caller)?;
            Ok((amount, format!("Collected {} in fees.", amount)))
        })
    }

    pub fn grant_role(&self, caller: &Address, actor: Address, role: Role) -> VaultResult<()> {
        self.execute(Operation::GrantRole, caller, |state, _| {
            state.grant_role(caller, actor, role)?;
            Ok(((), format!("Granted {:?} to {}.", role, actor)))
        })
    }

    /// Returns the role the actor held before.
    pub fn revoke_role(&self, caller: &Address, actor: &Address) -> VaultResult<Role> {
        self.execute(Operation::RevokeRole, caller, |state, _| {
            let role = state.revoke_role(caller, actor)?;
            Ok((role, format!("Revoked {:?} from {}.", role, actor)))
        })
    }

    /// Installs `strategy` in place of the current one, which must be empty.
    /// Returns the retired strategy.
    pub fn replace_strategy(&self, caller: &Address, strategy: S) -> VaultResult<S> {
        self.execute(Operation::ReplaceStrategy, caller, |state, _| {
            let retired = state.replace_strategy(caller, strategy)?;
            Ok((retired, "Strategy replaced.".to_string()))
        })
    }

    /// Idle balance plus the strategy's balance
    pub fn balance(&self) -> VaultResult<U256> {
        self.view(|state| state.balance())
    }

    /// Idle balance
    pub fn available(&self) -> VaultResult<U256> {
        self.view(|state| Ok(state.idle))
    }

    pub fn strategy_balance(&self) -> VaultResult<U256> {
        self.view(|state| Ok(state.strategy.balance_of()))
    }

    pub fn total_shares(&self) -> VaultResult<U256> {
        self.view(|state| Ok(state.ledger.total_shares()))
    }

    pub fn shares_of(&self, holder: &Address) -> VaultResult<U256> {
        self.view(|state| Ok(state.ledger.shares_of(holder)))
    }

    /// Value of one full share, scaled by 1e18.
    pub fn price_per_full_share(&self) -> VaultResult<U256> {
        self.view(|state| state.price_per_full_share())
    }

    pub fn fee_pool(&self) -> VaultResult<U256> {
        self.view(|state| Ok(state.fee_pool))
    }

    pub fn cumulative_deposits(&self, holder: &Address) -> VaultResult<U256> {
        self.view(|state| Ok(state.cumulative_deposits(holder)))
    }

    pub fn cumulative_withdrawals(&self, holder: &Address) -> VaultResult<U256> {
        self.view(|state| Ok(state.cumulative_withdrawals(holder)))
    }

    pub fn status(&self) -> VaultResult<LifecycleStatus> {
        self.view(|state| Ok(state.lifecycle.status()))
    }

    pub fn role_of(&self, actor: &Address) -> VaultResult<Role> {
        self.view(|state| Ok(state.registry.role_of(actor)))
    }

    pub fn config(&self) -> VaultResult<VaultConfig> {
        self.view(|state| Ok(state.config.clone()))
    }

    /// Mean APR of the last `n` harvests, in basis points.
    pub fn average_apr(&self, n: usize) -> VaultResult<U256> {
        self.view(|state| state.harvests.average_apr(n))
    }

    /// Logged harvests, oldest first.
    pub fn harvest_records(&self) -> VaultResult<Vec<HarvestRecord>> {
        self.view(|state| Ok(state.harvests.records()))
    }

    pub fn journal(&self) -> VaultResult<Vec<JournalEntry>> {
        self.lock.ensure_unlocked()?;
        Ok(self.journal.borrow().entries().cloned().collect())
    }

    pub fn snapshot(&self) -> VaultResult<VaultSnapshot> {
        self.view(|state| state.snapshot())
    }
}
