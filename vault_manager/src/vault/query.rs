use alloy_primitives::U256;
use candid::{CandidType, Nat};
use serde::Deserialize;

use crate::lifecycle::LifecycleStatus;

/// Point-in-time view of the vault, returned by [`super::Vault::snapshot`]
#[derive(Clone, CandidType, Debug, Deserialize, PartialEq)]
pub struct VaultSnapshot {
    pub total_shares: Nat,
    /// Idle balance plus the strategy's balance
    pub balance: Nat,
    /// Idle balance
    pub available: Nat,
    pub strategy_balance: Nat,
    /// Scaled by 1e18
    pub price_per_full_share: Nat,
    pub fee_pool: Nat,
    pub tvl_cap: Option<Nat>,
    pub status: LifecycleStatus,
    pub harvest_count: u64,
    pub last_harvest: u64,
    /// Mean APR over the whole harvest log, in basis points
    pub average_apr_bps: Nat,
}

/// Amounts moved by a successful harvest
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct HarvestOutcome {
    /// Yield reported by the strategy
    pub yield_amount: U256,
    /// Performance fee pulled back from the strategy, caller fee included
    pub performance_fee: U256,
    /// Part of the performance fee paid to the caller
    pub caller_fee: U256,
    /// Yield left to the share holders
    pub net_yield: U256,
}
