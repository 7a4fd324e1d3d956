//! Role based access control
//!
//! Every actor resolves to exactly one [`Role`]. Whether a role may run an
//! [`Operation`] is answered by a per-operation table rather than by comparing
//! roles, since the ordering differs between operations: a guardian can pause
//! the strategy but can not resume it.
//!
//! ```plain
//!                         Unassigned  Strategist  Guardian  Admin  SuperAdmin
//! UpdateHarvestLogCadence     -           x          x        x        x
//! Pause / Panic               -           -          x        x        x
//! Unpause                     -           -          -        x        x
//! UpdateSecurityFee           -           -          -        -        x
//! ```

use std::collections::HashMap;

use alloy_primitives::Address;
use candid::CandidType;
use serde::{Deserialize, Serialize};

use crate::utils::error::{invalid_config, VaultError, VaultResult};

/// Roles an actor can hold
#[derive(Clone, Copy, CandidType, Debug, Deserialize, Serialize, PartialEq, Eq, Hash)]
pub enum Role {
    Unassigned,
    Strategist,
    Guardian,
    Admin,
    SuperAdmin,
}

/// Every operation the vault exposes
#[derive(Clone, Copy, CandidType, Debug, Deserialize, Serialize, PartialEq, Eq, Hash)]
pub enum Operation {
    Deposit,
    Withdraw,
    TransferShares,
    Sweep,
    Harvest,
    Pause,
    Unpause,
    Panic,
    UpdateHarvestLogCadence,
    UpdateSecurityFee,
    UpdateDepositFee,
    UpdatePerformanceFee,
    UpdateTvlCap,
    UpdateSweepThreshold,
    CollectFees,
    GrantRole,
    RevokeRole,
    ReplaceStrategy,
}

const EVERYONE: &[Role] = &[
    Role::Unassigned,
    Role::Strategist,
    Role::Guardian,
    Role::Admin,
    Role::SuperAdmin,
];
const STRATEGIST_AND_UP: &[Role] = &[
    Role::Strategist,
    Role::Guardian,
    Role::Admin,
    Role::SuperAdmin,
];
const GUARDIAN_AND_UP: &[Role] = &[Role::Guardian, Role::Admin, Role::SuperAdmin];
const ADMIN_AND_UP: &[Role] = &[Role::Admin, Role::SuperAdmin];
const SUPER_ADMIN_ONLY: &[Role] = &[Role::SuperAdmin];

impl Operation {
    /// Roles that are allowed to run this operation.
    pub fn permitted_roles(&self) -> &'static [Role] {
        match self {
            Operation::Deposit
            | Operation::Withdraw
            | Operation::TransferShares
            | Operation::Sweep
            | Operation::Harvest => EVERYONE,
            Operation::UpdateHarvestLogCadence => STRATEGIST_AND_UP,
            Operation::Pause | Operation::Panic => GUARDIAN_AND_UP,
            Operation::Unpause
            | Operation::UpdateTvlCap
            | Operation::UpdateSweepThreshold
            | Operation::CollectFees => ADMIN_AND_UP,
            Operation::UpdateSecurityFee
            | Operation::UpdateDepositFee
            | Operation::UpdatePerformanceFee
            | Operation::GrantRole
            | Operation::RevokeRole
            | Operation::ReplaceStrategy => SUPER_ADMIN_ONLY,
        }
    }
}

/// Maps actors to their roles.
/// Actors that are not present in the map are `Unassigned`.
#[derive(Clone, Debug)]
pub struct AccessRegistry {
    super_admin: Address,
    roles: HashMap<Address, Role>,
}

impl AccessRegistry {
    /// Creates a registry with a single super admin.
    pub fn new(super_admin: Address) -> Self {
        let mut roles = HashMap::new();
        roles.insert(super_admin, Role::SuperAdmin);
        Self { super_admin, roles }
    }

    /// Creates a registry from the multisig role triple and a strategist list.
    /// An address may only appear once across all lists.
    pub fn with_roles(
        super_admin: Address,
        admins: &[Address],
        guardians: &[Address],
        strategists: &[Address],
    ) -> VaultResult<Self> {
        let mut registry = Self::new(super_admin);
        let assignments = admins
            .iter()
            .map(|actor| (actor, Role::Admin))
            .chain(guardians.iter().map(|actor| (actor, Role::Guardian)))
            .chain(strategists.iter().map(|actor| (actor, Role::Strategist)));

        for (actor, role) in assignments {
            if registry.roles.contains_key(actor) {
                return Err(invalid_config(format!(
                    "{} is assigned more than one role.",
                    actor
                )));
            }
            registry.roles.insert(*actor, role);
        }

        Ok(registry)
    }

    /// Returns the role of the actor.
    pub fn role_of(&self, actor: &Address) -> Role {
        self.roles.get(actor).copied().unwrap_or(Role::Unassigned)
    }

    pub fn super_admin(&self) -> Address {
        self.super_admin
    }

    /// Returns `true` if the actor may run the operation.
    pub fn authorize(&self, actor: &Address, operation: Operation) -> bool {
        operation.permitted_roles().contains(&self.role_of(actor))
    }

    /// Returns `Err(VaultError::Unauthorized)` if the actor may not run the operation.
    pub fn require(&self, actor: &Address, operation: Operation) -> VaultResult<()> {
        if !self.authorize(actor, operation) {
            return Err(VaultError::Unauthorized);
        }
        Ok(())
    }

    /// Assigns `role` to `actor`, replacing any previous role.
    /// Only the super admin may do this, and the super admin role itself is never handed out.
    pub fn grant(&mut self, caller: &Address, actor: Address, role: Role) -> VaultResult<()> {
        self.require(caller, Operation::GrantRole)?;
        if matches!(role, Role::SuperAdmin | Role::Unassigned) || actor == self.super_admin {
            return Err(VaultError::InvalidRole);
        }
        self.roles.insert(actor, role);
        Ok(())
    }

    /// Removes any role held by `actor`.
    pub fn revoke(&mut self, caller: &Address, actor: &Address) -> VaultResult<Role> {
        self.require(caller, Operation::RevokeRole)?;
        if *actor == self.super_admin {
            return Err(VaultError::InvalidRole);
        }
        Ok(self.roles.remove(actor).unwrap_or(Role::Unassigned))
    }
}
