use candid::CandidType;
use serde::Deserialize;
use thiserror::Error;

/// Vault Result
pub type VaultResult<T> = Result<T, VaultError>;

/// Vault Errors
///
/// Every variant aborts the operation that produced it without mutating the vault.
#[derive(Clone, CandidType, Debug, Deserialize, Error, PartialEq)]
pub enum VaultError {
    /// The caller's role is not permitted to perform the operation
    #[error("Unauthorized access")]
    Unauthorized,
    /// The holder owns fewer shares than requested
    #[error("Insufficient shares")]
    InsufficientShares,
    /// The requested amount exceeds what is available
    #[error("Insufficient balance")]
    InsufficientBalance,
    /// The deposit would push the vault over its TVL cap
    #[error("Deposit would exceed the vault's TVL cap")]
    CapExceeded,
    /// The strategy is not in the `Active` state
    #[error("Strategy is not active")]
    NotActive,
    /// The strategy is already `Active`
    #[error("Strategy is already active")]
    AlreadyActive,
    /// The minimum time between two harvests has not passed yet
    #[error("Harvest cadence has not elapsed")]
    CadenceNotElapsed,
    /// A nested call was made while another operation was in progress
    #[error("Reentrant call")]
    Reentrant,
    /// Amount must be greater than zero
    #[error("Amount must be greater than zero")]
    ZeroAmount,
    /// The operation would mint or burn zero shares
    #[error("Operation results in zero shares")]
    ZeroShares,
    /// The role can not be granted or revoked this way
    #[error("Invalid role assignment")]
    InvalidRole,
    /// Rejected configuration value
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
    /// The active strategy still manages capital
    #[error("Strategy still holds capital")]
    StrategyNotRetired,
    /// A harvest was recorded with a timestamp older than the previous one
    #[error("Harvest timestamp is older than the last recorded harvest")]
    NonMonotonicTimestamp,
    /// Failure reported by the strategy adapter
    #[error("Strategy error: {0}")]
    Strategy(String),
    /// Failure reported by the asset ledger
    #[error("Asset error: {0}")]
    Asset(String),
    /// Arithmetic error
    #[error("Arithmetic error: {0}")]
    Arithmetic(String),
}

pub fn arithmetic_err<S: AsRef<str>>(s: S) -> VaultError {
    VaultError::Arithmetic(s.as_ref().to_string())
}

pub fn invalid_config<S: AsRef<str>>(s: S) -> VaultError {
    VaultError::InvalidConfig(s.as_ref().to_string())
}
