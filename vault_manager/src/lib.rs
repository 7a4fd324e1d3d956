pub mod access;
pub mod asset;
pub mod clock;
pub mod config;
pub mod constants;
pub mod harvest;
pub mod journal;
pub mod ledger;
pub mod lifecycle;
pub mod lock;
pub mod strategy;
pub mod utils;
pub mod vault;

pub use access::{AccessRegistry, Operation, Role};
pub use asset::{AssetLedger, Token, TokenAccount};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::VaultConfig;
pub use lifecycle::LifecycleStatus;
pub use strategy::{HoldStrategy, Strategy};
pub use utils::error::{VaultError, VaultResult};
pub use vault::{HarvestOutcome, Vault, VaultSnapshot};
