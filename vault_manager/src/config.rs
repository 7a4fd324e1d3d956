//! Vault configuration

use alloy_primitives::{Address, U256};
use serde::{Deserialize, Serialize};

use crate::{
    constants::{
        default_harvest_log_cadence, DEFAULT_CALLER_FEE_BPS, DEFAULT_HARVEST_LOG_CAPACITY,
        DEFAULT_JOURNAL_CAPACITY, DEFAULT_PERFORMANCE_FEE_BPS, DEFAULT_SECURITY_FEE_BPS,
        PERCENT_DIVISOR,
    },
    utils::error::{invalid_config, VaultResult},
};

/// Settings a vault is constructed with.
/// Fees are denominated in basis points and durations in seconds.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct VaultConfig {
    /// Fee taken from every deposit
    pub deposit_fee_bps: u16,
    /// Fee taken from every withdrawal
    pub security_fee_bps: u16,
    /// Fee taken from every harvested yield
    pub performance_fee_bps: u16,
    /// Portion of the performance fee paid to the harvest caller
    pub caller_fee_bps: u16,
    /// Upper bound on the vault balance. `None` is unbounded.
    pub tvl_cap: Option<U256>,
    pub harvest_log_cadence: u64,
    pub harvest_log_capacity: usize,
    /// Idle reserve that sweeps leave in the vault
    pub sweep_threshold: U256,
    pub journal_capacity: usize,
    /// Recipient of collected fees
    pub treasury: Address,
}

impl Default for VaultConfig {
    fn default() -> Self {
        Self {
            deposit_fee_bps: 0,
            security_fee_bps: DEFAULT_SECURITY_FEE_BPS,
            performance_fee_bps: DEFAULT_PERFORMANCE_FEE_BPS,
            caller_fee_bps: DEFAULT_CALLER_FEE_BPS,
            tvl_cap: None,
            harvest_log_cadence: default_harvest_log_cadence(),
            harvest_log_capacity: DEFAULT_HARVEST_LOG_CAPACITY,
            sweep_threshold: U256::ZERO,
            journal_capacity: DEFAULT_JOURNAL_CAPACITY,
            treasury: Address::ZERO,
        }
    }
}

impl VaultConfig {
    /// Parses a JSON document. Missing fields keep their defaults.
    pub fn from_json(json: &str) -> VaultResult<Self> {
        let config: Self = serde_json::from_str(json)
            .map_err(|err| invalid_config(format!("Could not parse config: {}", err)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> VaultResult<()> {
        check_fee("deposit_fee_bps", self.deposit_fee_bps)?;
        check_fee("security_fee_bps", self.security_fee_bps)?;
        check_fee("performance_fee_bps", self.performance_fee_bps)?;
        if self.caller_fee_bps > PERCENT_DIVISOR {
            return Err(invalid_config(format!(
                "caller_fee_bps must not exceed {}.",
                PERCENT_DIVISOR
            )));
        }
        if self.harvest_log_capacity == 0 {
            return Err(invalid_config("harvest_log_capacity must be greater than zero."));
        }
        if self.journal_capacity == 0 {
            return Err(invalid_config("journal_capacity must be greater than zero."));
        }
        Ok(())
    }

    pub fn deposit_fee_bps(&mut self, bps: u16) -> &mut Self {
        self.deposit_fee_bps = bps;
        self
    }

    pub fn security_fee_bps(&mut self, bps: u16) -> &mut Self {
        self.security_fee_bps = bps;
        self
    }

    pub fn performance_fee_bps(&mut self, bps: u16) -> &mut Self {
        self.performance_fee_bps = bps;
        self
    }

    pub fn caller_fee_bps(&mut self, bps: u16) -> &mut Self {
        self.caller_fee_bps = bps;
        self
    }

    pub fn tvl_cap(&mut self, cap: Option<U256>) -> &mut Self {
        self.tvl_cap = cap;
        self
    }

    pub fn harvest_log_cadence(&mut self, seconds: u64) -> &mut Self {
        self.harvest_log_cadence = seconds;
        self
    }

    pub fn harvest_log_capacity(&mut self, capacity: usize) -> &mut Self {
        self.harvest_log_capacity = capacity;
        self
    }

    pub fn sweep_threshold(&mut self, threshold: U256) -> &mut Self {
        self.sweep_threshold = threshold;
        self
    }

    pub fn journal_capacity(&mut self, capacity: usize) -> &mut Self {
        self.journal_capacity = capacity;
        self
    }

    pub fn treasury(&mut self, treasury: Address) -> &mut Self {
        self.treasury = treasury;
        self
    }
}

/// Fees must stay strictly below 100%.
pub(crate) fn check_fee(name: &str, bps: u16) -> VaultResult<()> {
    if bps >= PERCENT_DIVISOR {
        return Err(invalid_config(format!(
            "{} must be lower than {}.",
            name, PERCENT_DIVISOR
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::error::VaultError;

    #[test]
    fn defaults_are_valid() {
        let config = VaultConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.security_fee_bps, 10);
        assert_eq!(config.harvest_log_cadence, 3_600);
        assert_eq!(config.tvl_cap, None);
    }

    #[test]
    fn builder_chains() {
        let mut config = VaultConfig::default();
        config
            .deposit_fee_bps(25)
            .tvl_cap(Some(U256::from(1_000u64)))
            .harvest_log_capacity(4)
            .treasury(Address::repeat_byte(0x77));

        assert_eq!(config.deposit_fee_bps, 25);
        assert_eq!(config.tvl_cap, Some(U256::from(1_000u64)));
        assert_eq!(config.harvest_log_capacity, 4);
        assert_eq!(config.treasury, Address::repeat_byte(0x77));
    }

    #[test]
    fn full_fees_are_rejected() {
        let mut config = VaultConfig::default();
        config.security_fee_bps(10_000);
        assert!(matches!(config.validate(), Err(VaultError::InvalidConfig(_))));

        let mut config = VaultConfig::default();
        config.caller_fee_bps(10_000);
        assert!(config.validate().is_ok());
        config.caller_fee_bps(10_001);
        assert!(matches!(config.validate(), Err(VaultError::InvalidConfig(_))));
    }

    #[test]
    fn zero_capacities_are_rejected() {
        let mut config = VaultConfig::default();
        config.harvest_log_capacity(0);
        assert!(config.validate().is_err());

        let mut config = VaultConfig::default();
        config.journal_capacity(0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn json_fills_missing_fields_with_defaults() {
        let config = VaultConfig::from_json(
            r#"{ "deposit_fee_bps": 50, "harvest_log_cadence": 60, "tvl_cap": "0x3e8" }"#,
        )
        .unwrap();

        assert_eq!(config.deposit_fee_bps, 50);
        assert_eq!(config.harvest_log_cadence, 60);
        assert_eq!(config.tvl_cap, Some(U256::from(1_000u64)));
        assert_eq!(config.performance_fee_bps, DEFAULT_PERFORMANCE_FEE_BPS);
    }

    #[test]
    fn invalid_json_is_a_config_error() {
        assert!(matches!(
            VaultConfig::from_json("{ \"deposit_fee_bps\": \"a lot\" }"),
            Err(VaultError::InvalidConfig(_))
        ));
        assert!(matches!(
            VaultConfig::from_json("{ \"deposit_fee_bps\": 10000 }"),
            Err(VaultError::InvalidConfig(_))
        ));
    }
}
