//! Vault Manager's Constants

use alloy_primitives::U256;
use chrono::Duration;

/// Scale used for fixed point arithmetic
pub const SCALE: u128 = 1_000_000_000_000_000_000; // e18
pub fn scale() -> U256 {
    U256::from(SCALE)
}

/// Basis point denominator
pub const PERCENT_DIVISOR: u16 = 10_000;
pub fn percent_divisor() -> U256 {
    U256::from(PERCENT_DIVISOR)
}

/// Seconds in a (365 day) year, used to annualize harvest yields
pub fn seconds_per_year() -> U256 {
    U256::from(Duration::days(365).num_seconds() as u64)
}

/// Withdrawal (security) fee charged by default: 0.1%
pub const DEFAULT_SECURITY_FEE_BPS: u16 = 10;

/// Performance fee taken from every harvest by default: 4.5%
pub const DEFAULT_PERFORMANCE_FEE_BPS: u16 = 450;

/// Portion of the performance fee paid to the harvest caller by default: 10% of the fee
pub const DEFAULT_CALLER_FEE_BPS: u16 = 1_000;

/// Minimum time between two harvests by default, denominated in seconds
pub fn default_harvest_log_cadence() -> u64 {
    Duration::hours(1).num_seconds() as u64
}

/// Number of harvests kept in the harvest log
pub const DEFAULT_HARVEST_LOG_CAPACITY: usize = 32;

/// Number of journal entries kept before the oldest ones are dropped
pub const DEFAULT_JOURNAL_CAPACITY: usize = 300;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scale_is_e18() {
        assert_eq!(SCALE, 10_u128.pow(18));
    }

    #[test]
    fn year_is_365_days() {
        assert_eq!(seconds_per_year(), U256::from(31_536_000u64));
    }

    #[test]
    fn default_cadence_is_one_hour() {
        assert_eq!(default_harvest_log_cadence(), 3_600);
    }
}
