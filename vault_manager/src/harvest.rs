//! Harvest log
//!
//! Keeps the last `capacity` harvests in a fixed ring buffer and derives the
//! trailing APR from them. It also owns the harvest cadence: the minimum time
//! that has to pass between two harvests.

use std::borrow::Cow;

use alloy_primitives::U256;
use ic_stable_structures::{storable::Bound, Storable};

use crate::{
    constants::{percent_divisor, seconds_per_year},
    utils::{
        common::mul_div,
        error::{arithmetic_err, invalid_config, VaultError, VaultResult},
    },
};

/// Outcome of a single harvest
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct HarvestRecord {
    /// Time of the harvest, denominated in seconds.
    pub timestamp: u64,
    /// Yield credited to the share holders, net of fees.
    pub yield_amount: U256,
    /// Fee paid to the account that triggered the harvest.
    pub caller_fee_amount: U256,
    /// Vault balance right before the harvest.
    pub vault_balance: U256,
    /// Seconds since the previous harvest (or since the vault was created).
    pub interval: u64,
}

impl HarvestRecord {
    /// Annualized rate of this harvest, in basis points.
    /// Harvests with no balance or no elapsed time yield a rate of zero.
    pub fn apr_bps(&self) -> VaultResult<U256> {
        if self.vault_balance.is_zero() || self.interval == 0 {
            return Ok(U256::ZERO);
        }
        let annual_yield = mul_div(
            self.yield_amount,
            seconds_per_year(),
            U256::from(self.interval),
        )?;
        mul_div(annual_yield, percent_divisor(), self.vault_balance)
    }
}

const RECORD_SIZE: u32 = 8 + 32 * 3 + 8;

/// Fixed width encoding: timestamp | yield | caller fee | vault balance | interval
impl Storable for HarvestRecord {
    fn to_bytes(&self) -> Cow<[u8]> {
        let mut bytes = Vec::with_capacity(RECORD_SIZE as usize);
        bytes.extend_from_slice(&self.timestamp.to_be_bytes());
        bytes.extend_from_slice(&self.yield_amount.to_be_bytes::<32>());
        bytes.extend_from_slice(&self.caller_fee_amount.to_be_bytes::<32>());
        bytes.extend_from_slice(&self.vault_balance.to_be_bytes::<32>());
        bytes.extend_from_slice(&self.interval.to_be_bytes());
        Cow::Owned(bytes)
    }

    fn from_bytes(bytes: Cow<[u8]>) -> Self {
        let u64_at = |offset: usize| {
            let mut word = [0u8; 8];
            word.copy_from_slice(&bytes[offset..offset + 8]);
            u64::from_be_bytes(word)
        };
        let u256_at = |offset: usize| {
            let mut word = [0u8; 32];
            word.copy_from_slice(&bytes[offset..offset + 32]);
            U256::from_be_bytes(word)
        };

        Self {
            timestamp: u64_at(0),
            yield_amount: u256_at(8),
            caller_fee_amount: u256_at(40),
            vault_balance: u256_at(72),
            interval: u64_at(104),
        }
    }

    const BOUND: Bound = Bound::Bounded {
        max_size: RECORD_SIZE,
        is_fixed_size: true,
    };
}

/// Ring buffer of the most recent harvests
#[derive(Clone, Debug, PartialEq)]
pub struct HarvestTracker {
    records: Vec<HarvestRecord>,
    capacity: usize,
    /// Index of the oldest record once the buffer is full
    head: usize,
    /// Timestamp of the last harvest, or of the vault creation before the first harvest
    last_harvest: u64,
    /// Minimum number of seconds between two harvests
    cadence: u64,
}

impl HarvestTracker {
    pub fn new(capacity: usize, cadence: u64, created_at: u64) -> VaultResult<Self> {
        if capacity == 0 {
            return Err(invalid_config("Harvest log capacity must be greater than zero."));
        }
        Ok(Self {
            records: Vec::with_capacity(capacity),
            capacity,
            head: 0,
            last_harvest: created_at,
            cadence,
        })
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn cadence(&self) -> u64 {
        self.cadence
    }

    pub fn last_harvest(&self) -> u64 {
        self.last_harvest
    }

    pub fn set_cadence(&mut self, cadence: u64) {
        self.cadence = cadence;
    }

    /// Returns `Err(VaultError::CadenceNotElapsed)` if the last harvest is too recent.
    pub fn check_cadence(&self, now: u64) -> VaultResult<()> {
        if now < self.last_harvest {
            return Err(VaultError::NonMonotonicTimestamp);
        }
        if now - self.last_harvest < self.cadence {
            return Err(VaultError::CadenceNotElapsed);
        }
        Ok(())
    }

    /// Seconds since the last harvest.
    pub fn interval_until(&self, now: u64) -> VaultResult<u64> {
        now.checked_sub(self.last_harvest)
            .ok_or(VaultError::NonMonotonicTimestamp)
    }

    /// Appends a record, evicting the oldest one when the buffer is full.
    pub fn record_harvest(&mut self, record: HarvestRecord) -> VaultResult<()> {
        if record.timestamp < self.last_harvest {
            return Err(VaultError::NonMonotonicTimestamp);
        }
        self.last_harvest = record.timestamp;

        if self.records.len() < self.capacity {
            self.records.push(record);
        } else {
            self.records[self.head] = record;
            self.head = (self.head + 1) % self.capacity;
        }
        Ok(())
    }

    /// Records from oldest to newest.
    pub fn records(&self) -> Vec<HarvestRecord> {
        let (newer, older) = self.records.split_at(self.head);
        older.iter().chain(newer.iter()).cloned().collect()
    }

    /// Most recent record, if any.
    pub fn latest(&self) -> Option<&HarvestRecord> {
        if self.records.is_empty() {
            return None;
        }
        let index = (self.head + self.records.len() - 1) % self.records.len();
        self.records.get(index)
    }

    /// Arithmetic mean of the annualized rates of the last `min(n, len)` harvests,
    /// in basis points. Zero if nothing was recorded yet.
    pub fn average_apr(&self, n: usize) -> VaultResult<U256> {
        let records = self.records();
        let count = n.min(records.len());
        if count == 0 {
            return Ok(U256::ZERO);
        }

        let mut sum = U256::ZERO;
        for record in &records[records.len() - count..] {
            sum = sum
                .checked_add(record.apr_bps()?)
                .ok_or_else(|| arithmetic_err("APR sum overflowed."))?;
        }
        Ok(sum / U256::from(count))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(
        timestamp: u64,
        yield_amount: u64,
        vault_balance: u64,
        interval: u64,
    ) -> HarvestRecord {
        HarvestRecord {
            timestamp,
            yield_amount: U256::from(yield_amount),
            caller_fee_amount: U256::ZERO,
            vault_balance: U256::from(vault_balance),
            interval,
        }
    }

    #[test]
    fn zero_capacity_is_rejected() {
        assert!(matches!(
            HarvestTracker::new(0, 60, 0),
            Err(VaultError::InvalidConfig(_))
        ));
    }

    #[test]
    fn average_apr_of_nothing_is_zero() {
        let tracker = HarvestTracker::new(4, 60, 0).unwrap();
        assert_eq!(tracker.average_apr(5).unwrap(), U256::ZERO);
    }

    #[test]
    fn apr_is_annualized_in_basis_points() {
        // 1% over one day is 365% a year
        let record = record(86_400, 10, 1_000, 86_400);
        assert_eq!(record.apr_bps().unwrap(), U256::from(36_500u64));
    }

    #[test]
    fn empty_balance_contributes_zero() {
        assert_eq!(record(10, 10, 0, 10).apr_bps().unwrap(), U256::ZERO);
        assert_eq!(record(10, 10, 100, 0).apr_bps().unwrap(), U256::ZERO);
    }

    #[test]
    fn ring_buffer_evicts_oldest() {
        let mut tracker = HarvestTracker::new(3, 0, 0).unwrap();
        for timestamp in 1..=5 {
            tracker
                .record_harvest(record(timestamp, timestamp, 100, 1))
                .unwrap();
        }

        let timestamps: Vec<u64> = tracker.records().iter().map(|r| r.timestamp).collect();
        assert_eq!(timestamps, vec![3, 4, 5]);
        assert_eq!(tracker.len(), 3);
        assert_eq!(tracker.latest().map(|r| r.timestamp), Some(5));
    }

    #[test]
    fn average_uses_the_most_recent_records() {
        let mut tracker = HarvestTracker::new(8, 0, 0).unwrap();
        let year = 31_536_000;
        // rates of 100, 200 and 600 bps
        tracker.record_harvest(record(year, 10, 1_000, year)).unwrap();
        tracker.record_harvest(record(2 * year, 20, 1_000, year)).unwrap();
        tracker.record_harvest(record(3 * year, 60, 1_000, year)).unwrap();

        assert_eq!(tracker.average_apr(2).unwrap(), U256::from(400u64));
        assert_eq!(tracker.average_apr(3).unwrap(), U256::from(300u64));
        assert_eq!(tracker.average_apr(10).unwrap(), U256::from(300u64));
    }

    #[test]
    fn cadence_gate() {
        let mut tracker = HarvestTracker::new(4, 1_800, 0).unwrap();
        assert_eq!(tracker.check_cadence(1_799), Err(VaultError::CadenceNotElapsed));
        assert!(tracker.check_cadence(1_800).is_ok());

        tracker.record_harvest(record(3_600, 0, 0, 3_600)).unwrap();
        assert_eq!(tracker.check_cadence(4_000), Err(VaultError::CadenceNotElapsed));
        assert!(tracker.check_cadence(5_400).is_ok());

        tracker.set_cadence(100);
        assert!(tracker.check_cadence(3_700).is_ok());
    }

    #[test]
    fn timestamps_never_decrease() {
        let mut tracker = HarvestTracker::new(4, 0, 100).unwrap();
        assert_eq!(
            tracker.record_harvest(record(99, 0, 0, 0)),
            Err(VaultError::NonMonotonicTimestamp)
        );
        tracker.record_harvest(record(100, 0, 0, 0)).unwrap();
        tracker.record_harvest(record(100, 0, 0, 0)).unwrap();
        assert_eq!(tracker.len(), 2);
    }

    #[test]
    fn storable_encoding_is_fixed_width() {
        let record = HarvestRecord {
            timestamp: 1_700_000_000,
            yield_amount: U256::from(12_345u64),
            caller_fee_amount: U256::from(67u64),
            vault_balance: U256::MAX,
            interval: 3_600,
        };
        let bytes = record.to_bytes();
        assert_eq!(bytes.len(), RECORD_SIZE as usize);
        assert_eq!(HarvestRecord::from_bytes(bytes), record);
    }
}
