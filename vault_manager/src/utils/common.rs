//! Common arithmetic and conversion helpers that are used across the project

use alloy_primitives::U256;
use candid::Nat;
use num_bigint::BigUint;

use super::error::{arithmetic_err, VaultResult};
use crate::constants::percent_divisor;

/// Computes `value * numerator / denominator`, rounding down.
///
/// Returns an arithmetic error if the product overflows or the denominator is zero.
pub fn mul_div(value: U256, numerator: U256, denominator: U256) -> VaultResult<U256> {
    if denominator.is_zero() {
        return Err(arithmetic_err("Division by zero."));
    }
    let product = value
        .checked_mul(numerator)
        .ok_or_else(|| arithmetic_err("Multiplication overflowed."))?;
    Ok(product / denominator)
}

/// Applies a basis point rate to an amount, rounding down.
pub fn apply_bps(amount: U256, bps: u16) -> VaultResult<U256> {
    mul_div(amount, U256::from(bps), percent_divisor())
}

/// Converts values of type `U256` to `Nat`
pub fn u256_to_nat(value: &U256) -> Nat {
    Nat(BigUint::from_bytes_be(&value.to_be_bytes::<32>()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::error::VaultError;
    use proptest::prelude::*;

    #[test]
    fn mul_div_rounds_down() {
        let result = mul_div(U256::from(100), U256::from(1), U256::from(3)).unwrap();
        assert_eq!(result, U256::from(33));
    }

    #[test]
    fn mul_div_rejects_zero_denominator() {
        let result = mul_div(U256::from(100), U256::from(100), U256::ZERO);
        assert!(matches!(result, Err(VaultError::Arithmetic(_))));
    }

    #[test]
    fn mul_div_rejects_overflow() {
        let result = mul_div(U256::MAX, U256::from(2), U256::from(1));
        assert!(matches!(result, Err(VaultError::Arithmetic(_))));
    }

    #[test]
    fn apply_bps_floors_sub_unit_fees() {
        // 0.1% of 999 wei is 0.999 wei, which rounds to zero
        assert_eq!(apply_bps(U256::from(999), 10).unwrap(), U256::ZERO);
        assert_eq!(apply_bps(U256::from(1_000), 10).unwrap(), U256::from(1));
    }

    #[test]
    fn u256_to_nat_keeps_large_values() {
        let value = U256::from(u128::MAX) * U256::from(4u64);
        let nat = u256_to_nat(&value);
        assert_eq!(nat.0.to_string(), value.to_string());
    }

    proptest! {
        #[test]
        fn apply_bps_never_exceeds_amount(amount in any::<u128>(), bps in 0u16..=10_000) {
            let amount = U256::from(amount);
            let fee = apply_bps(amount, bps).unwrap();
            prop_assert!(fee <= amount);
        }
    }
}
