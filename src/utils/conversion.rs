//! Type conversion and formatting utilities.
//!
//! Fixed-point values stay in U256 through all derived-metric arithmetic;
//! conversion to f64 happens only at the edges (percentage fields, logs),
//! routed through BigDecimal to avoid precision loss above 2^53.

use alloy::primitives::{hex, U256};
use bigdecimal::BigDecimal;
use num_bigint::BigInt;
use num_traits::ToPrimitive;
use once_cell::sync::Lazy;

/// Encode bytes as a lowercase hex string with 0x prefix.
pub fn hex_encode(bytes: &[u8]) -> String {
    format!("0x{}", hex::encode(bytes))
}

/// Convert U256 to f64 with decimal adjustment using BigDecimal.
///
/// Returns 0.0 if the value does not fit a finite f64.
pub fn u256_to_f64(value: U256, decimals: u8) -> f64 {
    let bytes: [u8; 32] = value.to_le_bytes();
    let big_int = BigInt::from_bytes_le(num_bigint::Sign::Plus, &bytes);
    let big_value = BigDecimal::from(big_int);

    let adjusted = big_value / big_pow10(decimals);

    match adjusted.to_f64() {
        Some(v) if v.is_finite() => v,
        _ => 0.0,
    }
}

static POW10_CACHE: Lazy<[BigDecimal; 25]> =
    Lazy::new(|| std::array::from_fn(|i| BigDecimal::from(BigInt::from(10u32).pow(i as u32))));

/// Compute 10^exp as BigDecimal.
fn big_pow10(exp: u8) -> BigDecimal {
    if (exp as usize) < POW10_CACHE.len() {
        POW10_CACHE[exp as usize].clone()
    } else {
        BigDecimal::from(BigInt::from(10u32).pow(exp as u32))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_u256_to_f64_wad() {
        let one_and_a_half = U256::from(1_500_000_000_000_000_000u128);
        assert_eq!(u256_to_f64(one_and_a_half, 18), 1.5);
    }

    #[test]
    fn test_u256_to_f64_large_value_no_precision_cliff() {
        // 10^30 with 18 decimals = 10^12, exactly representable
        let v = U256::from(10u8).pow(U256::from(30u8));
        assert_eq!(u256_to_f64(v, 18), 1e12);
    }
}
