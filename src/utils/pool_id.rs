//! Uniswap V4 pool ID computation.

use alloy::primitives::{keccak256, Address, B256};
use alloy::sol_types::SolValue;

/// Compute the Uniswap V4 pool ID from pool key parameters:
///
/// ```text
/// keccak256(abi.encode(currency0, currency1, fee, tickSpacing, hooks))
/// ```
///
/// Currencies are sorted by address (lower address first), matching the
/// manager's `sortsBefore` logic, so callers may pass them in either order.
pub fn compute_v4_pool_id(
    currency_a: Address,
    currency_b: Address,
    fee: u32,
    tick_spacing: i32,
    hooks: Address,
) -> B256 {
    let (currency0, currency1) = if currency_a < currency_b {
        (currency_a, currency_b)
    } else {
        (currency_b, currency_a)
    };

    // ABI encode as (address, address, uint24, int24, address)
    let encoded = (currency0, currency1, fee, tick_spacing, hooks).abi_encode();

    keccak256(&encoded)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(s: &str) -> Address {
        s.parse().unwrap()
    }

    #[test]
    fn test_pool_id_sorting() {
        // Same inputs in different order should produce the same pool ID
        let usdc = addr("0xa0b86991c6218b36c1d19d4a2e9eb0ce3606eb48");
        let id1 = compute_v4_pool_id(Address::ZERO, usdc, 3000, 60, Address::ZERO);
        let id2 = compute_v4_pool_id(usdc, Address::ZERO, 3000, 60, Address::ZERO);
        assert_eq!(id1, id2);
    }

    #[test]
    fn test_different_hooks_produce_different_ids() {
        let usdc = addr("0xa0b86991c6218b36c1d19d4a2e9eb0ce3606eb48");
        let hook = addr("0x1234567890abcdef1234567890abcdef12345678");
        let id_no_hooks = compute_v4_pool_id(Address::ZERO, usdc, 3000, 60, Address::ZERO);
        let id_with_hooks = compute_v4_pool_id(Address::ZERO, usdc, 3000, 60, hook);
        assert_ne!(id_no_hooks, id_with_hooks);
    }
}
