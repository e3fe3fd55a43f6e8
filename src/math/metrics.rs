//! USD-denominated derived metrics.
//!
//! `eth_price` arguments are reference-feed values scaled by
//! [`ORACLE_SCALE`] (1e8); prices and balances are WAD-scaled. Outputs are
//! WAD-scaled USD figures.

use alloy::primitives::{U256, U512};

use super::{ORACLE_SCALE, WAD};

/// USD value locked in a pool: `(asset*price/WAD + quote) * eth_price / 1e8`.
///
/// Both sides of a balanced pool contribute, which is the standard
/// 2x-quote-side AMM convention once the asset side is converted to quote
/// terms through the pool's own price.
pub fn dollar_liquidity(
    asset_balance: U256,
    quote_balance: U256,
    price: U256,
    eth_price: U256,
) -> U256 {
    let asset_in_quote = (U512::from(asset_balance) * U512::from(price)) / U512::from(*WAD);
    let total_quote = asset_in_quote + U512::from(quote_balance);
    let usd = (total_quote * U512::from(eth_price)) / U512::from(*ORACLE_SCALE);

    U256::saturating_from(usd)
}

/// Market capitalization in USD:
/// `price * total_supply / WAD * eth_price / 1e8`.
///
/// Multiplications stay ahead of divisions within each step; reordering to
/// divide first loses the sub-WAD component of the price.
pub fn market_cap(price: U256, eth_price: U256, total_supply: U256) -> U256 {
    let cap_in_quote = (U512::from(price) * U512::from(total_supply)) / U512::from(*WAD);
    let cap_usd = (cap_in_quote * U512::from(eth_price)) / U512::from(*ORACLE_SCALE);

    U256::saturating_from(cap_usd)
}

/// Protocol fee taken from the inbound amount, `fee_ppm` in parts per
/// million (the tier encoding all three AMM versions share).
pub fn swap_fee(amount_in: U256, fee_ppm: u32) -> U256 {
    let fee = (U512::from(amount_in) * U512::from(fee_ppm)) / U512::from(1_000_000u32);

    U256::saturating_from(fee)
}

/// Bonding-curve graduation progress with two decimal places, uncapped.
///
/// A pool can overshoot 100% before the external migration job reacts, so
/// values above 100.00 are expected and preserved.
pub fn graduation_percentage(balance: U256, threshold: U256) -> f64 {
    if threshold.is_zero() {
        return 0.0;
    }

    let bps = (U512::from(balance) * U512::from(10_000u32)) / U512::from(threshold);
    let bps = u128::try_from(bps).unwrap_or(u128::MAX);

    bps as f64 / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wad(n: u128) -> U256 {
        U256::from(n) * *WAD
    }

    #[test]
    fn test_market_cap_closed_form() {
        // price = 2 (WAD), eth = $3000 (8-decimal feed), supply = 1e24
        let price = wad(2);
        let eth_price = U256::from(3000u64) * *ORACLE_SCALE;
        let total_supply = U256::from(10u8).pow(U256::from(24u8));

        // (2e18 * 1e24 / 1e18) * 3e11 / 1e8 = 6e27, i.e. $6B at WAD scale
        let expected = U256::from(6u8) * U256::from(10u8).pow(U256::from(27u8));
        assert_eq!(market_cap(price, eth_price, total_supply), expected);
    }

    #[test]
    fn test_market_cap_keeps_sub_wad_price_component() {
        // price = 0.5: dividing price by WAD first would floor it to zero
        let price = *WAD / U256::from(2u8);
        let eth_price = U256::from(2000u64) * *ORACLE_SCALE;
        let total_supply = wad(1_000);

        // 0.5 * 1000 * 2000 = $1,000,000
        assert_eq!(market_cap(price, eth_price, total_supply), wad(1_000_000));
    }

    #[test]
    fn test_dollar_liquidity_both_sides() {
        // 100 asset at price 4 + 400 quote = 800 quote, at $2500/quote
        let liq = dollar_liquidity(
            wad(100),
            wad(400),
            wad(4),
            U256::from(2500u64) * *ORACLE_SCALE,
        );
        assert_eq!(liq, wad(2_000_000));
    }

    #[test]
    fn test_dollar_liquidity_zero_price() {
        // Unpriced pool still values the quote side
        let liq = dollar_liquidity(
            wad(100),
            wad(400),
            U256::ZERO,
            U256::from(1000u64) * *ORACLE_SCALE,
        );
        assert_eq!(liq, wad(400_000));
    }

    #[test]
    fn test_swap_fee_ppm() {
        // 0.3% tier on 1000 tokens
        assert_eq!(swap_fee(wad(1_000), 3_000), wad(3));
        assert_eq!(swap_fee(wad(1_000), 0), U256::ZERO);
    }

    #[test]
    fn test_graduation_percentage_zero_threshold() {
        assert_eq!(graduation_percentage(U256::ZERO, U256::from(1000u64)), 0.0);
        assert_eq!(graduation_percentage(U256::from(500u64), U256::ZERO), 0.0);
    }

    #[test]
    fn test_graduation_percentage_two_decimals() {
        assert_eq!(
            graduation_percentage(U256::from(500u64), U256::from(1000u64)),
            50.0
        );
        assert_eq!(
            graduation_percentage(U256::from(333u64), U256::from(1000u64)),
            33.3
        );
        assert_eq!(
            graduation_percentage(U256::from(1u64), U256::from(10_000u64)),
            0.01
        );
    }

    #[test]
    fn test_graduation_percentage_uncapped() {
        assert_eq!(
            graduation_percentage(U256::from(1500u64), U256::from(1000u64)),
            150.0
        );
    }
}
