//! AMM state to price conversion.
//!
//! Prices are always expressed as quote tokens per asset token, scaled by
//! [`WAD`]. A freshly initialized pool can briefly hold zero reserves on one
//! side, so zero in means zero out, never a division panic.

use alloy::primitives::{U256, U512};

use super::WAD;

/// Price of the asset in quote terms from constant-product reserves:
/// `quote_reserve * WAD / asset_reserve`.
///
/// Returns 0 if either reserve is 0.
pub fn v2_price(asset_reserve: U256, quote_reserve: U256) -> U256 {
    if asset_reserve.is_zero() || quote_reserve.is_zero() {
        return U256::ZERO;
    }

    let scaled = U512::from(quote_reserve) * U512::from(*WAD);
    narrow(scaled / U512::from(asset_reserve))
}

/// Narrow a U512 back to U256, saturating on the (pathological) overflow
/// case instead of panicking mid-pipeline.
fn narrow(value: U512) -> U256 {
    U256::saturating_from(value)
}

/// Price of the asset in quote terms from a Q64.96 square-root price.
///
/// The raw ratio is `(sqrtPriceX96 / 2^96)^2 = token1 per token0`. When the
/// asset is token0 that ratio is the price; when the asset is token1 the
/// ratio must be inverted. Squaring a uint160 needs up to 320 bits, so the
/// whole expression runs in U512.
///
/// Returns 0 for a zero sqrt price (uninitialized pool).
pub fn sqrt_price_to_price(sqrt_price_x96: U256, is_token0: bool) -> U256 {
    if sqrt_price_x96.is_zero() {
        return U256::ZERO;
    }

    let sqrt = U512::from(sqrt_price_x96);
    let ratio_x192 = sqrt * sqrt;
    let q192: U512 = U512::from(1u8) << 192;
    let wad = U512::from(*WAD);

    let price = if is_token0 {
        // token1 per token0, multiplied up before the single division
        (ratio_x192 * wad) / q192
    } else {
        // token0 per token1: invert the ratio
        (q192 * wad) / ratio_x192
    };

    narrow(price)
}

/// Virtual token amounts held by in-range concentrated liquidity:
/// `amount0 = L * 2^96 / sqrtPrice`, `amount1 = L * sqrtPrice / 2^96`.
///
/// Used for V4 singleton pools, where no per-pool contract exists to read
/// balances from. Returns (0, 0) when either input is zero.
pub fn reserves_from_liquidity(liquidity: U256, sqrt_price_x96: U256) -> (U256, U256) {
    if liquidity.is_zero() || sqrt_price_x96.is_zero() {
        return (U256::ZERO, U256::ZERO);
    }

    let l = U512::from(liquidity);
    let sqrt = U512::from(sqrt_price_x96);
    let q96: U512 = U512::from(1u8) << 96;

    let amount0 = (l * q96) / sqrt;
    let amount1 = (l * sqrt) / q96;

    (narrow(amount0), narrow(amount1))
}
