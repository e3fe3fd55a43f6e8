//! Fixed-point arithmetic for derived pool metrics.
//!
//! All computation stays in the integer domain (U256 with U512
//! intermediates); multiplications always happen before divisions so no
//! precision is thrown away mid-expression.
//!
//! - [`price`] - AMM state to price-ratio conversion
//! - [`metrics`] - USD liquidity, market cap, graduation progress

mod metrics;
mod price;

use alloy::primitives::U256;
use once_cell::sync::Lazy;

/// Fixed-point scale for prices and USD amounts: 1e18.
pub static WAD: Lazy<U256> = Lazy::new(|| U256::from(10u8).pow(U256::from(18u8)));

/// Scale of the external reference-price feed (Chainlink-style, 8 decimals).
pub static ORACLE_SCALE: Lazy<U256> = Lazy::new(|| U256::from(10u8).pow(U256::from(8u8)));

pub use metrics::{dollar_liquidity, graduation_percentage, market_cap, swap_fee};
pub use price::{reserves_from_liquidity, sqrt_price_to_price, v2_price};
