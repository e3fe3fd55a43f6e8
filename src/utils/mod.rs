//! Shared utilities for the tidepool indexer core.
//!
//! - [`conversion`] - U256/f64 conversions and hex encoding
//! - [`pool_id`] - Uniswap V4 pool ID computation

mod conversion;
mod pool_id;

pub use conversion::{hex_encode, u256_to_f64};
pub use pool_id::compute_v4_pool_id;
