//! Reference-price (ETH/USD) resolution.
//!
//! The external feed collector writes one row per 5-minute bucket, but the
//! feed can lag or skip buckets, so resolution walks backwards bucket by
//! bucket until it finds a price. The walk is bounded to 24 hours: a price
//! staler than that is worse than no price, and an unbounded walk over an
//! empty feed table would issue one query per bucket back to the epoch.

use alloy::primitives::U256;
use log::debug;

use crate::error::OracleError;
use crate::store::Store;

/// Feed bucket interval in seconds.
pub const PRICE_BUCKET_SECS: u64 = 300;

/// How many buckets backwards to search before giving up (24 hours).
const MAX_LOOKBACK_STEPS: u64 = 86_400 / PRICE_BUCKET_SECS;

/// Floor a timestamp to its feed bucket.
pub fn price_bucket(timestamp: u64) -> u64 {
    timestamp - (timestamp % PRICE_BUCKET_SECS)
}

/// ETH/USD price (feed scale, 8 decimals) in effect at `timestamp`.
///
/// Tries the exact bucket first, then older buckets one interval at a time.
/// Fails with [`OracleError::Gap`] when no price exists within the lookback
/// window; callers degrade to price-only updates rather than writing USD
/// figures derived from a stale or missing reference.
pub async fn resolve_eth_price(
    store: &dyn Store,
    timestamp: u64,
) -> Result<U256, OracleError> {
    let start = price_bucket(timestamp);
    let mut bucket = start;

    for step in 0..=MAX_LOOKBACK_STEPS {
        if let Some(price) = store.find_eth_price(bucket).await? {
            if step > 0 {
                debug!(
                    "Reference price for bucket {} filled from bucket {} ({} steps back)",
                    start, bucket, step
                );
            }
            return Ok(price);
        }

        match bucket.checked_sub(PRICE_BUCKET_SECS) {
            Some(prev) => bucket = prev,
            None => break,
        }
    }

    Err(OracleError::Gap {
        bucket: start,
        window_secs: MAX_LOOKBACK_STEPS * PRICE_BUCKET_SECS,
    })
}
