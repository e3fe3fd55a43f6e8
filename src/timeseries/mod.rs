//! Price-history buckets and rolling daily volume.
//!
//! Buckets are keyed by floored timestamps, so replays and out-of-order
//! deliveries land on the same row instead of creating duplicates. Volume is
//! the one accumulator that must never double-count, so it is guarded by a
//! per-log seen marker on top of the keyed upsert.

use alloy::primitives::{U256, U512};
use anyhow::Result;

use crate::math::{ORACLE_SCALE, WAD};
use crate::store::models::PriceBucket;
use crate::store::Store;
use crate::utils::u256_to_f64;

/// Price-history bucket interval in seconds.
pub const HOUR_BUCKET_SECS: u64 = 3_600;

/// Daily-volume bucket interval in seconds.
pub const DAY_SECS: u64 = 86_400;

pub fn hour_bucket(timestamp: u64) -> u64 {
    timestamp - (timestamp % HOUR_BUCKET_SECS)
}

pub fn day_bucket(timestamp: u64) -> u64 {
    timestamp - (timestamp % DAY_SECS)
}

/// USD value of a swap from its inbound side.
///
/// A quote inflow is already denominated in the reference asset; an asset
/// inflow is converted through the pool price first. WAD-scaled result.
pub fn swap_usd_value(
    amount_in: U256,
    token_in_is_asset: bool,
    price: U256,
    eth_price: U256,
) -> U256 {
    let quote_amount = if token_in_is_asset {
        (U512::from(amount_in) * U512::from(price)) / U512::from(*WAD)
    } else {
        U512::from(amount_in)
    };

    let usd = (quote_amount * U512::from(eth_price)) / U512::from(*ORACLE_SCALE);
    U256::saturating_from(usd)
}

/// Write the hourly close for a pool. The latest write within an hour wins.
pub async fn record_price_bucket(
    store: &dyn Store,
    chain_id: u64,
    pool_address: &str,
    timestamp: u64,
    price: U256,
    eth_price: U256,
    market_cap_usd: U256,
) -> Result<()> {
    let close_usd = (U512::from(price) * U512::from(eth_price)) / U512::from(*ORACLE_SCALE);

    store
        .upsert_price_bucket(&PriceBucket {
            chain_id,
            pool_address: pool_address.to_string(),
            bucket_timestamp: hour_bucket(timestamp),
            close_price: price,
            close_usd: U256::saturating_from(close_usd),
            market_cap_usd,
        })
        .await
}

/// Accumulate a swap into the pool's daily volume.
///
/// Returns false when the (tx_hash, log_index) delivery was already counted;
/// the caller treats that as success, not an error.
#[allow(clippy::too_many_arguments)]
pub async fn record_daily_volume(
    store: &dyn Store,
    chain_id: u64,
    pool_address: &str,
    tx_hash: &str,
    log_index: u32,
    timestamp: u64,
    amount_in: U256,
    token_in_is_asset: bool,
    price: U256,
    eth_price: U256,
) -> Result<bool> {
    let delta_usd = swap_usd_value(amount_in, token_in_is_asset, price, eth_price);
    store
        .add_daily_volume(
            chain_id,
            pool_address,
            day_bucket(timestamp),
            delta_usd,
            timestamp,
            tx_hash,
            log_index,
        )
        .await
}

/// Percent change of market cap against the oldest bucket inside the
/// trailing 24 hours. 0.0 when no bucket or no baseline exists, covering
/// pools younger than a day.
pub async fn compute_24h_price_change(
    store: &dyn Store,
    chain_id: u64,
    pool_address: &str,
    now: u64,
    current_market_cap_usd: U256,
) -> Result<f64> {
    let from_ts = now.saturating_sub(DAY_SECS);
    let baseline = match store.find_price_bucket_at_or_after(chain_id, pool_address, from_ts).await? {
        Some(bucket) => bucket.market_cap_usd,
        None => return Ok(0.0),
    };

    if baseline.is_zero() {
        return Ok(0.0);
    }

    let current = u256_to_f64(current_market_cap_usd, 18);
    let old = u256_to_f64(baseline, 18);
    Ok((current - old) / old * 100.0)
}
