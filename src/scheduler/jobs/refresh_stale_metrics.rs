//! Job to refresh USD-derived metrics on recently-active pools.
//!
//! Re-resolves the reference price, re-reads token supply, and recomputes
//! market cap, dollar liquidity and the 24h change from the stored pool
//! price. Pools without a swap inside the activity window are skipped; their
//! figures will be refreshed by the next swap that touches them.

use alloy::primitives::Address;
use anyhow::{Context, Result};
use log::{info, warn};

use crate::error::OracleError;
use crate::math;
use crate::oracle;
use crate::reader::ChainReader;
use crate::registry;
use crate::store::models::{PoolUpdate, TokenUpdate};
use crate::store::Store;
use crate::timeseries;

/// Refresh all pools active inside the window. Returns how many were
/// refreshed.
pub async fn run(
    store: &dyn Store,
    reader: &dyn ChainReader,
    chain_id: u64,
    active_window_secs: u64,
    now: u64,
) -> Result<usize> {
    let start = std::time::Instant::now();

    let since = now.saturating_sub(active_window_secs);
    let active = store.active_pools_since(chain_id, since).await?;

    if active.is_empty() {
        return Ok(0);
    }

    // One reference price for the whole sweep; a gap means nothing can be
    // recomputed this round.
    let eth_price = match oracle::resolve_eth_price(store, now).await {
        Ok(price) => price,
        Err(OracleError::Gap { .. }) => {
            warn!("Skipping stale-metrics refresh: no reference price available");
            return Ok(0);
        },
        Err(OracleError::Store(e)) => return Err(e),
    };

    let mut refreshed = 0;
    for marker in &active {
        match refresh_pool(store, reader, chain_id, &marker.pool_address, eth_price, now).await {
            Ok(()) => refreshed += 1,
            Err(e) => {
                warn!("Failed to refresh pool {}: {:#}", marker.pool_address, e);
            },
        }
    }

    info!(
        "Refreshed metrics for {}/{} active pools in {:?}",
        refreshed,
        active.len(),
        start.elapsed()
    );
    Ok(refreshed)
}

async fn refresh_pool(
    store: &dyn Store,
    reader: &dyn ChainReader,
    chain_id: u64,
    pool_address: &str,
    eth_price: alloy::primitives::U256,
    now: u64,
) -> Result<()> {
    let pool = store
        .find_pool(chain_id, pool_address)
        .await?
        .with_context(|| format!("active marker for unknown pool {pool_address}"))?;

    let asset: Address = pool.asset.parse().context("invalid asset address")?;
    let total_supply = reader.total_supply(asset).await?;

    let market_cap_usd = math::market_cap(pool.price, eth_price, total_supply);
    let dollar_liquidity =
        math::dollar_liquidity(pool.asset_reserve, pool.quote_reserve, pool.price, eth_price);
    let percent_day_change =
        timeseries::compute_24h_price_change(store, chain_id, pool_address, now, market_cap_usd)
            .await?;

    registry::update_pool(
        store,
        chain_id,
        pool_address,
        &PoolUpdate {
            dollar_liquidity: Some(dollar_liquidity),
            market_cap_usd: Some(market_cap_usd),
            percent_day_change: Some(percent_day_change),
            last_refreshed: Some(now),
            ..Default::default()
        },
    )
    .await?;

    registry::update_token(
        store,
        chain_id,
        &pool.asset,
        &TokenUpdate {
            total_supply: Some(total_supply),
            liquidity_usd: Some(dollar_liquidity),
            market_cap_usd: Some(market_cap_usd),
            percent_day_change: Some(percent_day_change),
            last_seen_at: None,
        },
    )
    .await?;

    Ok(())
}
