//! Version-independent swap settlement.
//!
//! Each version adapter reduces its event to a [`SwapObservation`]; this
//! module derives the USD metrics and fans out the independent writes. An
//! oracle gap degrades the event to a price-only update instead of failing
//! the batch: raw AMM state is still correct without a reference price, only
//! the USD-denominated fields have to wait.

use alloy::primitives::{Address, U256};
use anyhow::{Context, Result};
use log::warn;

use crate::error::OracleError;
use crate::math;
use crate::oracle;
use crate::reader::ChainReader;
use crate::registry;
use crate::scheduler;
use crate::store::models::{Pool, PoolUpdate, TokenUpdate};
use crate::store::Store;
use crate::timeseries;

/// Per-log identity of the swap being settled.
pub(crate) struct SwapMeta<'a> {
    pub tx_hash: &'a str,
    pub log_index: u32,
    pub timestamp: u64,
}

/// Quote-token movement through the pool, for graduation tracking.
pub(crate) enum QuoteFlow {
    In(U256),
    Out(U256),
}

/// Normalized post-swap state, already oriented asset-vs-quote.
pub(crate) struct SwapObservation {
    /// Asset price in quote terms, WAD-scaled.
    pub price: U256,
    pub liquidity: Option<U256>,
    pub sqrt_price_x96: Option<U256>,
    pub tick: Option<i32>,
    pub asset_reserve: U256,
    pub quote_reserve: U256,
    /// Inbound amount, raw units of the inbound token.
    pub amount_in: U256,
    pub token_in_is_asset: bool,
    /// Fee tier charged on this swap, parts per million.
    pub fee_ppm: u32,
    /// Some for bonding-curve pool versions, None for V2.
    pub quote_flow: Option<QuoteFlow>,
}

/// Graduation accumulator and percentage after this swap's quote flow.
/// Needs no reference price, so both settlement paths apply it.
fn graduation_progress(pool: &Pool, obs: &SwapObservation) -> (Option<U256>, Option<f64>) {
    let balance = match &obs.quote_flow {
        Some(QuoteFlow::In(amount)) => pool.graduation_balance.saturating_add(*amount),
        Some(QuoteFlow::Out(amount)) => pool.graduation_balance.saturating_sub(*amount),
        None => return (None, None),
    };

    (
        Some(balance),
        Some(math::graduation_percentage(balance, pool.graduation_threshold)),
    )
}

/// Lifetime fee accumulators after charging this swap's inbound fee.
fn accrued_fees(pool: &Pool, obs: &SwapObservation) -> (Option<U256>, Option<U256>) {
    let fee = math::swap_fee(obs.amount_in, obs.fee_ppm);
    if fee.is_zero() {
        return (None, None);
    }

    // Fees accrue on the inbound token, in pair order
    let token0_in = obs.token_in_is_asset == pool.is_token0;
    if token0_in {
        (Some(pool.total_fee0.saturating_add(fee)), None)
    } else {
        (None, Some(pool.total_fee1.saturating_add(fee)))
    }
}

pub(crate) async fn apply_swap(
    store: &dyn Store,
    reader: &dyn ChainReader,
    chain_id: u64,
    pool: &Pool,
    obs: SwapObservation,
    meta: SwapMeta<'_>,
) -> Result<()> {
    let eth_price = match oracle::resolve_eth_price(store, meta.timestamp).await {
        Ok(price) => price,
        Err(OracleError::Gap { bucket, .. }) => {
            warn!(
                "No reference price near bucket {} for swap on {}; applying price-only update",
                bucket, pool.address
            );
            return apply_degraded(store, chain_id, pool, obs, meta).await;
        },
        Err(OracleError::Store(e)) => return Err(e),
    };

    let asset: Address = pool.asset.parse().context("invalid asset address")?;
    let total_supply = reader.total_supply(asset).await?;

    let market_cap_usd = math::market_cap(obs.price, eth_price, total_supply);
    let dollar_liquidity =
        math::dollar_liquidity(obs.asset_reserve, obs.quote_reserve, obs.price, eth_price);

    // Volume first: the pool's lifetime accumulator must only grow when the
    // deduplicated daily accumulator does.
    let counted = timeseries::record_daily_volume(
        store,
        chain_id,
        &pool.address,
        meta.tx_hash,
        meta.log_index,
        meta.timestamp,
        obs.amount_in,
        obs.token_in_is_asset,
        obs.price,
        eth_price,
    )
    .await?;

    let volume_usd = if counted {
        let delta =
            timeseries::swap_usd_value(obs.amount_in, obs.token_in_is_asset, obs.price, eth_price);
        pool.volume_usd.saturating_add(delta)
    } else {
        pool.volume_usd
    };

    let percent_day_change = timeseries::compute_24h_price_change(
        store,
        chain_id,
        &pool.address,
        meta.timestamp,
        market_cap_usd,
    )
    .await?;

    let (graduation_balance, graduation_percentage) = graduation_progress(pool, &obs);

    let (total_fee0, total_fee1) = accrued_fees(pool, &obs);

    let pool_update = PoolUpdate {
        price: Some(obs.price),
        liquidity: obs.liquidity,
        sqrt_price_x96: obs.sqrt_price_x96,
        tick: obs.tick,
        asset_reserve: Some(obs.asset_reserve),
        quote_reserve: Some(obs.quote_reserve),
        dollar_liquidity: Some(dollar_liquidity),
        market_cap_usd: Some(market_cap_usd),
        volume_usd: Some(volume_usd),
        percent_day_change: Some(percent_day_change),
        graduation_balance,
        graduation_percentage,
        total_fee0,
        total_fee1,
        last_swap_timestamp: Some(meta.timestamp),
        ..Default::default()
    };

    let token_update = TokenUpdate {
        total_supply: Some(total_supply),
        liquidity_usd: Some(dollar_liquidity),
        market_cap_usd: Some(market_cap_usd),
        percent_day_change: Some(percent_day_change),
        last_seen_at: Some(meta.timestamp),
    };

    tokio::try_join!(
        scheduler::mark_active_pool(store, chain_id, &pool.address, meta.timestamp),
        timeseries::record_price_bucket(
            store,
            chain_id,
            &pool.address,
            meta.timestamp,
            obs.price,
            eth_price,
            market_cap_usd,
        ),
        registry::update_pool(store, chain_id, &pool.address, &pool_update),
        registry::update_token(store, chain_id, &pool.asset, &token_update),
    )?;

    Ok(())
}

/// Oracle-gap fallback: persist the raw AMM state and activity marker, skip
/// every USD-denominated figure.
async fn apply_degraded(
    store: &dyn Store,
    chain_id: u64,
    pool: &Pool,
    obs: SwapObservation,
    meta: SwapMeta<'_>,
) -> Result<()> {
    let (graduation_balance, graduation_percentage) = graduation_progress(pool, &obs);
    let (total_fee0, total_fee1) = accrued_fees(pool, &obs);

    let pool_update = PoolUpdate {
        price: Some(obs.price),
        liquidity: obs.liquidity,
        sqrt_price_x96: obs.sqrt_price_x96,
        tick: obs.tick,
        asset_reserve: Some(obs.asset_reserve),
        quote_reserve: Some(obs.quote_reserve),
        graduation_balance,
        graduation_percentage,
        total_fee0,
        total_fee1,
        last_swap_timestamp: Some(meta.timestamp),
        ..Default::default()
    };

    tokio::try_join!(
        scheduler::mark_active_pool(store, chain_id, &pool.address, meta.timestamp),
        registry::update_pool(store, chain_id, &pool.address, &pool_update),
    )?;

    Ok(())
}
