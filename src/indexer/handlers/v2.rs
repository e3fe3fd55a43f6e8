//! Constant-product swap adapter.
//!
//! V2 swap events carry the traded amounts but no post-swap state, so the
//! reserves are re-read from the pair and the price recomputed from their
//! ratio.

use anyhow::{Context, Result};
use log::warn;

use crate::abis::v2;
use crate::indexer::handlers::{apply_swap, SwapMeta, SwapObservation};
use crate::math;
use crate::reader::ChainReader;
use crate::store::Store;

pub async fn handle_v2_swap(
    store: &dyn Store,
    reader: &dyn ChainReader,
    chain_id: u64,
    event: &v2::Swap,
    log_address: &str,
    tx_hash: &str,
    log_index: u32,
    timestamp: u64,
) -> Result<()> {
    let Some(pool) = store.find_pool(chain_id, log_address).await? else {
        warn!("Skipping V2 swap on unknown pool {}", log_address);
        return Ok(());
    };

    let pair = log_address.parse().context("invalid pair address")?;
    let state = reader.v2_pair_state(pair).await?;

    let (asset_reserve, quote_reserve) = if pool.is_token0 {
        (state.reserve0, state.reserve1)
    } else {
        (state.reserve1, state.reserve0)
    };

    // Exactly one In side and one Out side is non-zero
    let token0_in = !event.amount0In.is_zero();
    let amount_in = if token0_in { event.amount0In } else { event.amount1In };
    let token_in_is_asset = token0_in == pool.is_token0;

    let obs = SwapObservation {
        price: math::v2_price(asset_reserve, quote_reserve),
        liquidity: None,
        sqrt_price_x96: None,
        tick: None,
        asset_reserve,
        quote_reserve,
        amount_in,
        token_in_is_asset,
        fee_ppm: pool.fee,
        quote_flow: None,
    };

    apply_swap(
        store,
        reader,
        chain_id,
        &pool,
        obs,
        SwapMeta {
            tx_hash,
            log_index,
            timestamp,
        },
    )
    .await
}
