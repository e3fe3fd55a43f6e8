//! Singleton-manager swap adapter.
//!
//! V4 swaps are emitted by the pool manager keyed by pool id, not by a
//! per-pool contract, so the pool row is looked up through its stored key
//! hash. Amounts are signed from the trader's perspective: negative flows
//! into the pool, the opposite of V3.

use alloy::primitives::U256;
use anyhow::Result;
use log::warn;

use crate::abis::v4;
use crate::indexer::handlers::{apply_swap, QuoteFlow, SwapMeta, SwapObservation};
use crate::math;
use crate::reader::ChainReader;
use crate::store::Store;
use crate::utils::hex_encode;

/// Quote-side signed amount to a graduation flow. Negative is an inflow.
fn quote_flow(amount: i128) -> Option<QuoteFlow> {
    match amount {
        0 => None,
        a if a < 0 => Some(QuoteFlow::In(U256::from(a.unsigned_abs()))),
        a => Some(QuoteFlow::Out(U256::from(a.unsigned_abs()))),
    }
}

pub async fn handle_v4_swap(
    store: &dyn Store,
    reader: &dyn ChainReader,
    chain_id: u64,
    event: &v4::Swap,
    tx_hash: &str,
    log_index: u32,
    timestamp: u64,
) -> Result<()> {
    let pool_id = hex_encode(event.id.as_slice());
    let Some(pool) = store.find_pool_by_pool_id(chain_id, &pool_id).await? else {
        warn!("Skipping V4 swap on unknown pool id {}", pool_id);
        return Ok(());
    };

    let token0_in = event.amount0 < 0;
    let amount_in = if token0_in {
        U256::from(event.amount0.unsigned_abs())
    } else {
        U256::from(event.amount1.unsigned_abs())
    };
    let token_in_is_asset = token0_in == pool.is_token0;

    let quote_amount = if pool.is_token0 { event.amount1 } else { event.amount0 };

    let sqrt_price_x96 = U256::from(event.sqrtPriceX96);
    let liquidity = U256::from(event.liquidity);

    // No per-pool contract to read balances from; reserves are the virtual
    // amounts backing the in-range liquidity
    let (reserve0, reserve1) = math::reserves_from_liquidity(liquidity, sqrt_price_x96);
    let (asset_reserve, quote_reserve) =
        if pool.is_token0 { (reserve0, reserve1) } else { (reserve1, reserve0) };

    let obs = SwapObservation {
        price: math::sqrt_price_to_price(sqrt_price_x96, pool.is_token0),
        liquidity: Some(liquidity),
        sqrt_price_x96: Some(sqrt_price_x96),
        tick: Some(event.tick.as_i32()),
        asset_reserve,
        quote_reserve,
        amount_in,
        token_in_is_asset,
        fee_ppm: event.fee.to::<u32>(),
        quote_flow: quote_flow(quote_amount),
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
