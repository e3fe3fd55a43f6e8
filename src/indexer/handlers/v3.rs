//! Concentrated-liquidity swap adapter.
//!
//! The V3 swap event already carries the post-swap slot0 state, so no state
//! read is needed for the price; reserves come from direct balance reads on
//! the pool contract. Amounts are signed from the pool's perspective:
//! positive flows in.

use alloy::primitives::{Address, I256, U256};
use anyhow::{Context, Result};
use log::warn;

use crate::abis::v3;
use crate::indexer::handlers::{apply_swap, QuoteFlow, SwapMeta, SwapObservation};
use crate::math;
use crate::reader::ChainReader;
use crate::store::Store;

/// Quote-side signed amount to a graduation flow. Positive is an inflow.
fn quote_flow(amount: I256) -> Option<QuoteFlow> {
    if amount.is_zero() {
        None
    } else if amount.is_positive() {
        Some(QuoteFlow::In(amount.unsigned_abs()))
    } else {
        Some(QuoteFlow::Out(amount.unsigned_abs()))
    }
}

#[allow(clippy::too_many_arguments)]
pub async fn handle_v3_swap(
    store: &dyn Store,
    reader: &dyn ChainReader,
    chain_id: u64,
    event: &v3::Swap,
    log_address: &str,
    tx_hash: &str,
    log_index: u32,
    timestamp: u64,
) -> Result<()> {
    let Some(pool) = store.find_pool(chain_id, log_address).await? else {
        warn!("Skipping V3 swap on unknown pool {}", log_address);
        return Ok(());
    };

    let pool_addr: Address = log_address.parse().context("invalid pool address")?;
    let asset: Address = pool.asset.parse().context("invalid asset address")?;
    let numeraire: Address = pool.numeraire.parse().context("invalid numeraire address")?;

    let asset_reserve = reader.balance_of(asset, pool_addr).await?;
    let quote_reserve = reader.balance_of(numeraire, pool_addr).await?;

    let token0_in = event.amount0.is_positive();
    let amount_in = if token0_in {
        event.amount0.unsigned_abs()
    } else {
        event.amount1.unsigned_abs()
    };
    let token_in_is_asset = token0_in == pool.is_token0;

    let quote_amount = if pool.is_token0 { event.amount1 } else { event.amount0 };
    let sqrt_price_x96 = U256::from(event.sqrtPriceX96);

    let obs = SwapObservation {
        price: math::sqrt_price_to_price(sqrt_price_x96, pool.is_token0),
        liquidity: Some(U256::from(event.liquidity)),
        sqrt_price_x96: Some(sqrt_price_x96),
        tick: Some(event.tick.as_i32()),
        asset_reserve,
        quote_reserve,
        amount_in,
        token_in_is_asset,
        fee_ppm: pool.fee,
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

#[cfg(test)]
mod tests {
    use alloy::primitives::aliases::{I24, U160};

    use super::*;
    use crate::abis::factory;
    use crate::indexer::handlers::handle_pool_created;
    use crate::math::{ORACLE_SCALE, WAD};
    use crate::oracle::price_bucket;
    use crate::reader::mock::MockReader;
    use crate::reader::{TokenMetadata, V3PoolState};
    use crate::store::models::{PoolType, PoolUpdate};
    use crate::store::{MemoryStore, Store};
    use crate::utils::hex_encode;

    const CHAIN: u64 = 8453;

    fn wad(n: u64) -> U256 {
        U256::from(n) * *WAD
    }

    fn q96() -> U256 {
        U256::from(1u8) << 96
    }

    fn sq96() -> U160 {
        U160::from(1u8) << 96
    }

    /// Signed amount in WAD units.
    fn i_wad(n: i64) -> I256 {
        I256::try_from(n as i128 * 1_000_000_000_000_000_000i128).unwrap()
    }

    /// asset = token0 in this fixture, so token1 flows are quote flows.
    async fn seed(store: &MemoryStore, reader: &MockReader, now: u64) -> String {
        let asset = Address::repeat_byte(0x0a);
        let numeraire = Address::repeat_byte(0xbb);
        let pool_addr = Address::repeat_byte(0x33);

        reader.set_token(
            asset,
            TokenMetadata {
                name: "Tide".to_string(),
                symbol: "TIDE".to_string(),
                decimals: 18,
                total_supply: wad(1_000),
            },
        );
        reader.set_v3_pool(
            pool_addr,
            V3PoolState {
                token0: asset,
                token1: numeraire,
                fee: 3_000,
                sqrt_price_x96: q96(),
                tick: 0,
                liquidity: wad(9),
            },
        );
        reader.set_balance(asset, pool_addr, wad(500));
        reader.set_balance(numeraire, pool_addr, wad(20));
        store
            .insert_eth_price(price_bucket(now), U256::from(2_000u64) * *ORACLE_SCALE)
            .await
            .unwrap();

        let event = factory::Create {
            poolOrHook: pool_addr,
            asset,
            numeraire,
        };
        handle_pool_created(store, reader, CHAIN, PoolType::V3, &event, now - 100).await.unwrap();

        hex_encode(pool_addr.as_slice())
    }

    fn swap_event(amount0: I256, amount1: I256, sqrt_price_x96: U160) -> v3::Swap {
        v3::Swap {
            sender: Address::repeat_byte(0x01),
            recipient: Address::repeat_byte(0x02),
            amount0,
            amount1,
            sqrtPriceX96: sqrt_price_x96,
            liquidity: 1_000_000u128,
            tick: I24::ZERO,
        }
    }

    #[tokio::test]
    async fn test_quote_inflow_tracks_graduation() {
        let store = MemoryStore::new();
        let reader = MockReader::new();
        let now = 1_700_000_000u64;
        let pool_address = seed(&store, &reader, now).await;

        // External logic configured the bonding-curve threshold
        store
            .update_pool(
                CHAIN,
                &pool_address,
                &PoolUpdate {
                    graduation_threshold: Some(wad(10)),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        // Buy: 5 quote in (token1), asset out; price carried by the event
        let event = swap_event(i_wad(-1), i_wad(5), sq96());
        handle_v3_swap(&store, &reader, CHAIN, &event, &pool_address, "0xtx1", 0, now)
            .await
            .unwrap();

        let pool = store.find_pool(CHAIN, &pool_address).await.unwrap().unwrap();
        assert_eq!(pool.graduation_balance, wad(5));
        assert_eq!(pool.graduation_percentage, 50.0);
        // 0.3% of the 5 inbound quote tokens, accrued on token1
        assert_eq!(pool.total_fee1, U256::from(15_000_000_000_000_000u64));
        assert_eq!(pool.total_fee0, U256::ZERO);

        // Sell: 2 quote out
        let event = swap_event(i_wad(1), i_wad(-2), sq96());
        handle_v3_swap(&store, &reader, CHAIN, &event, &pool_address, "0xtx2", 0, now + 5)
            .await
            .unwrap();

        let pool = store.find_pool(CHAIN, &pool_address).await.unwrap().unwrap();
        assert_eq!(pool.graduation_balance, wad(3));
        assert_eq!(pool.graduation_percentage, 30.0);
        // Sell charged 0.3% of 1 inbound asset token on token0
        assert_eq!(pool.total_fee0, U256::from(3_000_000_000_000_000u64));
    }

    #[tokio::test]
    async fn test_price_from_event_sqrt_price() {
        let store = MemoryStore::new();
        let reader = MockReader::new();
        let now = 1_700_000_000u64;
        let pool_address = seed(&store, &reader, now).await;

        // sqrtPrice = 2 * 2^96 encodes token1/token0 = 4; asset is token0
        let event = swap_event(i_wad(-1), i_wad(1), U160::from(2u8) << 96);
        handle_v3_swap(&store, &reader, CHAIN, &event, &pool_address, "0xtx1", 0, now)
            .await
            .unwrap();

        let pool = store.find_pool(CHAIN, &pool_address).await.unwrap().unwrap();
        assert_eq!(pool.price, wad(4));
        assert_eq!(pool.sqrt_price_x96, Some(U256::from(2u8) << 96));
    }

    #[tokio::test]
    async fn test_oracle_gap_keeps_graduation_tracking() {
        let store = MemoryStore::new();
        let reader = MockReader::new();
        let now = 1_700_000_000u64;
        let pool_address = seed(&store, &reader, now).await;

        store
            .update_pool(
                CHAIN,
                &pool_address,
                &PoolUpdate {
                    graduation_threshold: Some(wad(10)),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        // Quote inflow during a reference-price gap must still move the
        // bonding-curve accumulator; nothing reconciles it afterwards
        let later = now + 2 * 86_400;
        let event = swap_event(i_wad(-1), i_wad(5), sq96());
        handle_v3_swap(&store, &reader, CHAIN, &event, &pool_address, "0xtx7", 0, later)
            .await
            .unwrap();

        let pool = store.find_pool(CHAIN, &pool_address).await.unwrap().unwrap();
        assert_eq!(pool.graduation_balance, wad(5));
        assert_eq!(pool.graduation_percentage, 50.0);
        // USD volume still waits for the oracle
        assert_eq!(pool.volume_usd, U256::ZERO);
    }

    #[tokio::test]
    async fn test_oracle_gap_degrades_to_price_only() {
        let store = MemoryStore::new();
        let reader = MockReader::new();
        let now = 1_700_000_000u64;
        let pool_address = seed(&store, &reader, now).await;

        // Swap lands two days later; no reference price near it
        let later = now + 2 * 86_400;
        let event = swap_event(i_wad(-1), i_wad(1), U160::from(2u8) << 96);
        handle_v3_swap(&store, &reader, CHAIN, &event, &pool_address, "0xtx9", 0, later)
            .await
            .unwrap();

        let pool = store.find_pool(CHAIN, &pool_address).await.unwrap().unwrap();
        // Raw state updated
        assert_eq!(pool.price, wad(4));
        assert_eq!(pool.last_swap_timestamp, Some(later));
        // USD figures untouched and no volume accumulated
        assert_eq!(pool.volume_usd, U256::ZERO);
        assert!(store.find_daily_volume(CHAIN, &pool_address, later - (later % 86_400))
            .await
            .unwrap()
            .is_none());
        // Activity marker still written for the refresh sweep
        let active = store.active_pools_since(CHAIN, later).await.unwrap();
        assert_eq!(active.len(), 1);
    }
}
