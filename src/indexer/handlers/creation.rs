//! Pool-creation settlement.
//!
//! One shared `Create(poolOrHook, asset, numeraire)` event covers all three
//! versions; the parser already resolved which version emitted it. The
//! handler registers the asset token, reads version-specific initial state,
//! and registers the pool idempotently. An oracle gap at creation leaves the
//! USD figures zeroed; the first priced swap or the refresh sweep fills them.

use alloy::primitives::{Address, U256};
use anyhow::{Context, Result};
use log::{info, warn};

use crate::abis::factory;
use crate::error::OracleError;
use crate::math;
use crate::oracle;
use crate::reader::ChainReader;
use crate::registry;
use crate::store::models::{Pool, PoolType};
use crate::store::Store;
use crate::utils::{compute_v4_pool_id, hex_encode};

/// Version-specific initial pool state, already oriented asset-vs-quote.
struct InitialState {
    price: U256,
    liquidity: U256,
    sqrt_price_x96: Option<U256>,
    tick: Option<i32>,
    asset_reserve: U256,
    quote_reserve: U256,
    fee: u32,
    pool_id: Option<String>,
}

pub async fn handle_pool_created(
    store: &dyn Store,
    reader: &dyn ChainReader,
    chain_id: u64,
    pool_type: PoolType,
    event: &factory::Create,
    timestamp: u64,
) -> Result<()> {
    let pool_or_hook = event.poolOrHook;
    let asset = event.asset;
    let numeraire = event.numeraire;

    let address = hex_encode(pool_or_hook.as_slice());
    let asset_hex = hex_encode(asset.as_slice());
    let numeraire_hex = hex_encode(numeraire.as_slice());

    // AMMs order the pair by address, not by economic role; this single
    // bit orients every later read.
    let is_token0 = asset < numeraire;

    let token =
        registry::get_or_create_token(store, reader, chain_id, asset, &address, timestamp).await?;

    let state = match pool_type {
        PoolType::V2 => read_v2_state(reader, pool_or_hook, is_token0).await?,
        PoolType::V3 => read_v3_state(reader, pool_or_hook, asset, numeraire, is_token0).await?,
        PoolType::V4 => read_v4_state(reader, pool_or_hook, is_token0).await?,
    };

    let (dollar_liquidity, market_cap_usd) =
        match oracle::resolve_eth_price(store, timestamp).await {
            Ok(eth_price) => (
                math::dollar_liquidity(
                    state.asset_reserve,
                    state.quote_reserve,
                    state.price,
                    eth_price,
                ),
                math::market_cap(state.price, eth_price, token.total_supply),
            ),
            Err(OracleError::Gap { bucket, .. }) => {
                warn!(
                    "No reference price near bucket {} at creation of {}; USD figures start at 0",
                    bucket, address
                );
                (U256::ZERO, U256::ZERO)
            },
            Err(OracleError::Store(e)) => return Err(e),
        };

    let pool = registry::get_or_create_pool(
        store,
        Pool {
            chain_id,
            address: address.clone(),
            asset: asset_hex,
            numeraire: numeraire_hex,
            pool_type,
            is_token0,
            pool_id: state.pool_id,
            fee: state.fee,
            price: state.price,
            liquidity: state.liquidity,
            sqrt_price_x96: state.sqrt_price_x96,
            tick: state.tick,
            asset_reserve: state.asset_reserve,
            quote_reserve: state.quote_reserve,
            dollar_liquidity,
            market_cap_usd,
            volume_usd: U256::ZERO,
            percent_day_change: 0.0,
            graduation_balance: U256::ZERO,
            graduation_threshold: U256::ZERO,
            graduation_percentage: 0.0,
            total_fee0: U256::ZERO,
            total_fee1: U256::ZERO,
            created_at: timestamp,
            last_refreshed: None,
            last_swap_timestamp: None,
        },
    )
    .await?;

    info!(
        "Registered {} pool {} for asset {}",
        pool.pool_type.as_str(),
        pool.address,
        pool.asset
    );
    Ok(())
}

async fn read_v2_state(
    reader: &dyn ChainReader,
    pair: Address,
    is_token0: bool,
) -> Result<InitialState> {
    let state = reader.v2_pair_state(pair).await?;

    let (asset_reserve, quote_reserve) = if is_token0 {
        (state.reserve0, state.reserve1)
    } else {
        (state.reserve1, state.reserve0)
    };

    Ok(InitialState {
        price: math::v2_price(asset_reserve, quote_reserve),
        liquidity: U256::ZERO,
        sqrt_price_x96: None,
        tick: None,
        asset_reserve,
        quote_reserve,
        fee: 3000,
        pool_id: None,
    })
}

async fn read_v3_state(
    reader: &dyn ChainReader,
    pool: Address,
    asset: Address,
    numeraire: Address,
    is_token0: bool,
) -> Result<InitialState> {
    let state = reader.v3_pool_state(pool).await?;

    // Concentrated-liquidity reserves are the pool's actual token balances
    let asset_reserve = reader.balance_of(asset, pool).await?;
    let quote_reserve = reader.balance_of(numeraire, pool).await?;

    Ok(InitialState {
        price: math::sqrt_price_to_price(state.sqrt_price_x96, is_token0),
        liquidity: state.liquidity,
        sqrt_price_x96: Some(state.sqrt_price_x96),
        tick: Some(state.tick),
        asset_reserve,
        quote_reserve,
        fee: state.fee,
        pool_id: None,
    })
}

async fn read_v4_state(
    reader: &dyn ChainReader,
    hook: Address,
    is_token0: bool,
) -> Result<InitialState> {
    let key = reader.v4_pool_key(hook).await?;
    if key.hooks != hook {
        // The hook must own the pool it reports
        anyhow::bail!("pool key of hook {} names a different hook {}", hook, key.hooks);
    }

    let pool_id =
        compute_v4_pool_id(key.currency0, key.currency1, key.fee, key.tick_spacing, key.hooks);
    let state = reader
        .v4_pool_state(pool_id)
        .await
        .with_context(|| format!("state view read for pool id {pool_id}"))?;

    let (reserve0, reserve1) = math::reserves_from_liquidity(state.liquidity, state.sqrt_price_x96);
    let (asset_reserve, quote_reserve) =
        if is_token0 { (reserve0, reserve1) } else { (reserve1, reserve0) };

    Ok(InitialState {
        price: math::sqrt_price_to_price(state.sqrt_price_x96, is_token0),
        liquidity: state.liquidity,
        sqrt_price_x96: Some(state.sqrt_price_x96),
        tick: Some(state.tick),
        asset_reserve,
        quote_reserve,
        fee: key.fee,
        pool_id: Some(hex_encode(pool_id.as_slice())),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::{ORACLE_SCALE, WAD};
    use crate::oracle::price_bucket;
    use crate::reader::mock::MockReader;
    use crate::reader::{TokenMetadata, V2PairState, V3PoolState, V4PoolKey, V4PoolState};
    use crate::store::{MemoryStore, Store};

    const CHAIN: u64 = 8453;

    fn wad(n: u64) -> U256 {
        U256::from(n) * *WAD
    }

    fn asset_metadata(supply: U256) -> TokenMetadata {
        TokenMetadata {
            name: "Tide".to_string(),
            symbol: "TIDE".to_string(),
            decimals: 18,
            total_supply: supply,
        }
    }

    #[tokio::test]
    async fn test_v2_creation_orients_reserves() {
        let store = MemoryStore::new();
        let reader = MockReader::new();
        let now = 1_700_000_000u64;

        // asset > numeraire numerically: asset is token1
        let asset = Address::repeat_byte(0xbb);
        let numeraire = Address::repeat_byte(0x0a);
        let pair = Address::repeat_byte(0x77);

        reader.set_token(asset, asset_metadata(wad(1_000)));
        reader.set_v2_pair(
            pair,
            V2PairState {
                token0: numeraire,
                token1: asset,
                reserve0: wad(100), // quote
                reserve1: wad(50),  // asset
            },
        );
        store
            .insert_eth_price(price_bucket(now), U256::from(2_000u64) * *ORACLE_SCALE)
            .await
            .unwrap();

        let event = factory::Create {
            poolOrHook: pair,
            asset,
            numeraire,
        };
        handle_pool_created(&store, &reader, CHAIN, PoolType::V2, &event, now).await.unwrap();

        let pool = store
            .find_pool(CHAIN, &hex_encode(pair.as_slice()))
            .await
            .unwrap()
            .unwrap();
        assert!(!pool.is_token0);
        assert_eq!(pool.asset_reserve, wad(50));
        assert_eq!(pool.quote_reserve, wad(100));
        // 100 quote / 50 asset = 2 quote per asset
        assert_eq!(pool.price, wad(2));
        // (50*2 + 100) quote at $2000 = $400k
        assert_eq!(pool.dollar_liquidity, wad(400_000));
        // 1000 supply at 2 quote, $2000 per quote
        assert_eq!(pool.market_cap_usd, wad(4_000_000));

        let token = store.find_token(CHAIN, &pool.asset).await.unwrap().unwrap();
        assert_eq!(token.symbol, "TIDE");
    }

    #[tokio::test]
    async fn test_v3_creation_reads_balances() {
        let store = MemoryStore::new();
        let reader = MockReader::new();
        let now = 1_700_000_000u64;

        let asset = Address::repeat_byte(0x0a);
        let numeraire = Address::repeat_byte(0xbb);
        let pool_addr = Address::repeat_byte(0x33);

        reader.set_token(asset, asset_metadata(wad(500)));
        reader.set_v3_pool(
            pool_addr,
            V3PoolState {
                token0: asset,
                token1: numeraire,
                fee: 10_000,
                sqrt_price_x96: U256::from(1u8) << 96, // price 1.0
                tick: 0,
                liquidity: wad(9),
            },
        );
        reader.set_balance(asset, pool_addr, wad(400));
        reader.set_balance(numeraire, pool_addr, wad(3));
        store
            .insert_eth_price(price_bucket(now), U256::from(1_000u64) * *ORACLE_SCALE)
            .await
            .unwrap();

        let event = factory::Create {
            poolOrHook: pool_addr,
            asset,
            numeraire,
        };
        handle_pool_created(&store, &reader, CHAIN, PoolType::V3, &event, now).await.unwrap();

        let pool = store
            .find_pool(CHAIN, &hex_encode(pool_addr.as_slice()))
            .await
            .unwrap()
            .unwrap();
        assert!(pool.is_token0);
        assert_eq!(pool.price, *WAD);
        assert_eq!(pool.fee, 10_000);
        assert_eq!(pool.tick, Some(0));
        assert_eq!(pool.asset_reserve, wad(400));
        assert_eq!(pool.quote_reserve, wad(3));
    }

    #[tokio::test]
    async fn test_v4_creation_stores_pool_id() {
        let store = MemoryStore::new();
        let reader = MockReader::new();
        let now = 1_700_000_000u64;

        let asset = Address::repeat_byte(0x0a);
        let numeraire = Address::repeat_byte(0xbb);
        let hook = Address::repeat_byte(0x44);

        let key = V4PoolKey {
            currency0: asset,
            currency1: numeraire,
            fee: 0,
            tick_spacing: 8,
            hooks: hook,
        };
        let pool_id = compute_v4_pool_id(asset, numeraire, 0, 8, hook);

        reader.set_token(asset, asset_metadata(wad(100)));
        reader.set_v4_key(hook, key);
        reader.set_v4_state(
            pool_id,
            V4PoolState {
                sqrt_price_x96: U256::from(1u8) << 96,
                tick: 0,
                liquidity: wad(4),
            },
        );
        store
            .insert_eth_price(price_bucket(now), U256::from(1_000u64) * *ORACLE_SCALE)
            .await
            .unwrap();

        let event = factory::Create {
            poolOrHook: hook,
            asset,
            numeraire,
        };
        handle_pool_created(&store, &reader, CHAIN, PoolType::V4, &event, now).await.unwrap();

        let pool = store
            .find_pool(CHAIN, &hex_encode(hook.as_slice()))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(pool.pool_id, Some(hex_encode(pool_id.as_slice())));
        // At price 1.0 both virtual reserves equal the liquidity
        assert_eq!(pool.asset_reserve, wad(4));
        assert_eq!(pool.quote_reserve, wad(4));

        // Swap handlers look the pool up by the manager's id
        let by_id = store
            .find_pool_by_pool_id(CHAIN, &hex_encode(pool_id.as_slice()))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(by_id.address, pool.address);
    }

    #[tokio::test]
    async fn test_creation_without_oracle_zeroes_usd() {
        let store = MemoryStore::new();
        let reader = MockReader::new();
        let now = 1_700_000_000u64;

        let asset = Address::repeat_byte(0x0a);
        let numeraire = Address::repeat_byte(0xbb);
        let pair = Address::repeat_byte(0x77);

        reader.set_token(asset, asset_metadata(wad(1_000)));
        reader.set_v2_pair(
            pair,
            V2PairState {
                token0: asset,
                token1: numeraire,
                reserve0: wad(50),
                reserve1: wad(100),
            },
        );

        let event = factory::Create {
            poolOrHook: pair,
            asset,
            numeraire,
        };
        handle_pool_created(&store, &reader, CHAIN, PoolType::V2, &event, now).await.unwrap();

        let pool = store
            .find_pool(CHAIN, &hex_encode(pair.as_slice()))
            .await
            .unwrap()
            .unwrap();
        // Price still derived from reserves; USD figures wait for the oracle
        assert_eq!(pool.price, wad(2));
        assert_eq!(pool.dollar_liquidity, U256::ZERO);
        assert_eq!(pool.market_cap_usd, U256::ZERO);
    }

    #[tokio::test]
    async fn test_replayed_creation_is_idempotent() {
        let store = MemoryStore::new();
        let reader = MockReader::new();
        let now = 1_700_000_000u64;

        let asset = Address::repeat_byte(0x0a);
        let numeraire = Address::repeat_byte(0xbb);
        let pair = Address::repeat_byte(0x77);

        reader.set_token(asset, asset_metadata(wad(1_000)));
        reader.set_v2_pair(
            pair,
            V2PairState {
                token0: asset,
                token1: numeraire,
                reserve0: wad(50),
                reserve1: wad(100),
            },
        );

        let event = factory::Create {
            poolOrHook: pair,
            asset,
            numeraire,
        };
        handle_pool_created(&store, &reader, CHAIN, PoolType::V2, &event, now).await.unwrap();

        // Reorg replay with changed on-chain state must not touch the row
        reader.set_v2_pair(
            pair,
            V2PairState {
                token0: asset,
                token1: numeraire,
                reserve0: wad(1),
                reserve1: wad(1),
            },
        );
        handle_pool_created(&store, &reader, CHAIN, PoolType::V2, &event, now + 10).await.unwrap();

        let pool = store
            .find_pool(CHAIN, &hex_encode(pair.as_slice()))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(pool.created_at, now);
        assert_eq!(pool.asset_reserve, wad(50));
    }
}
