//! Identity management for pools and tokens.
//!
//! Creation events can be replayed and two events can race to register the
//! same entity, so every create path is an idempotent insert-if-absent:
//! losing the race is not an error, the loser simply adopts the winner's
//! row. Updates against entities that were never registered are logged and
//! skipped; an out-of-order swap must not fail the batch.

use alloy::primitives::{Address, U256};
use anyhow::{bail, Result};
use log::warn;

use crate::reader::ChainReader;
use crate::store::models::{Pool, PoolUpdate, Token, TokenUpdate};
use crate::store::Store;
use crate::utils::hex_encode;

/// Register a pool, or return the existing row untouched.
///
/// A hit never refreshes fields from the caller's candidate: the first
/// registration wins and replays see exactly what the original saw.
pub async fn get_or_create_pool(store: &dyn Store, pool: Pool) -> Result<Pool> {
    if let Some(existing) = store.find_pool(pool.chain_id, &pool.address).await? {
        return Ok(existing);
    }

    if store.insert_pool(&pool).await? {
        return Ok(pool);
    }

    // Lost a concurrent registration race; adopt the winner's row.
    match store.find_pool(pool.chain_id, &pool.address).await? {
        Some(existing) => Ok(existing),
        None => bail!("pool {} vanished after losing insert race", pool.address),
    }
}

/// Apply a partial update, skipping with a warning when the pool was never
/// registered.
pub async fn update_pool(
    store: &dyn Store,
    chain_id: u64,
    address: &str,
    update: &PoolUpdate,
) -> Result<()> {
    if !store.update_pool(chain_id, address, update).await? {
        warn!("Skipping update for unknown pool {} on chain {}", address, chain_id);
    }
    Ok(())
}

/// Register a token, fetching its on-chain metadata exactly once, or return
/// the existing row.
pub async fn get_or_create_token(
    store: &dyn Store,
    reader: &dyn ChainReader,
    chain_id: u64,
    token: Address,
    creator: &str,
    timestamp: u64,
) -> Result<Token> {
    let address = hex_encode(token.as_slice());

    if let Some(existing) = store.find_token(chain_id, &address).await? {
        return Ok(existing);
    }

    // Supply comes from a live contract read, never from the event payload.
    let metadata = reader.token_metadata(token).await?;

    let candidate = Token {
        chain_id,
        address: address.clone(),
        symbol: metadata.symbol,
        name: metadata.name,
        decimals: metadata.decimals,
        creator_address: creator.to_string(),
        total_supply: metadata.total_supply,
        liquidity_usd: U256::ZERO,
        market_cap_usd: U256::ZERO,
        percent_day_change: 0.0,
        is_promoted: false,
        first_seen_at: timestamp,
        last_seen_at: timestamp,
    };

    if store.insert_token(&candidate).await? {
        return Ok(candidate);
    }

    match store.find_token(chain_id, &address).await? {
        Some(existing) => Ok(existing),
        None => bail!("token {} vanished after losing insert race", address),
    }
}

/// Apply a partial update, skipping with a warning when the token was never
/// registered.
pub async fn update_token(
    store: &dyn Store,
    chain_id: u64,
    address: &str,
    update: &TokenUpdate,
) -> Result<()> {
    if !store.update_token(chain_id, address, update).await? {
        warn!("Skipping update for unknown token {} on chain {}", address, chain_id);
    }
    Ok(())
}

/// Operator curation toggle. Returns whether the token existed.
pub async fn set_token_promoted(
    store: &dyn Store,
    chain_id: u64,
    address: &str,
    promoted: bool,
) -> Result<bool> {
    let found = store.set_token_promoted(chain_id, address, promoted).await?;
    if !found {
        warn!("Cannot promote unknown token {} on chain {}", address, chain_id);
    }
    Ok(found)
}
