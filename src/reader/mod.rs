//! Live on-chain reads.
//!
//! Event payloads never carry token supplies or full pair state, so the
//! pipeline backfills those with direct contract calls through
//! [`ChainReader`]. Production uses [`RpcReader`] over an HTTP provider;
//! tests substitute a canned implementation.

#[cfg(test)]
pub mod mock;
mod rpc;

use alloy::primitives::{Address, B256, U256};
use anyhow::Result;
use async_trait::async_trait;

pub use rpc::RpcReader;

/// ERC-20 metadata snapshot taken when a token is first registered.
#[derive(Debug, Clone, PartialEq)]
pub struct TokenMetadata {
    pub name: String,
    pub symbol: String,
    pub decimals: u8,
    pub total_supply: U256,
}

/// Constant-product pair state from `token0`/`token1`/`getReserves`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct V2PairState {
    pub token0: Address,
    pub token1: Address,
    pub reserve0: U256,
    pub reserve1: U256,
}

/// Concentrated-liquidity pool state from the pool contract itself.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct V3PoolState {
    pub token0: Address,
    pub token1: Address,
    pub fee: u32,
    pub sqrt_price_x96: U256,
    pub tick: i32,
    pub liquidity: U256,
}

/// Pool key read from a V4 hook; hashing it yields the manager's pool id.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct V4PoolKey {
    pub currency0: Address,
    pub currency1: Address,
    pub fee: u32,
    pub tick_spacing: i32,
    pub hooks: Address,
}

/// Singleton-manager pool state read through the state-view lens contract.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct V4PoolState {
    pub sqrt_price_x96: U256,
    pub tick: i32,
    pub liquidity: U256,
}

#[async_trait]
pub trait ChainReader: Send + Sync {
    async fn token_metadata(&self, token: Address) -> Result<TokenMetadata>;

    async fn total_supply(&self, token: Address) -> Result<U256>;

    async fn balance_of(&self, token: Address, holder: Address) -> Result<U256>;

    async fn v2_pair_state(&self, pair: Address) -> Result<V2PairState>;

    async fn v3_pool_state(&self, pool: Address) -> Result<V3PoolState>;

    async fn v4_pool_key(&self, hook: Address) -> Result<V4PoolKey>;

    async fn v4_pool_state(&self, pool_id: B256) -> Result<V4PoolState>;
}
