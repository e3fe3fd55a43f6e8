use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use alloy::primitives::{Address, B256, U256};
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use rustc_hash::FxHashMap;

use crate::reader::{
    ChainReader, TokenMetadata, V2PairState, V3PoolState, V4PoolKey, V4PoolState,
};

/// Canned [`ChainReader`] for tests: every read is served from fixture maps
/// and a missing fixture is an error, mirroring a failed RPC call.
#[derive(Default)]
pub struct MockReader {
    tokens: Mutex<FxHashMap<Address, TokenMetadata>>,
    balances: Mutex<FxHashMap<(Address, Address), U256>>,
    v2_pairs: Mutex<FxHashMap<Address, V2PairState>>,
    v3_pools: Mutex<FxHashMap<Address, V3PoolState>>,
    v4_keys: Mutex<FxHashMap<Address, V4PoolKey>>,
    v4_states: Mutex<FxHashMap<B256, V4PoolState>>,
    metadata_calls: AtomicUsize,
}

impl MockReader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_token(&self, token: Address, metadata: TokenMetadata) {
        self.tokens.lock().unwrap().insert(token, metadata);
    }

    pub fn set_balance(&self, token: Address, holder: Address, balance: U256) {
        self.balances.lock().unwrap().insert((token, holder), balance);
    }

    pub fn set_v2_pair(&self, pair: Address, state: V2PairState) {
        self.v2_pairs.lock().unwrap().insert(pair, state);
    }

    pub fn set_v3_pool(&self, pool: Address, state: V3PoolState) {
        self.v3_pools.lock().unwrap().insert(pool, state);
    }

    pub fn set_v4_key(&self, hook: Address, key: V4PoolKey) {
        self.v4_keys.lock().unwrap().insert(hook, key);
    }

    pub fn set_v4_state(&self, pool_id: B256, state: V4PoolState) {
        self.v4_states.lock().unwrap().insert(pool_id, state);
    }

    /// How many times token_metadata was called, to assert fetch-once paths.
    pub fn metadata_calls(&self) -> usize {
        self.metadata_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ChainReader for MockReader {
    async fn token_metadata(&self, token: Address) -> Result<TokenMetadata> {
        self.metadata_calls.fetch_add(1, Ordering::SeqCst);
        self.tokens
            .lock()
            .unwrap()
            .get(&token)
            .cloned()
            .ok_or_else(|| anyhow!("no metadata fixture for {token}"))
    }

    async fn total_supply(&self, token: Address) -> Result<U256> {
        self.tokens
            .lock()
            .unwrap()
            .get(&token)
            .map(|m| m.total_supply)
            .ok_or_else(|| anyhow!("no metadata fixture for {token}"))
    }

    async fn balance_of(&self, token: Address, holder: Address) -> Result<U256> {
        self.balances
            .lock()
            .unwrap()
            .get(&(token, holder))
            .copied()
            .ok_or_else(|| anyhow!("no balance fixture for {token} held by {holder}"))
    }

    async fn v2_pair_state(&self, pair: Address) -> Result<V2PairState> {
        self.v2_pairs
            .lock()
            .unwrap()
            .get(&pair)
            .copied()
            .ok_or_else(|| anyhow!("no pair fixture for {pair}"))
    }

    async fn v3_pool_state(&self, pool: Address) -> Result<V3PoolState> {
        self.v3_pools
            .lock()
            .unwrap()
            .get(&pool)
            .copied()
            .ok_or_else(|| anyhow!("no pool fixture for {pool}"))
    }

    async fn v4_pool_key(&self, hook: Address) -> Result<V4PoolKey> {
        self.v4_keys
            .lock()
            .unwrap()
            .get(&hook)
            .copied()
            .ok_or_else(|| anyhow!("no pool key fixture for {hook}"))
    }

    async fn v4_pool_state(&self, pool_id: B256) -> Result<V4PoolState> {
        self.v4_states
            .lock()
            .unwrap()
            .get(&pool_id)
            .copied()
            .ok_or_else(|| anyhow!("no pool state fixture for {pool_id}"))
    }
}
