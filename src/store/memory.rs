use std::sync::Mutex;

use alloy::primitives::U256;
use anyhow::Result;
use async_trait::async_trait;
use rustc_hash::{FxHashMap, FxHashSet};

use crate::store::models::{
    ActivePool, DailyVolume, Pool, PoolUpdate, PriceBucket, Token, TokenUpdate,
};
use crate::store::Store;

/// In-process [`Store`] over hash maps. Mirrors the keyed upsert semantics
/// of the SQL implementation so the engine behaves identically against
/// either backend.
#[derive(Default)]
pub struct MemoryStore {
    pools: Mutex<FxHashMap<(u64, String), Pool>>,
    tokens: Mutex<FxHashMap<(u64, String), Token>>,
    eth_prices: Mutex<FxHashMap<u64, U256>>,
    buckets: Mutex<FxHashMap<(u64, String, u64), PriceBucket>>,
    volumes: Mutex<FxHashMap<(u64, String, u64), DailyVolume>>,
    seen_logs: Mutex<FxHashSet<(u64, String, u32)>>,
    active: Mutex<FxHashMap<(u64, String), ActivePool>>,
}

impl MemoryStore {
    pub fn new() -> Self { Self::default() }

    /// Number of bucket rows stored for a pool, for test assertions.
    pub fn bucket_count(&self, chain_id: u64, pool_address: &str) -> usize {
        self.buckets
            .lock()
            .unwrap()
            .keys()
            .filter(|(c, p, _)| *c == chain_id && p == pool_address)
            .count()
    }

    pub fn pool_count(&self, chain_id: u64) -> usize {
        self.pools.lock().unwrap().keys().filter(|(c, _)| *c == chain_id).count()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn find_pool(&self, chain_id: u64, address: &str) -> Result<Option<Pool>> {
        Ok(self.pools.lock().unwrap().get(&(chain_id, address.to_string())).cloned())
    }

    async fn find_pool_by_pool_id(&self, chain_id: u64, pool_id: &str) -> Result<Option<Pool>> {
        Ok(self
            .pools
            .lock()
            .unwrap()
            .values()
            .find(|p| p.chain_id == chain_id && p.pool_id.as_deref() == Some(pool_id))
            .cloned())
    }

    async fn insert_pool(&self, pool: &Pool) -> Result<bool> {
        let mut pools = self.pools.lock().unwrap();
        let key = (pool.chain_id, pool.address.clone());
        if pools.contains_key(&key) {
            return Ok(false);
        }
        pools.insert(key, pool.clone());
        Ok(true)
    }

    async fn update_pool(
        &self,
        chain_id: u64,
        address: &str,
        update: &PoolUpdate,
    ) -> Result<bool> {
        let mut pools = self.pools.lock().unwrap();
        match pools.get_mut(&(chain_id, address.to_string())) {
            Some(pool) => {
                pool.apply(update);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn find_token(&self, chain_id: u64, address: &str) -> Result<Option<Token>> {
        Ok(self.tokens.lock().unwrap().get(&(chain_id, address.to_string())).cloned())
    }

    async fn insert_token(&self, token: &Token) -> Result<bool> {
        let mut tokens = self.tokens.lock().unwrap();
        let key = (token.chain_id, token.address.clone());
        if tokens.contains_key(&key) {
            return Ok(false);
        }
        tokens.insert(key, token.clone());
        Ok(true)
    }

    async fn update_token(
        &self,
        chain_id: u64,
        address: &str,
        update: &TokenUpdate,
    ) -> Result<bool> {
        let mut tokens = self.tokens.lock().unwrap();
        match tokens.get_mut(&(chain_id, address.to_string())) {
            Some(token) => {
                token.apply(update);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn set_token_promoted(
        &self,
        chain_id: u64,
        address: &str,
        promoted: bool,
    ) -> Result<bool> {
        let mut tokens = self.tokens.lock().unwrap();
        match tokens.get_mut(&(chain_id, address.to_string())) {
            Some(token) => {
                token.is_promoted = promoted;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn find_eth_price(&self, timestamp: u64) -> Result<Option<U256>> {
        Ok(self.eth_prices.lock().unwrap().get(&timestamp).copied())
    }

    async fn insert_eth_price(&self, timestamp: u64, price: U256) -> Result<()> {
        self.eth_prices.lock().unwrap().insert(timestamp, price);
        Ok(())
    }

    async fn upsert_price_bucket(&self, bucket: &PriceBucket) -> Result<()> {
        let key = (bucket.chain_id, bucket.pool_address.clone(), bucket.bucket_timestamp);
        self.buckets.lock().unwrap().insert(key, bucket.clone());
        Ok(())
    }

    async fn find_price_bucket_at_or_after(
        &self,
        chain_id: u64,
        pool_address: &str,
        from_ts: u64,
    ) -> Result<Option<PriceBucket>> {
        Ok(self
            .buckets
            .lock()
            .unwrap()
            .values()
            .filter(|b| {
                b.chain_id == chain_id
                    && b.pool_address == pool_address
                    && b.bucket_timestamp >= from_ts
            })
            .min_by_key(|b| b.bucket_timestamp)
            .cloned())
    }

    async fn add_daily_volume(
        &self,
        chain_id: u64,
        pool_address: &str,
        day_timestamp: u64,
        delta_usd: U256,
        timestamp: u64,
        tx_hash: &str,
        log_index: u32,
    ) -> Result<bool> {
        // Marker and accumulation under one critical section, mirroring the
        // single SQL transaction of the Postgres store
        let mut seen = self.seen_logs.lock().unwrap();
        if !seen.insert((chain_id, tx_hash.to_string(), log_index)) {
            return Ok(false);
        }

        let mut volumes = self.volumes.lock().unwrap();
        let entry = volumes
            .entry((chain_id, pool_address.to_string(), day_timestamp))
            .or_insert_with(|| DailyVolume {
                chain_id,
                pool_address: pool_address.to_string(),
                day_timestamp,
                volume_usd: U256::ZERO,
                last_updated: timestamp,
            });
        entry.volume_usd = entry.volume_usd.saturating_add(delta_usd);
        entry.last_updated = timestamp;
        Ok(true)
    }

    async fn find_daily_volume(
        &self,
        chain_id: u64,
        pool_address: &str,
        day_timestamp: u64,
    ) -> Result<Option<DailyVolume>> {
        Ok(self
            .volumes
            .lock()
            .unwrap()
            .get(&(chain_id, pool_address.to_string(), day_timestamp))
            .cloned())
    }

    async fn upsert_active_pool(&self, marker: &ActivePool) -> Result<()> {
        let mut active = self.active.lock().unwrap();
        let key = (marker.chain_id, marker.pool_address.clone());
        match active.get_mut(&key) {
            Some(existing) => {
                if marker.last_swap_timestamp > existing.last_swap_timestamp {
                    existing.last_swap_timestamp = marker.last_swap_timestamp;
                }
            }
            None => {
                active.insert(key, marker.clone());
            }
        }
        Ok(())
    }

    async fn active_pools_since(&self, chain_id: u64, since_ts: u64) -> Result<Vec<ActivePool>> {
        let mut out: Vec<ActivePool> = self
            .active
            .lock()
            .unwrap()
            .values()
            .filter(|a| a.chain_id == chain_id && a.last_swap_timestamp >= since_ts)
            .cloned()
            .collect();
        out.sort_by(|a, b| a.pool_address.cmp(&b.pool_address));
        Ok(out)
    }
}
