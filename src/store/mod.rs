//! Persistence layer.
//!
//! The transactional store is owned by the event-ingestion engine; this core
//! talks to it through the [`Store`] trait and receives a handle by
//! dependency injection, never through a process-wide singleton. Two
//! implementations exist:
//!
//! - [`PostgresStore`] - production, raw SQL with keyed `ON CONFLICT`
//!   upserts over a deadpool connection pool
//! - [`MemoryStore`] - in-process, used by tests and local runs

pub mod memory;
pub mod models;
pub mod postgres;

use alloy::primitives::U256;
use anyhow::Result;
use async_trait::async_trait;

pub use memory::MemoryStore;
pub use models::{ActivePool, DailyVolume, Pool, PoolType, PoolUpdate, PriceBucket, Token, TokenUpdate};
pub use postgres::PostgresStore;

/// Keyed find/insert/update operations over the persisted entities.
///
/// Every write is an idempotent keyed upsert so reorg-driven reprocessing
/// can re-deliver events safely. `insert_*` enforce uniqueness per primary
/// key and report whether the row was actually inserted, which is how
/// concurrent creators detect that they lost the race.
#[async_trait]
pub trait Store: Send + Sync {
    // ==================== POOLS ====================

    async fn find_pool(&self, chain_id: u64, address: &str) -> Result<Option<Pool>>;

    /// Look up a V4 pool by the manager's pool key hash.
    async fn find_pool_by_pool_id(&self, chain_id: u64, pool_id: &str) -> Result<Option<Pool>>;

    /// Insert-if-absent. Returns false when a row for the key already
    /// existed (the caller should re-fetch, not error).
    async fn insert_pool(&self, pool: &Pool) -> Result<bool>;

    /// Partial merge, last writer wins per field. Returns false when no row
    /// exists for the key.
    async fn update_pool(&self, chain_id: u64, address: &str, update: &PoolUpdate)
        -> Result<bool>;

    // ==================== TOKENS ====================

    async fn find_token(&self, chain_id: u64, address: &str) -> Result<Option<Token>>;

    async fn insert_token(&self, token: &Token) -> Result<bool>;

    async fn update_token(
        &self,
        chain_id: u64,
        address: &str,
        update: &TokenUpdate,
    ) -> Result<bool>;

    /// Admin-surface toggle. Returns false when the token does not exist.
    async fn set_token_promoted(&self, chain_id: u64, address: &str, promoted: bool)
        -> Result<bool>;

    // ==================== REFERENCE PRICES ====================

    /// Exact-bucket lookup in the oracle feed table (feed scale, 8 decimals).
    async fn find_eth_price(&self, timestamp: u64) -> Result<Option<U256>>;

    /// Written by the external feed collector; overwrites on conflict.
    async fn insert_eth_price(&self, timestamp: u64, price: U256) -> Result<()>;

    // ==================== TIME SERIES ====================

    /// Create or overwrite the bucket row; the latest write within an
    /// interval wins.
    async fn upsert_price_bucket(&self, bucket: &PriceBucket) -> Result<()>;

    /// Earliest bucket for the pool with `bucket_timestamp >= from_ts`.
    async fn find_price_bucket_at_or_after(
        &self,
        chain_id: u64,
        pool_address: &str,
        from_ts: u64,
    ) -> Result<Option<PriceBucket>>;

    /// Add to the day's volume accumulator, creating the row on first write
    /// of the day. The (chain_id, tx_hash, log_index) dedup marker and the
    /// accumulation commit as one unit: either both land or neither does,
    /// so a failure mid-write stays retryable. Returns false when the log
    /// was already counted.
    #[allow(clippy::too_many_arguments)]
    async fn add_daily_volume(
        &self,
        chain_id: u64,
        pool_address: &str,
        day_timestamp: u64,
        delta_usd: U256,
        timestamp: u64,
        tx_hash: &str,
        log_index: u32,
    ) -> Result<bool>;

    async fn find_daily_volume(
        &self,
        chain_id: u64,
        pool_address: &str,
        day_timestamp: u64,
    ) -> Result<Option<DailyVolume>>;

    // ==================== ACTIVITY ====================

    async fn upsert_active_pool(&self, marker: &ActivePool) -> Result<()>;

    /// Pools whose last swap is at or after `since_ts`.
    async fn active_pools_since(&self, chain_id: u64, since_ts: u64) -> Result<Vec<ActivePool>>;
}
