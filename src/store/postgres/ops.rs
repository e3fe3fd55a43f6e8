use alloy::primitives::U256;
use anyhow::{Context, Result};
use async_trait::async_trait;
use log::error;
use tokio_postgres::Row;

use crate::store::models::{
    ActivePool, DailyVolume, Pool, PoolType, PoolUpdate, PriceBucket, Token, TokenUpdate,
};
use crate::store::postgres::PostgresStore;
use crate::store::Store;

fn u256_col(row: &Row, col: &str) -> Result<U256> {
    let raw: String = row.get(col);
    raw.parse::<U256>()
        .with_context(|| format!("Invalid numeric value in column {}: {}", col, raw))
}

fn u256_col_opt(row: &Row, col: &str) -> Result<Option<U256>> {
    let raw: Option<String> = row.get(col);
    match raw {
        Some(raw) => {
            let value = raw
                .parse::<U256>()
                .with_context(|| format!("Invalid numeric value in column {}: {}", col, raw))?;
            Ok(Some(value))
        },
        None => Ok(None),
    }
}

fn row_to_pool(row: &Row) -> Result<Pool> {
    let pool_type: String = row.get("pool_type");
    let pool_type = PoolType::parse(&pool_type)
        .with_context(|| format!("Unknown pool type: {}", pool_type))?;

    Ok(Pool {
        chain_id: row.get::<_, i64>("chain_id") as u64,
        address: row.get("address"),
        asset: row.get("asset"),
        numeraire: row.get("numeraire"),
        pool_type,
        is_token0: row.get("is_token0"),
        pool_id: row.get("pool_id"),
        fee: row.get::<_, i64>("fee") as u32,
        price: u256_col(row, "price")?,
        liquidity: u256_col(row, "liquidity")?,
        sqrt_price_x96: u256_col_opt(row, "sqrt_price_x96")?,
        tick: row.get("tick"),
        asset_reserve: u256_col(row, "asset_reserve")?,
        quote_reserve: u256_col(row, "quote_reserve")?,
        dollar_liquidity: u256_col(row, "dollar_liquidity")?,
        market_cap_usd: u256_col(row, "market_cap_usd")?,
        volume_usd: u256_col(row, "volume_usd")?,
        percent_day_change: row.get("percent_day_change"),
        graduation_balance: u256_col(row, "graduation_balance")?,
        graduation_threshold: u256_col(row, "graduation_threshold")?,
        graduation_percentage: row.get("graduation_percentage"),
        total_fee0: u256_col(row, "total_fee0")?,
        total_fee1: u256_col(row, "total_fee1")?,
        created_at: row.get::<_, i64>("created_at") as u64,
        last_refreshed: row.get::<_, Option<i64>>("last_refreshed").map(|v| v as u64),
        last_swap_timestamp: row.get::<_, Option<i64>>("last_swap_timestamp").map(|v| v as u64),
    })
}

fn row_to_token(row: &Row) -> Result<Token> {
    Ok(Token {
        chain_id: row.get::<_, i64>("chain_id") as u64,
        address: row.get("address"),
        symbol: row.get("symbol"),
        name: row.get("name"),
        decimals: row.get::<_, i16>("decimals") as u8,
        creator_address: row.get("creator_address"),
        total_supply: u256_col(row, "total_supply")?,
        liquidity_usd: u256_col(row, "liquidity_usd")?,
        market_cap_usd: u256_col(row, "market_cap_usd")?,
        percent_day_change: row.get("percent_day_change"),
        is_promoted: row.get("is_promoted"),
        first_seen_at: row.get::<_, i64>("first_seen_at") as u64,
        last_seen_at: row.get::<_, i64>("last_seen_at") as u64,
    })
}

fn row_to_bucket(row: &Row) -> Result<PriceBucket> {
    Ok(PriceBucket {
        chain_id: row.get::<_, i64>("chain_id") as u64,
        pool_address: row.get("pool_address"),
        bucket_timestamp: row.get::<_, i64>("bucket_timestamp") as u64,
        close_price: u256_col(row, "close_price")?,
        close_usd: u256_col(row, "close_usd")?,
        market_cap_usd: u256_col(row, "market_cap_usd")?,
    })
}

#[async_trait]
impl Store for PostgresStore {
    // ==================== POOLS ====================

    async fn find_pool(&self, chain_id: u64, address: &str) -> Result<Option<Pool>> {
        let client = self.pool.get().await?;
        let query = r#"
            SELECT
                chain_id, address, asset, numeraire, pool_type, is_token0, pool_id, fee,
                price, liquidity, sqrt_price_x96, tick, asset_reserve, quote_reserve,
                dollar_liquidity, market_cap_usd, volume_usd, percent_day_change,
                graduation_balance, graduation_threshold, graduation_percentage,
                total_fee0, total_fee1, created_at, last_refreshed, last_swap_timestamp
            FROM indexer.pools
            WHERE chain_id = $1 AND address = $2
        "#;

        let rows = client.query(query, &[&(chain_id as i64), &address]).await?;
        rows.first().map(row_to_pool).transpose()
    }

    async fn find_pool_by_pool_id(&self, chain_id: u64, pool_id: &str) -> Result<Option<Pool>> {
        let client = self.pool.get().await?;
        let query = r#"
            SELECT
                chain_id, address, asset, numeraire, pool_type, is_token0, pool_id, fee,
                price, liquidity, sqrt_price_x96, tick, asset_reserve, quote_reserve,
                dollar_liquidity, market_cap_usd, volume_usd, percent_day_change,
                graduation_balance, graduation_threshold, graduation_percentage,
                total_fee0, total_fee1, created_at, last_refreshed, last_swap_timestamp
            FROM indexer.pools
            WHERE chain_id = $1 AND pool_id = $2
        "#;

        let rows = client.query(query, &[&(chain_id as i64), &pool_id]).await?;
        rows.first().map(row_to_pool).transpose()
    }

    async fn insert_pool(&self, pool: &Pool) -> Result<bool> {
        let client = self.pool.get().await?;
        let query = r#"
            INSERT INTO indexer.pools (
                chain_id, address, asset, numeraire, pool_type, is_token0, pool_id, fee,
                price, liquidity, sqrt_price_x96, tick, asset_reserve, quote_reserve,
                dollar_liquidity, market_cap_usd, volume_usd, percent_day_change,
                graduation_balance, graduation_threshold, graduation_percentage,
                total_fee0, total_fee1, created_at, last_refreshed, last_swap_timestamp
            ) VALUES (
                $1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14,
                $15, $16, $17, $18, $19, $20, $21, $22, $23, $24, $25, $26
            )
            ON CONFLICT (chain_id, address) DO NOTHING
        "#;

        let inserted = client
            .execute(
                query,
                &[
                    &(pool.chain_id as i64),
                    &pool.address,
                    &pool.asset,
                    &pool.numeraire,
                    &pool.pool_type.as_str(),
                    &pool.is_token0,
                    &pool.pool_id,
                    &(pool.fee as i64),
                    &pool.price.to_string(),
                    &pool.liquidity.to_string(),
                    &pool.sqrt_price_x96.map(|v| v.to_string()),
                    &pool.tick,
                    &pool.asset_reserve.to_string(),
                    &pool.quote_reserve.to_string(),
                    &pool.dollar_liquidity.to_string(),
                    &pool.market_cap_usd.to_string(),
                    &pool.volume_usd.to_string(),
                    &pool.percent_day_change,
                    &pool.graduation_balance.to_string(),
                    &pool.graduation_threshold.to_string(),
                    &pool.graduation_percentage,
                    &pool.total_fee0.to_string(),
                    &pool.total_fee1.to_string(),
                    &(pool.created_at as i64),
                    &pool.last_refreshed.map(|v| v as i64),
                    &pool.last_swap_timestamp.map(|v| v as i64),
                ],
            )
            .await
            .map_err(|e| {
                error!("Failed to insert pool {}: {:?}", pool.address, e);
                e
            })?;

        Ok(inserted == 1)
    }

    async fn update_pool(
        &self,
        chain_id: u64,
        address: &str,
        update: &PoolUpdate,
    ) -> Result<bool> {
        let client = self.pool.get().await?;
        let query = r#"
            UPDATE indexer.pools SET
                price = COALESCE($3, price),
                liquidity = COALESCE($4, liquidity),
                sqrt_price_x96 = COALESCE($5, sqrt_price_x96),
                tick = COALESCE($6, tick),
                asset_reserve = COALESCE($7, asset_reserve),
                quote_reserve = COALESCE($8, quote_reserve),
                dollar_liquidity = COALESCE($9, dollar_liquidity),
                market_cap_usd = COALESCE($10, market_cap_usd),
                volume_usd = COALESCE($11, volume_usd),
                percent_day_change = COALESCE($12, percent_day_change),
                graduation_balance = COALESCE($13, graduation_balance),
                graduation_threshold = COALESCE($14, graduation_threshold),
                graduation_percentage = COALESCE($15, graduation_percentage),
                total_fee0 = COALESCE($16, total_fee0),
                total_fee1 = COALESCE($17, total_fee1),
                last_refreshed = COALESCE($18, last_refreshed),
                last_swap_timestamp = COALESCE($19, last_swap_timestamp)
            WHERE chain_id = $1 AND address = $2
        "#;

        let updated = client
            .execute(
                query,
                &[
                    &(chain_id as i64),
                    &address,
                    &update.price.map(|v| v.to_string()),
                    &update.liquidity.map(|v| v.to_string()),
                    &update.sqrt_price_x96.map(|v| v.to_string()),
                    &update.tick,
                    &update.asset_reserve.map(|v| v.to_string()),
                    &update.quote_reserve.map(|v| v.to_string()),
                    &update.dollar_liquidity.map(|v| v.to_string()),
                    &update.market_cap_usd.map(|v| v.to_string()),
                    &update.volume_usd.map(|v| v.to_string()),
                    &update.percent_day_change,
                    &update.graduation_balance.map(|v| v.to_string()),
                    &update.graduation_threshold.map(|v| v.to_string()),
                    &update.graduation_percentage,
                    &update.total_fee0.map(|v| v.to_string()),
                    &update.total_fee1.map(|v| v.to_string()),
                    &update.last_refreshed.map(|v| v as i64),
                    &update.last_swap_timestamp.map(|v| v as i64),
                ],
            )
            .await
            .map_err(|e| {
                error!("Failed to update pool {}: {:?}", address, e);
                e
            })?;

        Ok(updated > 0)
    }

    // ==================== TOKENS ====================

    async fn find_token(&self, chain_id: u64, address: &str) -> Result<Option<Token>> {
        let client = self.pool.get().await?;
        let query = r#"
            SELECT
                chain_id, address, symbol, name, decimals, creator_address,
                total_supply, liquidity_usd, market_cap_usd, percent_day_change,
                is_promoted, first_seen_at, last_seen_at
            FROM indexer.tokens
            WHERE chain_id = $1 AND address = $2
        "#;

        let rows = client.query(query, &[&(chain_id as i64), &address]).await?;
        rows.first().map(row_to_token).transpose()
    }

    async fn insert_token(&self, token: &Token) -> Result<bool> {
        let client = self.pool.get().await?;
        let query = r#"
            INSERT INTO indexer.tokens (
                chain_id, address, symbol, name, decimals, creator_address,
                total_supply, liquidity_usd, market_cap_usd, percent_day_change,
                is_promoted, first_seen_at, last_seen_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            ON CONFLICT (chain_id, address) DO NOTHING
        "#;

        let inserted = client
            .execute(
                query,
                &[
                    &(token.chain_id as i64),
                    &token.address,
                    &token.symbol,
                    &token.name,
                    &(token.decimals as i16),
                    &token.creator_address,
                    &token.total_supply.to_string(),
                    &token.liquidity_usd.to_string(),
                    &token.market_cap_usd.to_string(),
                    &token.percent_day_change,
                    &token.is_promoted,
                    &(token.first_seen_at as i64),
                    &(token.last_seen_at as i64),
                ],
            )
            .await
            .map_err(|e| {
                error!("Failed to insert token {}: {:?}", token.address, e);
                e
            })?;

        Ok(inserted == 1)
    }

    async fn update_token(
        &self,
        chain_id: u64,
        address: &str,
        update: &TokenUpdate,
    ) -> Result<bool> {
        let client = self.pool.get().await?;
        let query = r#"
            UPDATE indexer.tokens SET
                total_supply = COALESCE($3, total_supply),
                liquidity_usd = COALESCE($4, liquidity_usd),
                market_cap_usd = COALESCE($5, market_cap_usd),
                percent_day_change = COALESCE($6, percent_day_change),
                last_seen_at = COALESCE($7, last_seen_at)
            WHERE chain_id = $1 AND address = $2
        "#;

        let updated = client
            .execute(
                query,
                &[
                    &(chain_id as i64),
                    &address,
                    &update.total_supply.map(|v| v.to_string()),
                    &update.liquidity_usd.map(|v| v.to_string()),
                    &update.market_cap_usd.map(|v| v.to_string()),
                    &update.percent_day_change,
                    &update.last_seen_at.map(|v| v as i64),
                ],
            )
            .await?;

        Ok(updated > 0)
    }

    async fn set_token_promoted(
        &self,
        chain_id: u64,
        address: &str,
        promoted: bool,
    ) -> Result<bool> {
        let client = self.pool.get().await?;
        let updated = client
            .execute(
                "UPDATE indexer.tokens SET is_promoted = $3 WHERE chain_id = $1 AND address = $2",
                &[&(chain_id as i64), &address, &promoted],
            )
            .await?;

        Ok(updated > 0)
    }

    // ==================== REFERENCE PRICES ====================

    async fn find_eth_price(&self, timestamp: u64) -> Result<Option<U256>> {
        let client = self.pool.get().await?;
        let rows = client
            .query(
                "SELECT price FROM indexer.eth_prices WHERE timestamp = $1",
                &[&(timestamp as i64)],
            )
            .await?;

        rows.first().map(|row| u256_col(row, "price")).transpose()
    }

    async fn insert_eth_price(&self, timestamp: u64, price: U256) -> Result<()> {
        let client = self.pool.get().await?;
        client
            .execute(
                r#"
                    INSERT INTO indexer.eth_prices (timestamp, price)
                    VALUES ($1, $2)
                    ON CONFLICT (timestamp) DO UPDATE SET price = EXCLUDED.price
                "#,
                &[&(timestamp as i64), &price.to_string()],
            )
            .await?;

        Ok(())
    }

    // ==================== TIME SERIES ====================

    async fn upsert_price_bucket(&self, bucket: &PriceBucket) -> Result<()> {
        let client = self.pool.get().await?;
        let query = r#"
            INSERT INTO indexer.price_buckets (
                chain_id, pool_address, bucket_timestamp, close_price, close_usd, market_cap_usd
            ) VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (chain_id, pool_address, bucket_timestamp) DO UPDATE SET
                close_price = EXCLUDED.close_price,
                close_usd = EXCLUDED.close_usd,
                market_cap_usd = EXCLUDED.market_cap_usd
        "#;

        client
            .execute(
                query,
                &[
                    &(bucket.chain_id as i64),
                    &bucket.pool_address,
                    &(bucket.bucket_timestamp as i64),
                    &bucket.close_price.to_string(),
                    &bucket.close_usd.to_string(),
                    &bucket.market_cap_usd.to_string(),
                ],
            )
            .await?;

        Ok(())
    }

    async fn find_price_bucket_at_or_after(
        &self,
        chain_id: u64,
        pool_address: &str,
        from_ts: u64,
    ) -> Result<Option<PriceBucket>> {
        let client = self.pool.get().await?;
        let query = r#"
            SELECT chain_id, pool_address, bucket_timestamp, close_price, close_usd, market_cap_usd
            FROM indexer.price_buckets
            WHERE chain_id = $1 AND pool_address = $2 AND bucket_timestamp >= $3
            ORDER BY bucket_timestamp ASC
            LIMIT 1
        "#;

        let rows = client
            .query(query, &[&(chain_id as i64), &pool_address, &(from_ts as i64)])
            .await?;
        rows.first().map(row_to_bucket).transpose()
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
        let mut client = self.pool.get().await?;
        // One transaction for the dedup marker and the accumulation: a
        // failure mid-write rolls both back, so a redelivery can retry
        // instead of finding a marker with no volume behind it.
        let tx = client.transaction().await?;

        let marked = tx
            .execute(
                r#"
                    INSERT INTO indexer.seen_logs (chain_id, tx_hash, log_index)
                    VALUES ($1, $2, $3)
                    ON CONFLICT (chain_id, tx_hash, log_index) DO NOTHING
                "#,
                &[&(chain_id as i64), &tx_hash, &(log_index as i32)],
            )
            .await?;
        if marked == 0 {
            return Ok(false);
        }

        // Accumulation happens database-side so concurrent writers never lose
        // a delta to read-modify-write races.
        let query = r#"
            INSERT INTO indexer.daily_volumes (
                chain_id, pool_address, day_timestamp, volume_usd, last_updated
            ) VALUES ($1, $2, $3, $4::numeric, $5)
            ON CONFLICT (chain_id, pool_address, day_timestamp) DO UPDATE SET
                volume_usd = indexer.daily_volumes.volume_usd + EXCLUDED.volume_usd,
                last_updated = EXCLUDED.last_updated
        "#;

        tx.execute(
            query,
            &[
                &(chain_id as i64),
                &pool_address,
                &(day_timestamp as i64),
                &delta_usd.to_string(),
                &(timestamp as i64),
            ],
        )
        .await
        .map_err(|e| {
            error!("Failed to accumulate daily volume for {}: {:?}", pool_address, e);
            e
        })?;

        tx.commit().await?;
        Ok(true)
    }

    async fn find_daily_volume(
        &self,
        chain_id: u64,
        pool_address: &str,
        day_timestamp: u64,
    ) -> Result<Option<DailyVolume>> {
        let client = self.pool.get().await?;
        let query = r#"
            SELECT chain_id, pool_address, day_timestamp, volume_usd::text AS volume_usd, last_updated
            FROM indexer.daily_volumes
            WHERE chain_id = $1 AND pool_address = $2 AND day_timestamp = $3
        "#;

        let rows = client
            .query(query, &[&(chain_id as i64), &pool_address, &(day_timestamp as i64)])
            .await?;

        rows.first()
            .map(|row| {
                Ok(DailyVolume {
                    chain_id: row.get::<_, i64>("chain_id") as u64,
                    pool_address: row.get("pool_address"),
                    day_timestamp: row.get::<_, i64>("day_timestamp") as u64,
                    volume_usd: u256_col(row, "volume_usd")?,
                    last_updated: row.get::<_, i64>("last_updated") as u64,
                })
            })
            .transpose()
    }

    // ==================== ACTIVITY ====================

    async fn upsert_active_pool(&self, marker: &ActivePool) -> Result<()> {
        let client = self.pool.get().await?;
        let query = r#"
            INSERT INTO indexer.active_pools (chain_id, pool_address, last_swap_timestamp)
            VALUES ($1, $2, $3)
            ON CONFLICT (chain_id, pool_address) DO UPDATE SET
                last_swap_timestamp = GREATEST(
                    indexer.active_pools.last_swap_timestamp,
                    EXCLUDED.last_swap_timestamp
                )
        "#;

        client
            .execute(
                query,
                &[
                    &(marker.chain_id as i64),
                    &marker.pool_address,
                    &(marker.last_swap_timestamp as i64),
                ],
            )
            .await?;

        Ok(())
    }

    async fn active_pools_since(&self, chain_id: u64, since_ts: u64) -> Result<Vec<ActivePool>> {
        let client = self.pool.get().await?;
        let query = r#"
            SELECT chain_id, pool_address, last_swap_timestamp
            FROM indexer.active_pools
            WHERE chain_id = $1 AND last_swap_timestamp >= $2
            ORDER BY pool_address ASC
        "#;

        let rows = client.query(query, &[&(chain_id as i64), &(since_ts as i64)]).await?;

        Ok(rows
            .iter()
            .map(|row| ActivePool {
                chain_id: row.get::<_, i64>("chain_id") as u64,
                pool_address: row.get("pool_address"),
                last_swap_timestamp: row.get::<_, i64>("last_swap_timestamp") as u64,
            })
            .collect())
    }
}
