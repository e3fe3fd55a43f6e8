use alloy::primitives::U256;

/// Discretized price history point for one pool.
///
/// Primary Key: (chain_id, pool_address, bucket_timestamp)
///
/// `bucket_timestamp` is the event timestamp floored to the bucket interval.
/// The row for the current interval is overwritten in place as swaps arrive,
/// so the stored values are closing-of-interval figures, not averages.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct PriceBucket {
    pub chain_id: u64,
    pub pool_address: String,
    pub bucket_timestamp: u64,
    /// Closing asset price in quote terms, WAD-scaled.
    pub close_price: U256,
    /// Closing asset price in USD, WAD-scaled.
    pub close_usd: U256,
    /// Market cap observed at the last write within the interval; the 24h
    /// change query compares against this.
    pub market_cap_usd: U256,
}
