use alloy::primitives::U256;

/// Rolling daily volume accumulator for one pool.
///
/// Primary Key: (chain_id, pool_address, day_timestamp)
///
/// `day_timestamp` is the event timestamp floored to the day. Within a day
/// the row only ever grows; a new row starts when the timestamp crosses the
/// day boundary. Accumulation is deduplicated upstream by
/// (chain_id, tx_hash, log_index).
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct DailyVolume {
    pub chain_id: u64,
    pub pool_address: String,
    pub day_timestamp: u64,
    /// Accumulated USD volume, WAD-scaled.
    pub volume_usd: U256,
    pub last_updated: u64,
}
