/// Lightweight marker consumed by the periodic stale-metrics sweep.
///
/// Primary Key: (chain_id, pool_address)
///
/// Upserted on every swap, never deleted by this core.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct ActivePool {
    pub chain_id: u64,
    pub pool_address: String,
    pub last_swap_timestamp: u64,
}
