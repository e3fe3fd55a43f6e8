use alloy::primitives::U256;

/// AMM design the pool belongs to. Closed set: dispatch over versions is an
/// enum match, never open-ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum PoolType {
    V2,
    V3,
    V4,
}

impl PoolType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PoolType::V2 => "v2",
            PoolType::V3 => "v3",
            PoolType::V4 => "v4",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "v2" => Some(PoolType::V2),
            "v3" => Some(PoolType::V3),
            "v4" => Some(PoolType::V4),
            _ => None,
        }
    }
}

/// Canonical pool row, one per on-chain pool contract.
///
/// Primary Key: (chain_id, address)
///
/// For V4 the hook address stands in for the pool address and `pool_id`
/// carries the manager's keccak pool key hash. `asset`, `numeraire`,
/// `pool_type`, `is_token0`, `pool_id` and `created_at` are immutable after
/// creation; everything else is refreshed by the event pipeline.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct Pool {
    // Primary key
    pub chain_id: u64,
    pub address: String,

    // Economic roles (immutable)
    pub asset: String,
    pub numeraire: String,
    pub pool_type: PoolType,
    /// True iff the asset is token0, i.e. has the numerically smaller
    /// contract address of the pair. The single fact that lets every
    /// downstream formula treat asset vs. quote uniformly.
    pub is_token0: bool,
    /// V4 pool key hash (hex), None for V2/V3.
    pub pool_id: Option<String>,
    pub fee: u32,

    // Raw AMM state
    /// Asset price in quote terms, WAD-scaled.
    pub price: U256,
    pub liquidity: U256,
    pub sqrt_price_x96: Option<U256>,
    pub tick: Option<i32>,
    pub asset_reserve: U256,
    pub quote_reserve: U256,

    // Derived USD metrics (WAD-scaled)
    pub dollar_liquidity: U256,
    pub market_cap_usd: U256,
    pub volume_usd: U256,
    pub percent_day_change: f64,

    // Bonding-curve graduation progress
    pub graduation_balance: U256,
    pub graduation_threshold: U256,
    pub graduation_percentage: f64,

    // Fee accumulators (raw token units)
    pub total_fee0: U256,
    pub total_fee1: U256,

    // Timestamps (unix seconds)
    pub created_at: u64,
    pub last_refreshed: Option<u64>,
    pub last_swap_timestamp: Option<u64>,
}

/// Partial merge applied by `update_pool`: `Some` fields overwrite, `None`
/// fields are left alone. Field-level conflicts between concurrent in-flight
/// events resolve by commit order (accepted eventual-consistency trade-off,
/// not a guarantee of event-order precedence).
#[derive(Debug, Clone, Default)]
pub struct PoolUpdate {
    pub price: Option<U256>,
    pub liquidity: Option<U256>,
    pub sqrt_price_x96: Option<U256>,
    pub tick: Option<i32>,
    pub asset_reserve: Option<U256>,
    pub quote_reserve: Option<U256>,
    pub dollar_liquidity: Option<U256>,
    pub market_cap_usd: Option<U256>,
    pub volume_usd: Option<U256>,
    pub percent_day_change: Option<f64>,
    pub graduation_balance: Option<U256>,
    pub graduation_threshold: Option<U256>,
    pub graduation_percentage: Option<f64>,
    pub total_fee0: Option<U256>,
    pub total_fee1: Option<U256>,
    pub last_refreshed: Option<u64>,
    pub last_swap_timestamp: Option<u64>,
}

impl Pool {
    /// Apply a partial update, last writer wins per field.
    pub fn apply(&mut self, update: &PoolUpdate) {
        if let Some(v) = update.price {
            self.price = v;
        }
        if let Some(v) = update.liquidity {
            self.liquidity = v;
        }
        if let Some(v) = update.sqrt_price_x96 {
            self.sqrt_price_x96 = Some(v);
        }
        if let Some(v) = update.tick {
            self.tick = Some(v);
        }
        if let Some(v) = update.asset_reserve {
            self.asset_reserve = v;
        }
        if let Some(v) = update.quote_reserve {
            self.quote_reserve = v;
        }
        if let Some(v) = update.dollar_liquidity {
            self.dollar_liquidity = v;
        }
        if let Some(v) = update.market_cap_usd {
            self.market_cap_usd = v;
        }
        if let Some(v) = update.volume_usd {
            self.volume_usd = v;
        }
        if let Some(v) = update.percent_day_change {
            self.percent_day_change = v;
        }
        if let Some(v) = update.graduation_balance {
            self.graduation_balance = v;
        }
        if let Some(v) = update.graduation_threshold {
            self.graduation_threshold = v;
        }
        if let Some(v) = update.graduation_percentage {
            self.graduation_percentage = v;
        }
        if let Some(v) = update.total_fee0 {
            self.total_fee0 = v;
        }
        if let Some(v) = update.total_fee1 {
            self.total_fee1 = v;
        }
        if let Some(v) = update.last_refreshed {
            self.last_refreshed = Some(v);
        }
        if let Some(v) = update.last_swap_timestamp {
            self.last_swap_timestamp = Some(v);
        }
    }
}
