use alloy::primitives::U256;

/// Traded token row, one per contract per chain.
///
/// Primary Key: (chain_id, address)
///
/// `total_supply` is always sourced from a live contract read, never trusted
/// from event payloads. `is_promoted` is operator-curated and only mutated
/// through the admin surface, never by the event pipeline.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct Token {
    // Primary key
    pub chain_id: u64,
    pub address: String,

    // On-chain metadata (fetched once at creation)
    pub symbol: String,
    pub name: String,
    pub decimals: u8,
    pub creator_address: String,

    // Market state
    pub total_supply: U256,
    pub liquidity_usd: U256,
    pub market_cap_usd: U256,
    pub percent_day_change: f64,

    // Operator curation
    pub is_promoted: bool,

    // Activity tracking (unix seconds)
    pub first_seen_at: u64,
    pub last_seen_at: u64,
}

/// Partial merge applied by `update_token`, same last-writer-wins semantics
/// as [`super::PoolUpdate`]. Deliberately has no `is_promoted` field.
#[derive(Debug, Clone, Default)]
pub struct TokenUpdate {
    pub total_supply: Option<U256>,
    pub liquidity_usd: Option<U256>,
    pub market_cap_usd: Option<U256>,
    pub percent_day_change: Option<f64>,
    pub last_seen_at: Option<u64>,
}

impl Token {
    pub fn apply(&mut self, update: &TokenUpdate) {
        if let Some(v) = update.total_supply {
            self.total_supply = v;
        }
        if let Some(v) = update.liquidity_usd {
            self.liquidity_usd = v;
        }
        if let Some(v) = update.market_cap_usd {
            self.market_cap_usd = v;
        }
        if let Some(v) = update.percent_day_change {
            self.percent_day_change = v;
        }
        if let Some(v) = update.last_seen_at {
            self.last_seen_at = v;
        }
    }
}
