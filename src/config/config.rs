use config::{Config, ConfigError, File};
use serde::Deserialize;

/// PostgreSQL database connection configuration.
///
/// Used for storing pools, tokens, price buckets, daily volumes, active-pool
/// markers, and the reference-price table written by the oracle feed.
#[derive(Debug, Deserialize, Clone)]
pub struct PostgresSettings {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub database: String,
    #[serde(default = "default_pool_size")]
    pub pool_size: usize,
}

fn default_pool_size() -> usize {
    16
}

/// Per-chain contract address table.
///
/// Creation events are dispatched by the emitting contract, so the parser
/// needs the initializer addresses; the V4 path additionally needs the
/// singleton manager's state-view accessor.
#[derive(Debug, Deserialize, Clone)]
pub struct ChainSettings {
    pub chain_id: u64,
    pub rpc_url: String,
    pub v2_initializer: String,
    pub v3_initializer: String,
    pub v4_initializer: String,
    pub state_view: String,
}

/// Configuration for periodic background jobs.
#[derive(Debug, Deserialize, Clone)]
pub struct CronSettings {
    /// Interval for refreshing stale derived metrics on active pools.
    #[serde(default = "default_refresh_interval_secs")]
    pub refresh_interval_secs: u64,
    /// How far back a pool's last swap may be to count as active.
    #[serde(default = "default_active_window_secs")]
    pub active_window_secs: u64,
}

impl Default for CronSettings {
    fn default() -> Self {
        Self {
            refresh_interval_secs: default_refresh_interval_secs(),
            active_window_secs: default_active_window_secs(),
        }
    }
}

fn default_refresh_interval_secs() -> u64 {
    300 // 5 minutes, one oracle bucket
}

fn default_active_window_secs() -> u64 {
    86_400
}

/// Root application configuration, loaded from `config.yaml` at startup.
#[derive(Debug, Deserialize, Clone)]
pub struct Settings {
    pub postgres: PostgresSettings,
    pub chain: ChainSettings,
    #[serde(default)]
    pub cron: Option<CronSettings>,
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        let s = Config::builder()
            .add_source(File::with_name("config"))
            .build()?;

        let settings: Settings = s.try_deserialize()?;

        Ok(settings)
    }
}
