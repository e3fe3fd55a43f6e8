//! Liquidity-pool event indexer core.
//!
//! Ingests pool creation and swap events from three AMM designs (constant
//! product pairs, concentrated-liquidity pools and the singleton pool
//! manager) into a normalized economic view per pool: spot price, USD
//! liquidity, market cap, rolling daily volume, 24h price change and
//! bonding-curve graduation progress.

pub mod abis;
pub mod config;
pub mod error;
pub mod indexer;
pub mod math;
pub mod oracle;
pub mod reader;
pub mod registry;
pub mod scheduler;
pub mod store;
pub mod timeseries;
pub mod utils;

pub use config::Settings;
pub use error::OracleError;
pub use indexer::Indexer;
pub use reader::{ChainReader, RpcReader};
pub use scheduler::CronScheduler;
pub use store::{PostgresStore, Store};
