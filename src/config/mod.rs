mod config;

pub use config::{ChainSettings, CronSettings, PostgresSettings, Settings};
