//! Periodic background jobs.
//!
//! Swap handlers mark pools active; the scheduler sweeps recently-active
//! pools on a fixed interval and refreshes their USD-derived metrics, so a
//! pool whose reference price drifted does not keep stale figures just
//! because nobody swapped against it.

pub mod jobs;

use std::sync::Arc;

use anyhow::Result;
use log::{error, info};
use tokio_cron_scheduler::{Job, JobScheduler};
use tokio_util::sync::CancellationToken;

use crate::config::CronSettings;
use crate::reader::ChainReader;
use crate::store::models::ActivePool;
use crate::store::Store;

/// Record that a pool just saw a swap. The marker only ever moves forward.
pub async fn mark_active_pool(
    store: &dyn Store,
    chain_id: u64,
    pool_address: &str,
    last_swap_timestamp: u64,
) -> Result<()> {
    store
        .upsert_active_pool(&ActivePool {
            chain_id,
            pool_address: pool_address.to_string(),
            last_swap_timestamp,
        })
        .await
}

/// Cron scheduler that manages periodic background jobs.
pub struct CronScheduler {
    store: Arc<dyn Store>,
    reader: Arc<dyn ChainReader>,
    chain_id: u64,
    settings: CronSettings,
}

impl CronScheduler {
    pub fn new(
        store: Arc<dyn Store>,
        reader: Arc<dyn ChainReader>,
        chain_id: u64,
        settings: CronSettings,
    ) -> Self {
        Self {
            store,
            reader,
            chain_id,
            settings,
        }
    }

    /// Starts the cron scheduler and runs until cancellation.
    pub async fn run(&self, cancellation_token: CancellationToken) -> Result<()> {
        let mut scheduler = JobScheduler::new().await?;

        self.register_refresh_stale_metrics_job(&scheduler).await?;

        scheduler.start().await?;
        info!("Cron scheduler started");

        cancellation_token.cancelled().await;
        info!("Cron scheduler shutting down...");

        scheduler.shutdown().await?;
        Ok(())
    }

    async fn register_refresh_stale_metrics_job(&self, scheduler: &JobScheduler) -> Result<()> {
        let store = self.store.clone();
        let reader = self.reader.clone();
        let chain_id = self.chain_id;
        let window = self.settings.active_window_secs;
        let interval = self.settings.refresh_interval_secs;

        let job = Job::new_repeated_async(
            std::time::Duration::from_secs(interval),
            move |_uuid, _lock| {
                let store = store.clone();
                let reader = reader.clone();
                Box::pin(async move {
                    let now = chrono::Utc::now().timestamp() as u64;
                    if let Err(e) =
                        jobs::refresh_stale_metrics::run(&*store, &*reader, chain_id, window, now)
                            .await
                    {
                        error!("Failed to refresh stale metrics: {:#}", e);
                    }
                })
            },
        )?;

        scheduler.add(job).await?;
        info!("Registered refresh_stale_metrics job (every {}s)", interval);
        Ok(())
    }
}
