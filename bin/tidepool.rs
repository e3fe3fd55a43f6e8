use std::sync::Arc;

use alloy::primitives::Address;
use anyhow::Context;
use jemallocator::Jemalloc;
use log::{error, info, LevelFilter};
use simple_logger::SimpleLogger;
use tokio_util::sync::CancellationToken;

#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

use tidepool::{CronScheduler, PostgresStore, RpcReader, Settings};

#[tokio::main()]
async fn main() -> anyhow::Result<()> {
    SimpleLogger::new()
        .with_level(LevelFilter::Info)
        .init()
        .unwrap();

    // Load configuration
    let settings = Settings::new()
        .context("Failed to load config.yaml. Please ensure it exists and is valid")?;

    let cancellation_token = CancellationToken::new();

    let store = PostgresStore::new(settings.postgres.clone())
        .await
        .context("Failed to initialize database connection")?;
    store.migrate().await.context("Failed to run database migrations")?;

    let store: Arc<dyn tidepool::Store> = Arc::new(store);

    let state_view = settings
        .chain
        .state_view
        .parse::<Address>()
        .context("Invalid state_view address in config")?;
    let reader: Arc<dyn tidepool::ChainReader> =
        Arc::new(RpcReader::new(&settings.chain.rpc_url, state_view)?);

    // Create and spawn cron scheduler for background jobs
    // (stale metric refresh on recently active pools)
    let cron_scheduler = CronScheduler::new(
        store.clone(),
        reader.clone(),
        settings.chain.chain_id,
        settings.cron.clone().unwrap_or_default(),
    );

    let cron_token = cancellation_token.child_token();
    let cron_handle = tokio::spawn(async move {
        if let Err(e) = cron_scheduler.run(cron_token).await {
            error!("Cron scheduler failed: {:#}", e);
        }
    });

    #[cfg(unix)]
    let mut sigterm_stream = {
        use tokio::signal::unix::{signal, SignalKind};
        signal(SignalKind::terminate()).context("Failed to install SIGTERM handler")?
    };

    info!("Indexer running. Press Ctrl+C to stop.");

    #[cfg(unix)]
    {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("Received shutdown signal (Ctrl+C), exiting gracefully...");
            },
            _ = sigterm_stream.recv() => {
                info!("Received SIGTERM, exiting gracefully...");
            },
        };
    }

    #[cfg(not(unix))]
    {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("Received shutdown signal (Ctrl+C), exiting gracefully...");
            },
        };
    }

    info!("Finishing all tasks...");

    cancellation_token.cancel();

    info!("Waiting for cron scheduler to stop...");
    let _ = cron_handle.await;

    info!("All tasks stopped");
    Ok(())
}
