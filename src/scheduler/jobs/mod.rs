pub mod refresh_stale_metrics;
