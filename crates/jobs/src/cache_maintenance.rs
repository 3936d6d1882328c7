use cinder_dns_application::ports::CacheMaintenancePort;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

const DEFAULT_REFRESH_INTERVAL_SECS: u64 = 30;
const DEFAULT_SWEEP_INTERVAL_SECS: u64 = 300;

/// Two loops over the cache maintenance port: a prefetch refresh cycle
/// and an expired-entry sweep, each on its own interval.
pub struct CacheMaintenanceJob {
    maintenance: Arc<dyn CacheMaintenancePort>,
    refresh_interval_secs: u64,
    sweep_interval_secs: u64,
    shutdown: CancellationToken,
}

impl CacheMaintenanceJob {
    pub fn new(maintenance: Arc<dyn CacheMaintenancePort>) -> Self {
        Self {
            maintenance,
            refresh_interval_secs: DEFAULT_REFRESH_INTERVAL_SECS,
            sweep_interval_secs: DEFAULT_SWEEP_INTERVAL_SECS,
            shutdown: CancellationToken::new(),
        }
    }

    pub fn with_intervals(mut self, refresh_secs: u64, sweep_secs: u64) -> Self {
        self.refresh_interval_secs = refresh_secs;
        self.sweep_interval_secs = sweep_secs;
        self
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.shutdown = token;
        self
    }

    pub async fn start(self: Arc<Self>) {
        info!("Starting cache maintenance jobs");

        let refresh_job = Arc::clone(&self);
        let refresh_shutdown = self.shutdown.clone();
        tokio::spawn(async move {
            let mut interval =
                tokio::time::interval(Duration::from_secs(refresh_job.refresh_interval_secs));
            interval.tick().await;
            loop {
                tokio::select! {
                    _ = refresh_shutdown.cancelled() => {
                        info!("CacheMaintenanceJob (refresh): shutting down");
                        break;
                    }
                    _ = interval.tick() => {
                        match refresh_job.maintenance.run_refresh_cycle().await {
                            Ok(outcome) => {
                                if outcome.candidates_found > 0 {
                                    info!(
                                        candidates = outcome.candidates_found,
                                        refreshed = outcome.refreshed,
                                        failed = outcome.failed,
                                        cache_size = outcome.cache_size,
                                        "Prefetch refresh cycle completed"
                                    );
                                }
                            }
                            Err(e) => {
                                error!(error = %e, "Prefetch refresh cycle failed");
                            }
                        }
                    }
                }
            }
        });

        let sweep_job = Arc::clone(&self);
        let sweep_shutdown = self.shutdown.clone();
        tokio::spawn(async move {
            let mut interval =
                tokio::time::interval(Duration::from_secs(sweep_job.sweep_interval_secs));
            interval.tick().await;
            loop {
                tokio::select! {
                    _ = sweep_shutdown.cancelled() => {
                        info!("CacheMaintenanceJob (sweep): shutting down");
                        break;
                    }
                    _ = interval.tick() => {
                        match sweep_job.maintenance.run_sweep_cycle().await {
                            Ok(outcome) => {
                                if outcome.entries_removed > 0 {
                                    info!(
                                        entries_removed = outcome.entries_removed,
                                        cache_size = outcome.cache_size,
                                        "Cache sweep completed"
                                    );
                                }
                            }
                            Err(e) => {
                                error!(error = %e, "Cache sweep failed");
                            }
                        }
                    }
                }
            }
        });
    }
}
