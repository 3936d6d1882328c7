use cinder_dns_application::ports::StatsReadout;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::info;

const DEFAULT_STATS_INTERVAL_SECS: u64 = 60;

/// Logs an operational stats line on an interval.
pub struct StatsJob {
    stats: Arc<dyn StatsReadout>,
    stats_interval_secs: u64,
    shutdown: CancellationToken,
}

impl StatsJob {
    pub fn new(stats: Arc<dyn StatsReadout>) -> Self {
        Self {
            stats,
            stats_interval_secs: DEFAULT_STATS_INTERVAL_SECS,
            shutdown: CancellationToken::new(),
        }
    }

    pub fn with_interval(mut self, stats_secs: u64) -> Self {
        self.stats_interval_secs = stats_secs;
        self
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.shutdown = token;
        self
    }

    pub async fn start(self: Arc<Self>) {
        let mut interval = tokio::time::interval(Duration::from_secs(self.stats_interval_secs));
        interval.tick().await;
        loop {
            tokio::select! {
                _ = self.shutdown.cancelled() => {
                    info!("StatsJob: shutting down");
                    break;
                }
                _ = interval.tick() => {
                    let snapshot = self.stats.snapshot();
                    info!(
                        queries = snapshot.queries,
                        servfail = snapshot.servfail_responses,
                        malformed = snapshot.malformed_requests,
                        cache_size = snapshot.cache_size,
                        cache_hit_rate = format!("{:.1}%", snapshot.cache_hit_rate * 100.0),
                        "Server stats"
                    );
                }
            }
        }
    }
}
