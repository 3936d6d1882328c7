use cinder_dns_application::ports::UpstreamHealthPort;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

const DEFAULT_PROBE_INTERVAL_SECS: u64 = 15;

/// Periodically re-probes unhealthy upstream endpoints whose cooldown
/// has elapsed so they rejoin the rotation without waiting for client
/// traffic.
pub struct HealthProbeJob {
    health: Arc<dyn UpstreamHealthPort>,
    probe_interval_secs: u64,
    shutdown: CancellationToken,
}

impl HealthProbeJob {
    pub fn new(health: Arc<dyn UpstreamHealthPort>) -> Self {
        Self {
            health,
            probe_interval_secs: DEFAULT_PROBE_INTERVAL_SECS,
            shutdown: CancellationToken::new(),
        }
    }

    pub fn with_interval(mut self, probe_secs: u64) -> Self {
        self.probe_interval_secs = probe_secs;
        self
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.shutdown = token;
        self
    }

    pub async fn start(self: Arc<Self>) {
        info!(
            interval_secs = self.probe_interval_secs,
            "Starting upstream health probe job"
        );

        let mut interval = tokio::time::interval(Duration::from_secs(self.probe_interval_secs));
        interval.tick().await;
        loop {
            tokio::select! {
                _ = self.shutdown.cancelled() => {
                    info!("HealthProbeJob: shutting down");
                    break;
                }
                _ = interval.tick() => {
                    match self.health.probe_cooled_down().await {
                        Ok(outcome) => {
                            if outcome.probed > 0 {
                                info!(
                                    probed = outcome.probed,
                                    recovered = outcome.recovered,
                                    still_unhealthy = outcome.still_unhealthy,
                                    "Upstream probe pass completed"
                                );
                            }
                        }
                        Err(e) => {
                            error!(error = %e, "Upstream probe pass failed");
                        }
                    }
                }
            }
        }
    }
}
