use async_trait::async_trait;
use cinder_dns_domain::DomainError;

/// Outcome of one upstream re-probe pass.
#[derive(Debug, Default, Clone)]
pub struct ProbeOutcome {
    pub probed: usize,
    pub recovered: usize,
    pub still_unhealthy: usize,
}

/// Port for probing unhealthy upstream endpoints after their cooldown.
#[async_trait]
pub trait UpstreamHealthPort: Send + Sync {
    async fn probe_cooled_down(&self) -> Result<ProbeOutcome, DomainError>;
}
