use async_trait::async_trait;
use cinder_dns_domain::DomainError;

/// Outcome of a prefetch refresh cycle.
#[derive(Debug, Default, Clone)]
pub struct RefreshOutcome {
    pub candidates_found: usize,
    pub refreshed: usize,
    pub failed: usize,
    pub cache_size: usize,
}

/// Outcome of an expired-entry sweep.
#[derive(Debug, Default, Clone)]
pub struct SweepOutcome {
    pub entries_removed: usize,
    pub cache_size: usize,
}

/// Port for cache maintenance (prefetch refresh + expiry sweep).
#[async_trait]
pub trait CacheMaintenancePort: Send + Sync {
    /// Re-resolve entries whose remaining TTL fell below the prefetch
    /// threshold, before clients see a miss.
    async fn run_refresh_cycle(&self) -> Result<RefreshOutcome, DomainError>;

    /// Remove entries past their expiry to reclaim memory.
    async fn run_sweep_cycle(&self) -> Result<SweepOutcome, DomainError>;
}
