/// Operational counters gathered across the server and cache.
#[derive(Debug, Clone, Default)]
pub struct StatsSnapshot {
    pub queries: u64,
    pub servfail_responses: u64,
    pub malformed_requests: u64,
    pub cache_size: usize,
    pub cache_hit_rate: f64,
}

/// Port for reading a point-in-time stats snapshot.
pub trait StatsReadout: Send + Sync {
    fn snapshot(&self) -> StatsSnapshot;
}
