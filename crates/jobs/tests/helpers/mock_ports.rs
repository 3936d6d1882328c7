use async_trait::async_trait;
use cinder_dns_application::ports::{
    CacheMaintenancePort, ProbeOutcome, RefreshOutcome, StatsReadout, StatsSnapshot, SweepOutcome,
    UpstreamHealthPort,
};
use cinder_dns_domain::DomainError;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;

pub struct MockCacheMaintenancePort {
    refresh_call_count: Arc<AtomicU64>,
    sweep_call_count: Arc<AtomicU64>,
    should_fail_refresh: Arc<RwLock<bool>>,
    should_fail_sweep: Arc<RwLock<bool>>,
    refresh_outcome: Arc<RwLock<RefreshOutcome>>,
    sweep_outcome: Arc<RwLock<SweepOutcome>>,
}

impl MockCacheMaintenancePort {
    pub fn new() -> Self {
        Self {
            refresh_call_count: Arc::new(AtomicU64::new(0)),
            sweep_call_count: Arc::new(AtomicU64::new(0)),
            should_fail_refresh: Arc::new(RwLock::new(false)),
            should_fail_sweep: Arc::new(RwLock::new(false)),
            refresh_outcome: Arc::new(RwLock::new(RefreshOutcome::default())),
            sweep_outcome: Arc::new(RwLock::new(SweepOutcome::default())),
        }
    }

    pub fn with_refresh_outcome(mut self, outcome: RefreshOutcome) -> Self {
        self.refresh_outcome = Arc::new(RwLock::new(outcome));
        self
    }

    pub fn with_sweep_outcome(mut self, outcome: SweepOutcome) -> Self {
        self.sweep_outcome = Arc::new(RwLock::new(outcome));
        self
    }

    pub fn refresh_call_count(&self) -> u64 {
        self.refresh_call_count.load(Ordering::Relaxed)
    }

    pub fn sweep_call_count(&self) -> u64 {
        self.sweep_call_count.load(Ordering::Relaxed)
    }

    pub async fn set_should_fail_refresh(&self, fail: bool) {
        *self.should_fail_refresh.write().await = fail;
    }

    pub async fn set_should_fail_sweep(&self, fail: bool) {
        *self.should_fail_sweep.write().await = fail;
    }
}

#[async_trait]
impl CacheMaintenancePort for MockCacheMaintenancePort {
    async fn run_refresh_cycle(&self) -> Result<RefreshOutcome, DomainError> {
        self.refresh_call_count.fetch_add(1, Ordering::Relaxed);
        if *self.should_fail_refresh.read().await {
            return Err(DomainError::IoError("mock refresh failure".into()));
        }
        Ok(self.refresh_outcome.read().await.clone())
    }

    async fn run_sweep_cycle(&self) -> Result<SweepOutcome, DomainError> {
        self.sweep_call_count.fetch_add(1, Ordering::Relaxed);
        if *self.should_fail_sweep.read().await {
            return Err(DomainError::IoError("mock sweep failure".into()));
        }
        Ok(self.sweep_outcome.read().await.clone())
    }
}

pub struct MockUpstreamHealthPort {
    probe_call_count: Arc<AtomicU64>,
    should_fail: Arc<RwLock<bool>>,
    outcome: Arc<RwLock<ProbeOutcome>>,
}

impl MockUpstreamHealthPort {
    pub fn new() -> Self {
        Self {
            probe_call_count: Arc::new(AtomicU64::new(0)),
            should_fail: Arc::new(RwLock::new(false)),
            outcome: Arc::new(RwLock::new(ProbeOutcome::default())),
        }
    }

    pub fn with_outcome(mut self, outcome: ProbeOutcome) -> Self {
        self.outcome = Arc::new(RwLock::new(outcome));
        self
    }

    pub fn probe_call_count(&self) -> u64 {
        self.probe_call_count.load(Ordering::Relaxed)
    }

    pub async fn set_should_fail(&self, fail: bool) {
        *self.should_fail.write().await = fail;
    }
}

#[async_trait]
impl UpstreamHealthPort for MockUpstreamHealthPort {
    async fn probe_cooled_down(&self) -> Result<ProbeOutcome, DomainError> {
        self.probe_call_count.fetch_add(1, Ordering::Relaxed);
        if *self.should_fail.read().await {
            return Err(DomainError::UpstreamUnavailable("mock probe failure".into()));
        }
        Ok(self.outcome.read().await.clone())
    }
}

pub struct MockStatsReadout {
    snapshot_call_count: Arc<AtomicU64>,
}

impl MockStatsReadout {
    pub fn new() -> Self {
        Self {
            snapshot_call_count: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn snapshot_call_count(&self) -> u64 {
        self.snapshot_call_count.load(Ordering::Relaxed)
    }
}

impl StatsReadout for MockStatsReadout {
    fn snapshot(&self) -> StatsSnapshot {
        self.snapshot_call_count.fetch_add(1, Ordering::Relaxed);
        StatsSnapshot {
            queries: 42,
            servfail_responses: 1,
            malformed_requests: 0,
            cache_size: 10,
            cache_hit_rate: 0.5,
        }
    }
}
