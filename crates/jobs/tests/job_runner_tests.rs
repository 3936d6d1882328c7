use cinder_dns_jobs::{CacheMaintenanceJob, HealthProbeJob, JobRunner, StatsJob};
use std::sync::Arc;
use tokio::time::{sleep, Duration};
use tokio_util::sync::CancellationToken;

mod helpers;
use helpers::{MockCacheMaintenancePort, MockStatsReadout, MockUpstreamHealthPort};

#[tokio::test]
async fn test_job_runner_empty_starts_cleanly() {
    JobRunner::new().start().await;
}

#[tokio::test]
async fn test_job_runner_with_only_cache_maintenance() {
    let mock = Arc::new(MockCacheMaintenancePort::new());
    let job = CacheMaintenanceJob::new(mock);

    JobRunner::new().with_cache_maintenance(job).start().await;
    sleep(Duration::from_millis(10)).await;
}

#[tokio::test]
async fn test_job_runner_with_all_jobs() {
    let maintenance = Arc::new(MockCacheMaintenancePort::new());
    let health = Arc::new(MockUpstreamHealthPort::new());
    let stats = Arc::new(MockStatsReadout::new());

    JobRunner::new()
        .with_cache_maintenance(CacheMaintenanceJob::new(maintenance))
        .with_health_probe(HealthProbeJob::new(health))
        .with_stats(StatsJob::new(stats))
        .start()
        .await;

    sleep(Duration::from_millis(10)).await;
}

#[tokio::test]
async fn test_job_runner_health_probe_fires() {
    let health = Arc::new(MockUpstreamHealthPort::new());
    let job = HealthProbeJob::new(health.clone()).with_interval(1);

    JobRunner::new().with_health_probe(job).start().await;

    sleep(Duration::from_millis(1100)).await;

    assert!(health.probe_call_count() >= 1);
}

#[tokio::test]
async fn test_job_runner_health_probe_error_is_non_fatal() {
    let health = Arc::new(MockUpstreamHealthPort::new());
    health.set_should_fail(true).await;

    let job = HealthProbeJob::new(health.clone()).with_interval(1);

    JobRunner::new().with_health_probe(job).start().await;

    sleep(Duration::from_millis(2200)).await;

    assert!(
        health.probe_call_count() >= 2,
        "Job should continue running after probe errors"
    );
}

#[tokio::test]
async fn test_job_runner_stats_fires() {
    let stats = Arc::new(MockStatsReadout::new());
    let job = StatsJob::new(stats.clone()).with_interval(1);

    JobRunner::new().with_stats(job).start().await;

    sleep(Duration::from_millis(1100)).await;

    assert!(stats.snapshot_call_count() >= 1);
}

#[tokio::test]
async fn test_job_runner_shutdown_token_stops_all_jobs() {
    let maintenance = Arc::new(MockCacheMaintenancePort::new());
    let health = Arc::new(MockUpstreamHealthPort::new());
    let token = CancellationToken::new();

    JobRunner::new()
        .with_cache_maintenance(CacheMaintenanceJob::new(maintenance.clone()).with_intervals(1, 1))
        .with_health_probe(HealthProbeJob::new(health.clone()).with_interval(1))
        .with_shutdown_token(token.clone())
        .start()
        .await;

    sleep(Duration::from_millis(1100)).await;
    assert!(maintenance.refresh_call_count() >= 1);
    assert!(health.probe_call_count() >= 1);

    token.cancel();
    sleep(Duration::from_millis(100)).await;

    let refresh_after = maintenance.refresh_call_count();
    let probe_after = health.probe_call_count();
    sleep(Duration::from_millis(1100)).await;

    assert_eq!(maintenance.refresh_call_count(), refresh_after);
    assert_eq!(health.probe_call_count(), probe_after);
}

#[tokio::test]
async fn test_job_runner_builder_is_chainable() {
    let maintenance = Arc::new(MockCacheMaintenancePort::new());
    let stats = Arc::new(MockStatsReadout::new());

    let runner = JobRunner::new()
        .with_cache_maintenance(CacheMaintenanceJob::new(maintenance))
        .with_stats(StatsJob::new(stats));

    runner.start().await;
}
