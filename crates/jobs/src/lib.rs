//! cinder-dns background jobs: cache maintenance, upstream health
//! probing, and periodic stats logging, coordinated by a JobRunner.
pub mod cache_maintenance;
pub mod health_probe;
pub mod runner;
pub mod stats;

pub use cache_maintenance::CacheMaintenanceJob;
pub use health_probe::HealthProbeJob;
pub use runner::JobRunner;
pub use stats::StatsJob;
