mod cache_maintenance;
mod dns_resolver;
mod stats;
mod upstream_health;

pub use cache_maintenance::{CacheMaintenancePort, RefreshOutcome, SweepOutcome};
pub use dns_resolver::{DnsResolver, Resolution};
pub use stats::{StatsReadout, StatsSnapshot};
pub use upstream_health::{ProbeOutcome, UpstreamHealthPort};
