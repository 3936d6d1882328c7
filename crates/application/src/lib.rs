//! cinder-dns application layer: resolver ports and query dispatch.
pub mod ports;
pub mod use_cases;

pub use ports::{
    CacheMaintenancePort, DnsResolver, ProbeOutcome, RefreshOutcome, Resolution, StatsReadout,
    StatsSnapshot, SweepOutcome, UpstreamHealthPort,
};
pub use use_cases::HandleDnsQueryUseCase;
