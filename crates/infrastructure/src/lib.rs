//! cinder-dns infrastructure layer: cache, DoH transport, upstream pool,
//! DNSSEC validation, resolver stack, and the wire-level request handler.
pub mod dns;

pub use dns::cache::{CacheMetricsSnapshot, NegativeTtlPolicy, ResolverCache};
pub use dns::dnssec::{DnssecValidator, TrustAnchorStore};
pub use dns::metrics::{ServerMetrics, ServerMetricsSnapshot, StatsCollector};
pub use dns::resolver::{
    CachedResolver, CacheMaintenance, ForwardingResolver, PositiveTtlPolicy, ValidatingResolver,
};
pub use dns::server::DnsRequestHandler;
pub use dns::upstream::{UpstreamPool, UpstreamProber};
