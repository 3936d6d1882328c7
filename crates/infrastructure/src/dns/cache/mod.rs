mod entry;
mod key;
mod metrics;
mod negative;
mod storage;

pub use entry::CacheEntry;
pub use key::CacheKey;
pub use metrics::{CacheMetrics, CacheMetricsSnapshot};
pub use negative::NegativeTtlPolicy;
pub use storage::ResolverCache;
