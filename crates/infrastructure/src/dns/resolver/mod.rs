mod cache_layer;
mod core;
mod dnssec_layer;
mod maintenance;

pub use cache_layer::{CachedResolver, PositiveTtlPolicy};
pub use core::ForwardingResolver;
pub use dnssec_layer::ValidatingResolver;
pub use maintenance::CacheMaintenance;
