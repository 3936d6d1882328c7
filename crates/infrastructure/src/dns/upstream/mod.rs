mod health;
mod pool;
mod prober;

pub use health::{EndpointHealth, EndpointStatus};
pub use pool::{UpstreamEndpoint, UpstreamPool};
pub use prober::UpstreamProber;
