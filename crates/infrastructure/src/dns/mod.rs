pub mod cache;
pub mod dnssec;
pub mod metrics;
pub mod resolver;
pub mod server;
pub mod transport;
pub mod upstream;
