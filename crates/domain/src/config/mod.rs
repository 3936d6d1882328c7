mod dns;
mod errors;
mod logging;
mod root;
mod server;

pub use dns::{DnsConfig, DohMethod};
pub use errors::ConfigError;
pub use logging::LoggingConfig;
pub use root::{CliOverrides, Config};
pub use server::ServerConfig;
