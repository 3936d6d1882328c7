use serde::{Deserialize, Serialize};

use super::dns::DnsConfig;
use super::errors::ConfigError;
use super::logging::LoggingConfig;
use super::server::ServerConfig;

/// Main configuration for cinder-dns.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub dns: DnsConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from file or use defaults.
    ///
    /// Priority order:
    /// 1. Explicitly provided path
    /// 2. cinder-dns.toml in the current directory
    /// 3. /etc/cinder-dns/config.toml
    /// 4. Default configuration
    pub fn load(path: Option<&str>, cli_overrides: CliOverrides) -> Result<Self, ConfigError> {
        let mut config = if let Some(path) = path {
            Self::from_file(path)?
        } else if std::path::Path::new("cinder-dns.toml").exists() {
            Self::from_file("cinder-dns.toml")?
        } else if std::path::Path::new("/etc/cinder-dns/config.toml").exists() {
            Self::from_file("/etc/cinder-dns/config.toml")?
        } else {
            Self::default()
        };

        config.apply_cli_overrides(cli_overrides);
        Ok(config)
    }

    fn from_file(path: &str) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::FileRead(path.to_string(), e.to_string()))?;
        toml::from_str(&contents).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    fn apply_cli_overrides(&mut self, overrides: CliOverrides) {
        if let Some(port) = overrides.dns_port {
            self.server.dns_port = port;
        }
        if let Some(bind) = overrides.bind_address {
            self.server.bind_address = bind;
        }
        if let Some(upstreams) = overrides.upstream_urls {
            self.dns.upstream_urls = upstreams;
        }
        if let Some(level) = overrides.log_level {
            self.logging.level = level;
        }
    }

    /// Startup validation. The only fatal errors in the system live here.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.dns_port == 0 {
            return Err(ConfigError::Validation("DNS port cannot be 0".to_string()));
        }

        if self.server.bind_address.parse::<std::net::IpAddr>().is_err() {
            return Err(ConfigError::Validation(format!(
                "Invalid bind address '{}'",
                self.server.bind_address
            )));
        }

        if self.dns.upstream_urls.is_empty() {
            return Err(ConfigError::Validation(
                "No upstream DoH endpoint configured".to_string(),
            ));
        }

        for url in &self.dns.upstream_urls {
            if !url.starts_with("https://") {
                return Err(ConfigError::Validation(format!(
                    "Upstream endpoint '{}' is not an https:// URL",
                    url
                )));
            }
        }

        if !(0.0..1.0).contains(&self.dns.prefetch_fraction) {
            return Err(ConfigError::Validation(format!(
                "prefetch_fraction {} must be in [0, 1)",
                self.dns.prefetch_fraction
            )));
        }

        if self.dns.min_ttl > self.dns.max_ttl {
            return Err(ConfigError::Validation(
                "min_ttl exceeds max_ttl".to_string(),
            ));
        }

        if self.dns.max_inflight_forwards == 0 {
            return Err(ConfigError::Validation(
                "max_inflight_forwards cannot be 0".to_string(),
            ));
        }

        Ok(())
    }
}

/// Command-line overrides for configuration.
#[derive(Debug, Default)]
pub struct CliOverrides {
    pub dns_port: Option<u16>,
    pub bind_address: Option<String>,
    pub upstream_urls: Option<Vec<String>>,
    pub log_level: Option<String>,
}
