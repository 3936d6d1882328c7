use thiserror::Error;

#[derive(Error, Debug, Clone)]
pub enum DomainError {
    #[error("Malformed DNS message: {0}")]
    MalformedMessage(String),

    #[error("No upstream endpoint produced a usable answer: {0}")]
    UpstreamUnavailable(String),

    #[error("DNSSEC validation returned Bogus: {0}")]
    ValidationBogus(String),

    #[error("Concurrent upstream forward ceiling reached")]
    CapacityExceeded,

    #[error("Query timeout")]
    QueryTimeout,

    #[error("Domain not found (NXDOMAIN)")]
    NxDomain,

    #[error("Invalid domain name: {0}")]
    InvalidDomainName(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("I/O error: {0}")]
    IoError(String),
}
