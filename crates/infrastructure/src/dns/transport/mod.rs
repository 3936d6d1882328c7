mod https;

pub use https::HttpsTransport;

use async_trait::async_trait;
use cinder_dns_domain::DomainError;
use std::time::Duration;

/// Raw bytes returned by an upstream transport.
#[derive(Debug)]
pub struct TransportResponse {
    pub bytes: Vec<u8>,
}

/// A way to carry one DNS message to an upstream and bring back the
/// response bytes. Decoding is the caller's problem.
#[async_trait]
pub trait DnsTransport: Send + Sync {
    async fn send(
        &self,
        message_bytes: &[u8],
        timeout: Duration,
    ) -> Result<TransportResponse, DomainError>;
}
