use crate::dns::upstream::UpstreamPool;
use async_trait::async_trait;
use cinder_dns_application::ports::{DnsResolver, Resolution};
use cinder_dns_domain::{DnssecStatus, DomainError, Question};
use std::sync::Arc;

/// The bottom of the resolver stack: forwards every question to the
/// upstream pool. Upstream rcodes (including SERVFAIL) pass through as
/// answers; transport-level failures surface as errors.
pub struct ForwardingResolver {
    pool: Arc<UpstreamPool>,
}

impl ForwardingResolver {
    pub fn new(pool: Arc<UpstreamPool>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl DnsResolver for ForwardingResolver {
    async fn resolve(&self, question: &Question) -> Result<Resolution, DomainError> {
        let (message, url) = self.pool.forward(question).await?;
        Ok(Resolution::upstream(
            Arc::new(message),
            DnssecStatus::Unknown,
            url,
        ))
    }
}
