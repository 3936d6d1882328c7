use crate::dns::dnssec::DnssecValidator;
use async_trait::async_trait;
use cinder_dns_application::ports::{DnsResolver, Resolution};
use cinder_dns_domain::{DnssecStatus, DomainError, Question};
use std::sync::Arc;

/// Validation layer: stamps each upstream answer with its DNSSEC status
/// and refuses to hand Bogus answers up the stack.
pub struct ValidatingResolver {
    inner: Arc<dyn DnsResolver>,
    validator: DnssecValidator,
}

impl ValidatingResolver {
    pub fn new(inner: Arc<dyn DnsResolver>, validator: DnssecValidator) -> Self {
        Self { inner, validator }
    }
}

#[async_trait]
impl DnsResolver for ValidatingResolver {
    async fn resolve(&self, question: &Question) -> Result<Resolution, DomainError> {
        let mut resolution = self.inner.resolve(question).await?;

        // Cached answers keep the status assigned when they were stored.
        if resolution.cache_hit {
            return Ok(resolution);
        }

        let status = self.validator.validate(&resolution.message);
        if status == DnssecStatus::Bogus {
            return Err(DomainError::ValidationBogus(format!(
                "Validation failed for {}",
                question.name
            )));
        }
        resolution.dnssec_status = status;
        Ok(resolution)
    }

    fn try_cache(&self, question: &Question) -> Option<Resolution> {
        self.inner.try_cache(question)
    }
}
