use super::health::EndpointHealth;
use crate::dns::transport::{DnsTransport, HttpsTransport};
use cinder_dns_domain::wire::{decode_message, encode_message};
use cinder_dns_domain::{DohMethod, DomainError, Message, Question};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

pub struct UpstreamEndpoint {
    pub url: Arc<str>,
    pub transport: Arc<dyn DnsTransport>,
    pub health: EndpointHealth,
}

impl UpstreamEndpoint {
    pub fn new(
        url: Arc<str>,
        transport: Arc<dyn DnsTransport>,
        failure_threshold: u32,
        cooldown: Duration,
    ) -> Self {
        Self {
            url,
            transport,
            health: EndpointHealth::new(failure_threshold, cooldown),
        }
    }
}

/// Ordered failover over DoH endpoints with per-endpoint health.
///
/// A response only counts if it decodes and its id matches the query id;
/// anything else is an endpoint failure and the next endpoint is tried.
pub struct UpstreamPool {
    endpoints: Vec<Arc<UpstreamEndpoint>>,
    query_timeout: Duration,
}

impl UpstreamPool {
    pub fn new(
        urls: &[String],
        method: DohMethod,
        query_timeout: Duration,
        failure_threshold: u32,
        cooldown: Duration,
    ) -> Result<Self, DomainError> {
        let mut endpoints = Vec::with_capacity(urls.len());
        for url in urls {
            let transport = HttpsTransport::new(url.clone(), method)?;
            endpoints.push(Arc::new(UpstreamEndpoint::new(
                Arc::from(url.as_str()),
                Arc::new(transport),
                failure_threshold,
                cooldown,
            )));
        }
        Ok(Self {
            endpoints,
            query_timeout,
        })
    }

    /// For tests and custom wiring: a pool over prebuilt endpoints.
    pub fn with_endpoints(endpoints: Vec<Arc<UpstreamEndpoint>>, query_timeout: Duration) -> Self {
        Self {
            endpoints,
            query_timeout,
        }
    }

    pub fn endpoints(&self) -> &[Arc<UpstreamEndpoint>] {
        &self.endpoints
    }

    /// Resolve one question upstream. Returns the decoded response and
    /// the endpoint that produced it.
    pub async fn forward(&self, question: &Question) -> Result<(Message, Arc<str>), DomainError> {
        let id = fastrand::u16(..);
        let query = Message::query(id, question.name.clone(), question.rtype);
        let query_bytes = encode_message(&query)?;

        let available: Vec<&Arc<UpstreamEndpoint>> = self
            .endpoints
            .iter()
            .filter(|e| e.health.is_available())
            .collect();
        // With every endpoint in cooldown there is nothing to lose by
        // trying them all anyway.
        let candidates: Vec<&Arc<UpstreamEndpoint>> = if available.is_empty() {
            self.endpoints.iter().collect()
        } else {
            available
        };

        let mut last_error = String::from("no upstream endpoints configured");
        for endpoint in candidates {
            match self.try_endpoint(endpoint, &query_bytes, id).await {
                Ok(response) => {
                    endpoint.health.record_success(&endpoint.url);
                    return Ok((response, Arc::clone(&endpoint.url)));
                }
                Err(error) => {
                    let text = error.to_string();
                    endpoint.health.record_failure(&endpoint.url, &text);
                    warn!(
                        endpoint = %endpoint.url,
                        domain = %question.name,
                        error = %text,
                        "Upstream attempt failed"
                    );
                    last_error = text;
                }
            }
        }

        Err(DomainError::UpstreamUnavailable(last_error))
    }

    async fn try_endpoint(
        &self,
        endpoint: &UpstreamEndpoint,
        query_bytes: &[u8],
        id: u16,
    ) -> Result<Message, DomainError> {
        let response = endpoint
            .transport
            .send(query_bytes, self.query_timeout)
            .await?;
        let message = decode_message(&response.bytes).map_err(|e| {
            DomainError::UpstreamUnavailable(format!("Undecodable response: {}", e))
        })?;

        if message.header.id != id {
            return Err(DomainError::UpstreamUnavailable(format!(
                "Response id {:#06x} does not match query id {:#06x}",
                message.header.id, id
            )));
        }
        if !message.header.response {
            return Err(DomainError::UpstreamUnavailable(
                "Response bit not set".to_string(),
            ));
        }

        debug!(
            endpoint = %endpoint.url,
            rcode = %message.header.rcode,
            answers = message.answers.len(),
            "Upstream response"
        );
        Ok(message)
    }
}
