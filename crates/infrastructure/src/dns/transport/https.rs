//! DNS-over-HTTPS transport (RFC 8484).
//!
//! POST carries the raw DNS message as the request body with the
//! `application/dns-message` content type; GET carries it in a
//! `?dns=<base64url>` query parameter (no padding). Either way the
//! response body is a raw DNS message.

use super::{DnsTransport, TransportResponse};
use async_trait::async_trait;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use cinder_dns_domain::{DohMethod, DomainError};
use std::time::Duration;
use tracing::debug;

/// Expected media type for DoH requests and responses (RFC 8484 §6).
const DNS_MESSAGE_CONTENT_TYPE: &str = "application/dns-message";

pub struct HttpsTransport {
    url: String,
    method: DohMethod,
    client: reqwest::Client,
}

impl HttpsTransport {
    pub fn new(url: String, method: DohMethod) -> Result<Self, DomainError> {
        let client = reqwest::Client::builder()
            .use_rustls_tls()
            .timeout(Duration::from_secs(10))
            .pool_max_idle_per_host(4)
            .build()
            .map_err(|e| DomainError::ConfigError(format!("HTTP client init failed: {}", e)))?;
        Ok(Self {
            url,
            method,
            client,
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl DnsTransport for HttpsTransport {
    async fn send(
        &self,
        message_bytes: &[u8],
        timeout: Duration,
    ) -> Result<TransportResponse, DomainError> {
        debug!(
            url = %self.url,
            method = %self.method.as_str(),
            message_len = message_bytes.len(),
            "Sending DoH query"
        );

        let request = match self.method {
            DohMethod::Post => self
                .client
                .post(&self.url)
                .header("Content-Type", DNS_MESSAGE_CONTENT_TYPE)
                .header("Accept", DNS_MESSAGE_CONTENT_TYPE)
                .body(message_bytes.to_vec()),
            DohMethod::Get => self
                .client
                .get(&self.url)
                .header("Accept", DNS_MESSAGE_CONTENT_TYPE)
                .query(&[("dns", URL_SAFE_NO_PAD.encode(message_bytes))]),
        };

        let response = tokio::time::timeout(timeout, request.send())
            .await
            .map_err(|_| {
                DomainError::UpstreamUnavailable(format!("Timeout sending to {}", self.url))
            })?
            .map_err(|e| {
                DomainError::UpstreamUnavailable(format!("Request to {} failed: {}", self.url, e))
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(DomainError::UpstreamUnavailable(format!(
                "{} returned HTTP {}",
                self.url,
                status.as_u16()
            )));
        }

        let body = tokio::time::timeout(timeout, response.bytes())
            .await
            .map_err(|_| {
                DomainError::UpstreamUnavailable(format!("Timeout reading body from {}", self.url))
            })?
            .map_err(|e| {
                DomainError::UpstreamUnavailable(format!(
                    "Failed reading body from {}: {}",
                    self.url, e
                ))
            })?;

        debug!(url = %self.url, response_len = body.len(), "DoH response received");

        Ok(TransportResponse {
            bytes: body.to_vec(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn construction_keeps_url() {
        let transport =
            HttpsTransport::new("https://dns.google/dns-query".to_string(), DohMethod::Post)
                .unwrap();
        assert_eq!(transport.url(), "https://dns.google/dns-query");
    }

    #[test]
    fn get_query_parameter_is_base64url_without_padding() {
        // 13-byte input would need padding in plain base64.
        let bytes = [0u8, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12];
        let encoded = URL_SAFE_NO_PAD.encode(bytes);
        assert!(!encoded.contains('='));
        assert!(!encoded.contains('+'));
        assert!(!encoded.contains('/'));
    }
}
