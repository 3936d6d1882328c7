use crate::dns::metrics::ServerMetrics;
use cinder_dns_application::HandleDnsQueryUseCase;
use cinder_dns_domain::wire::{decode_message, encode_response_limited, HEADER_LEN};
use cinder_dns_domain::{Header, Message, Opcode, Rcode};
use std::sync::Arc;
use tracing::{debug, warn};

/// Wire-level request handler shared by the UDP and TCP listeners:
/// decode, dispatch, encode. A well-formed query always gets a reply;
/// undecodable datagrams get FORMERR when the header id is readable and
/// are dropped otherwise.
pub struct DnsRequestHandler {
    use_case: Arc<HandleDnsQueryUseCase>,
    metrics: Arc<ServerMetrics>,
}

impl DnsRequestHandler {
    pub fn new(use_case: Arc<HandleDnsQueryUseCase>, metrics: Arc<ServerMetrics>) -> Self {
        Self { use_case, metrics }
    }

    pub fn metrics(&self) -> Arc<ServerMetrics> {
        Arc::clone(&self.metrics)
    }

    /// `max_response_len` is 512 for UDP (oversized answers are truncated
    /// with TC set) and 65535 for TCP.
    pub async fn handle(&self, request_bytes: &[u8], max_response_len: usize) -> Option<Vec<u8>> {
        let request = match decode_message(request_bytes) {
            Ok(request) => request,
            Err(error) => {
                self.metrics.record_malformed();
                debug!(error = %error, len = request_bytes.len(), "Malformed request");
                return self.formerr_for_garbage(request_bytes, max_response_len);
            }
        };

        self.metrics.record_query();
        let response = self.use_case.execute(&request).await;
        self.metrics.record_response(response.header.rcode);

        match encode_response_limited(&response, max_response_len) {
            Ok(bytes) => Some(bytes),
            Err(error) => {
                warn!(error = %error, "Failed to encode response");
                None
            }
        }
    }

    /// The request didn't decode, but if the 12-byte header is there we
    /// can still address a FORMERR at its id.
    fn formerr_for_garbage(&self, request_bytes: &[u8], max_response_len: usize) -> Option<Vec<u8>> {
        if request_bytes.len() < HEADER_LEN {
            return None;
        }
        let id = u16::from_be_bytes([request_bytes[0], request_bytes[1]]);
        let response = Message {
            header: Header {
                id,
                response: true,
                opcode: Opcode::Query,
                authoritative: false,
                truncated: false,
                recursion_desired: false,
                recursion_available: true,
                rcode: Rcode::FormErr,
            },
            questions: vec![],
            answers: vec![],
            authorities: vec![],
            additionals: vec![],
        };
        encode_response_limited(&response, max_response_len).ok()
    }
}
