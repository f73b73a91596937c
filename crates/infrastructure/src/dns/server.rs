use crate::dns::forwarding::RecordTypeMapper;
use crate::dns::wire_response::{self, RequestHeader};
use dns_relay_application::use_cases::HandleDnsQueryUseCase;
use dns_relay_domain::{DnsRequest, DnsResponse, DomainError, ResponseCode};
use futures::future::join_all;
use hickory_proto::op::{Message, Query};
use hickory_proto::rr::DNSClass;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Turns one inbound datagram into at most one response datagram.
#[derive(Clone)]
pub struct DnsServerHandler {
    use_case: Arc<HandleDnsQueryUseCase>,
}

impl DnsServerHandler {
    pub fn new(use_case: Arc<HandleDnsQueryUseCase>) -> Self {
        Self { use_case }
    }

    fn normalize_domain(domain: &str) -> String {
        domain.trim_end_matches('.').to_string()
    }

    /// Returns `None` only for datagrams that must not be answered, which are
    /// responses sent to the listener port. Every request gets exactly one
    /// reply, failures included.
    pub async fn handle_datagram(&self, raw: &[u8], client: SocketAddr) -> Option<Vec<u8>> {
        let Some(header) = RequestHeader::parse(raw) else {
            warn!(client = %client, len = raw.len(), "Datagram shorter than a DNS header");
            return Some(wire_response::build_format_error(raw));
        };

        if header.is_response {
            debug!(client = %client, id = header.id, "Ignoring DNS response sent to listener");
            return None;
        }

        if !header.is_standard_query() {
            info!(client = %client, id = header.id, opcode = header.opcode, "Unsupported opcode");
            return Some(wire_response::build_header_response(
                &header,
                ResponseCode::NotImp,
            ));
        }

        let message = match Message::from_vec(raw) {
            Ok(message) => message,
            Err(e) => {
                warn!(client = %client, id = header.id, error = %e, "Malformed DNS query");
                return Some(wire_response::build_format_error(raw));
            }
        };

        let queries = message.queries();
        if queries.is_empty() {
            warn!(client = %client, id = header.id, "DNS query without a question");
            return Some(wire_response::build_header_response(
                &header,
                ResponseCode::FormErr,
            ));
        }

        let parts = join_all(
            queries
                .iter()
                .map(|query| self.answer_question(header.id, query, client)),
        )
        .await;
        let response = DnsResponse::combine(header.id, parts);

        debug!(
            client = %client,
            id = response.id,
            rcode = %response.code,
            answers = response.answers.len(),
            nodata = response.is_nodata(),
            nxdomain = response.is_nxdomain(),
            "Sending response"
        );

        Some(wire_response::build_response(&header, queries, &response))
    }

    async fn answer_question(&self, id: u16, query: &Query, client: SocketAddr) -> DnsResponse {
        let domain = Self::normalize_domain(&query.name().to_ascii());
        let hickory_record_type = query.query_type();

        info!(domain = %domain, record_type = ?hickory_record_type, client = %client, "DNS query received");

        // Upstream queries are always class IN.
        if query.query_class() != DNSClass::IN {
            let error = DomainError::UnsupportedClass(u16::from(query.query_class()));
            warn!(domain = %domain, error = %error, "Unsupported query class");
            return DnsResponse::failure(id, error.response_code());
        }

        let Some(record_type) = RecordTypeMapper::from_hickory(hickory_record_type) else {
            let error = DomainError::UnsupportedRecordType(u16::from(hickory_record_type));
            warn!(domain = %domain, error = %error, "Unsupported record type");
            return DnsResponse::failure(id, error.response_code());
        };

        let request = DnsRequest::new(id, domain, record_type, client);
        self.use_case.execute(&request).await
    }
}
