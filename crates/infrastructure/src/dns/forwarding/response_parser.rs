use super::record_codec::RecordCodec;
use dns_relay_domain::{DnsRecord, DomainError, ResponseCode};
use hickory_proto::op::Message;
use tracing::debug;

const HEADER_LEN: usize = 12;
const QR_BIT: u8 = 0x80;
const TC_BIT: u8 = 0x02;

/// What the relay keeps from an upstream reply.
#[derive(Debug, Clone)]
pub struct UpstreamReply {
    pub rcode: ResponseCode,
    pub truncated: bool,
    pub records: Vec<DnsRecord>,
}

pub struct ResponseParser;

impl ResponseParser {
    /// Transaction id of a datagram whose QR bit marks it as a response.
    pub fn reply_id(bytes: &[u8]) -> Option<u16> {
        if bytes.len() < 3 || bytes[2] & QR_BIT == 0 {
            return None;
        }
        Some(u16::from_be_bytes([bytes[0], bytes[1]]))
    }

    pub fn parse(response_bytes: &[u8]) -> Result<UpstreamReply, DomainError> {
        let message = match Message::from_vec(response_bytes) {
            Ok(message) => message,
            Err(e) => {
                return Self::truncated_header_only(response_bytes).ok_or_else(|| {
                    DomainError::UpstreamFormat(format!("Failed to parse DNS response: {}", e))
                })
            }
        };

        let rcode = ResponseCode::from_u16(u16::from(message.response_code()));
        let truncated = message.truncated();

        let mut records = Vec::with_capacity(message.answers().len());
        for record in message.answers() {
            match RecordCodec::to_domain(record)? {
                Some(converted) => records.push(converted),
                None => {
                    debug!(record_type = ?record.record_type(), "Skipping answer of unsupported type")
                }
            }
        }

        debug!(
            id = message.id(),
            rcode = %rcode,
            answers = records.len(),
            truncated = truncated,
            "DNS response parsed"
        );

        Ok(UpstreamReply {
            rcode,
            truncated,
            records,
        })
    }

    /// A truncated reply may be cut mid-record. Its header alone is still
    /// enough to relay the TC flag.
    fn truncated_header_only(bytes: &[u8]) -> Option<UpstreamReply> {
        if bytes.len() < HEADER_LEN || bytes[2] & TC_BIT == 0 {
            return None;
        }

        debug!("Truncated upstream reply did not decode; relaying header only");

        Some(UpstreamReply {
            rcode: ResponseCode::from_u16(u16::from(bytes[3] & 0x0F)),
            truncated: true,
            records: Vec::new(),
        })
    }
}
