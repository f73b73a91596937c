use crate::dns::forwarding::{MessageBuilder, RecordCodec};
use dns_relay_domain::{DnsResponse, ResponseCode};
use hickory_proto::op::{Message, MessageType, OpCode, Query};
use tracing::warn;

pub const HEADER_LEN: usize = 12;

const QR_BIT: u8 = 0x80;
const OPCODE_MASK: u8 = 0x78;
const TC_BIT: u8 = 0x02;
const RD_BIT: u8 = 0x01;
const RA_BIT: u8 = 0x80;

/// The header fields of a client request that decide how it is answered.
///
/// Read straight from the datagram so an answer can be formed even when the
/// rest of the message does not decode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestHeader {
    pub id: u16,
    pub is_response: bool,
    pub opcode: u8,
    pub recursion_desired: bool,
}

impl RequestHeader {
    /// Returns `None` when the datagram is shorter than a DNS header.
    pub fn parse(raw: &[u8]) -> Option<Self> {
        if raw.len() < HEADER_LEN {
            return None;
        }

        Some(Self {
            id: u16::from_be_bytes([raw[0], raw[1]]),
            is_response: raw[2] & QR_BIT != 0,
            opcode: (raw[2] & OPCODE_MASK) >> 3,
            recursion_desired: raw[2] & RD_BIT != 0,
        })
    }

    pub fn is_standard_query(&self) -> bool {
        self.opcode == 0
    }

    /// Flags byte 2 of a response to this request: QR set, opcode and RD echoed.
    fn response_flags(&self) -> u8 {
        let mut flags = QR_BIT | (self.opcode << 3);
        if self.recursion_desired {
            flags |= RD_BIT;
        }
        flags
    }
}

/// FORMERR for a datagram that could not be decoded.
///
/// The id comes from the first two bytes, or 0 when fewer arrived.
pub fn build_format_error(raw: &[u8]) -> Vec<u8> {
    let id = match raw {
        [hi, lo, ..] => u16::from_be_bytes([*hi, *lo]),
        _ => 0,
    };
    let flags = match raw.get(2) {
        Some(byte) => QR_BIT | (byte & (OPCODE_MASK | RD_BIT)),
        None => QR_BIT,
    };

    header_only(id, flags, ResponseCode::FormErr)
}

/// A response with an empty question section, for requests that are rejected
/// on their header alone.
pub fn build_header_response(request: &RequestHeader, code: ResponseCode) -> Vec<u8> {
    header_only(request.id, request.response_flags(), code)
}

/// Encodes a resolved response, echoing the request's questions.
///
/// Answers are only written for a successful response. RA is always set and
/// TC mirrors the upstream.
pub fn build_response(
    request: &RequestHeader,
    queries: &[Query],
    response: &DnsResponse,
) -> Vec<u8> {
    let mut message = Message::new(response.id, MessageType::Response, OpCode::Query);
    message.set_recursion_desired(request.recursion_desired);
    for query in queries {
        message.add_query(query.clone());
    }

    if response.code.is_success() {
        for record in &response.answers {
            match RecordCodec::to_hickory(record) {
                Ok(converted) => {
                    message.add_answer(converted);
                }
                Err(e) => warn!(record = %record, error = %e, "Dropping answer that cannot be encoded"),
            }
        }
    }

    let mut bytes = match MessageBuilder::serialize_message(&message) {
        Ok(bytes) => bytes,
        Err(e) => {
            warn!(id = response.id, error = %e, "Failed to encode response");
            return header_only(response.id, request.response_flags(), ResponseCode::ServFail);
        }
    };

    if response.truncated {
        bytes[2] |= TC_BIT;
    }
    bytes[3] = RA_BIT | rcode_bits(response.code);

    bytes
}

fn header_only(id: u16, flags: u8, code: ResponseCode) -> Vec<u8> {
    let mut buf = vec![0u8; HEADER_LEN];
    buf[0] = (id >> 8) as u8;
    buf[1] = id as u8;
    buf[2] = flags;
    buf[3] = RA_BIT | rcode_bits(code);
    buf
}

/// Low four bits of the RCODE. Extended codes need EDNS, which the relay
/// does not speak.
fn rcode_bits(code: ResponseCode) -> u8 {
    (code.to_u16() & 0x0F) as u8
}
