use super::RecordType;
use std::fmt;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use std::sync::Arc;

/// Type-specific payload of an answer record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordData {
    A(Ipv4Addr),
    Aaaa(Ipv6Addr),
    /// Encoded RDATA for every other type. Names inside are uncompressed and
    /// keep their case.
    Raw(Arc<[u8]>),
}

impl RecordData {
    pub fn address(&self) -> Option<IpAddr> {
        match self {
            RecordData::A(ip) => Some(IpAddr::V4(*ip)),
            RecordData::Aaaa(ip) => Some(IpAddr::V6(*ip)),
            RecordData::Raw(_) => None,
        }
    }
}

impl fmt::Display for RecordData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordData::A(ip) => write!(f, "{}", ip),
            RecordData::Aaaa(ip) => write!(f, "{}", ip),
            RecordData::Raw(bytes) => write!(f, "<{} bytes>", bytes.len()),
        }
    }
}

/// One answer record. Fields are private so a record cannot change once it
/// has been built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DnsRecord {
    name: Arc<str>,
    record_type: RecordType,
    ttl: u32,
    data: RecordData,
}

impl DnsRecord {
    pub fn new(
        name: impl Into<Arc<str>>,
        record_type: RecordType,
        ttl: u32,
        data: RecordData,
    ) -> Self {
        Self {
            name: name.into(),
            record_type,
            ttl,
            data,
        }
    }

    pub fn a(name: impl Into<Arc<str>>, ttl: u32, address: Ipv4Addr) -> Self {
        Self::new(name, RecordType::A, ttl, RecordData::A(address))
    }

    pub fn aaaa(name: impl Into<Arc<str>>, ttl: u32, address: Ipv6Addr) -> Self {
        Self::new(name, RecordType::AAAA, ttl, RecordData::Aaaa(address))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn record_type(&self) -> RecordType {
        self.record_type
    }

    pub fn ttl(&self) -> u32 {
        self.ttl
    }

    pub fn data(&self) -> &RecordData {
        &self.data
    }
}

impl fmt::Display for DnsRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} IN {} {}",
            self.name, self.ttl, self.record_type, self.data
        )
    }
}
