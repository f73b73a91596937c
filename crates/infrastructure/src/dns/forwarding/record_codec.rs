use super::record_type_map::RecordTypeMapper;
use dns_relay_domain::{DnsRecord, DomainError, RecordData};
use hickory_proto::rr::rdata::{A, AAAA, NULL};
use hickory_proto::rr::{Name, RData, Record};
use hickory_proto::serialize::binary::{BinEncodable, BinEncoder, NameEncoding};
use std::str::FromStr;
use std::sync::Arc;

/// Converts answer records between hickory's representation and the domain's.
///
/// Address records keep their typed payload. Every other supported type is
/// carried as its encoded RDATA and written back verbatim.
pub struct RecordCodec;

impl RecordCodec {
    /// Returns `Ok(None)` for record types the relay does not carry.
    pub fn to_domain(record: &Record) -> Result<Option<DnsRecord>, DomainError> {
        let Some(record_type) = RecordTypeMapper::from_hickory(record.record_type()) else {
            return Ok(None);
        };

        let name = record.name().to_ascii();
        let name = name.trim_end_matches('.');

        let data = match record.data() {
            RData::A(a) => RecordData::A(a.0),
            RData::AAAA(aaaa) => RecordData::Aaaa(aaaa.0),
            other => RecordData::Raw(Arc::from(Self::encode_rdata(other)?)),
        };

        Ok(Some(DnsRecord::new(name, record_type, record.ttl(), data)))
    }

    pub fn to_hickory(record: &DnsRecord) -> Result<Record, DomainError> {
        let owner = format!("{}.", record.name().trim_end_matches('.'));
        let name = Name::from_str(&owner).map_err(|e| {
            DomainError::InvalidDomainName(format!("Invalid owner name '{}': {}", owner, e))
        })?;

        let rdata = match record.data() {
            RecordData::A(ip) => RData::A(A(*ip)),
            RecordData::Aaaa(ip) => RData::AAAA(AAAA(*ip)),
            RecordData::Raw(bytes) => RData::Unknown {
                code: RecordTypeMapper::to_hickory(&record.record_type()),
                rdata: NULL::with(bytes.to_vec()),
            },
        };

        Ok(Record::from_rdata(name, record.ttl(), rdata))
    }

    /// Encodes RDATA on its own, with names uncompressed and in their
    /// original case, so the bytes can be written into any message.
    fn encode_rdata(rdata: &RData) -> Result<Vec<u8>, DomainError> {
        let mut buf = Vec::with_capacity(64);
        let mut encoder = BinEncoder::new(&mut buf);
        encoder.set_name_encoding(NameEncoding::Uncompressed);

        rdata
            .emit(&mut encoder)
            .map_err(|e| DomainError::UpstreamFormat(format!("Failed to encode RDATA: {}", e)))?;

        Ok(buf)
    }
}
