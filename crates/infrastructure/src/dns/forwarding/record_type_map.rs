//! Mapping between `dns_relay_domain::RecordType` and `hickory_proto::rr::RecordType`.
//!
//! Conversion goes through the numeric type code, so types hickory has no
//! named variant for (DNAME in some releases) still map cleanly.

use dns_relay_domain::RecordType;
use hickory_proto::rr::RecordType as HickoryRecordType;

/// Bidirectional mapper between domain and hickory record types
pub struct RecordTypeMapper;

impl RecordTypeMapper {
    /// Convert domain RecordType → hickory RecordType (for building queries)
    pub fn to_hickory(record_type: &RecordType) -> HickoryRecordType {
        HickoryRecordType::from(record_type.to_u16())
    }

    /// Convert hickory RecordType → domain RecordType.
    ///
    /// Returns `None` for types the relay does not support.
    pub fn from_hickory(record_type: HickoryRecordType) -> Option<RecordType> {
        RecordType::from_u16(u16::from(record_type))
    }
}
