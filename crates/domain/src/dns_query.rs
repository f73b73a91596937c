use super::RecordType;
use std::sync::Arc;

#[derive(Debug, Clone)]
pub struct DnsQuery {
    pub domain: Arc<str>,
    pub record_type: RecordType,
}

impl DnsQuery {
    pub fn new(domain: impl Into<Arc<str>>, record_type: RecordType) -> Self {
        Self {
            domain: domain.into(),
            record_type,
        }
    }

    /// Domain with exactly one trailing dot, as sent on the wire.
    pub fn fqdn(&self) -> String {
        let trimmed = self.domain.trim_end_matches('.');
        format!("{}.", trimmed)
    }
}
