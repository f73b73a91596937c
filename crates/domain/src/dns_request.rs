use super::{DnsQuery, RecordType};
use std::net::SocketAddr;
use std::sync::Arc;

/// A decoded client question together with the transaction id it arrived with.
#[derive(Debug, Clone)]
pub struct DnsRequest {
    pub id: u16,
    pub domain: Arc<str>,
    pub record_type: RecordType,
    pub client: SocketAddr,
}

impl DnsRequest {
    pub fn new(
        id: u16,
        domain: impl Into<Arc<str>>,
        record_type: RecordType,
        client: SocketAddr,
    ) -> Self {
        Self {
            id,
            domain: domain.into(),
            record_type,
            client,
        }
    }

    pub fn query(&self) -> DnsQuery {
        DnsQuery::new(Arc::clone(&self.domain), self.record_type)
    }
}
