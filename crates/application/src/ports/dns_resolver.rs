use async_trait::async_trait;
use dns_relay_domain::{DnsQuery, DnsRecord, DomainError};
use std::time::Duration;

#[derive(Debug, Clone, Default)]
pub struct DnsResolution {
    /// Answer section as returned by the upstream, in order.
    pub records: Vec<DnsRecord>,
    pub upstream_server: Option<String>,
    /// Upstream set the TC bit.
    pub truncated: bool,
}

impl DnsResolution {
    pub fn new(records: Vec<DnsRecord>) -> Self {
        Self {
            records,
            upstream_server: None,
            truncated: false,
        }
    }

    pub fn from_server(records: Vec<DnsRecord>, server: impl Into<String>) -> Self {
        Self {
            records,
            upstream_server: Some(server.into()),
            truncated: false,
        }
    }

    pub fn with_truncated(mut self, truncated: bool) -> Self {
        self.truncated = truncated;
        self
    }
}

/// One request/response exchange with an upstream resolver.
///
/// Implementations must give up once `timeout` has elapsed and must report a
/// non-success upstream RCODE as `DomainError::UpstreamRefused` rather than an
/// empty answer set.
#[async_trait]
pub trait DnsResolver: Send + Sync {
    async fn resolve(
        &self,
        query: &DnsQuery,
        timeout: Duration,
    ) -> Result<DnsResolution, DomainError>;
}
