use crate::ports::DnsResolver;
use dns_relay_domain::{DnsRequest, DnsResponse, DomainError};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Extra time allowed past the upstream timeout before the use case gives up
/// on the resolver on its own.
const RESOLVE_GRACE: Duration = Duration::from_millis(250);

/// Turns a decoded client question into exactly one response.
///
/// Every resolver failure is mapped to a response code here; nothing is
/// propagated to the caller.
pub struct HandleDnsQueryUseCase {
    resolver: Arc<dyn DnsResolver>,
    query_timeout: Duration,
}

impl HandleDnsQueryUseCase {
    pub fn new(resolver: Arc<dyn DnsResolver>, query_timeout: Duration) -> Self {
        Self {
            resolver,
            query_timeout,
        }
    }

    pub fn query_timeout(&self) -> Duration {
        self.query_timeout
    }

    pub async fn execute(&self, request: &DnsRequest) -> DnsResponse {
        let start = Instant::now();
        let query = request.query();

        let outcome = match tokio::time::timeout(
            self.query_timeout + RESOLVE_GRACE,
            self.resolver.resolve(&query, self.query_timeout),
        )
        .await
        {
            Ok(result) => result,
            Err(_) => Err(DomainError::QueryTimeout),
        };

        let elapsed_ms = start.elapsed().as_millis() as u64;

        match outcome {
            Ok(resolution) => {
                debug!(
                    id = request.id,
                    domain = %request.domain,
                    record_type = %request.record_type,
                    answers = resolution.records.len(),
                    upstream = ?resolution.upstream_server,
                    elapsed_ms,
                    "Query resolved"
                );
                DnsResponse::success(request.id, resolution.records)
                    .with_truncated(resolution.truncated)
            }
            Err(e @ DomainError::UpstreamRefused { .. }) => {
                info!(
                    id = request.id,
                    domain = %request.domain,
                    record_type = %request.record_type,
                    status = e.status(),
                    elapsed_ms,
                    "Upstream returned failure code"
                );
                DnsResponse::failure(request.id, e.response_code())
            }
            Err(e) => {
                warn!(
                    id = request.id,
                    domain = %request.domain,
                    record_type = %request.record_type,
                    client = %request.client,
                    status = e.status(),
                    error = %e,
                    elapsed_ms,
                    "Query resolution failed"
                );
                DnsResponse::failure(request.id, e.response_code())
            }
        }
    }
}
