use super::message_builder::MessageBuilder;
use super::response_parser::{ResponseParser, UpstreamReply};
use async_trait::async_trait;
use dns_relay_application::ports::{DnsResolution, DnsResolver};
use dns_relay_domain::{DnsQuery, DomainError};
use std::net::{Ipv4Addr, Ipv6Addr, SocketAddr};
use std::time::Duration;
use tokio::net::UdpSocket;
use tokio::time::Instant;
use tracing::{debug, warn};

/// Largest reply a single UDP datagram can carry.
const MAX_UDP_RESPONSE_SIZE: usize = 65535;

/// Forwards queries to one upstream resolver over UDP.
///
/// Every query gets its own connected ephemeral socket, so replies never
/// have to be demultiplexed between concurrent callers. The kernel drops
/// datagrams from any other source.
pub struct DnsForwarder {
    server: SocketAddr,
    recv_buffer_size: usize,
}

impl DnsForwarder {
    pub fn new(server: SocketAddr) -> Self {
        Self {
            server,
            recv_buffer_size: MAX_UDP_RESPONSE_SIZE,
        }
    }

    pub fn with_recv_buffer_size(mut self, size: usize) -> Self {
        self.recv_buffer_size = size;
        self
    }

    pub fn server(&self) -> SocketAddr {
        self.server
    }

    /// Send one query and wait for the matching reply until `timeout` elapses.
    ///
    /// Datagrams that are not responses, or that carry another transaction
    /// id, are discarded and the wait continues.
    pub async fn query(
        &self,
        query: &DnsQuery,
        timeout: Duration,
    ) -> Result<UpstreamReply, DomainError> {
        let deadline = Instant::now() + timeout;
        let (id, request_bytes) = MessageBuilder::build_query_with_id(query)?;

        let socket = self.connect().await?;

        socket
            .send(&request_bytes)
            .await
            .map_err(|e| DomainError::transport(self.server, format!("send failed: {}", e)))?;

        debug!(
            server = %self.server,
            id = id,
            domain = %query.domain,
            record_type = %query.record_type,
            "UDP query sent"
        );

        let mut recv_buf = vec![0u8; self.recv_buffer_size];

        loop {
            let len = match tokio::time::timeout_at(deadline, socket.recv(&mut recv_buf)).await {
                Err(_) => return Err(DomainError::QueryTimeout),
                Ok(Err(e)) => {
                    return Err(DomainError::transport(
                        self.server,
                        format!("receive failed: {}", e),
                    ))
                }
                Ok(Ok(len)) => len,
            };

            let reply = &recv_buf[..len];
            match ResponseParser::reply_id(reply) {
                Some(reply_id) if reply_id == id => return ResponseParser::parse(reply),
                other => {
                    warn!(
                        server = %self.server,
                        expected = id,
                        received = ?other,
                        "Discarding upstream datagram that does not answer this query"
                    );
                }
            }
        }
    }

    async fn connect(&self) -> Result<UdpSocket, DomainError> {
        let bind_addr: SocketAddr = if self.server.is_ipv4() {
            (Ipv4Addr::UNSPECIFIED, 0).into()
        } else {
            (Ipv6Addr::UNSPECIFIED, 0).into()
        };

        let socket = UdpSocket::bind(bind_addr)
            .await
            .map_err(|e| DomainError::transport(self.server, format!("bind failed: {}", e)))?;

        socket
            .connect(self.server)
            .await
            .map_err(|e| DomainError::transport(self.server, format!("connect failed: {}", e)))?;

        Ok(socket)
    }
}

#[async_trait]
impl DnsResolver for DnsForwarder {
    async fn resolve(
        &self,
        query: &DnsQuery,
        timeout: Duration,
    ) -> Result<DnsResolution, DomainError> {
        let reply = self.query(query, timeout).await?;

        if !reply.rcode.is_success() {
            return Err(DomainError::UpstreamRefused { code: reply.rcode });
        }

        Ok(
            DnsResolution::from_server(reply.records, self.server.to_string())
                .with_truncated(reply.truncated),
        )
    }
}
