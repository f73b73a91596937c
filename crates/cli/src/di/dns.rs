use dns_relay_application::use_cases::HandleDnsQueryUseCase;
use dns_relay_domain::Config;
use dns_relay_infrastructure::dns::{DnsForwarder, DnsServerHandler, ListenerConfig};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::info;

pub struct DnsServices {
    pub forwarder: Arc<DnsForwarder>,
    pub handler_use_case: Arc<HandleDnsQueryUseCase>,
    pub listener_config: ListenerConfig,
}

impl DnsServices {
    pub fn new(config: &Config) -> anyhow::Result<Self> {
        let upstream = config.upstream.socket_addr()?;
        let query_timeout = config.upstream.query_timeout();

        info!(
            timeout_ms = query_timeout.as_millis() as u64,
            recv_buffer_size = config.server.recv_buffer_size,
            "Initializing DNS forwarding"
        );

        let forwarder = Arc::new(DnsForwarder::new(upstream));
        let handler_use_case = Arc::new(HandleDnsQueryUseCase::new(
            forwarder.clone(),
            query_timeout,
        ));

        let bind_addr: SocketAddr = config.server.listen_address().parse()?;
        let listener_config = ListenerConfig::new(bind_addr)
            .with_recv_buffer_size(config.server.recv_buffer_size)
            .with_reuse_port(config.server.reuse_port);

        Ok(Self {
            forwarder,
            handler_use_case,
            listener_config,
        })
    }

    pub fn handler(&self) -> DnsServerHandler {
        DnsServerHandler::new(self.handler_use_case.clone())
    }
}
