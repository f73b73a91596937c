use crate::dns::server::DnsServerHandler;
use dns_relay_domain::DomainError;
use socket2::{Domain, Protocol, Socket, Type};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::UdpSocket;
use tokio::task::{JoinHandle, JoinSet};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

const DEFAULT_RECV_BUFFER_SIZE: usize = 65535;
const DEFAULT_SHUTDOWN_GRACE: Duration = Duration::from_secs(2);
const SOCKET_BUFFER_BYTES: usize = 512 * 1024;

#[derive(Debug, Clone)]
pub struct ListenerConfig {
    pub bind_addr: SocketAddr,
    /// Largest datagram accepted from a client.
    pub recv_buffer_size: usize,
    pub reuse_port: bool,
    /// How long `stop` waits for in-flight queries before aborting them.
    pub shutdown_grace: Duration,
}

impl ListenerConfig {
    pub fn new(bind_addr: SocketAddr) -> Self {
        Self {
            bind_addr,
            recv_buffer_size: DEFAULT_RECV_BUFFER_SIZE,
            reuse_port: true,
            shutdown_grace: DEFAULT_SHUTDOWN_GRACE,
        }
    }

    pub fn with_recv_buffer_size(mut self, size: usize) -> Self {
        self.recv_buffer_size = size;
        self
    }

    pub fn with_reuse_port(mut self, reuse_port: bool) -> Self {
        self.reuse_port = reuse_port;
        self
    }

    pub fn with_shutdown_grace(mut self, grace: Duration) -> Self {
        self.shutdown_grace = grace;
        self
    }
}

/// UDP front door. Each datagram is handled on its own task so a slow
/// upstream for one client never holds up another.
pub struct DnsListener {
    socket: Arc<UdpSocket>,
    local_addr: SocketAddr,
    handler: Arc<DnsServerHandler>,
    config: ListenerConfig,
    shutdown: CancellationToken,
}

impl DnsListener {
    /// Binds the listening socket. Must be called from within a tokio runtime.
    pub fn bind(config: ListenerConfig, handler: Arc<DnsServerHandler>) -> Result<Self, DomainError> {
        let bind_error = |e: std::io::Error| DomainError::Bind {
            addr: config.bind_addr.to_string(),
            reason: e.to_string(),
        };

        let socket = create_udp_socket(&config).map_err(bind_error)?;
        let local_addr = socket.local_addr().map_err(bind_error)?;

        info!(bind_address = %local_addr, reuse_port = config.reuse_port, "DNS listener bound");

        Ok(Self {
            socket: Arc::new(socket),
            local_addr,
            handler,
            config,
            shutdown: CancellationToken::new(),
        })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Token that ends `serve` when cancelled.
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    /// Run the serve loop on its own task.
    pub fn spawn(self) -> ListenerHandle {
        let local_addr = self.local_addr;
        let shutdown = self.shutdown.clone();
        let task = tokio::spawn(self.serve());

        ListenerHandle {
            local_addr,
            shutdown,
            task,
        }
    }

    /// Receive datagrams until the shutdown token fires, then drain.
    pub async fn serve(self) {
        info!(bind_address = %self.local_addr, "DNS listener ready");

        let mut recv_buf = vec![0u8; self.config.recv_buffer_size];
        let mut in_flight: JoinSet<()> = JoinSet::new();

        loop {
            tokio::select! {
                biased;

                _ = self.shutdown.cancelled() => break,

                Some(finished) = in_flight.join_next(), if !in_flight.is_empty() => {
                    if let Err(e) = finished {
                        if e.is_panic() {
                            error!(error = %e, "Query task panicked");
                        }
                    }
                }

                received = self.socket.recv_from(&mut recv_buf) => match received {
                    Ok((len, client)) => {
                        let datagram = recv_buf[..len].to_vec();
                        let responder = UdpResponder {
                            socket: Arc::clone(&self.socket),
                            client,
                        };
                        let handler = Arc::clone(&self.handler);

                        in_flight.spawn(async move {
                            if let Some(response) = handler.handle_datagram(&datagram, client).await {
                                responder.send(&response).await;
                            }
                        });
                    }
                    Err(e) => warn!(error = %e, "UDP recv error"),
                },
            }
        }

        self.drain(in_flight).await;
        info!(bind_address = %self.local_addr, "DNS listener stopped");
    }

    async fn drain(&self, mut in_flight: JoinSet<()>) {
        if in_flight.is_empty() {
            return;
        }

        debug!(in_flight = in_flight.len(), "Waiting for in-flight queries");

        let finished = tokio::time::timeout(self.config.shutdown_grace, async {
            while in_flight.join_next().await.is_some() {}
        })
        .await;

        if finished.is_err() {
            warn!(
                aborted = in_flight.len(),
                "Shutdown grace period elapsed; aborting in-flight queries"
            );
            in_flight.abort_all();
            while in_flight.join_next().await.is_some() {}
        }
    }
}

/// Handle to a spawned listener.
pub struct ListenerHandle {
    local_addr: SocketAddr,
    shutdown: CancellationToken,
    task: JoinHandle<()>,
}

impl ListenerHandle {
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Stop accepting datagrams and wait for the listener to drain. No new
    /// work is dispatched once this returns.
    pub async fn stop(self) {
        self.shutdown.cancel();
        if let Err(e) = self.task.await {
            error!(error = %e, "DNS listener task failed");
        }
    }
}

/// Writes responses back to the client a datagram came from.
struct UdpResponder {
    socket: Arc<UdpSocket>,
    client: SocketAddr,
}

impl UdpResponder {
    async fn send(&self, response: &[u8]) {
        if let Err(e) = self.socket.send_to(response, self.client).await {
            error!(client = %self.client, error = %e, "Failed to send DNS response");
        }
    }
}

fn create_udp_socket(config: &ListenerConfig) -> std::io::Result<UdpSocket> {
    let addr = config.bind_addr;
    let domain = if addr.is_ipv4() {
        Domain::IPV4
    } else {
        Domain::IPV6
    };

    let socket = Socket::new(domain, Type::DGRAM, Some(Protocol::UDP))?;
    if addr.is_ipv6() {
        socket.set_only_v6(false)?;
    }
    socket.set_reuse_address(true)?;
    #[cfg(unix)]
    {
        if config.reuse_port {
            socket.set_reuse_port(true)?;
        }
    }
    socket.set_recv_buffer_size(SOCKET_BUFFER_BYTES)?;
    socket.set_send_buffer_size(SOCKET_BUFFER_BYTES)?;
    socket.bind(&addr.into())?;
    socket.set_nonblocking(true)?;

    let std_socket: std::net::UdpSocket = socket.into();
    UdpSocket::from_std(std_socket)
}
