#![allow(dead_code)]
pub mod dns_server_mock;

pub use dns_server_mock::MockDnsServer;

use dns_relay_application::use_cases::HandleDnsQueryUseCase;
use dns_relay_infrastructure::dns::forwarding::MessageBuilder;
use dns_relay_infrastructure::dns::{
    DnsForwarder, DnsListener, DnsServerHandler, ListenerConfig, ListenerHandle,
};
use hickory_proto::op::{Message, MessageType, OpCode, Query};
use hickory_proto::rr::{Name, RecordType};
use std::net::SocketAddr;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::UdpSocket;

/// Relay listening on an ephemeral loopback port, forwarding to `upstream`.
pub fn start_relay(upstream: SocketAddr, query_timeout: Duration) -> ListenerHandle {
    let forwarder = Arc::new(DnsForwarder::new(upstream));
    let use_case = Arc::new(HandleDnsQueryUseCase::new(forwarder, query_timeout));
    let handler = Arc::new(DnsServerHandler::new(use_case));

    let config = ListenerConfig::new("127.0.0.1:0".parse().unwrap())
        .with_reuse_port(false)
        .with_shutdown_grace(Duration::from_millis(200));

    DnsListener::bind(config, handler).unwrap().spawn()
}

pub fn client_query(id: u16, domain: &str, record_type: RecordType) -> Vec<u8> {
    let mut message = Message::new(id, MessageType::Query, OpCode::Query);
    message.set_recursion_desired(true);
    message.add_query(Query::query(Name::from_str(domain).unwrap(), record_type));
    MessageBuilder::serialize_message(&message).unwrap()
}

pub async fn client_socket() -> UdpSocket {
    UdpSocket::bind("127.0.0.1:0").await.unwrap()
}

/// Send `bytes` to `server` and wait for one datagram back.
pub async fn exchange(
    socket: &UdpSocket,
    server: SocketAddr,
    bytes: &[u8],
    wait: Duration,
) -> Option<Vec<u8>> {
    socket.send_to(bytes, server).await.unwrap();

    let mut buf = vec![0u8; 65535];
    match tokio::time::timeout(wait, socket.recv_from(&mut buf)).await {
        Ok(Ok((len, _))) => Some(buf[..len].to_vec()),
        _ => None,
    }
}

pub fn rcode(bytes: &[u8]) -> u8 {
    bytes[3] & 0x0F
}
