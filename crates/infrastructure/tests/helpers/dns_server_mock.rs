#![allow(dead_code)]
use dns_relay_infrastructure::dns::forwarding::MessageBuilder;
use hickory_proto::op::{Message, MessageType, OpCode};
use hickory_proto::rr::rdata::A;
use hickory_proto::rr::{Name, RData, Record};
use std::collections::{HashMap, HashSet};
use std::net::{Ipv4Addr, SocketAddr};
use std::str::FromStr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::net::UdpSocket;
use tokio::sync::oneshot;

const NXDOMAIN: u8 = 3;
const TC_BIT: u8 = 0x02;

#[derive(Default)]
struct Script {
    answers: HashMap<String, Vec<Record>>,
    rcodes: HashMap<String, u8>,
    delays: HashMap<String, Duration>,
    truncated: HashSet<String>,
    silent: bool,
    decoy: bool,
}

/// Stub upstream resolver on 127.0.0.1 answering from a script.
///
/// Unknown names get an empty NOERROR answer.
pub struct MockDnsServer {
    addr: SocketAddr,
    script: Arc<Mutex<Script>>,
    queries: Arc<AtomicUsize>,
    shutdown_tx: Option<oneshot::Sender<()>>,
}

impl MockDnsServer {
    pub async fn start() -> Result<Self, std::io::Error> {
        let socket = Arc::new(UdpSocket::bind("127.0.0.1:0").await?);
        let addr = socket.local_addr()?;
        let script = Arc::new(Mutex::new(Script::default()));
        let queries = Arc::new(AtomicUsize::new(0));

        let (shutdown_tx, mut shutdown_rx) = oneshot::channel();

        let task_script = Arc::clone(&script);
        let task_queries = Arc::clone(&queries);
        tokio::spawn(async move {
            let mut buf = vec![0u8; 4096];

            loop {
                tokio::select! {
                    _ = &mut shutdown_rx => {
                        break;
                    }
                    result = socket.recv_from(&mut buf) => {
                        if let Ok((len, peer)) = result {
                            task_queries.fetch_add(1, Ordering::SeqCst);
                            let query = buf[..len].to_vec();
                            let socket = Arc::clone(&socket);
                            let script = Arc::clone(&task_script);
                            tokio::spawn(async move {
                                Self::respond(&socket, &script, &query, peer).await;
                            });
                        }
                    }
                }
            }
        });

        Ok(Self {
            addr,
            script,
            queries,
            shutdown_tx: Some(shutdown_tx),
        })
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    pub fn query_count(&self) -> usize {
        self.queries.load(Ordering::SeqCst)
    }

    pub fn answer_a(&self, domain: &str, address: Ipv4Addr, ttl: u32) {
        let record = Record::from_rdata(
            Name::from_str(&format!("{}.", domain)).unwrap(),
            ttl,
            RData::A(A(address)),
        );
        self.answer(domain, record);
    }

    pub fn answer(&self, domain: &str, record: Record) {
        self.script
            .lock()
            .unwrap()
            .answers
            .entry(domain.to_string())
            .or_default()
            .push(record);
    }

    pub fn nxdomain(&self, domain: &str) {
        self.rcode(domain, NXDOMAIN);
    }

    pub fn rcode(&self, domain: &str, code: u8) {
        self.script
            .lock()
            .unwrap()
            .rcodes
            .insert(domain.to_string(), code);
    }

    pub fn delay(&self, domain: &str, delay: Duration) {
        self.script
            .lock()
            .unwrap()
            .delays
            .insert(domain.to_string(), delay);
    }

    pub fn truncate(&self, domain: &str) {
        self.script
            .lock()
            .unwrap()
            .truncated
            .insert(domain.to_string());
    }

    /// Receive queries but never answer them.
    pub fn set_silent(&self, silent: bool) {
        self.script.lock().unwrap().silent = silent;
    }

    /// Send a reply with the wrong transaction id before the real one.
    pub fn set_decoy(&self, decoy: bool) {
        self.script.lock().unwrap().decoy = decoy;
    }

    pub fn shutdown(mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }

    async fn respond(socket: &UdpSocket, script: &Mutex<Script>, query: &[u8], peer: SocketAddr) {
        let Ok(request) = Message::from_vec(query) else {
            return;
        };
        let Some(question) = request.queries().first().cloned() else {
            return;
        };
        let domain = question.name().to_ascii().trim_end_matches('.').to_lowercase();

        let (silent, decoy, delay, rcode, truncated, answers) = {
            let script = script.lock().unwrap();
            (
                script.silent,
                script.decoy,
                script.delays.get(&domain).copied(),
                script.rcodes.get(&domain).copied().unwrap_or(0),
                script.truncated.contains(&domain),
                script.answers.get(&domain).cloned().unwrap_or_default(),
            )
        };

        if silent {
            return;
        }
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let id = u16::from_be_bytes([query[0], query[1]]);

        if decoy {
            let poisoned = vec![Record::from_rdata(
                question.name().clone(),
                999,
                RData::A(A(Ipv4Addr::new(6, 6, 6, 6))),
            )];
            let bytes = Self::encode(id.wrapping_add(1), &question, &poisoned, 0, false);
            let _ = socket.send_to(&bytes, peer).await;
            tokio::time::sleep(Duration::from_millis(20)).await;
        }

        let answers = if rcode == 0 { answers } else { Vec::new() };
        let bytes = Self::encode(id, &question, &answers, rcode, truncated);
        let _ = socket.send_to(&bytes, peer).await;
    }

    fn encode(
        id: u16,
        question: &hickory_proto::op::Query,
        answers: &[Record],
        rcode: u8,
        truncated: bool,
    ) -> Vec<u8> {
        let mut message = Message::new(id, MessageType::Response, OpCode::Query);
        message.set_recursion_desired(true);
        message.add_query(question.clone());
        for record in answers {
            message.add_answer(record.clone());
        }

        let mut bytes = MessageBuilder::serialize_message(&message).unwrap();
        bytes[3] = 0x80 | (rcode & 0x0F);
        if truncated {
            bytes[2] |= TC_BIT;
        }
        bytes
    }
}

impl Drop for MockDnsServer {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}
