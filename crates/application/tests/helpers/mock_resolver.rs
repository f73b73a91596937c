#![allow(dead_code)]

use async_trait::async_trait;
use dns_relay_application::ports::{DnsResolution, DnsResolver};
use dns_relay_domain::{DnsQuery, DomainError};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

#[derive(Clone)]
pub struct MockDnsResolver {
    responses: Arc<RwLock<HashMap<String, DnsResolution>>>,
    error_responses: Arc<std::sync::RwLock<HashMap<String, DomainError>>>,
    delays: Arc<std::sync::RwLock<HashMap<String, Duration>>>,
    hang: Arc<std::sync::RwLock<bool>>,
    calls: Arc<AtomicUsize>,
    last_timeout: Arc<std::sync::RwLock<Option<Duration>>>,
}

impl MockDnsResolver {
    pub fn new() -> Self {
        Self {
            responses: Arc::new(RwLock::new(HashMap::new())),
            error_responses: Arc::new(std::sync::RwLock::new(HashMap::new())),
            delays: Arc::new(std::sync::RwLock::new(HashMap::new())),
            hang: Arc::new(std::sync::RwLock::new(false)),
            calls: Arc::new(AtomicUsize::new(0)),
            last_timeout: Arc::new(std::sync::RwLock::new(None)),
        }
    }

    pub async fn set_response(&self, domain: &str, resolution: DnsResolution) {
        self.responses
            .write()
            .await
            .insert(domain.to_string(), resolution);
    }

    pub fn set_response_error(&self, domain: &str, error: DomainError) {
        self.error_responses
            .write()
            .unwrap()
            .insert(domain.to_string(), error);
    }

    pub fn set_delay(&self, domain: &str, delay: Duration) {
        self.delays
            .write()
            .unwrap()
            .insert(domain.to_string(), delay);
    }

    /// Never answer, ignoring the timeout handed to `resolve`.
    pub fn set_hang(&self, hang: bool) {
        *self.hang.write().unwrap() = hang;
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_timeout(&self) -> Option<Duration> {
        *self.last_timeout.read().unwrap()
    }
}

impl Default for MockDnsResolver {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DnsResolver for MockDnsResolver {
    async fn resolve(
        &self,
        query: &DnsQuery,
        timeout: Duration,
    ) -> Result<DnsResolution, DomainError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_timeout.write().unwrap() = Some(timeout);

        let hang = *self.hang.read().unwrap();
        if hang {
            std::future::pending::<()>().await;
        }

        let delay = self
            .delays
            .read()
            .unwrap()
            .get(query.domain.as_ref())
            .copied();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let error = self
            .error_responses
            .read()
            .unwrap()
            .get(query.domain.as_ref())
            .cloned();
        if let Some(err) = error {
            return Err(err);
        }

        let responses = self.responses.read().await;
        responses
            .get(query.domain.as_ref())
            .cloned()
            .ok_or_else(|| {
                DomainError::transport("mock", format!("no mock response for {}", query.domain))
            })
    }
}
