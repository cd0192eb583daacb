//! Test doubles and common utilities for contract tests
//!
//! The doubles record every call so tests can assert on what the engine
//! asked the outside world to do.

#![allow(dead_code)]

use ddns_core::config::{DdnsConfig, EngineConfig, ProviderConfig};
use ddns_core::engine::{EngineEvent, PollingLoop, UpdateCoordinator};
use ddns_core::error::{Error, Result};
use ddns_core::traits::{DnsProvider, IpResolver, IpVersion, RecordType, UpsertOutcome};
use std::collections::{HashMap, HashSet, VecDeque};
use std::net::IpAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::{Barrier, mpsc};

/// One scripted answer from [`ScriptedResolver`]
#[derive(Debug, Clone)]
pub enum Step {
    /// Return this address
    Address(&'static str),
    /// Fail with an IP source error (bad status, garbage body)
    Failure,
    /// Fail with a timeout
    Timeout,
}

/// An IpResolver that replays a script
///
/// Once the script runs out, the last returned address is repeated.
#[derive(Clone)]
pub struct ScriptedResolver {
    script: Arc<Mutex<VecDeque<Step>>>,
    last_address: Arc<Mutex<Option<IpAddr>>>,
    calls: Arc<AtomicUsize>,
    requested_versions: Arc<Mutex<Vec<IpVersion>>>,
}

impl ScriptedResolver {
    pub fn new(script: Vec<Step>) -> Self {
        Self {
            script: Arc::new(Mutex::new(script.into())),
            last_address: Arc::new(Mutex::new(None)),
            calls: Arc::new(AtomicUsize::new(0)),
            requested_versions: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Number of lookups performed
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Address families requested, in call order
    pub fn requested_versions(&self) -> Vec<IpVersion> {
        self.requested_versions.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl IpResolver for ScriptedResolver {
    async fn current_address(&self, version: IpVersion) -> Result<IpAddr> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requested_versions.lock().unwrap().push(version);

        let step = self.script.lock().unwrap().pop_front();
        match step {
            Some(Step::Address(raw)) => {
                let ip: IpAddr = raw.parse().expect("scripted address parses");
                *self.last_address.lock().unwrap() = Some(ip);
                Ok(ip)
            }
            Some(Step::Failure) => Err(Error::ip_source("HTTP error: 502 Bad Gateway")),
            Some(Step::Timeout) => Err(Error::timeout("operation timed out")),
            None => self
                .last_address
                .lock()
                .unwrap()
                .ok_or_else(|| Error::ip_source("script exhausted")),
        }
    }

    fn resolver_name(&self) -> &'static str {
        "scripted"
    }
}

/// How [`RecordingProvider::validate_domain`] answers
#[derive(Debug, Clone, Copy)]
pub enum Validation {
    Ok,
    NotFound,
    Status(u16),
}

/// One recorded upsert call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpsertCall {
    pub domain: String,
    pub record: String,
    pub record_type: RecordType,
    pub ip: IpAddr,
}

struct ProviderState {
    validation: Validation,
    validate_calls: AtomicUsize,
    upserts: Mutex<Vec<UpsertCall>>,
    failing_records: HashSet<String>,
    remote: Mutex<HashMap<(String, RecordType), String>>,
    barrier: Option<Barrier>,
}

/// A DnsProvider that records calls and keeps an in-memory zone
///
/// Clones share state, so a test can keep one handle and give the
/// engine another.
#[derive(Clone)]
pub struct RecordingProvider {
    state: Arc<ProviderState>,
}

impl RecordingProvider {
    pub fn new() -> Self {
        Self::build(Validation::Ok, &[], None)
    }

    pub fn with_validation(validation: Validation) -> Self {
        Self::build(validation, &[], None)
    }

    /// Upserts for these record names fail with HTTP 500
    pub fn failing(records: &[&str]) -> Self {
        Self::build(Validation::Ok, records, None)
    }

    /// Every upsert waits until `parties` upserts are in flight
    pub fn rendezvous(parties: usize, failing: &[&str]) -> Self {
        Self::build(Validation::Ok, failing, Some(Barrier::new(parties)))
    }

    fn build(validation: Validation, failing: &[&str], barrier: Option<Barrier>) -> Self {
        Self {
            state: Arc::new(ProviderState {
                validation,
                validate_calls: AtomicUsize::new(0),
                upserts: Mutex::new(Vec::new()),
                failing_records: failing.iter().map(|r| r.to_string()).collect(),
                remote: Mutex::new(HashMap::new()),
                barrier,
            }),
        }
    }

    pub fn validate_call_count(&self) -> usize {
        self.state.validate_calls.load(Ordering::SeqCst)
    }

    pub fn upserts(&self) -> Vec<UpsertCall> {
        self.state.upserts.lock().unwrap().clone()
    }

    pub fn upsert_count(&self) -> usize {
        self.state.upserts.lock().unwrap().len()
    }
}

#[async_trait::async_trait]
impl DnsProvider for RecordingProvider {
    async fn validate_domain(&self, domain: &str) -> Result<()> {
        self.state.validate_calls.fetch_add(1, Ordering::SeqCst);
        match self.state.validation {
            Validation::Ok => Ok(()),
            Validation::NotFound => Err(Error::domain_not_found(domain)),
            Validation::Status(status) => Err(Error::http(status, "validation failed")),
        }
    }

    async fn upsert_record(
        &self,
        domain: &str,
        record: &str,
        record_type: RecordType,
        new_ip: IpAddr,
    ) -> Result<UpsertOutcome> {
        self.state.upserts.lock().unwrap().push(UpsertCall {
            domain: domain.to_string(),
            record: record.to_string(),
            record_type,
            ip: new_ip,
        });

        if let Some(barrier) = &self.state.barrier {
            barrier.wait().await;
        }

        if self.state.failing_records.contains(record) {
            return Err(Error::http(500, "Internal Server Error"));
        }

        let mut remote = self.state.remote.lock().unwrap();
        let key = (record.to_string(), record_type);
        match remote.get(&key) {
            Some(id) => Ok(UpsertOutcome::Updated {
                record_id: id.clone(),
            }),
            None => {
                let id = format!("rec-{}", remote.len() + 1);
                remote.insert(key, id.clone());
                Ok(UpsertOutcome::Created {
                    record_id: Some(id),
                })
            }
        }
    }

    fn provider_name(&self) -> &'static str {
        "recording"
    }
}

/// Helper to create a minimal DdnsConfig for testing
pub fn minimal_config(records: &[&str], interval_secs: u64) -> DdnsConfig {
    let mut config = DdnsConfig::new(
        ProviderConfig::Arvan {
            api_key: "test-key".to_string(),
        },
        "example.com",
        records.iter().map(|r| r.to_string()).collect(),
    );
    config.ip_version = Some(IpVersion::V4);
    config.engine = EngineConfig {
        interval_secs,
        request_timeout_secs: 5,
        error_backoff_cap_secs: 60,
        network_backoff_cap_secs: 15,
        event_channel_capacity: 100,
    };
    config
}

/// Wire a polling loop around the given doubles
pub fn polling_loop(
    provider: &RecordingProvider,
    resolver: &ScriptedResolver,
    config: &DdnsConfig,
) -> (PollingLoop, mpsc::Receiver<EngineEvent>) {
    let coordinator = UpdateCoordinator::new(
        Box::new(provider.clone()),
        Box::new(resolver.clone()),
        config,
    )
    .expect("coordinator construction succeeds");

    PollingLoop::new(coordinator, config.engine.clone()).expect("loop construction succeeds")
}

/// Drain every event currently buffered
pub fn drain_events(rx: &mut mpsc::Receiver<EngineEvent>) -> Vec<EngineEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}
