// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Common test utilities for integration tests

#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use dnscentral::backend::{self, Backend, SyncReport};
use dnscentral::central::Central;
use dnscentral::config::CentralConfig;
use dnscentral::context::RequestContext;
use dnscentral::errors::BackendError;
use dnscentral::models::{CreateDomain, CreateServer, Domain, HealthStatus, Record, Server, TsigKey};
use dnscentral::notification::Notifier;
use dnscentral::policy::{PolicyGate, RulePolicy};
use dnscentral::storage::{Criterion, MemoryStorage, Storage};
use serde_json::Value;

/// Backend that logs `"<operation>:<name>"` and can be switched to failing.
#[derive(Default)]
pub struct ScriptedBackend {
    calls: Mutex<Vec<String>>,
    failing: AtomicBool,
}

impl ScriptedBackend {
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    fn record(&self, entry: String) -> backend::Result<()> {
        self.calls.lock().unwrap().push(entry);
        if self.failing.load(Ordering::SeqCst) {
            return Err(BackendError::Driver(anyhow::anyhow!("nameserver unreachable")));
        }
        Ok(())
    }
}

#[async_trait]
impl Backend for ScriptedBackend {
    fn name(&self) -> &'static str {
        "scripted"
    }
    async fn start(&self) -> backend::Result<()> {
        self.record("start".to_string())
    }
    async fn stop(&self) -> backend::Result<()> {
        self.record("stop".to_string())
    }
    async fn create_tsigkey(&self, tsigkey: &TsigKey) -> backend::Result<()> {
        self.record(format!("create_tsigkey:{}", tsigkey.name))
    }
    async fn update_tsigkey(&self, tsigkey: &TsigKey) -> backend::Result<()> {
        self.record(format!("update_tsigkey:{}", tsigkey.name))
    }
    async fn delete_tsigkey(&self, tsigkey: &TsigKey) -> backend::Result<()> {
        self.record(format!("delete_tsigkey:{}", tsigkey.name))
    }
    async fn create_domain(&self, domain: &Domain) -> backend::Result<()> {
        self.record(format!("create_domain:{}", domain.name))
    }
    async fn update_domain(&self, domain: &Domain) -> backend::Result<()> {
        self.record(format!("update_domain:{}", domain.name))
    }
    async fn delete_domain(&self, domain: &Domain) -> backend::Result<()> {
        self.record(format!("delete_domain:{}", domain.name))
    }
    async fn create_record(&self, _domain: &Domain, record: &Record) -> backend::Result<()> {
        self.record(format!("create_record:{}", record.name))
    }
    async fn update_record(
        &self,
        _domain: &Domain,
        _previous: &Record,
        record: &Record,
    ) -> backend::Result<()> {
        self.record(format!("update_record:{}", record.name))
    }
    async fn delete_record(&self, _domain: &Domain, record: &Record) -> backend::Result<()> {
        self.record(format!("delete_record:{}", record.name))
    }
    async fn sync_domain(
        &self,
        domain: &Domain,
        records: &[Record],
        servers: Option<&[Server]>,
    ) -> backend::Result<SyncReport> {
        self.record(format!("sync_domain:{}", domain.name))?;
        Ok(SyncReport::new(domain, records, servers))
    }
    async fn sync_record(&self, _domain: &Domain, record: &Record) -> backend::Result<()> {
        self.record(format!("sync_record:{}", record.name))
    }
    async fn ping(&self) -> backend::Result<HealthStatus> {
        self.record("ping".to_string())?;
        Ok(HealthStatus::ok())
    }
}

/// Notifier that keeps event types in order.
#[derive(Default)]
pub struct CollectingNotifier {
    events: Mutex<Vec<String>>,
}

impl CollectingNotifier {
    pub fn events(&self) -> Vec<String> {
        self.events.lock().unwrap().clone()
    }
}

#[async_trait]
impl Notifier for CollectingNotifier {
    async fn notify(&self, _ctx: &RequestContext, event_type: &str, _payload: Value) {
        self.events.lock().unwrap().push(event_type.to_string());
    }
}

pub struct TestService {
    pub central: Arc<Central>,
    pub storage: Arc<MemoryStorage>,
    pub backend: Arc<ScriptedBackend>,
    pub notifier: Arc<CollectingNotifier>,
}

impl TestService {
    pub fn new(config: CentralConfig) -> Self {
        let storage = Arc::new(MemoryStorage::new());
        let backend = Arc::new(ScriptedBackend::default());
        let notifier = Arc::new(CollectingNotifier::default());
        let policy = PolicyGate::new(Arc::new(RulePolicy::from_config(&config.policy)));
        let central = Central::new(
            Arc::new(config),
            storage.clone(),
            backend.clone(),
            policy,
            notifier.clone(),
        )
        .expect("valid configuration");
        Self {
            central: Arc::new(central),
            storage,
            backend,
            notifier,
        }
    }

    pub async fn with_server() -> Self {
        let service = Self::new(CentralConfig::default());
        service
            .central
            .create_server(
                &RequestContext::admin(),
                CreateServer {
                    name: "ns1.example.net.".to_string(),
                },
            )
            .await
            .expect("server created");
        service
    }

    pub async fn domain_count(&self) -> usize {
        self.storage
            .get_domains(&Criterion::new())
            .await
            .expect("storage available")
            .len()
    }
}

pub fn tenant(id: &str) -> RequestContext {
    RequestContext::new(format!("{id}-user"), id)
}

pub fn new_domain(name: &str) -> CreateDomain {
    CreateDomain {
        name: name.to_string(),
        email: "hostmaster@example.com".to_string(),
        ttl: None,
    }
}
