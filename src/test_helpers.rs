// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Shared doubles and fixtures for unit tests.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::Value;
use uuid::Uuid;

use crate::backend::{self, Backend, SyncReport};
use crate::central::Central;
use crate::config::{CentralConfig, HandlerConfig};
use crate::constants::{CENTRAL_NOTIFICATION_TOPIC, DEFAULT_DNS_RECORD_TTL_SECS};
use crate::context::RequestContext;
use crate::errors::{BackendError, StorageError};
use crate::models::{
    CreateDomain, CreateServer, Domain, HealthStatus, NewDomain, NewRecord, NewTsigKey, Record,
    Server, TsigKey,
};
use crate::notification::Notifier;
use crate::policy::{PolicyGate, RulePolicy};
use crate::storage::{self, Criterion, MemoryStorage, Storage};

/// Backend that records every call as `"<operation>:<name>"`.
#[derive(Default)]
pub struct RecordingBackend {
    calls: Mutex<Vec<String>>,
    failing: AtomicBool,
}

impl RecordingBackend {
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    /// Make every later call fail.
    pub fn fail(&self) {
        self.failing.store(true, Ordering::SeqCst);
    }

    fn call(&self, entry: String) -> backend::Result<()> {
        self.calls.lock().unwrap().push(entry);
        if self.failing.load(Ordering::SeqCst) {
            return Err(BackendError::Driver(anyhow::anyhow!("backend unavailable")));
        }
        Ok(())
    }
}

#[async_trait]
impl Backend for RecordingBackend {
    fn name(&self) -> &'static str {
        "recording"
    }

    async fn start(&self) -> backend::Result<()> {
        self.call("start".to_string())
    }

    async fn stop(&self) -> backend::Result<()> {
        self.call("stop".to_string())
    }

    async fn create_tsigkey(&self, tsigkey: &TsigKey) -> backend::Result<()> {
        self.call(format!("create_tsigkey:{}", tsigkey.name))
    }

    async fn update_tsigkey(&self, tsigkey: &TsigKey) -> backend::Result<()> {
        self.call(format!("update_tsigkey:{}", tsigkey.name))
    }

    async fn delete_tsigkey(&self, tsigkey: &TsigKey) -> backend::Result<()> {
        self.call(format!("delete_tsigkey:{}", tsigkey.name))
    }

    async fn create_domain(&self, domain: &Domain) -> backend::Result<()> {
        self.call(format!("create_domain:{}", domain.name))
    }

    async fn update_domain(&self, domain: &Domain) -> backend::Result<()> {
        self.call(format!("update_domain:{}", domain.name))
    }

    async fn delete_domain(&self, domain: &Domain) -> backend::Result<()> {
        self.call(format!("delete_domain:{}", domain.name))
    }

    async fn create_record(&self, _domain: &Domain, record: &Record) -> backend::Result<()> {
        self.call(format!("create_record:{}", record.name))
    }

    async fn update_record(
        &self,
        _domain: &Domain,
        previous: &Record,
        record: &Record,
    ) -> backend::Result<()> {
        self.call(format!(
            "update_record:{}:{}->{}",
            record.name, previous.data, record.data
        ))
    }

    async fn delete_record(&self, _domain: &Domain, record: &Record) -> backend::Result<()> {
        self.call(format!("delete_record:{}", record.name))
    }

    async fn sync_domain(
        &self,
        domain: &Domain,
        records: &[Record],
        servers: Option<&[Server]>,
    ) -> backend::Result<SyncReport> {
        self.call(format!("sync_domain:{}", domain.name))?;
        Ok(SyncReport::new(domain, records, servers))
    }

    async fn sync_record(&self, _domain: &Domain, record: &Record) -> backend::Result<()> {
        self.call(format!("sync_record:{}", record.name))
    }

    async fn ping(&self) -> backend::Result<HealthStatus> {
        self.call("ping".to_string())?;
        Ok(HealthStatus::ok())
    }
}

/// Notifier that keeps every event.
#[derive(Default)]
pub struct RecordingNotifier {
    events: Mutex<Vec<(String, Value)>>,
}

impl RecordingNotifier {
    pub fn event_types(&self) -> Vec<String> {
        self.events
            .lock()
            .unwrap()
            .iter()
            .map(|(event_type, _)| event_type.clone())
            .collect()
    }

    pub fn last_payload(&self) -> Option<Value> {
        self.events.lock().unwrap().last().map(|(_, p)| p.clone())
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn notify(&self, _ctx: &RequestContext, event_type: &str, payload: Value) {
        self.events
            .lock()
            .unwrap()
            .push((event_type.to_string(), payload));
    }
}

/// Storage whose every call fails.
pub struct UnavailableStorage;

fn unavailable<T>() -> storage::Result<T> {
    Err(StorageError::Unavailable("connection refused".to_string()))
}

#[async_trait]
impl Storage for UnavailableStorage {
    async fn create_server(&self, _values: CreateServer) -> storage::Result<Server> {
        unavailable()
    }
    async fn get_server(&self, _id: Uuid) -> storage::Result<Server> {
        unavailable()
    }
    async fn get_servers(&self, _criterion: &Criterion) -> storage::Result<Vec<Server>> {
        unavailable()
    }
    async fn update_server(&self, _server: Server) -> storage::Result<Server> {
        unavailable()
    }
    async fn delete_server(&self, _id: Uuid) -> storage::Result<Server> {
        unavailable()
    }
    async fn create_tsigkey(&self, _values: NewTsigKey) -> storage::Result<TsigKey> {
        unavailable()
    }
    async fn get_tsigkey(&self, _id: Uuid) -> storage::Result<TsigKey> {
        unavailable()
    }
    async fn get_tsigkeys(&self, _criterion: &Criterion) -> storage::Result<Vec<TsigKey>> {
        unavailable()
    }
    async fn update_tsigkey(&self, _tsigkey: TsigKey) -> storage::Result<TsigKey> {
        unavailable()
    }
    async fn delete_tsigkey(&self, _id: Uuid) -> storage::Result<TsigKey> {
        unavailable()
    }
    async fn create_domain(&self, _values: NewDomain) -> storage::Result<Domain> {
        unavailable()
    }
    async fn get_domain(&self, _id: Uuid) -> storage::Result<Domain> {
        unavailable()
    }
    async fn get_domains(&self, _criterion: &Criterion) -> storage::Result<Vec<Domain>> {
        unavailable()
    }
    async fn find_domain(&self, _criterion: &Criterion) -> storage::Result<Domain> {
        unavailable()
    }
    async fn update_domain(&self, _domain: Domain) -> storage::Result<Domain> {
        unavailable()
    }
    async fn delete_domain(&self, _id: Uuid) -> storage::Result<Domain> {
        unavailable()
    }
    async fn create_record(&self, _values: NewRecord) -> storage::Result<Record> {
        unavailable()
    }
    async fn get_record(&self, _id: Uuid) -> storage::Result<Record> {
        unavailable()
    }
    async fn get_records(&self, _criterion: &Criterion) -> storage::Result<Vec<Record>> {
        unavailable()
    }
    async fn update_record(&self, _record: Record) -> storage::Result<Record> {
        unavailable()
    }
    async fn delete_record(&self, _id: Uuid) -> storage::Result<Record> {
        unavailable()
    }
    async fn ping(&self) -> storage::Result<HealthStatus> {
        unavailable()
    }
}

/// A central service wired to in-memory and recording collaborators.
pub struct Harness {
    pub central: Arc<Central>,
    pub storage: Arc<MemoryStorage>,
    pub backend: Arc<RecordingBackend>,
    pub notifier: Arc<RecordingNotifier>,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_config(CentralConfig::default())
    }

    pub fn with_config(config: CentralConfig) -> Self {
        let storage = Arc::new(MemoryStorage::new());
        let backend = Arc::new(RecordingBackend::default());
        let notifier = Arc::new(RecordingNotifier::default());
        let policy = PolicyGate::new(Arc::new(RulePolicy::from_config(&config.policy)));
        let central = Central::new(
            Arc::new(config),
            storage.clone(),
            backend.clone(),
            policy,
            notifier.clone(),
        )
        .unwrap();
        Self {
            central: Arc::new(central),
            storage,
            backend,
            notifier,
        }
    }

    /// Harness with one server registered.
    pub async fn with_server() -> Self {
        let harness = Self::new();
        harness.add_server().await;
        harness
    }

    pub async fn add_server(&self) -> Server {
        self.storage
            .create_server(CreateServer {
                name: "ns1.example.net.".to_string(),
            })
            .await
            .unwrap()
    }

    /// Creates `name` as a member of `tenant`.
    pub async fn domain(&self, tenant: &str, name: &str) -> Domain {
        self.central
            .create_domain(&tenant_ctx(tenant), create_domain(name))
            .await
            .unwrap()
    }
}

pub fn tenant_ctx(tenant: &str) -> RequestContext {
    RequestContext::new(format!("user-{tenant}"), tenant)
}

pub fn create_domain(name: &str) -> CreateDomain {
    CreateDomain {
        name: name.to_string(),
        email: "hostmaster@example.com".to_string(),
        ttl: None,
    }
}

pub fn handler_config(domain_id: Uuid) -> HandlerConfig {
    HandlerConfig {
        domain_id: Some(domain_id),
        domain_name: None,
        format: "{hostname}.{domain}".to_string(),
        control_exchange: None,
        notification_topics: vec![CENTRAL_NOTIFICATION_TOPIC.to_string()],
        ttl: DEFAULT_DNS_RECORD_TTL_SECS,
    }
}
