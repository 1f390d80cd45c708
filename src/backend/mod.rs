// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Backend nameserver drivers.
//!
//! A backend pushes zone, record and TSIG key state to an authoritative
//! nameserver. The central service calls it after storage has been written on
//! create/update, and before storage is deleted on delete. A backend failure
//! after a storage write is not rolled back; `sync_domain` and `sync_all` are
//! the repair path.
//!
//! # Drivers
//!
//! - [`fake::FakeBackend`] (`fake`) - logs every call and performs no I/O
//! - [`bind9::Bind9Backend`] (`bind9`) - zones via the bindcar HTTP API,
//!   records via RFC 2136 dynamic updates signed with TSIG
//!
//! Drivers are resolved once by name with [`from_config`].

pub mod bind9;
pub mod fake;
pub mod retry;

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::info;

use crate::config::CentralConfig;
use crate::errors::{BackendError, ConfigError};
use crate::models::{Domain, HealthStatus, Record, Server, TsigKey};

pub type Result<T> = std::result::Result<T, BackendError>;

/// Outcome of a full zone sync.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncReport {
    pub domain_name: String,
    /// Number of records pushed
    pub records: usize,
    /// Number of name servers announced, when servers were supplied
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub servers: Option<usize>,
    /// SHA-256 over the synced zone content
    pub zone_digest: String,
}

impl SyncReport {
    #[must_use]
    pub fn new(domain: &Domain, records: &[Record], servers: Option<&[Server]>) -> Self {
        Self {
            domain_name: domain.name.clone(),
            records: records.len(),
            servers: servers.map(<[Server]>::len),
            zone_digest: zone_digest(domain, records),
        }
    }
}

#[derive(Serialize)]
struct ZoneContent<'a> {
    name: &'a str,
    serial: u32,
    ttl: u32,
    records: Vec<(&'a str, &'a str, &'a str, Option<u16>, Option<u32>)>,
}

/// SHA-256 hex digest of a zone's name, serial, TTL and record set.
///
/// Record order does not affect the digest.
#[must_use]
pub fn zone_digest(domain: &Domain, records: &[Record]) -> String {
    let mut rows: Vec<_> = records
        .iter()
        .map(|r| {
            (
                r.name.as_str(),
                r.record_type.as_str(),
                r.data.as_str(),
                r.priority,
                r.ttl,
            )
        })
        .collect();
    rows.sort_unstable();

    let content = ZoneContent {
        name: &domain.name,
        serial: domain.serial,
        ttl: domain.ttl,
        records: rows,
    };
    let json = serde_json::to_string(&content).unwrap_or_default();
    let mut hasher = Sha256::new();
    hasher.update(json.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Driver contract for an authoritative nameserver.
#[async_trait]
pub trait Backend: Send + Sync {
    /// Registered driver name.
    fn name(&self) -> &'static str;

    async fn start(&self) -> Result<()>;
    async fn stop(&self) -> Result<()>;

    async fn create_tsigkey(&self, tsigkey: &TsigKey) -> Result<()>;
    async fn update_tsigkey(&self, tsigkey: &TsigKey) -> Result<()>;
    async fn delete_tsigkey(&self, tsigkey: &TsigKey) -> Result<()>;

    async fn create_domain(&self, domain: &Domain) -> Result<()>;
    async fn update_domain(&self, domain: &Domain) -> Result<()>;
    async fn delete_domain(&self, domain: &Domain) -> Result<()>;

    async fn create_record(&self, domain: &Domain, record: &Record) -> Result<()>;
    /// `previous` is the record as the nameserver last saw it; name, type
    /// and data may all differ from `record`.
    async fn update_record(&self, domain: &Domain, previous: &Record, record: &Record)
        -> Result<()>;
    async fn delete_record(&self, domain: &Domain, record: &Record) -> Result<()>;

    /// Pushes the full state of one zone, replacing whatever the nameserver holds.
    ///
    /// `servers` is supplied by bulk repair so the driver can announce the
    /// current name server set; single-zone syncs pass `None`.
    async fn sync_domain(
        &self,
        domain: &Domain,
        records: &[Record],
        servers: Option<&[Server]>,
    ) -> Result<SyncReport>;

    async fn sync_record(&self, domain: &Domain, record: &Record) -> Result<()>;

    async fn ping(&self) -> Result<HealthStatus>;
}

/// Resolves the configured backend driver.
///
/// # Errors
///
/// Returns [`ConfigError::UnknownBackend`] for an unregistered driver name and
/// [`ConfigError::Invalid`] if the driver's configuration section is missing
/// or unusable.
pub fn from_config(config: &CentralConfig) -> std::result::Result<Arc<dyn Backend>, ConfigError> {
    let backend: Arc<dyn Backend> = match config.backend_driver.as_str() {
        "fake" => Arc::new(fake::FakeBackend::new()),
        "bind9" => {
            let settings = config.bind9.as_ref().ok_or_else(|| ConfigError::Invalid {
                section: "bind9".to_string(),
                reason: "backend driver 'bind9' requires a bind9 section".to_string(),
            })?;
            Arc::new(bind9::Bind9Backend::new(settings)?)
        }
        other => return Err(ConfigError::UnknownBackend(other.to_string())),
    };
    info!(driver = backend.name(), "Loaded backend driver");
    Ok(backend)
}
