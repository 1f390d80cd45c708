// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! BIND9 backend driver.
//!
//! Zones are managed through the bindcar HTTP API sidecar. Records are pushed
//! with RFC 2136 dynamic updates signed by the configured update key.
//!
//! bindcar has no TSIG key endpoint, so key mutations are only logged. SOA
//! changes from `update_domain` (TTL, email, serial) reach the zone file on the
//! next `sync_domain`; `update_domain` itself only asks bindcar for a reload.

pub mod records;
pub mod tsig;
pub mod types;
pub mod zone_ops;

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use reqwest::Client as HttpClient;
use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use self::records::{build_record, DynamicUpdater, RecordUpdater, UpdateKind};
use self::types::{CreateZoneRequest, DnsRecord, SoaRecord, UpdateKey, ZoneConfig, ZONE_TYPE_PRIMARY};
use self::zone_ops::BindcarClient;
use super::{Backend, Result, SyncReport};
use crate::config::Bind9Config;
use crate::constants::{
    DEFAULT_SOA_EXPIRE_SECS, DEFAULT_SOA_NEGATIVE_TTL_SECS, DEFAULT_SOA_REFRESH_SECS,
    DEFAULT_SOA_RETRY_SECS,
};
use crate::errors::ConfigError;
use crate::models::{Domain, HealthStatus, Record, Server, TsigKey};

/// Backend driving one BIND9 primary through bindcar.
#[derive(Debug)]
pub struct Bind9Backend {
    api: BindcarClient,
    updater: Arc<dyn RecordUpdater>,
    update_key_name: String,
    name_server_ips: BTreeMap<String, String>,
}

fn invalid(reason: impl Into<String>) -> ConfigError {
    ConfigError::Invalid {
        section: "bind9".to_string(),
        reason: reason.into(),
    }
}

impl Bind9Backend {
    /// Build the driver from its configuration section.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] if the DNS server address, the update
    /// key or the HTTP client cannot be set up.
    pub fn new(settings: &Bind9Config) -> std::result::Result<Self, ConfigError> {
        let dns_server: SocketAddr = settings.dns_server.parse().map_err(|_| {
            invalid(format!(
                "dnsServer '{}' is not an IP:port address",
                settings.dns_server
            ))
        })?;

        let key = UpdateKey {
            name: settings.update_key_name.clone(),
            algorithm: settings.update_key_algorithm,
            secret: settings.update_key_secret.clone(),
        };
        if BASE64.decode(&key.secret).is_err() {
            return Err(invalid("updateKeySecret is not valid base64"));
        }
        tsig::create_tsig_signer(&key).map_err(|e| invalid(format!("{e:#}")))?;

        let http = HttpClient::builder()
            .build()
            .map_err(|e| invalid(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            api: BindcarClient::new(
                http,
                &settings.bindcar_url,
                settings.api_token.clone(),
                Duration::from_secs(settings.max_retry_secs),
            ),
            updater: Arc::new(DynamicUpdater::new(dns_server, key)),
            update_key_name: settings.update_key_name.clone(),
            name_server_ips: settings.name_server_ips.clone(),
        })
    }

    fn zone_request(
        &self,
        domain: &Domain,
        records: &[Record],
        servers: Option<&[Server]>,
    ) -> CreateZoneRequest {
        let name_servers: Vec<String> = match servers {
            Some(servers) if !servers.is_empty() => servers.iter().map(|s| s.name.clone()).collect(),
            _ => self.name_server_ips.keys().cloned().collect(),
        };
        let name_server_ips = self
            .name_server_ips
            .iter()
            .filter(|(name, _)| name_servers.contains(name))
            .map(|(name, ip)| (name.clone(), ip.clone()))
            .collect();
        let primary_ns = name_servers
            .first()
            .cloned()
            .unwrap_or_else(|| domain.name.clone());

        CreateZoneRequest {
            zone_name: api_zone_name(&domain.name).to_string(),
            zone_type: ZONE_TYPE_PRIMARY.to_string(),
            zone_config: ZoneConfig {
                ttl: domain.ttl,
                soa: SoaRecord {
                    primary_ns,
                    admin_email: soa_rname(&domain.email),
                    serial: domain.serial,
                    refresh: DEFAULT_SOA_REFRESH_SECS,
                    retry: DEFAULT_SOA_RETRY_SECS,
                    expire: DEFAULT_SOA_EXPIRE_SECS,
                    negative_ttl: DEFAULT_SOA_NEGATIVE_TTL_SECS,
                },
                name_servers,
                name_server_ips,
                records: records.iter().map(wire_record).collect(),
            },
            update_key_name: Some(self.update_key_name.clone()),
        }
    }

    async fn send(&self, kind: UpdateKind, domain: &Domain, record: &Record) -> Result<()> {
        let dns_record = build_record(record, domain.ttl)?;
        self.updater.update(kind, &domain.name, dns_record).await
    }
}

/// Zone name as bindcar addresses it (no trailing dot).
#[must_use]
pub fn api_zone_name(name: &str) -> &str {
    name.strip_suffix('.').unwrap_or(name)
}

/// SOA RNAME form of a contact email: `hostmaster@example.com` becomes `hostmaster.example.com.`.
#[must_use]
pub fn soa_rname(email: &str) -> String {
    let rname = match email.split_once('@') {
        Some((local, host)) => format!("{}.{host}", local.replace('.', "\\.")),
        None => email.to_string(),
    };
    if rname.ends_with('.') {
        rname
    } else {
        format!("{rname}.")
    }
}

fn wire_record(record: &Record) -> DnsRecord {
    DnsRecord {
        name: record.name.clone(),
        record_type: record.record_type.to_string(),
        value: record.data.clone(),
        ttl: record.ttl,
        priority: record.priority,
    }
}

#[async_trait]
impl Backend for Bind9Backend {
    fn name(&self) -> &'static str {
        "bind9"
    }

    async fn start(&self) -> Result<()> {
        info!(
            endpoint = %self.api.base_url(),
            dns_server = %self.updater.server(),
            "BIND9 backend started"
        );
        Ok(())
    }

    async fn stop(&self) -> Result<()> {
        info!("BIND9 backend stopped");
        Ok(())
    }

    async fn create_tsigkey(&self, tsigkey: &TsigKey) -> Result<()> {
        warn!(tsigkey = %tsigkey.name, "TSIG keys are not managed through bindcar; skipping create");
        Ok(())
    }

    async fn update_tsigkey(&self, tsigkey: &TsigKey) -> Result<()> {
        warn!(tsigkey = %tsigkey.name, "TSIG keys are not managed through bindcar; skipping update");
        Ok(())
    }

    async fn delete_tsigkey(&self, tsigkey: &TsigKey) -> Result<()> {
        warn!(tsigkey = %tsigkey.name, "TSIG keys are not managed through bindcar; skipping delete");
        Ok(())
    }

    async fn create_domain(&self, domain: &Domain) -> Result<()> {
        let request = self.zone_request(domain, &[], None);
        self.api.create_zone(&request).await?;
        Ok(())
    }

    async fn update_domain(&self, domain: &Domain) -> Result<()> {
        self.api.reload_zone(api_zone_name(&domain.name)).await
    }

    async fn delete_domain(&self, domain: &Domain) -> Result<()> {
        self.api.delete_zone(api_zone_name(&domain.name)).await?;
        Ok(())
    }

    async fn create_record(&self, domain: &Domain, record: &Record) -> Result<()> {
        self.send(UpdateKind::Append, domain, record).await
    }

    /// Removes exactly the previous RR, then adds the new one. Other records
    /// sharing the name and type are left alone.
    async fn update_record(&self, domain: &Domain, previous: &Record, record: &Record) -> Result<()> {
        self.send(UpdateKind::DeleteRdata, domain, previous).await?;
        self.send(UpdateKind::Append, domain, record).await
    }

    async fn delete_record(&self, domain: &Domain, record: &Record) -> Result<()> {
        self.send(UpdateKind::DeleteRdata, domain, record).await
    }

    async fn sync_domain(
        &self,
        domain: &Domain,
        records: &[Record],
        servers: Option<&[Server]>,
    ) -> Result<SyncReport> {
        let zone_name = api_zone_name(&domain.name);
        self.api.delete_zone(zone_name).await?;
        let request = self.zone_request(domain, records, servers);
        self.api.create_zone(&request).await?;

        let report = SyncReport::new(domain, records, servers);
        info!(
            domain = %domain.name,
            records = report.records,
            zone_digest = %report.zone_digest,
            "Synced zone to BIND9"
        );
        Ok(report)
    }

    async fn sync_record(&self, domain: &Domain, record: &Record) -> Result<()> {
        self.send(UpdateKind::Append, domain, record).await
    }

    async fn ping(&self) -> Result<HealthStatus> {
        let status = self.api.server_status().await?;
        Ok(HealthStatus {
            status: true,
            message: (!status.is_empty()).then_some(status),
        })
    }
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod mod_tests;
