// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! No-op backend driver.

use async_trait::async_trait;
use tracing::info;

use super::{Backend, Result, SyncReport};
use crate::models::{Domain, HealthStatus, Record, Server, TsigKey};

/// Backend that logs every call and touches no nameserver.
#[derive(Debug, Default)]
pub struct FakeBackend;

impl FakeBackend {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Backend for FakeBackend {
    fn name(&self) -> &'static str {
        "fake"
    }

    async fn start(&self) -> Result<()> {
        info!("Fake backend started");
        Ok(())
    }

    async fn stop(&self) -> Result<()> {
        info!("Fake backend stopped");
        Ok(())
    }

    async fn create_tsigkey(&self, tsigkey: &TsigKey) -> Result<()> {
        info!(tsigkey = %tsigkey.name, algorithm = %tsigkey.algorithm, "Create TSIG key");
        Ok(())
    }

    async fn update_tsigkey(&self, tsigkey: &TsigKey) -> Result<()> {
        info!(tsigkey = %tsigkey.name, algorithm = %tsigkey.algorithm, "Update TSIG key");
        Ok(())
    }

    async fn delete_tsigkey(&self, tsigkey: &TsigKey) -> Result<()> {
        info!(tsigkey = %tsigkey.name, "Delete TSIG key");
        Ok(())
    }

    async fn create_domain(&self, domain: &Domain) -> Result<()> {
        info!(domain = %domain.name, serial = domain.serial, "Create domain");
        Ok(())
    }

    async fn update_domain(&self, domain: &Domain) -> Result<()> {
        info!(domain = %domain.name, serial = domain.serial, "Update domain");
        Ok(())
    }

    async fn delete_domain(&self, domain: &Domain) -> Result<()> {
        info!(domain = %domain.name, "Delete domain");
        Ok(())
    }

    async fn create_record(&self, domain: &Domain, record: &Record) -> Result<()> {
        info!(
            domain = %domain.name,
            record = %record.name,
            record_type = %record.record_type,
            data = %record.data,
            "Create record"
        );
        Ok(())
    }

    async fn update_record(&self, domain: &Domain, previous: &Record, record: &Record) -> Result<()> {
        info!(
            domain = %domain.name,
            previous = %previous.name,
            record = %record.name,
            record_type = %record.record_type,
            data = %record.data,
            "Update record"
        );
        Ok(())
    }

    async fn delete_record(&self, domain: &Domain, record: &Record) -> Result<()> {
        info!(domain = %domain.name, record = %record.name, "Delete record");
        Ok(())
    }

    async fn sync_domain(
        &self,
        domain: &Domain,
        records: &[Record],
        servers: Option<&[Server]>,
    ) -> Result<SyncReport> {
        let report = SyncReport::new(domain, records, servers);
        info!(
            domain = %domain.name,
            records = report.records,
            servers = ?report.servers,
            zone_digest = %report.zone_digest,
            "Sync domain"
        );
        Ok(report)
    }

    async fn sync_record(&self, domain: &Domain, record: &Record) -> Result<()> {
        info!(domain = %domain.name, record = %record.name, "Sync record");
        Ok(())
    }

    async fn ping(&self) -> Result<HealthStatus> {
        Ok(HealthStatus::ok())
    }
}
