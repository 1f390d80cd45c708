// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! In-process storage.
//!
//! Keeps every table behind one `tokio::sync::RwLock`, so uniqueness checks
//! and inserts happen inside the same write critical section. Used by the
//! binary when no external storage is wired in, and by tests.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

use super::{Criterion, Result, Storage};
use crate::errors::{EntityKind, StorageError};
use crate::models::{
    CreateServer, Domain, DomainStatus, HealthStatus, NewDomain, NewRecord, NewTsigKey, Record,
    Server, TsigKey,
};

#[derive(Default)]
struct Tables {
    servers: HashMap<Uuid, Server>,
    tsigkeys: HashMap<Uuid, TsigKey>,
    domains: HashMap<Uuid, Domain>,
    records: HashMap<Uuid, Record>,
}

/// In-memory implementation of [`Storage`].
#[derive(Default)]
pub struct MemoryStorage {
    tables: RwLock<Tables>,
}

impl MemoryStorage {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

fn not_found(entity: EntityKind, id: impl ToString) -> StorageError {
    StorageError::NotFound {
        entity,
        id: id.to_string(),
    }
}

fn duplicate(entity: EntityKind, name: &str) -> StorageError {
    StorageError::Duplicate {
        entity,
        name: name.to_string(),
    }
}

/// Rows matching `criterion`, ordered by creation time for stable listings.
fn select<T, F>(rows: &HashMap<Uuid, T>, criterion: &Criterion, created_at: F) -> Vec<T>
where
    T: Clone + serde::Serialize,
    F: Fn(&T) -> chrono::DateTime<Utc>,
{
    let mut matched: Vec<T> = rows
        .values()
        .filter(|row| criterion.matches(row))
        .cloned()
        .collect();
    matched.sort_by_key(created_at);
    matched
}

#[async_trait]
impl Storage for MemoryStorage {
    async fn create_server(&self, values: CreateServer) -> Result<Server> {
        let mut tables = self.tables.write().await;
        if tables.servers.values().any(|s| s.name == values.name) {
            return Err(duplicate(EntityKind::Server, &values.name));
        }
        let server = Server {
            id: Uuid::new_v4(),
            name: values.name,
            created_at: Utc::now(),
            updated_at: None,
        };
        tables.servers.insert(server.id, server.clone());
        debug!(server_id = %server.id, "Stored server");
        Ok(server)
    }

    async fn get_server(&self, id: Uuid) -> Result<Server> {
        let tables = self.tables.read().await;
        tables
            .servers
            .get(&id)
            .cloned()
            .ok_or_else(|| not_found(EntityKind::Server, id))
    }

    async fn get_servers(&self, criterion: &Criterion) -> Result<Vec<Server>> {
        let tables = self.tables.read().await;
        Ok(select(&tables.servers, criterion, |s| s.created_at))
    }

    async fn update_server(&self, mut server: Server) -> Result<Server> {
        let mut tables = self.tables.write().await;
        if !tables.servers.contains_key(&server.id) {
            return Err(not_found(EntityKind::Server, server.id));
        }
        if tables
            .servers
            .values()
            .any(|s| s.id != server.id && s.name == server.name)
        {
            return Err(duplicate(EntityKind::Server, &server.name));
        }
        server.updated_at = Some(Utc::now());
        tables.servers.insert(server.id, server.clone());
        Ok(server)
    }

    async fn delete_server(&self, id: Uuid) -> Result<Server> {
        let mut tables = self.tables.write().await;
        tables
            .servers
            .remove(&id)
            .ok_or_else(|| not_found(EntityKind::Server, id))
    }

    async fn create_tsigkey(&self, values: NewTsigKey) -> Result<TsigKey> {
        let mut tables = self.tables.write().await;
        if tables.tsigkeys.values().any(|k| k.name == values.name) {
            return Err(duplicate(EntityKind::TsigKey, &values.name));
        }
        let tsigkey = TsigKey {
            id: Uuid::new_v4(),
            name: values.name,
            algorithm: values.algorithm,
            secret: values.secret,
            created_at: Utc::now(),
            updated_at: None,
        };
        tables.tsigkeys.insert(tsigkey.id, tsigkey.clone());
        Ok(tsigkey)
    }

    async fn get_tsigkey(&self, id: Uuid) -> Result<TsigKey> {
        let tables = self.tables.read().await;
        tables
            .tsigkeys
            .get(&id)
            .cloned()
            .ok_or_else(|| not_found(EntityKind::TsigKey, id))
    }

    async fn get_tsigkeys(&self, criterion: &Criterion) -> Result<Vec<TsigKey>> {
        let tables = self.tables.read().await;
        Ok(select(&tables.tsigkeys, criterion, |k| k.created_at))
    }

    async fn update_tsigkey(&self, mut tsigkey: TsigKey) -> Result<TsigKey> {
        let mut tables = self.tables.write().await;
        if !tables.tsigkeys.contains_key(&tsigkey.id) {
            return Err(not_found(EntityKind::TsigKey, tsigkey.id));
        }
        if tables
            .tsigkeys
            .values()
            .any(|k| k.id != tsigkey.id && k.name == tsigkey.name)
        {
            return Err(duplicate(EntityKind::TsigKey, &tsigkey.name));
        }
        tsigkey.updated_at = Some(Utc::now());
        tables.tsigkeys.insert(tsigkey.id, tsigkey.clone());
        Ok(tsigkey)
    }

    async fn delete_tsigkey(&self, id: Uuid) -> Result<TsigKey> {
        let mut tables = self.tables.write().await;
        tables
            .tsigkeys
            .remove(&id)
            .ok_or_else(|| not_found(EntityKind::TsigKey, id))
    }

    async fn create_domain(&self, values: NewDomain) -> Result<Domain> {
        let mut tables = self.tables.write().await;
        if tables.domains.values().any(|d| d.name == values.name) {
            return Err(duplicate(EntityKind::Domain, &values.name));
        }
        let domain = Domain {
            id: Uuid::new_v4(),
            name: values.name,
            email: values.email,
            ttl: values.ttl,
            serial: values.serial,
            tenant_id: values.tenant_id,
            parent_domain_id: values.parent_domain_id,
            status: DomainStatus::Active,
            created_at: Utc::now(),
            updated_at: None,
        };
        tables.domains.insert(domain.id, domain.clone());
        debug!(domain_id = %domain.id, domain_name = %domain.name, "Stored domain");
        Ok(domain)
    }

    async fn get_domain(&self, id: Uuid) -> Result<Domain> {
        let tables = self.tables.read().await;
        tables
            .domains
            .get(&id)
            .cloned()
            .ok_or_else(|| not_found(EntityKind::Domain, id))
    }

    async fn get_domains(&self, criterion: &Criterion) -> Result<Vec<Domain>> {
        let tables = self.tables.read().await;
        Ok(select(&tables.domains, criterion, |d| d.created_at))
    }

    async fn find_domain(&self, criterion: &Criterion) -> Result<Domain> {
        let tables = self.tables.read().await;
        select(&tables.domains, criterion, |d| d.created_at)
            .into_iter()
            .next()
            .ok_or_else(|| {
                let id = serde_json::to_string(criterion).unwrap_or_default();
                not_found(EntityKind::Domain, id)
            })
    }

    async fn update_domain(&self, mut domain: Domain) -> Result<Domain> {
        let mut tables = self.tables.write().await;
        if !tables.domains.contains_key(&domain.id) {
            return Err(not_found(EntityKind::Domain, domain.id));
        }
        if tables
            .domains
            .values()
            .any(|d| d.id != domain.id && d.name == domain.name)
        {
            return Err(duplicate(EntityKind::Domain, &domain.name));
        }
        domain.updated_at = Some(Utc::now());
        tables.domains.insert(domain.id, domain.clone());
        Ok(domain)
    }

    async fn delete_domain(&self, id: Uuid) -> Result<Domain> {
        let mut tables = self.tables.write().await;
        let domain = tables
            .domains
            .remove(&id)
            .ok_or_else(|| not_found(EntityKind::Domain, id))?;
        tables.records.retain(|_, r| r.domain_id != id);
        Ok(domain)
    }

    async fn create_record(&self, values: NewRecord) -> Result<Record> {
        let mut tables = self.tables.write().await;
        if !tables.domains.contains_key(&values.domain_id) {
            return Err(not_found(EntityKind::Domain, values.domain_id));
        }
        let v = values.values;
        let record = Record {
            id: Uuid::new_v4(),
            domain_id: values.domain_id,
            name: v.name,
            record_type: v.record_type,
            data: v.data,
            priority: v.priority,
            ttl: v.ttl,
            managed_resource_type: v.managed_resource_type,
            managed_resource_id: v.managed_resource_id,
            created_at: Utc::now(),
            updated_at: None,
        };
        tables.records.insert(record.id, record.clone());
        Ok(record)
    }

    async fn get_record(&self, id: Uuid) -> Result<Record> {
        let tables = self.tables.read().await;
        tables
            .records
            .get(&id)
            .cloned()
            .ok_or_else(|| not_found(EntityKind::Record, id))
    }

    async fn get_records(&self, criterion: &Criterion) -> Result<Vec<Record>> {
        let tables = self.tables.read().await;
        Ok(select(&tables.records, criterion, |r| r.created_at))
    }

    async fn update_record(&self, mut record: Record) -> Result<Record> {
        let mut tables = self.tables.write().await;
        if !tables.records.contains_key(&record.id) {
            return Err(not_found(EntityKind::Record, record.id));
        }
        record.updated_at = Some(Utc::now());
        tables.records.insert(record.id, record.clone());
        Ok(record)
    }

    async fn delete_record(&self, id: Uuid) -> Result<Record> {
        let mut tables = self.tables.write().await;
        tables
            .records
            .remove(&id)
            .ok_or_else(|| not_found(EntityKind::Record, id))
    }

    async fn ping(&self) -> Result<HealthStatus> {
        let tables = self.tables.read().await;
        debug!(
            domains = tables.domains.len(),
            records = tables.records.len(),
            "Memory storage ping"
        );
        Ok(HealthStatus::ok())
    }
}

#[cfg(test)]
#[path = "memory_tests.rs"]
mod memory_tests;
