// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Storage collaborator contract.
//!
//! Storage is the source of truth for every resource. The central service
//! assumes per-entity CRUD with a uniqueness constraint on domain name (and on
//! server and TSIG key names); a second concurrent insert of the same name
//! must fail with [`StorageError::Duplicate`].
//!
//! Single-item lookups fail with [`StorageError::NotFound`] when nothing
//! matches. List lookups take a [`Criterion`] of exact-match filters.

pub mod memory;

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use uuid::Uuid;

use crate::errors::StorageError;
use crate::models::{
    CreateServer, Domain, HealthStatus, NewDomain, NewRecord, NewTsigKey, Record, Server, TsigKey,
};

pub use memory::MemoryStorage;

pub type Result<T> = std::result::Result<T, StorageError>;

/// Exact-match filters over an entity's serialized fields.
///
/// Keys are the serialized (camelCase) field names, e.g. `tenantId` or
/// `managedResourceId`. A `null` value matches entities where the field is
/// unset. An empty criterion matches everything.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct Criterion(BTreeMap<String, Value>);

impl Criterion {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a filter, replacing any previous filter on `key`.
    #[must_use]
    pub fn with(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: &str, value: impl Into<Value>) {
        self.0.insert(key.to_string(), value.into());
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns true if every filter matches the serialized `entity`.
    pub fn matches<T: Serialize>(&self, entity: &T) -> bool {
        if self.0.is_empty() {
            return true;
        }
        let Ok(Value::Object(fields)) = serde_json::to_value(entity) else {
            return false;
        };
        self.0.iter().all(|(key, expected)| match fields.get(key) {
            Some(actual) => actual == expected,
            None => expected.is_null(),
        })
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Criterion {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

/// Durable storage of domains, records, servers and TSIG keys.
#[async_trait]
pub trait Storage: Send + Sync {
    // Servers
    async fn create_server(&self, values: CreateServer) -> Result<Server>;
    async fn get_server(&self, id: Uuid) -> Result<Server>;
    async fn get_servers(&self, criterion: &Criterion) -> Result<Vec<Server>>;
    async fn update_server(&self, server: Server) -> Result<Server>;
    async fn delete_server(&self, id: Uuid) -> Result<Server>;

    // TSIG keys
    async fn create_tsigkey(&self, values: NewTsigKey) -> Result<TsigKey>;
    async fn get_tsigkey(&self, id: Uuid) -> Result<TsigKey>;
    async fn get_tsigkeys(&self, criterion: &Criterion) -> Result<Vec<TsigKey>>;
    async fn update_tsigkey(&self, tsigkey: TsigKey) -> Result<TsigKey>;
    async fn delete_tsigkey(&self, id: Uuid) -> Result<TsigKey>;

    // Domains
    async fn create_domain(&self, values: NewDomain) -> Result<Domain>;
    async fn get_domain(&self, id: Uuid) -> Result<Domain>;
    async fn get_domains(&self, criterion: &Criterion) -> Result<Vec<Domain>>;

    /// Single domain matching `criterion`; [`StorageError::NotFound`] if none.
    async fn find_domain(&self, criterion: &Criterion) -> Result<Domain>;

    async fn update_domain(&self, domain: Domain) -> Result<Domain>;

    /// Deletes a domain together with its records.
    async fn delete_domain(&self, id: Uuid) -> Result<Domain>;

    // Records
    async fn create_record(&self, values: NewRecord) -> Result<Record>;
    async fn get_record(&self, id: Uuid) -> Result<Record>;
    async fn get_records(&self, criterion: &Criterion) -> Result<Vec<Record>>;
    async fn update_record(&self, record: Record) -> Result<Record>;
    async fn delete_record(&self, id: Uuid) -> Result<Record>;

    async fn ping(&self) -> Result<HealthStatus>;
}
