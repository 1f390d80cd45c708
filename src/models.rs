// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Resource models managed by the central service.
//!
//! # Resource Types
//!
//! - [`Domain`] - A DNS zone owned by one tenant
//! - [`Record`] - A DNS resource record scoped to exactly one zone
//! - [`Server`] - An authoritative name server (metadata only)
//! - [`TsigKey`] - A shared secret used to sign dynamic updates and transfers
//!
//! Every resource has a separate create payload (`CreateX`) and update payload
//! (`UpdateX`). In update payloads, `Some` means "present in values": only the
//! fields that are set are applied.
//!
//! # Example
//!
//! ```rust
//! use dnscentral::models::{CreateDomain, CreateRecord, RecordType};
//!
//! let zone = CreateDomain {
//!     name: "example.com.".to_string(),
//!     email: "hostmaster@example.com".to_string(),
//!     ttl: Some(3600),
//! };
//!
//! let www = CreateRecord {
//!     name: "www.example.com.".to_string(),
//!     record_type: RecordType::A,
//!     data: "192.0.2.1".to_string(),
//!     ..CreateRecord::default()
//! };
//! ```

use std::fmt;

use chrono::{DateTime, Datelike, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::constants::DEFAULT_ZONE_TTL_SECS;

/// Lifecycle status of a domain.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "UPPERCASE")]
pub enum DomainStatus {
    /// The zone is served by the backend
    #[default]
    Active,
}

/// A DNS zone.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Domain {
    pub id: Uuid,

    /// Fully-qualified zone name with trailing dot (e.g. `example.com.`).
    /// Globally unique.
    pub name: String,

    /// Zone administrator email, used as the SOA responsible party.
    pub email: String,

    /// Default TTL of the zone in seconds.
    pub ttl: u32,

    /// SOA serial number in `YYYYMMDDnn` form.
    pub serial: u32,

    /// Owning tenant. `None` for domains created without tenant identity.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tenant_id: Option<String>,

    /// Nearest existing ancestor zone owned by the same tenant, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_domain_id: Option<Uuid>,

    pub status: DomainStatus,

    pub created_at: DateTime<Utc>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Domain {
    /// Applies an update payload, bumping the serial.
    ///
    /// Name and tenant checks are the caller's responsibility; this only
    /// copies the present values.
    #[must_use]
    pub fn with_update(&self, values: &UpdateDomain) -> Self {
        let mut updated = self.clone();
        if let Some(name) = &values.name {
            updated.name.clone_from(name);
        }
        if let Some(email) = &values.email {
            updated.email.clone_from(email);
        }
        if let Some(ttl) = values.ttl {
            updated.ttl = ttl;
        }
        if let Some(tenant_id) = &values.tenant_id {
            updated.tenant_id = Some(tenant_id.clone());
        }
        updated.serial = next_serial(self.serial);
        updated
    }
}

/// Payload for creating a domain.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateDomain {
    pub name: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ttl: Option<u32>,
}

/// Payload for updating a domain.
///
/// Setting `tenant_id` requests a tenant transfer; setting `name` to anything
/// other than the stored name is rejected.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateDomain {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ttl: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tenant_id: Option<String>,
}

/// A fully-resolved domain handed to storage for insertion.
#[derive(Clone, Debug, PartialEq)]
pub struct NewDomain {
    pub name: String,
    pub email: String,
    pub ttl: u32,
    pub serial: u32,
    pub tenant_id: Option<String>,
    pub parent_domain_id: Option<Uuid>,
}

impl NewDomain {
    /// Builds a new domain from a create payload, stamping the initial serial
    /// for `today`.
    #[must_use]
    pub fn from_payload(
        values: CreateDomain,
        tenant_id: Option<String>,
        parent_domain_id: Option<Uuid>,
        today: DateTime<Utc>,
    ) -> Self {
        Self {
            name: values.name,
            email: values.email,
            ttl: values.ttl.unwrap_or(DEFAULT_ZONE_TTL_SECS),
            serial: initial_serial(today),
            tenant_id,
            parent_domain_id,
        }
    }
}

/// Initial SOA serial for a zone created at `now`: `YYYYMMDD01`.
#[must_use]
pub fn initial_serial(now: DateTime<Utc>) -> u32 {
    let date = now.date_naive();
    let year = u32::try_from(date.year()).unwrap_or(0);
    year * 1_000_000 + date.month() * 10_000 + date.day() * 100 + 1
}

/// Next serial after `serial`, wrapping per RFC 1982 serial arithmetic.
#[must_use]
pub fn next_serial(serial: u32) -> u32 {
    serial.wrapping_add(1)
}

/// DNS record types understood by the service.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "UPPERCASE")]
#[allow(clippy::upper_case_acronyms)]
pub enum RecordType {
    /// IPv4 address
    #[default]
    A,
    /// IPv6 address
    AAAA,
    /// Canonical name (alias)
    CNAME,
    /// Mail exchange; uses `priority`
    MX,
    /// Name server delegation
    NS,
    /// Reverse pointer
    PTR,
    /// Service location; uses `priority`, data is `weight port target`
    SRV,
    /// Free-form text
    TXT,
}

impl RecordType {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::A => "A",
            Self::AAAA => "AAAA",
            Self::CNAME => "CNAME",
            Self::MX => "MX",
            Self::NS => "NS",
            Self::PTR => "PTR",
            Self::SRV => "SRV",
            Self::TXT => "TXT",
        }
    }
}

impl fmt::Display for RecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A DNS resource record.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Record {
    pub id: Uuid,

    /// Owning domain. Every record operation must address this domain.
    pub domain_id: Uuid,

    /// Fully-qualified owner name; always ends with the owning domain's name.
    pub name: String,

    #[serde(rename = "type")]
    pub record_type: RecordType,

    /// Presentation-format record data (address, target name, text...).
    pub data: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<u16>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub ttl: Option<u32>,

    /// Kind of platform resource this record was created for (e.g. `instance`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub managed_resource_type: Option<String>,

    /// Id of the platform resource this record was created for.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub managed_resource_id: Option<String>,

    pub created_at: DateTime<Utc>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Record {
    #[must_use]
    pub fn with_update(&self, values: &UpdateRecord) -> Self {
        let mut updated = self.clone();
        if let Some(name) = &values.name {
            updated.name.clone_from(name);
        }
        if let Some(record_type) = values.record_type {
            updated.record_type = record_type;
        }
        if let Some(data) = &values.data {
            updated.data.clone_from(data);
        }
        if values.priority.is_some() {
            updated.priority = values.priority;
        }
        if values.ttl.is_some() {
            updated.ttl = values.ttl;
        }
        updated
    }
}

/// Payload for creating a record.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateRecord {
    pub name: String,
    #[serde(rename = "type")]
    pub record_type: RecordType,
    pub data: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ttl: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub managed_resource_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub managed_resource_id: Option<String>,
}

/// Payload for updating a record.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub record_type: Option<RecordType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ttl: Option<u32>,
}

/// A record handed to storage for insertion under `domain_id`.
#[derive(Clone, Debug, PartialEq)]
pub struct NewRecord {
    pub domain_id: Uuid,
    pub values: CreateRecord,
}

/// An authoritative name server. Servers are metadata only; they are listed
/// in zone syncs but never pushed to the backend on their own.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Server {
    pub id: Uuid,
    /// Fully-qualified host name of the server (e.g. `ns1.example.net.`)
    pub name: String,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateServer {
    pub name: String,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateServer {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// HMAC algorithms supported for TSIG keys.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema,
)]
pub enum TsigAlgorithm {
    #[serde(rename = "hmac-md5")]
    HmacMd5,
    #[serde(rename = "hmac-sha1")]
    HmacSha1,
    #[serde(rename = "hmac-sha224")]
    HmacSha224,
    #[default]
    #[serde(rename = "hmac-sha256")]
    HmacSha256,
    #[serde(rename = "hmac-sha384")]
    HmacSha384,
    #[serde(rename = "hmac-sha512")]
    HmacSha512,
}

impl TsigAlgorithm {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::HmacMd5 => "hmac-md5",
            Self::HmacSha1 => "hmac-sha1",
            Self::HmacSha224 => "hmac-sha224",
            Self::HmacSha256 => "hmac-sha256",
            Self::HmacSha384 => "hmac-sha384",
            Self::HmacSha512 => "hmac-sha512",
        }
    }
}

impl fmt::Display for TsigAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A TSIG shared secret.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct TsigKey {
    pub id: Uuid,
    /// Key name as presented in signed messages (e.g. `transfer-key`)
    pub name: String,
    pub algorithm: TsigAlgorithm,
    /// Base64-encoded secret
    pub secret: String,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl TsigKey {
    #[must_use]
    pub fn with_update(&self, values: &UpdateTsigKey) -> Self {
        let mut updated = self.clone();
        if let Some(name) = &values.name {
            updated.name.clone_from(name);
        }
        if let Some(algorithm) = values.algorithm {
            updated.algorithm = algorithm;
        }
        if let Some(secret) = &values.secret {
            updated.secret.clone_from(secret);
        }
        updated
    }
}

/// Payload for creating a TSIG key. A secret is generated when omitted.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateTsigKey {
    pub name: String,
    #[serde(default)]
    pub algorithm: TsigAlgorithm,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secret: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTsigKey {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub algorithm: Option<TsigAlgorithm>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secret: Option<String>,
}

/// A TSIG key handed to storage for insertion, with its secret resolved.
#[derive(Clone, Debug, PartialEq)]
pub struct NewTsigKey {
    pub name: String,
    pub algorithm: TsigAlgorithm,
    pub secret: String,
}

/// Health of one collaborator, as reported by `ping`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct HealthStatus {
    pub status: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl HealthStatus {
    #[must_use]
    pub fn ok() -> Self {
        Self {
            status: true,
            message: None,
        }
    }

    #[must_use]
    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            status: false,
            message: Some(message.into()),
        }
    }
}

#[cfg(test)]
#[path = "models_tests.rs"]
mod models_tests;
