// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Wire types of the bindcar HTTP API.
//!
//! bindcar expects camelCase JSON bodies.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::models::TsigAlgorithm;

/// Zone type for zones this driver owns.
pub const ZONE_TYPE_PRIMARY: &str = "primary";

/// Body of `POST /api/v1/zones`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateZoneRequest {
    pub zone_name: String,
    pub zone_type: String,
    pub zone_config: ZoneConfig,
    /// TSIG key allowed to send dynamic updates for this zone
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub update_key_name: Option<String>,
}

/// Zone file content rendered by bindcar.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ZoneConfig {
    pub ttl: u32,
    pub soa: SoaRecord,
    pub name_servers: Vec<String>,
    /// Glue addresses keyed by name server hostname
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub name_server_ips: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub records: Vec<DnsRecord>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SoaRecord {
    pub primary_ns: String,
    pub admin_email: String,
    pub serial: u32,
    pub refresh: u32,
    pub retry: u32,
    pub expire: u32,
    pub negative_ttl: u32,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DnsRecord {
    pub name: String,
    pub record_type: String,
    pub value: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ttl: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<u16>,
}

/// Generic bindcar response envelope.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ZoneResponse {
    #[serde(default = "default_success")]
    pub success: bool,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub details: Option<String>,
}

fn default_success() -> bool {
    true
}

/// TSIG key that signs RFC 2136 updates.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UpdateKey {
    pub name: String,
    pub algorithm: TsigAlgorithm,
    /// Base64-encoded secret
    pub secret: String,
}
