// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! `nova_fixed`: A/AAAA records for the fixed IPs of compute instances.
//!
//! The record name comes from the handler's `format` template with
//! `{hostname}`, `{tenant_id}`, `{domain}` and, for IPv4, `{octet0}`..`{octet3}`.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, info};

use super::{parse_address, parse_payload, AddressRecords, NotificationHandler};
use crate::central::{self, Central};
use crate::config::HandlerConfig;

pub const NAME: &str = "nova_fixed";

const DEFAULT_EXCHANGE: &str = "nova";
const MANAGED_RESOURCE_TYPE: &str = "instance";

pub const EVENT_INSTANCE_CREATE_END: &str = "compute.instance.create.end";
pub const EVENT_INSTANCE_DELETE_START: &str = "compute.instance.delete.start";

#[derive(Debug, Deserialize)]
struct InstancePayload {
    instance_id: String,
    #[serde(default)]
    hostname: String,
    #[serde(default)]
    tenant_id: Option<String>,
    #[serde(default)]
    fixed_ips: Vec<FixedIp>,
}

#[derive(Debug, Deserialize)]
struct FixedIp {
    address: String,
}

pub struct NovaFixedHandler {
    records: AddressRecords,
}

impl NovaFixedHandler {
    #[must_use]
    pub fn new(central: Arc<Central>, config: HandlerConfig) -> Self {
        Self {
            records: AddressRecords::new(central, config, MANAGED_RESOURCE_TYPE),
        }
    }

    async fn instance_created(&self, payload: InstancePayload) -> central::Result<()> {
        let addresses = payload
            .fixed_ips
            .iter()
            .map(|ip| parse_address(&ip.address))
            .collect::<central::Result<Vec<_>>>()?;

        let mut fields = BTreeMap::new();
        fields.insert("hostname", payload.hostname.clone());
        fields.insert("tenant_id", payload.tenant_id.clone().unwrap_or_default());

        let created = self
            .records
            .create(&payload.instance_id, &fields, &addresses)
            .await?;
        info!(
            instance_id = %payload.instance_id,
            hostname = %payload.hostname,
            records = created.len(),
            "Published instance addresses"
        );
        Ok(())
    }
}

#[async_trait]
impl NotificationHandler for NovaFixedHandler {
    fn canonical_name(&self) -> &'static str {
        NAME
    }

    fn exchange_topics(&self) -> (String, Vec<String>) {
        self.records.exchange_topics(DEFAULT_EXCHANGE)
    }

    fn event_types(&self) -> &'static [&'static str] {
        &[EVENT_INSTANCE_CREATE_END, EVENT_INSTANCE_DELETE_START]
    }

    async fn process_notification(
        &self,
        event_type: &str,
        payload: &Value,
    ) -> central::Result<()> {
        let payload: InstancePayload = parse_payload(event_type, payload)?;
        match event_type {
            EVENT_INSTANCE_CREATE_END => self.instance_created(payload).await,
            EVENT_INSTANCE_DELETE_START => {
                let deleted = self.records.delete(&payload.instance_id).await?;
                info!(instance_id = %payload.instance_id, records = deleted, "Removed instance records");
                Ok(())
            }
            other => {
                debug!(event_type = %other, "Ignoring event");
                Ok(())
            }
        }
    }
}

#[cfg(test)]
#[path = "nova_tests.rs"]
mod nova_tests;
