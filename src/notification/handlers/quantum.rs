// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! `quantum_floatingip`: A/AAAA records that follow floating IP association.
//!
//! An associated floating IP (one with a `port_id`) gets a record; a
//! disassociated or deleted one loses it. `{hostname}` in the name template
//! is the address with `.` and `:` replaced by `-`.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, info};

use super::{parse_address, parse_payload, AddressRecords, NotificationHandler};
use crate::central::{self, Central};
use crate::config::HandlerConfig;

pub const NAME: &str = "quantum_floatingip";

const DEFAULT_EXCHANGE: &str = "quantum";
const MANAGED_RESOURCE_TYPE: &str = "floatingip";

pub const EVENT_FLOATINGIP_UPDATE_END: &str = "floatingip.update.end";
pub const EVENT_FLOATINGIP_DELETE_START: &str = "floatingip.delete.start";

#[derive(Debug, Deserialize)]
struct UpdatePayload {
    floatingip: FloatingIp,
}

#[derive(Debug, Deserialize)]
struct FloatingIp {
    id: String,
    #[serde(default)]
    floating_ip_address: Option<String>,
    #[serde(default)]
    port_id: Option<String>,
    #[serde(default)]
    tenant_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct DeletePayload {
    floatingip_id: String,
}

pub struct QuantumFloatingIpHandler {
    records: AddressRecords,
}

impl QuantumFloatingIpHandler {
    #[must_use]
    pub fn new(central: Arc<Central>, config: HandlerConfig) -> Self {
        Self {
            records: AddressRecords::new(central, config, MANAGED_RESOURCE_TYPE),
        }
    }

    async fn floatingip_updated(&self, floatingip: FloatingIp) -> central::Result<()> {
        // Re-association replaces whatever was published before.
        let removed = self.records.delete(&floatingip.id).await?;

        let address = match (&floatingip.port_id, &floatingip.floating_ip_address) {
            (Some(_), Some(address)) => parse_address(address)?,
            _ => {
                info!(floatingip_id = %floatingip.id, records = removed, "Floating IP disassociated");
                return Ok(());
            }
        };

        let mut fields = BTreeMap::new();
        fields.insert("hostname", address.to_string().replace(['.', ':'], "-"));
        fields.insert("tenant_id", floatingip.tenant_id.clone().unwrap_or_default());

        self.records.create(&floatingip.id, &fields, &[address]).await?;
        info!(floatingip_id = %floatingip.id, address = %address, "Floating IP associated");
        Ok(())
    }
}

#[async_trait]
impl NotificationHandler for QuantumFloatingIpHandler {
    fn canonical_name(&self) -> &'static str {
        NAME
    }

    fn exchange_topics(&self) -> (String, Vec<String>) {
        self.records.exchange_topics(DEFAULT_EXCHANGE)
    }

    fn event_types(&self) -> &'static [&'static str] {
        &[EVENT_FLOATINGIP_UPDATE_END, EVENT_FLOATINGIP_DELETE_START]
    }

    async fn process_notification(
        &self,
        event_type: &str,
        payload: &Value,
    ) -> central::Result<()> {
        match event_type {
            EVENT_FLOATINGIP_UPDATE_END => {
                let payload: UpdatePayload = parse_payload(event_type, payload)?;
                self.floatingip_updated(payload.floatingip).await
            }
            EVENT_FLOATINGIP_DELETE_START => {
                let payload: DeletePayload = parse_payload(event_type, payload)?;
                let deleted = self.records.delete(&payload.floatingip_id).await?;
                info!(floatingip_id = %payload.floatingip_id, records = deleted, "Floating IP deleted");
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
#[path = "quantum_tests.rs"]
mod quantum_tests;
