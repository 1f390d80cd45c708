// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Notification handlers that turn platform events into DNS records.
//!
//! Handlers act on behalf of the platform, so every call they make into
//! [`Central`] uses an admin [`RequestContext`]. Records they create carry
//! `managed_resource_type` and `managed_resource_id`, which is how the
//! matching delete events find them again.
//!
//! ## Bundled handlers
//!
//! | Name | Exchange | Events |
//! |------|----------|--------|
//! | `nova_fixed` | `nova` | `compute.instance.create.end`, `compute.instance.delete.start` |
//! | `quantum_floatingip` | `quantum` | `floatingip.update.end`, `floatingip.delete.start` |

pub mod nova;
pub mod quantum;

use std::collections::BTreeMap;
use std::net::IpAddr;
use std::sync::Arc;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, info};

use crate::central::{self, Central};
use crate::config::{CentralConfig, HandlerConfig};
use crate::context::RequestContext;
use crate::errors::{CentralError, ConfigError};
use crate::models::{CreateRecord, Domain, Record, RecordType};
use crate::storage::Criterion;

/// A subscriber to platform events.
#[async_trait]
pub trait NotificationHandler: Send + Sync {
    /// Registry name, also used in queue names and metric labels.
    fn canonical_name(&self) -> &'static str;

    /// Exchange and the topics on it this handler consumes.
    fn exchange_topics(&self) -> (String, Vec<String>);

    /// Event types this handler reacts to.
    fn event_types(&self) -> &'static [&'static str];

    /// Handle one event whose type is in [`NotificationHandler::event_types`].
    async fn process_notification(
        &self,
        event_type: &str,
        payload: &Value,
    ) -> central::Result<()>;
}

/// Resolve the enabled handler names, in order.
///
/// # Errors
///
/// Returns [`ConfigError::UnknownHandler`] for a name that is not bundled, or
/// [`ConfigError::MissingHandlerConfig`] if an enabled handler has no section.
pub fn from_config(
    names: &[String],
    config: &CentralConfig,
    central: &Arc<Central>,
) -> Result<Vec<Arc<dyn NotificationHandler>>, ConfigError> {
    names
        .iter()
        .map(|name| {
            let handler: Arc<dyn NotificationHandler> = match name.as_str() {
                nova::NAME => Arc::new(nova::NovaFixedHandler::new(
                    Arc::clone(central),
                    config.handler(name)?.clone(),
                )),
                quantum::NAME => Arc::new(quantum::QuantumFloatingIpHandler::new(
                    Arc::clone(central),
                    config.handler(name)?.clone(),
                )),
                other => return Err(ConfigError::UnknownHandler(other.to_string())),
            };
            info!(handler = handler.canonical_name(), "Loaded notification handler");
            Ok(handler)
        })
        .collect()
}

/// Substitute `{key}` placeholders in `format`. Unknown placeholders are kept.
#[must_use]
pub fn render_name(format: &str, fields: &BTreeMap<&str, String>) -> String {
    fields.iter().fold(format.to_string(), |name, (key, value)| {
        name.replace(&format!("{{{key}}}"), value)
    })
}

/// Placeholder values derived from an address: `octet0` .. `octet3` for IPv4.
fn address_fields(address: IpAddr) -> BTreeMap<&'static str, String> {
    let mut fields = BTreeMap::new();
    if let IpAddr::V4(v4) = address {
        for (key, octet) in ["octet0", "octet1", "octet2", "octet3"]
            .into_iter()
            .zip(v4.octets())
        {
            fields.insert(key, octet.to_string());
        }
    }
    fields
}

pub(crate) fn parse_payload<T: DeserializeOwned>(
    event_type: &str,
    payload: &Value,
) -> central::Result<T> {
    serde_json::from_value(payload.clone())
        .map_err(|e| CentralError::BadRequest(format!("Malformed {event_type} payload: {e}")))
}

pub(crate) fn parse_address(address: &str) -> central::Result<IpAddr> {
    address
        .parse()
        .map_err(|_| CentralError::BadRequest(format!("Invalid IP address '{address}'")))
}

/// Record bookkeeping shared by the address-publishing handlers.
pub(crate) struct AddressRecords {
    central: Arc<Central>,
    config: HandlerConfig,
    managed_resource_type: &'static str,
}

impl AddressRecords {
    pub(crate) fn new(
        central: Arc<Central>,
        config: HandlerConfig,
        managed_resource_type: &'static str,
    ) -> Self {
        Self {
            central,
            config,
            managed_resource_type,
        }
    }

    pub(crate) fn exchange_topics(&self, default_exchange: &str) -> (String, Vec<String>) {
        let exchange = self
            .config
            .control_exchange
            .clone()
            .unwrap_or_else(|| default_exchange.to_string());
        (exchange, self.config.notification_topics.clone())
    }

    /// The configured zone, by id or else by name.
    async fn domain(&self, ctx: &RequestContext) -> central::Result<Domain> {
        if let Some(domain_id) = self.config.domain_id {
            return self.central.get_domain(ctx, domain_id).await;
        }
        let Some(name) = self.config.domain_name.as_deref() else {
            return Err(CentralError::DomainNotFound);
        };
        self.central
            .get_domains(ctx, Some(Criterion::new().with("name", name)))
            .await?
            .into_iter()
            .next()
            .ok_or(CentralError::DomainNotFound)
    }

    /// Create one A or AAAA record per address in the configured domain.
    pub(crate) async fn create(
        &self,
        resource_id: &str,
        fields: &BTreeMap<&'static str, String>,
        addresses: &[IpAddr],
    ) -> central::Result<Vec<Record>> {
        let ctx = RequestContext::admin();
        let domain = self.domain(&ctx).await?;

        let mut created = Vec::with_capacity(addresses.len());
        for address in addresses {
            let mut fields = fields.clone();
            fields.extend(address_fields(*address));
            fields.insert("domain", domain.name.clone());

            let record_type = match address {
                IpAddr::V4(_) => RecordType::A,
                IpAddr::V6(_) => RecordType::AAAA,
            };
            let record = self
                .central
                .create_record(
                    &ctx,
                    domain.id,
                    CreateRecord {
                        name: render_name(&self.config.format, &fields),
                        record_type,
                        data: address.to_string(),
                        priority: None,
                        ttl: Some(self.config.ttl),
                        managed_resource_type: Some(self.managed_resource_type.to_string()),
                        managed_resource_id: Some(resource_id.to_string()),
                    },
                )
                .await?;
            debug!(record = %record.name, resource_id = %resource_id, "Created managed record");
            created.push(record);
        }
        Ok(created)
    }

    /// Delete every record this handler created for `resource_id`.
    pub(crate) async fn delete(&self, resource_id: &str) -> central::Result<usize> {
        let ctx = RequestContext::admin();
        let domain = self.domain(&ctx).await?;
        let criterion = Criterion::new()
            .with("managedResourceType", self.managed_resource_type)
            .with("managedResourceId", resource_id);
        let records = self
            .central
            .get_records(&ctx, domain.id, Some(criterion))
            .await?;

        for record in &records {
            self.central
                .delete_record(&ctx, domain.id, record.id)
                .await?;
        }
        Ok(records.len())
    }
}
