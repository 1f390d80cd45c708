// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

#![allow(unexpected_cfgs)]

//! # dnscentral - multi-tenant DNS-as-a-service control plane
//!
//! dnscentral owns the authoritative record of tenants' DNS zones, records,
//! name servers and TSIG keys, and pushes every change to a nameserver
//! backend such as BIND9.
//!
//! ## Overview
//!
//! Every mutating call goes through the same pipeline in [`central::Central`]:
//! policy check, validation, storage write, backend propagation, then an
//! outbound notification. Platform events (instances booting, floating IPs
//! moving) flow the other way through the
//! [`notification::dispatcher::NotificationDispatcher`], whose handlers turn
//! them into records.
//!
//! ## Modules
//!
//! - [`central`] - the lifecycle operations and diagnostics
//! - [`policy`] - rule-based authorization
//! - [`storage`] - storage contract and the in-memory implementation
//! - [`backend`] - nameserver drivers (`fake`, `bind9`)
//! - [`notification`] - outbound notifier, transport, dispatcher and handlers
//! - [`config`] - YAML configuration
//! - [`models`] - domain, record, server and TSIG key types
//! - [`errors`] - error types for every layer
//! - [`metrics`] - Prometheus metrics
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use dnscentral::central::Central;
//! use dnscentral::config::CentralConfig;
//! use dnscentral::context::RequestContext;
//! use dnscentral::models::{CreateDomain, CreateServer};
//! use dnscentral::notification::LogNotifier;
//! use dnscentral::storage::MemoryStorage;
//!
//! # async fn run() -> anyhow::Result<()> {
//! let central = Central::from_config(
//!     Arc::new(CentralConfig::default()),
//!     Arc::new(MemoryStorage::new()),
//!     Arc::new(LogNotifier),
//! )?;
//!
//! let admin = RequestContext::admin();
//! central
//!     .create_server(&admin, CreateServer { name: "ns1.example.net.".to_string() })
//!     .await?;
//!
//! let tenant = RequestContext::new("alice", "tenant-a");
//! let domain = central
//!     .create_domain(
//!         &tenant,
//!         CreateDomain {
//!             name: "example.com.".to_string(),
//!             email: "hostmaster@example.com".to_string(),
//!             ttl: None,
//!         },
//!     )
//!     .await?;
//! assert_eq!(domain.tenant_id.as_deref(), Some("tenant-a"));
//! # Ok(())
//! # }
//! ```

pub mod backend;
pub mod central;
pub mod config;
pub mod constants;
pub mod context;
pub mod errors;
pub mod metrics;
pub mod models;
pub mod notification;
pub mod policy;
pub mod storage;

#[cfg(test)]
pub(crate) mod test_helpers;
