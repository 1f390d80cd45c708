// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! The central service.
//!
//! [`Central`] owns the long-lived collaborator handles and exposes every
//! lifecycle operation. Each operation follows the same shape:
//!
//! 1. Policy check through the [`PolicyGate`]
//! 2. Validation (blacklist, name syntax, containment, server count)
//! 3. Storage read or write (storage is the source of truth)
//! 4. Backend propagation
//! 5. Notification
//!
//! Deletes call the backend and notify *before* the storage row goes away.
//! Nothing is rolled back when the backend fails after a storage write; the
//! diagnostics sync operations repair divergence.
//!
//! Operations are split by resource:
//!
//! - [`domains`] - zone lifecycle, blacklist, subdomain resolution, tenant transfer
//! - [`records`] - record lifecycle with zone containment
//! - [`servers`] - name server metadata
//! - [`tsigkeys`] - TSIG keys
//! - [`diagnostics`] - bulk sync and health
//! - [`seed`] - servers and zones created from configuration at startup

pub mod diagnostics;
pub mod domains;
pub mod records;
pub mod seed;
pub mod servers;
pub mod tsigkeys;
pub mod validation;

use std::future::Future;
use std::sync::Arc;
use std::time::Instant;

use regex::Regex;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::backend::{self, Backend};
use crate::config::CentralConfig;
use crate::context::RequestContext;
use crate::errors::{CentralError, ConfigError};
use crate::metrics;
use crate::notification::Notifier;
use crate::policy::{PolicyGate, RulePolicy};
use crate::storage::Storage;

pub type Result<T> = std::result::Result<T, CentralError>;

/// Orchestrates storage, backend, policy and notifications.
pub struct Central {
    storage: Arc<dyn Storage>,
    backend: Arc<dyn Backend>,
    policy: PolicyGate,
    notifier: Arc<dyn Notifier>,
    blacklist: Vec<Regex>,
    config: Arc<CentralConfig>,
}

impl Central {
    /// Assemble the service from explicit collaborators.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidBlacklist`] if a blacklist pattern does not compile.
    pub fn new(
        config: Arc<CentralConfig>,
        storage: Arc<dyn Storage>,
        backend: Arc<dyn Backend>,
        policy: PolicyGate,
        notifier: Arc<dyn Notifier>,
    ) -> std::result::Result<Self, ConfigError> {
        let blacklist = config.compile_blacklist()?;
        debug!(
            backend = backend.name(),
            blacklist_patterns = blacklist.len(),
            "Central service assembled"
        );
        Ok(Self {
            storage,
            backend,
            policy,
            notifier,
            blacklist,
            config,
        })
    }

    /// Assemble the service with the configured backend driver and rule policy.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if the backend driver or blacklist is invalid.
    pub fn from_config(
        config: Arc<CentralConfig>,
        storage: Arc<dyn Storage>,
        notifier: Arc<dyn Notifier>,
    ) -> std::result::Result<Self, ConfigError> {
        let backend = backend::from_config(&config)?;
        let policy = PolicyGate::new(Arc::new(RulePolicy::from_config(&config.policy)));
        Self::new(config, storage, backend, policy, notifier)
    }

    #[must_use]
    pub fn config(&self) -> &CentralConfig {
        &self.config
    }

    #[must_use]
    pub fn backend(&self) -> Arc<dyn Backend> {
        Arc::clone(&self.backend)
    }

    async fn notify<T: Serialize>(&self, ctx: &RequestContext, event_type: &str, entity: &T) {
        let payload = serde_json::to_value(entity).unwrap_or_else(|e| {
            warn!(event_type = %event_type, error = %e, "Failed to serialize notification payload");
            Value::Null
        });
        self.notifier.notify(ctx, event_type, payload).await;
    }
}

/// Runs one operation, recording its outcome and duration.
async fn observe<T, F>(resource_type: &'static str, operation: &'static str, fut: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    let start = Instant::now();
    let result = fut.await;
    match &result {
        Ok(_) => metrics::record_operation_success(resource_type, operation, start.elapsed()),
        Err(e) => {
            if !e.is_validation() {
                warn!(
                    resource_type = resource_type,
                    operation = operation,
                    error = %e,
                    "Operation failed"
                );
            }
            metrics::record_operation_error(resource_type, operation, e.kind(), start.elapsed());
        }
    }
    result
}
