// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Repair syncs and health checks.
//!
//! The sync operations push storage state to the backend on demand; they are
//! the way to repair divergence left by a backend failure after a storage
//! write. `ping` reports backend and storage health and never fails on a
//! collaborator error.

use std::collections::BTreeMap;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use super::{observe, Central, Result};
use crate::backend::SyncReport;
use crate::constants::RESOURCE_DIAGNOSTICS;
use crate::context::RequestContext;
use crate::errors::RecoveredError;
use crate::models::HealthStatus;
use crate::policy::PolicyTarget;
use crate::storage::Criterion;

/// Result of [`Central::ping`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct PingReport {
    pub host: String,
    /// True only if both the backend and storage are healthy
    pub status: bool,
    pub backend: HealthStatus,
    pub storage: HealthStatus,
}

fn recover<E: std::error::Error>(
    component: &str,
    result: std::result::Result<HealthStatus, E>,
) -> HealthStatus {
    match result {
        Ok(status) => status,
        Err(e) => {
            let recovered = RecoveredError::new(component, &e);
            warn!(component = component, error = %recovered, "Ping failed");
            HealthStatus::failed(recovered.message)
        }
    }
}

impl Central {
    /// Push every zone, with its records and the current server set, to the backend.
    ///
    /// # Errors
    ///
    /// Returns [`crate::errors::CentralError::Forbidden`] or the first storage
    /// or backend failure; zones synced before the failure stay synced.
    pub async fn sync_all(&self, ctx: &RequestContext) -> Result<BTreeMap<Uuid, SyncReport>> {
        observe(RESOURCE_DIAGNOSTICS, "sync_all", async {
            self.policy
                .check("diagnostics_sync_all", ctx, &PolicyTarget::none())?;

            let domains = self.storage.get_domains(&Criterion::new()).await?;
            let mut reports = BTreeMap::new();
            for domain in domains {
                let servers = self.storage.get_servers(&Criterion::new()).await?;
                let records = self
                    .storage
                    .get_records(&Criterion::new().with("domainId", domain.id.to_string()))
                    .await?;
                let report = self
                    .backend
                    .sync_domain(&domain, &records, Some(&servers))
                    .await?;
                reports.insert(domain.id, report);
            }

            info!(domains = reports.len(), "Synced all domains");
            Ok(reports)
        })
        .await
    }

    /// Push one zone and its records to the backend.
    ///
    /// # Errors
    ///
    /// Returns [`crate::errors::CentralError::DomainNotFound`],
    /// [`crate::errors::CentralError::Forbidden`], or a storage or backend failure.
    pub async fn sync_domain(&self, ctx: &RequestContext, domain_id: Uuid) -> Result<SyncReport> {
        observe(RESOURCE_DIAGNOSTICS, "sync_domain", async {
            let domain = self.storage.get_domain(domain_id).await?;
            self.policy
                .check("diagnostics_sync_domain", ctx, &PolicyTarget::domain(&domain))?;

            let records = self
                .storage
                .get_records(&Criterion::new().with("domainId", domain.id.to_string()))
                .await?;
            Ok(self.backend.sync_domain(&domain, &records, None).await?)
        })
        .await
    }

    /// Push one record to the backend.
    ///
    /// # Errors
    ///
    /// Returns [`crate::errors::CentralError::RecordNotFound`] if the record is
    /// missing or belongs to another zone, or a policy, storage or backend failure.
    pub async fn sync_record(
        &self,
        ctx: &RequestContext,
        domain_id: Uuid,
        record_id: Uuid,
    ) -> Result<()> {
        observe(RESOURCE_DIAGNOSTICS, "sync_record", async {
            let domain = self.storage.get_domain(domain_id).await?;
            self.policy
                .check("diagnostics_sync_record", ctx, &PolicyTarget::domain(&domain))?;

            let (domain, record) = self.domain_and_record(domain.id, record_id).await?;
            Ok(self.backend.sync_record(&domain, &record).await?)
        })
        .await
    }

    /// Report backend and storage health.
    ///
    /// Collaborator failures are recovered into a failed [`HealthStatus`].
    ///
    /// # Errors
    ///
    /// Returns [`crate::errors::CentralError::Forbidden`] only.
    pub async fn ping(&self, ctx: &RequestContext) -> Result<PingReport> {
        observe(RESOURCE_DIAGNOSTICS, "ping", async {
            self.policy
                .check("diagnostics_ping", ctx, &PolicyTarget::none())?;

            let (backend, storage) = tokio::join!(self.backend.ping(), self.storage.ping());
            let backend = recover("backend", backend);
            let storage = recover("storage", storage);

            Ok(PingReport {
                host: self.config.host.clone(),
                status: backend.status && storage.status,
                backend,
                storage,
            })
        })
        .await
    }
}

#[cfg(test)]
#[path = "diagnostics_tests.rs"]
mod diagnostics_tests;
