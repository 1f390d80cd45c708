// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Domain (zone) lifecycle.
//!
//! # Subdomain resolution
//!
//! A new zone looks for its nearest existing ancestor zone, walking up one
//! label at a time (`a.b.example.com.` tries `b.example.com.`, then
//! `example.com.`, then `com.`). The first hit ends the search:
//!
//! - same tenant: the new zone records the ancestor as its parent
//! - other tenant: creation is forbidden, even when a same-tenant zone exists
//!   further up
//!
//! # Tenant transfer
//!
//! Changing `tenant_id` needs two grants against the existing zone: the
//! caller must be allowed to delete it as it is now, and to create it under
//! the new tenant.

use chrono::Utc;
use tracing::{error, info};
use uuid::Uuid;

use super::{observe, validation, Central, Result};
use crate::constants::{
    EVENT_DOMAIN_CREATE, EVENT_DOMAIN_DELETE, EVENT_DOMAIN_UPDATE, RESOURCE_DOMAIN,
};
use crate::context::RequestContext;
use crate::errors::{CentralError, StorageError};
use crate::metrics;
use crate::models::{CreateDomain, Domain, NewDomain, UpdateDomain};
use crate::policy::PolicyTarget;
use crate::storage::Criterion;

impl Central {
    /// Create a zone owned by the caller's tenant.
    ///
    /// # Errors
    ///
    /// - [`CentralError::Forbidden`] if policy denies creation, the name is
    ///   blacklisted for the caller, or the nearest ancestor zone belongs to
    ///   another tenant
    /// - [`CentralError::BadRequest`] if the name is not a fully-qualified DNS name
    /// - [`CentralError::NoServersConfigured`] if no server exists
    /// - [`CentralError::DuplicateDomain`] if the name is taken
    /// - storage or backend failures
    pub async fn create_domain(&self, ctx: &RequestContext, values: CreateDomain) -> Result<Domain> {
        observe(RESOURCE_DOMAIN, "create", async {
            let tenant_id = ctx.tenant_id.clone();
            let target = PolicyTarget {
                tenant_id: tenant_id.clone(),
                domain_name: Some(values.name.clone()),
                ..PolicyTarget::none()
            };
            self.policy.check("create_domain", ctx, &target)?;

            if validation::is_blacklisted(&self.blacklist, &values.name) {
                info!(domain = %values.name, "Domain name matches blacklist");
                self.policy.check("use_blacklisted_domain", ctx, &target)?;
            }

            validation::check_fqdn(&values.name)?;

            let parent_domain_id = self
                .resolve_parent(&values.name, tenant_id.as_deref())
                .await?;

            let servers = self.storage.get_servers(&Criterion::new()).await?;
            if servers.is_empty() {
                error!(domain = %values.name, "No servers configured, refusing to create domain");
                return Err(CentralError::NoServersConfigured);
            }

            let new_domain =
                NewDomain::from_payload(values, tenant_id, parent_domain_id, Utc::now());
            let domain = self.storage.create_domain(new_domain).await?;

            self.backend.create_domain(&domain).await?;
            self.notify(ctx, EVENT_DOMAIN_CREATE, &domain).await;

            info!(
                domain = %domain.name,
                domain_id = %domain.id,
                tenant_id = ?domain.tenant_id,
                parent_domain_id = ?domain.parent_domain_id,
                "Created domain"
            );
            metrics::record_resource_created(RESOURCE_DOMAIN);
            Ok(domain)
        })
        .await
    }

    /// Nearest existing ancestor zone of `name`, if it belongs to `tenant_id`.
    async fn resolve_parent(&self, name: &str, tenant_id: Option<&str>) -> Result<Option<Uuid>> {
        for candidate in validation::ancestor_names(name) {
            let criterion = Criterion::new().with("name", candidate.as_str());
            match self.storage.find_domain(&criterion).await {
                Ok(parent) if parent.tenant_id.as_deref() == tenant_id => {
                    info!(domain = %name, parent = %parent.name, "Resolved parent domain");
                    return Ok(Some(parent.id));
                }
                Ok(parent) => {
                    info!(
                        domain = %name,
                        parent = %parent.name,
                        "Refusing subdomain of another tenant's domain"
                    );
                    return Err(CentralError::Forbidden(
                        "Unable to create subdomain in another tenant's domain".to_string(),
                    ));
                }
                Err(StorageError::NotFound { .. }) => continue,
                Err(e) => return Err(e.into()),
            }
        }
        Ok(None)
    }

    /// List zones. Non-admin callers only ever see their own tenant's zones.
    ///
    /// # Errors
    ///
    /// Returns [`CentralError::Forbidden`] on policy denial, or a storage failure.
    pub async fn get_domains(
        &self,
        ctx: &RequestContext,
        criterion: Option<Criterion>,
    ) -> Result<Vec<Domain>> {
        observe(RESOURCE_DOMAIN, "list", async {
            let target = PolicyTarget::tenant(ctx.tenant_id.clone());
            self.policy.check("get_domains", ctx, &target)?;

            let mut criterion = criterion.unwrap_or_default();
            if !ctx.is_admin {
                criterion.insert("tenantId", ctx.tenant_id.clone());
            }
            Ok(self.storage.get_domains(&criterion).await?)
        })
        .await
    }

    /// # Errors
    ///
    /// Returns [`CentralError::DomainNotFound`] or [`CentralError::Forbidden`].
    pub async fn get_domain(&self, ctx: &RequestContext, domain_id: Uuid) -> Result<Domain> {
        observe(RESOURCE_DOMAIN, "get", async {
            let domain = self.storage.get_domain(domain_id).await?;
            self.policy
                .check("get_domain", ctx, &PolicyTarget::domain(&domain))?;
            Ok(domain)
        })
        .await
    }

    /// Update a zone. The serial advances by one on every successful update.
    ///
    /// # Errors
    ///
    /// - [`CentralError::Forbidden`] if policy denies the update or the transfer
    /// - [`CentralError::BadRequest`] on an attempt to rename the zone
    /// - storage or backend failures
    pub async fn update_domain(
        &self,
        ctx: &RequestContext,
        domain_id: Uuid,
        values: UpdateDomain,
    ) -> Result<Domain> {
        observe(RESOURCE_DOMAIN, "update", async {
            let domain = self.storage.get_domain(domain_id).await?;
            let target = PolicyTarget::domain(&domain);
            self.policy.check("update_domain", ctx, &target)?;

            if let Some(new_tenant_id) = &values.tenant_id {
                self.policy.check("delete_domain", ctx, &target)?;
                let new_target = PolicyTarget {
                    domain_id: Some(domain.id),
                    tenant_id: Some(new_tenant_id.clone()),
                    ..PolicyTarget::none()
                };
                self.policy.check("create_domain", ctx, &new_target)?;
            }

            if values.name.as_ref().is_some_and(|name| *name != domain.name) {
                return Err(CentralError::BadRequest(
                    "Renaming a domain is not allowed".to_string(),
                ));
            }

            let domain = self
                .storage
                .update_domain(domain.with_update(&values))
                .await?;

            self.backend.update_domain(&domain).await?;
            self.notify(ctx, EVENT_DOMAIN_UPDATE, &domain).await;

            info!(domain = %domain.name, serial = domain.serial, "Updated domain");
            metrics::record_resource_updated(RESOURCE_DOMAIN);
            Ok(domain)
        })
        .await
    }

    /// Delete a zone and its records. The backend is told first.
    ///
    /// # Errors
    ///
    /// Returns [`CentralError::DomainNotFound`], [`CentralError::Forbidden`],
    /// or a storage or backend failure.
    pub async fn delete_domain(&self, ctx: &RequestContext, domain_id: Uuid) -> Result<Domain> {
        observe(RESOURCE_DOMAIN, "delete", async {
            let domain = self.storage.get_domain(domain_id).await?;
            self.policy
                .check("delete_domain", ctx, &PolicyTarget::domain(&domain))?;

            self.backend.delete_domain(&domain).await?;
            self.notify(ctx, EVENT_DOMAIN_DELETE, &domain).await;

            let deleted = self.storage.delete_domain(domain_id).await?;
            info!(domain = %deleted.name, domain_id = %deleted.id, "Deleted domain");
            metrics::record_resource_deleted(RESOURCE_DOMAIN);
            Ok(deleted)
        })
        .await
    }
}

#[cfg(test)]
#[path = "domains_tests.rs"]
mod domains_tests;
