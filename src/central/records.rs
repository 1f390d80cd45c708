// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Record lifecycle.
//!
//! Records are always addressed through their zone. A record fetched by id
//! whose `domain_id` differs from the zone in the request is reported as
//! [`CentralError::RecordNotFound`], so ids cannot be used to discover records across zones.

use tracing::info;
use uuid::Uuid;

use super::{observe, validation, Central, Result};
use crate::constants::{
    EVENT_RECORD_CREATE, EVENT_RECORD_DELETE, EVENT_RECORD_UPDATE, RESOURCE_RECORD,
};
use crate::context::RequestContext;
use crate::errors::CentralError;
use crate::metrics;
use crate::models::{CreateRecord, Domain, NewRecord, Record, UpdateRecord};
use crate::policy::PolicyTarget;
use crate::storage::Criterion;

fn check_contained(record_name: &str, domain: &Domain) -> Result<()> {
    if validation::is_contained(record_name, &domain.name) {
        Ok(())
    } else {
        Err(CentralError::BadRequest(
            "Records must be contained within their parent zone".to_string(),
        ))
    }
}

impl Central {
    /// Fetch a zone and one of its records.
    pub(crate) async fn domain_and_record(
        &self,
        domain_id: Uuid,
        record_id: Uuid,
    ) -> Result<(Domain, Record)> {
        let domain = self.storage.get_domain(domain_id).await?;
        let record = self.storage.get_record(record_id).await?;
        if record.domain_id != domain.id {
            return Err(CentralError::RecordNotFound);
        }
        Ok((domain, record))
    }

    /// Create a record inside a zone.
    ///
    /// # Errors
    ///
    /// - [`CentralError::DomainNotFound`] if the zone does not exist
    /// - [`CentralError::Forbidden`] on policy denial
    /// - [`CentralError::BadRequest`] if the name is invalid or outside the zone
    /// - storage or backend failures
    pub async fn create_record(
        &self,
        ctx: &RequestContext,
        domain_id: Uuid,
        values: CreateRecord,
    ) -> Result<Record> {
        observe(RESOURCE_RECORD, "create", async {
            let domain = self.storage.get_domain(domain_id).await?;
            let target = PolicyTarget {
                record_name: Some(values.name.clone()),
                ..PolicyTarget::domain(&domain)
            };
            self.policy.check("create_record", ctx, &target)?;

            validation::check_fqdn(&values.name)?;
            check_contained(&values.name, &domain)?;

            let record = self
                .storage
                .create_record(NewRecord {
                    domain_id: domain.id,
                    values,
                })
                .await?;

            self.backend.create_record(&domain, &record).await?;
            self.notify(ctx, EVENT_RECORD_CREATE, &record).await;

            info!(
                domain = %domain.name,
                record = %record.name,
                record_type = %record.record_type,
                record_id = %record.id,
                "Created record"
            );
            metrics::record_resource_created(RESOURCE_RECORD);
            Ok(record)
        })
        .await
    }

    /// List the records of one zone, optionally filtered further.
    ///
    /// # Errors
    ///
    /// Returns [`CentralError::DomainNotFound`], [`CentralError::Forbidden`],
    /// or a storage failure.
    pub async fn get_records(
        &self,
        ctx: &RequestContext,
        domain_id: Uuid,
        criterion: Option<Criterion>,
    ) -> Result<Vec<Record>> {
        observe(RESOURCE_RECORD, "list", async {
            let domain = self.storage.get_domain(domain_id).await?;
            self.policy
                .check("get_records", ctx, &PolicyTarget::domain(&domain))?;

            let criterion = criterion
                .unwrap_or_default()
                .with("domainId", domain.id.to_string());
            Ok(self.storage.get_records(&criterion).await?)
        })
        .await
    }

    /// # Errors
    ///
    /// Returns [`CentralError::RecordNotFound`] if the record is missing or
    /// belongs to another zone, [`CentralError::DomainNotFound`], or
    /// [`CentralError::Forbidden`].
    pub async fn get_record(
        &self,
        ctx: &RequestContext,
        domain_id: Uuid,
        record_id: Uuid,
    ) -> Result<Record> {
        observe(RESOURCE_RECORD, "get", async {
            let (domain, record) = self.domain_and_record(domain_id, record_id).await?;
            self.policy
                .check("get_record", ctx, &PolicyTarget::record(&domain, &record))?;
            Ok(record)
        })
        .await
    }

    /// # Errors
    ///
    /// As [`Central::get_record`], plus [`CentralError::BadRequest`] if a new
    /// name is invalid or outside the zone, and storage or backend failures.
    pub async fn update_record(
        &self,
        ctx: &RequestContext,
        domain_id: Uuid,
        record_id: Uuid,
        values: UpdateRecord,
    ) -> Result<Record> {
        observe(RESOURCE_RECORD, "update", async {
            let (domain, record) = self.domain_and_record(domain_id, record_id).await?;
            self.policy
                .check("update_record", ctx, &PolicyTarget::record(&domain, &record))?;

            if let Some(name) = &values.name {
                validation::check_fqdn(name)?;
                check_contained(name, &domain)?;
            }

            let previous = record.clone();
            let record = self
                .storage
                .update_record(record.with_update(&values))
                .await?;

            self.backend
                .update_record(&domain, &previous, &record)
                .await?;
            self.notify(ctx, EVENT_RECORD_UPDATE, &record).await;

            info!(
                domain = %domain.name,
                record = %record.name,
                record_id = %record.id,
                "Updated record"
            );
            metrics::record_resource_updated(RESOURCE_RECORD);
            Ok(record)
        })
        .await
    }

    /// Delete a record. The backend is told before storage.
    ///
    /// # Errors
    ///
    /// As [`Central::get_record`], plus storage or backend failures.
    pub async fn delete_record(
        &self,
        ctx: &RequestContext,
        domain_id: Uuid,
        record_id: Uuid,
    ) -> Result<Record> {
        observe(RESOURCE_RECORD, "delete", async {
            let (domain, record) = self.domain_and_record(domain_id, record_id).await?;
            self.policy
                .check("delete_record", ctx, &PolicyTarget::record(&domain, &record))?;

            self.backend.delete_record(&domain, &record).await?;
            self.notify(ctx, EVENT_RECORD_DELETE, &record).await;

            let deleted = self.storage.delete_record(record.id).await?;
            info!(
                domain = %domain.name,
                record = %deleted.name,
                record_id = %deleted.id,
                "Deleted record"
            );
            metrics::record_resource_deleted(RESOURCE_RECORD);
            Ok(deleted)
        })
        .await
    }
}

#[cfg(test)]
#[path = "records_tests.rs"]
mod records_tests;
