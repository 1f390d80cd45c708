// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Startup seeding of servers and zones.
//!
//! The servers and zones listed in configuration are created through the
//! regular lifecycle operations, servers first. Names that already exist are
//! skipped, so seeding again is a no-op.

use serde::Serialize;
use tracing::{debug, info};

use super::{Central, Result};
use crate::context::RequestContext;
use crate::errors::CentralError;

/// Outcome of [`Central::seed`].
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SeedReport {
    pub servers_created: usize,
    pub domains_created: usize,
    /// Entries whose name was already taken
    pub skipped: usize,
}

impl Central {
    /// Create the configured servers, then the configured zones in order.
    ///
    /// # Errors
    ///
    /// Returns the first failure other than a duplicate name.
    pub async fn seed(&self) -> Result<SeedReport> {
        let mut report = SeedReport::default();
        let admin = RequestContext::admin();

        for server in &self.config.servers {
            match self.create_server(&admin, server.clone()).await {
                Ok(_) => report.servers_created += 1,
                Err(CentralError::DuplicateServer(name)) => {
                    debug!(server = %name, "Seed server already exists");
                    report.skipped += 1;
                }
                Err(e) => return Err(e),
            }
        }

        for seed in &self.config.domains {
            let ctx = RequestContext {
                tenant_id: seed.tenant_id.clone(),
                ..RequestContext::admin()
            };
            match self.create_domain(&ctx, seed.domain.clone()).await {
                Ok(_) => report.domains_created += 1,
                Err(CentralError::DuplicateDomain(name)) => {
                    debug!(domain = %name, "Seed domain already exists");
                    report.skipped += 1;
                }
                Err(e) => return Err(e),
            }
        }

        info!(
            servers_created = report.servers_created,
            domains_created = report.domains_created,
            skipped = report.skipped,
            "Seeded servers and domains"
        );
        Ok(report)
    }
}

#[cfg(test)]
#[path = "seed_tests.rs"]
mod seed_tests;
