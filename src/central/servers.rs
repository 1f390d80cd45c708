// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Name server lifecycle. Servers are metadata only and never reach the backend.

use tracing::info;
use uuid::Uuid;

use super::{observe, validation, Central, Result};
use crate::constants::{
    EVENT_SERVER_CREATE, EVENT_SERVER_DELETE, EVENT_SERVER_UPDATE, RESOURCE_SERVER,
};
use crate::context::RequestContext;
use crate::metrics;
use crate::models::{CreateServer, Server, UpdateServer};
use crate::policy::PolicyTarget;
use crate::storage::Criterion;

impl Central {
    /// # Errors
    ///
    /// Returns [`crate::errors::CentralError::Forbidden`],
    /// [`crate::errors::CentralError::BadRequest`] for a name that is not a
    /// fully-qualified DNS name, or [`crate::errors::CentralError::DuplicateServer`].
    pub async fn create_server(&self, ctx: &RequestContext, values: CreateServer) -> Result<Server> {
        observe(RESOURCE_SERVER, "create", async {
            self.policy
                .check("create_server", ctx, &PolicyTarget::none())?;
            validation::check_fqdn(&values.name)?;

            let server = self.storage.create_server(values).await?;
            self.notify(ctx, EVENT_SERVER_CREATE, &server).await;

            info!(server = %server.name, server_id = %server.id, "Created server");
            metrics::record_resource_created(RESOURCE_SERVER);
            Ok(server)
        })
        .await
    }

    /// # Errors
    ///
    /// Returns [`crate::errors::CentralError::Forbidden`] or a storage failure.
    pub async fn get_servers(
        &self,
        ctx: &RequestContext,
        criterion: Option<Criterion>,
    ) -> Result<Vec<Server>> {
        observe(RESOURCE_SERVER, "list", async {
            self.policy
                .check("get_servers", ctx, &PolicyTarget::none())?;
            Ok(self
                .storage
                .get_servers(&criterion.unwrap_or_default())
                .await?)
        })
        .await
    }

    /// # Errors
    ///
    /// Returns [`crate::errors::CentralError::Forbidden`] or
    /// [`crate::errors::CentralError::ServerNotFound`].
    pub async fn get_server(&self, ctx: &RequestContext, server_id: Uuid) -> Result<Server> {
        observe(RESOURCE_SERVER, "get", async {
            self.policy
                .check("get_server", ctx, &PolicyTarget::server(server_id))?;
            Ok(self.storage.get_server(server_id).await?)
        })
        .await
    }

    /// # Errors
    ///
    /// Returns [`crate::errors::CentralError::Forbidden`],
    /// [`crate::errors::CentralError::ServerNotFound`],
    /// [`crate::errors::CentralError::BadRequest`] or
    /// [`crate::errors::CentralError::DuplicateServer`].
    pub async fn update_server(
        &self,
        ctx: &RequestContext,
        server_id: Uuid,
        values: UpdateServer,
    ) -> Result<Server> {
        observe(RESOURCE_SERVER, "update", async {
            self.policy
                .check("update_server", ctx, &PolicyTarget::server(server_id))?;

            let mut server = self.storage.get_server(server_id).await?;
            if let Some(name) = values.name {
                validation::check_fqdn(&name)?;
                server.name = name;
            }
            let server = self.storage.update_server(server).await?;
            self.notify(ctx, EVENT_SERVER_UPDATE, &server).await;

            info!(server = %server.name, server_id = %server.id, "Updated server");
            metrics::record_resource_updated(RESOURCE_SERVER);
            Ok(server)
        })
        .await
    }

    /// # Errors
    ///
    /// Returns [`crate::errors::CentralError::Forbidden`] or
    /// [`crate::errors::CentralError::ServerNotFound`].
    pub async fn delete_server(&self, ctx: &RequestContext, server_id: Uuid) -> Result<Server> {
        observe(RESOURCE_SERVER, "delete", async {
            self.policy
                .check("delete_server", ctx, &PolicyTarget::server(server_id))?;

            let server = self.storage.get_server(server_id).await?;
            self.notify(ctx, EVENT_SERVER_DELETE, &server).await;
            let deleted = self.storage.delete_server(server.id).await?;

            info!(server = %deleted.name, server_id = %deleted.id, "Deleted server");
            metrics::record_resource_deleted(RESOURCE_SERVER);
            Ok(deleted)
        })
        .await
    }
}

#[cfg(test)]
#[path = "servers_tests.rs"]
mod servers_tests;
