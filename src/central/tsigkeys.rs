// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! TSIG key lifecycle.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use rand::Rng;
use tracing::info;
use uuid::Uuid;

use super::{observe, Central, Result};
use crate::constants::{
    EVENT_TSIGKEY_CREATE, EVENT_TSIGKEY_DELETE, EVENT_TSIGKEY_UPDATE, RESOURCE_TSIGKEY,
    TSIG_SECRET_BYTES,
};
use crate::context::RequestContext;
use crate::errors::CentralError;
use crate::metrics;
use crate::models::{CreateTsigKey, NewTsigKey, TsigKey, UpdateTsigKey};
use crate::policy::PolicyTarget;
use crate::storage::Criterion;

/// Generate a random base64-encoded 256-bit TSIG secret.
#[must_use]
pub fn generate_secret() -> String {
    let mut rng = rand::thread_rng();
    let mut key_bytes = [0u8; TSIG_SECRET_BYTES];
    rng.fill(&mut key_bytes);
    BASE64.encode(key_bytes)
}

fn check_secret(secret: &str) -> Result<()> {
    match BASE64.decode(secret) {
        Ok(bytes) if !bytes.is_empty() => Ok(()),
        _ => Err(CentralError::BadRequest(
            "TSIG secret must be non-empty base64".to_string(),
        )),
    }
}

impl Central {
    /// Create a TSIG key, generating a secret when none is supplied.
    ///
    /// # Errors
    ///
    /// Returns [`CentralError::Forbidden`], [`CentralError::BadRequest`] for an
    /// invalid secret, [`CentralError::DuplicateTsigKey`], or a backend failure.
    pub async fn create_tsigkey(
        &self,
        ctx: &RequestContext,
        values: CreateTsigKey,
    ) -> Result<TsigKey> {
        observe(RESOURCE_TSIGKEY, "create", async {
            self.policy
                .check("create_tsigkey", ctx, &PolicyTarget::none())?;

            let secret = match values.secret {
                Some(secret) => {
                    check_secret(&secret)?;
                    secret
                }
                None => generate_secret(),
            };
            let tsigkey = self
                .storage
                .create_tsigkey(NewTsigKey {
                    name: values.name,
                    algorithm: values.algorithm,
                    secret,
                })
                .await?;

            self.backend.create_tsigkey(&tsigkey).await?;
            self.notify(ctx, EVENT_TSIGKEY_CREATE, &tsigkey).await;

            info!(tsigkey = %tsigkey.name, algorithm = %tsigkey.algorithm, "Created TSIG key");
            metrics::record_resource_created(RESOURCE_TSIGKEY);
            Ok(tsigkey)
        })
        .await
    }

    /// # Errors
    ///
    /// Returns [`CentralError::Forbidden`] or a storage failure.
    pub async fn get_tsigkeys(
        &self,
        ctx: &RequestContext,
        criterion: Option<Criterion>,
    ) -> Result<Vec<TsigKey>> {
        observe(RESOURCE_TSIGKEY, "list", async {
            self.policy
                .check("get_tsigkeys", ctx, &PolicyTarget::none())?;
            Ok(self
                .storage
                .get_tsigkeys(&criterion.unwrap_or_default())
                .await?)
        })
        .await
    }

    /// # Errors
    ///
    /// Returns [`CentralError::Forbidden`] or [`CentralError::TsigKeyNotFound`].
    pub async fn get_tsigkey(&self, ctx: &RequestContext, tsigkey_id: Uuid) -> Result<TsigKey> {
        observe(RESOURCE_TSIGKEY, "get", async {
            self.policy
                .check("get_tsigkey", ctx, &PolicyTarget::tsigkey(tsigkey_id))?;
            Ok(self.storage.get_tsigkey(tsigkey_id).await?)
        })
        .await
    }

    /// # Errors
    ///
    /// Returns [`CentralError::Forbidden`], [`CentralError::TsigKeyNotFound`],
    /// [`CentralError::BadRequest`] for an invalid secret, or a backend failure.
    pub async fn update_tsigkey(
        &self,
        ctx: &RequestContext,
        tsigkey_id: Uuid,
        values: UpdateTsigKey,
    ) -> Result<TsigKey> {
        observe(RESOURCE_TSIGKEY, "update", async {
            self.policy
                .check("update_tsigkey", ctx, &PolicyTarget::tsigkey(tsigkey_id))?;
            if let Some(secret) = &values.secret {
                check_secret(secret)?;
            }

            let tsigkey = self.storage.get_tsigkey(tsigkey_id).await?;
            let tsigkey = self
                .storage
                .update_tsigkey(tsigkey.with_update(&values))
                .await?;

            self.backend.update_tsigkey(&tsigkey).await?;
            self.notify(ctx, EVENT_TSIGKEY_UPDATE, &tsigkey).await;

            info!(tsigkey = %tsigkey.name, "Updated TSIG key");
            metrics::record_resource_updated(RESOURCE_TSIGKEY);
            Ok(tsigkey)
        })
        .await
    }

    /// Delete a TSIG key. The backend is told before storage.
    ///
    /// # Errors
    ///
    /// Returns [`CentralError::Forbidden`], [`CentralError::TsigKeyNotFound`],
    /// or a backend failure.
    pub async fn delete_tsigkey(&self, ctx: &RequestContext, tsigkey_id: Uuid) -> Result<TsigKey> {
        observe(RESOURCE_TSIGKEY, "delete", async {
            self.policy
                .check("delete_tsigkey", ctx, &PolicyTarget::tsigkey(tsigkey_id))?;

            let tsigkey = self.storage.get_tsigkey(tsigkey_id).await?;
            self.backend.delete_tsigkey(&tsigkey).await?;
            self.notify(ctx, EVENT_TSIGKEY_DELETE, &tsigkey).await;

            let deleted = self.storage.delete_tsigkey(tsigkey.id).await?;
            info!(tsigkey = %deleted.name, "Deleted TSIG key");
            metrics::record_resource_deleted(RESOURCE_TSIGKEY);
            Ok(deleted)
        })
        .await
    }
}

#[cfg(test)]
#[path = "tsigkeys_tests.rs"]
mod tsigkeys_tests;
