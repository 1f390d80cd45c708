// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Per-request caller identity.
//!
//! Every public operation of [`crate::central::Central`] receives a
//! [`RequestContext`] describing who is calling: the user, the tenant they act
//! for, and whether they hold the admin role. The policy gate evaluates rules
//! against it and tenant-scoped reads derive their filters from it.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identity of the caller of one operation.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestContext {
    /// Authenticated user, if known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,

    /// Tenant the caller acts for. New domains are owned by this tenant.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tenant_id: Option<String>,

    /// Admin callers bypass tenant scoping on reads.
    #[serde(default)]
    pub is_admin: bool,

    /// Correlation id carried into logs.
    pub request_id: String,
}

impl RequestContext {
    /// Context of a regular tenant member.
    #[must_use]
    pub fn new(user_id: impl Into<String>, tenant_id: impl Into<String>) -> Self {
        Self {
            user_id: Some(user_id.into()),
            tenant_id: Some(tenant_id.into()),
            is_admin: false,
            request_id: new_request_id(),
        }
    }

    /// Context with the admin role and no tenant, used by notification
    /// handlers and service-internal calls.
    #[must_use]
    pub fn admin() -> Self {
        Self {
            user_id: None,
            tenant_id: None,
            is_admin: true,
            request_id: new_request_id(),
        }
    }

    /// Returns a copy of this context holding the admin role.
    #[must_use]
    pub fn elevated(&self) -> Self {
        Self {
            is_admin: true,
            ..self.clone()
        }
    }

    /// Returns true if the caller belongs to `tenant_id`.
    #[must_use]
    pub fn owns(&self, tenant_id: Option<&str>) -> bool {
        match (self.tenant_id.as_deref(), tenant_id) {
            (Some(mine), Some(theirs)) => mine == theirs,
            _ => false,
        }
    }
}

fn new_request_id() -> String {
    format!("req-{}", Uuid::new_v4())
}

#[cfg(test)]
#[path = "context_tests.rs"]
mod context_tests;
