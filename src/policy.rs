// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Authorization gate.
//!
//! Every mutating or tenant-scoped operation calls [`PolicyGate::check`] with a
//! rule name, the caller's [`RequestContext`] and a [`PolicyTarget`] describing
//! what is being accessed. A denial becomes [`CentralError::Forbidden`], which
//! callers propagate unchanged.
//!
//! The rule engine itself sits behind the [`Policy`] trait. [`RulePolicy`] is a
//! static table mapping rule names to one of a handful of [`Rule`]s.

use std::collections::BTreeMap;
use std::sync::Arc;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::config::PolicyConfig;
use crate::context::RequestContext;
use crate::errors::CentralError;
use crate::metrics;
use crate::models::{Domain, Record};

/// Attributes an authorization rule evaluates.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct PolicyTarget {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tenant_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub domain_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub domain_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub record_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub record_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub server_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tsigkey_id: Option<Uuid>,
}

impl PolicyTarget {
    /// Target with no attributes.
    #[must_use]
    pub fn none() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn tenant(tenant_id: Option<String>) -> Self {
        Self {
            tenant_id,
            ..Self::default()
        }
    }

    /// Target describing an existing domain.
    #[must_use]
    pub fn domain(domain: &Domain) -> Self {
        Self {
            tenant_id: domain.tenant_id.clone(),
            domain_id: Some(domain.id),
            domain_name: Some(domain.name.clone()),
            ..Self::default()
        }
    }

    /// Target describing an existing record in `domain`.
    #[must_use]
    pub fn record(domain: &Domain, record: &Record) -> Self {
        Self {
            record_id: Some(record.id),
            record_name: Some(record.name.clone()),
            ..Self::domain(domain)
        }
    }

    #[must_use]
    pub fn server(server_id: Uuid) -> Self {
        Self {
            server_id: Some(server_id),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn tsigkey(tsigkey_id: Uuid) -> Self {
        Self {
            tsigkey_id: Some(tsigkey_id),
            ..Self::default()
        }
    }
}

/// Policy engine collaborator.
pub trait Policy: Send + Sync {
    /// Returns true if `rule` grants the caller access to `target`.
    fn allows(&self, rule: &str, ctx: &RequestContext, target: &PolicyTarget) -> bool;
}

/// Shared handle to the policy engine, used by every central operation.
#[derive(Clone)]
pub struct PolicyGate {
    policy: Arc<dyn Policy>,
}

impl PolicyGate {
    #[must_use]
    pub fn new(policy: Arc<dyn Policy>) -> Self {
        Self { policy }
    }

    /// Checks `rule` for the caller against `target`.
    ///
    /// # Errors
    ///
    /// Returns [`CentralError::Forbidden`] if the policy denies the request.
    pub fn check(
        &self,
        rule: &str,
        ctx: &RequestContext,
        target: &PolicyTarget,
    ) -> Result<(), CentralError> {
        if self.policy.allows(rule, ctx, target) {
            debug!(rule = %rule, request_id = %ctx.request_id, "Policy check passed");
            return Ok(());
        }

        warn!(
            rule = %rule,
            request_id = %ctx.request_id,
            tenant_id = ?ctx.tenant_id,
            target_tenant_id = ?target.tenant_id,
            "Policy check denied"
        );
        metrics::record_policy_denial(rule);
        Err(CentralError::Forbidden(format!(
            "Policy does not allow '{rule}'"
        )))
    }
}

/// Outcome of a rule in [`RulePolicy`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum Rule {
    /// Everyone is allowed
    Allow,
    /// Nobody is allowed
    Deny,
    /// Only admin callers are allowed
    Admin,
    /// Only callers whose tenant matches the target tenant are allowed
    Owner,
    /// Admin callers, or callers whose tenant matches the target tenant
    AdminOrOwner,
}

impl Rule {
    #[must_use]
    pub fn evaluate(self, ctx: &RequestContext, target: &PolicyTarget) -> bool {
        match self {
            Self::Allow => true,
            Self::Deny => false,
            Self::Admin => ctx.is_admin,
            Self::Owner => ctx.owns(target.tenant_id.as_deref()),
            Self::AdminOrOwner => ctx.is_admin || ctx.owns(target.tenant_id.as_deref()),
        }
    }
}

/// Built-in rule for `name` when no override is configured.
///
/// Server, TSIG key, blacklist and diagnostics rules are admin-only; the
/// remaining domain and record rules are tenant-owned.
#[must_use]
pub fn builtin_rule(name: &str) -> Option<Rule> {
    let rule = match name {
        "create_server" | "get_servers" | "get_server" | "update_server" | "delete_server"
        | "create_tsigkey" | "get_tsigkeys" | "get_tsigkey" | "update_tsigkey"
        | "delete_tsigkey" | "use_blacklisted_domain" | "diagnostics_sync_all"
        | "diagnostics_sync_domain" | "diagnostics_sync_record" | "diagnostics_ping" => {
            Rule::Admin
        }
        "create_domain" | "get_domains" | "get_domain" | "update_domain" | "delete_domain"
        | "create_record" | "get_records" | "get_record" | "update_record" | "delete_record" => {
            Rule::AdminOrOwner
        }
        _ => return None,
    };
    Some(rule)
}

/// Static rule table.
#[derive(Clone, Debug)]
pub struct RulePolicy {
    rules: BTreeMap<String, Rule>,
    default_rule: Rule,
}

impl RulePolicy {
    /// Builds the table from configuration overrides on top of the built-in rules.
    ///
    /// Unknown rule names fall back to the configured default, or to `admin`.
    #[must_use]
    pub fn from_config(config: &PolicyConfig) -> Self {
        Self {
            rules: config.rules.clone(),
            default_rule: config.default_rule.unwrap_or(Rule::Admin),
        }
    }

    /// The rule that applies to `name`.
    #[must_use]
    pub fn rule_for(&self, name: &str) -> Rule {
        self.rules
            .get(name)
            .copied()
            .or_else(|| builtin_rule(name))
            .unwrap_or(self.default_rule)
    }
}

impl Default for RulePolicy {
    fn default() -> Self {
        Self::from_config(&PolicyConfig::default())
    }
}

impl Policy for RulePolicy {
    fn allows(&self, rule: &str, ctx: &RequestContext, target: &PolicyTarget) -> bool {
        self.rule_for(rule).evaluate(ctx, target)
    }
}

#[cfg(test)]
#[path = "policy_tests.rs"]
mod policy_tests;
