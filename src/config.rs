// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Configuration for the central service.
//!
//! Configuration is read once at startup from a YAML file and is immutable
//! afterwards. Components receive it as `Arc<CentralConfig>` at construction;
//! nothing reads ambient global state.
//!
//! # Example
//!
//! ```yaml
//! host: central-1
//! backendDriver: bind9
//! enabledNotificationHandlers: [nova_fixed]
//! domainNameBlacklist: ["^example\\.org\\.$", "\\.internal\\.$"]
//! policy:
//!   defaultRule: admin_or_owner
//!   rules:
//!     get_servers: allow
//! bind9:
//!   bindcarUrl: http://127.0.0.1:8080
//!   dnsServer: 127.0.0.1:53
//!   updateKeyName: dnscentral-update
//!   updateKeySecret: c2VjcmV0LXNlY3JldC1zZWNyZXQ=
//! servers:
//!   - name: ns1.example.net.
//! domains:
//!   - name: cloud.example.com.
//!     email: hostmaster@example.com
//!     tenantId: platform
//! handlers:
//!   nova_fixed:
//!     domainName: cloud.example.com.
//!     format: "{hostname}.{domain}"
//! ```

use std::collections::BTreeMap;
use std::path::Path;

use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use crate::constants::{
    CENTRAL_NOTIFICATION_TOPIC, DEFAULT_BACKEND_DRIVER, DEFAULT_DNS_RECORD_TTL_SECS, DEFAULT_HOST,
    DEFAULT_METRICS_BIND_ADDRESS,
};
use crate::errors::ConfigError;
use crate::models::{CreateDomain, CreateServer, TsigAlgorithm};
use crate::policy::Rule;

/// Top-level configuration of the central service.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CentralConfig {
    /// Service host identifier, reported by `ping`.
    #[serde(default = "default_host")]
    pub host: String,

    /// Topic on the `dnscentral` exchange that lifecycle events are published to.
    #[serde(default = "default_central_topic")]
    pub central_topic: String,

    /// Backend driver name (`fake` or `bind9`).
    #[serde(default = "default_backend_driver")]
    pub backend_driver: String,

    /// Notification handler names, in registration order.
    #[serde(default)]
    pub enabled_notification_handlers: Vec<String>,

    /// Regular expressions of domain names reserved to privileged callers.
    #[serde(default)]
    pub domain_name_blacklist: Vec<String>,

    #[serde(default)]
    pub policy: PolicyConfig,

    /// Settings of the `bind9` backend driver.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bind9: Option<Bind9Config>,

    /// Per-handler settings, keyed by handler name.
    #[serde(default)]
    pub handlers: BTreeMap<String, HandlerConfig>,

    /// Name servers created at startup when missing.
    #[serde(default)]
    pub servers: Vec<CreateServer>,

    /// Zones created at startup when missing, in order. List a parent zone
    /// before its subdomains.
    #[serde(default)]
    pub domains: Vec<SeedDomain>,

    /// Listen address of the metrics and health HTTP server.
    #[serde(default = "default_metrics_bind_address")]
    pub metrics_bind_address: String,
}

impl Default for CentralConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            central_topic: default_central_topic(),
            backend_driver: default_backend_driver(),
            enabled_notification_handlers: Vec::new(),
            domain_name_blacklist: Vec::new(),
            policy: PolicyConfig::default(),
            bind9: None,
            handlers: BTreeMap::new(),
            servers: Vec::new(),
            domains: Vec::new(),
            metrics_bind_address: default_metrics_bind_address(),
        }
    }
}

impl CentralConfig {
    /// Loads configuration from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Read`] if the file cannot be read and
    /// [`ConfigError::Parse`] if it is not valid configuration YAML.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        debug!(path = %path.display(), "Loaded configuration file");
        Self::from_yaml(&content)
    }

    /// Parses configuration from a YAML document.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] if the document is not valid configuration YAML.
    pub fn from_yaml(content: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(content)?)
    }

    /// Compiles the domain name blacklist.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidBlacklist`] naming the first pattern that
    /// is not a valid regular expression.
    pub fn compile_blacklist(&self) -> Result<Vec<Regex>, ConfigError> {
        self.domain_name_blacklist
            .iter()
            .map(|pattern| {
                Regex::new(pattern).map_err(|source| ConfigError::InvalidBlacklist {
                    pattern: pattern.clone(),
                    source,
                })
            })
            .collect()
    }

    /// Settings of a named notification handler.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingHandlerConfig`] if the handler has no
    /// section, or [`ConfigError::Invalid`] if the section names no zone.
    pub fn handler(&self, name: &str) -> Result<&HandlerConfig, ConfigError> {
        let handler = self
            .handlers
            .get(name)
            .ok_or_else(|| ConfigError::MissingHandlerConfig(name.to_string()))?;
        if handler.domain_id.is_none() && handler.domain_name.is_none() {
            return Err(ConfigError::Invalid {
                section: format!("handlers.{name}"),
                reason: "one of domainId or domainName is required".to_string(),
            });
        }
        Ok(handler)
    }
}

/// Rule table of the bundled [`crate::policy::RulePolicy`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PolicyConfig {
    /// Rule applied to names that have neither an override nor a built-in default.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_rule: Option<Rule>,

    /// Per-rule overrides.
    #[serde(default)]
    pub rules: BTreeMap<String, Rule>,
}

/// Settings of the `bind9` backend driver.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bind9Config {
    /// Base URL of the bindcar HTTP API (e.g. `http://127.0.0.1:8080`).
    pub bindcar_url: String,

    /// Bearer token sent to bindcar.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_token: Option<String>,

    /// Address (IP:port) that receives RFC 2136 dynamic updates.
    pub dns_server: String,

    /// Name of the TSIG key that signs dynamic updates.
    pub update_key_name: String,

    #[serde(default)]
    pub update_key_algorithm: TsigAlgorithm,

    /// Base64-encoded secret of the update key.
    pub update_key_secret: String,

    /// Name server IPs announced in zone glue, keyed by server name.
    #[serde(default)]
    pub name_server_ips: BTreeMap<String, String>,

    /// Upper bound on the total time spent retrying one HTTP request.
    #[serde(default = "default_max_retry_secs")]
    pub max_retry_secs: u64,
}

/// A zone created at startup, owned by `tenant_id` when given.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeedDomain {
    #[serde(flatten)]
    pub domain: CreateDomain,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tenant_id: Option<String>,
}

/// Settings shared by the bundled notification handlers.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HandlerConfig {
    /// Domain that receives the records this handler creates.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domain_id: Option<Uuid>,

    /// Same as `domain_id`, by zone name. `domain_id` wins when both are set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domain_name: Option<String>,

    /// Record name template. Placeholders: `{hostname}`, `{domain}`,
    /// `{tenant_id}` and `{octet0}` .. `{octet3}` of the address.
    #[serde(default = "default_name_format")]
    pub format: String,

    /// Exchange the handler subscribes to. Defaults per handler.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub control_exchange: Option<String>,

    /// Topics the handler subscribes to.
    #[serde(default = "default_notification_topics")]
    pub notification_topics: Vec<String>,

    /// TTL of created records.
    #[serde(default = "default_record_ttl")]
    pub ttl: u32,
}

fn default_host() -> String {
    DEFAULT_HOST.to_string()
}

fn default_central_topic() -> String {
    CENTRAL_NOTIFICATION_TOPIC.to_string()
}

fn default_backend_driver() -> String {
    DEFAULT_BACKEND_DRIVER.to_string()
}

fn default_metrics_bind_address() -> String {
    DEFAULT_METRICS_BIND_ADDRESS.to_string()
}

fn default_max_retry_secs() -> u64 {
    60
}

fn default_name_format() -> String {
    "{hostname}.{domain}".to_string()
}

fn default_notification_topics() -> Vec<String> {
    vec![CENTRAL_NOTIFICATION_TOPIC.to_string()]
}

fn default_record_ttl() -> u32 {
    DEFAULT_DNS_RECORD_TTL_SECS
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod config_tests;
