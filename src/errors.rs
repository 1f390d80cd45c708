// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Error types for dnscentral.
//!
//! This module provides the error taxonomy shared by every component:
//! - [`CentralError`] - returned by every public operation of the central service
//! - [`StorageError`] - returned by storage collaborators
//! - [`BackendError`] - returned by backend nameserver drivers
//! - [`ConfigError`] - returned while loading configuration and resolving registries
//! - [`TransportError`] - returned by notification transports
//!
//! Collaborator failures are surfaced to callers verbatim through the
//! `Storage` and `Backend` variants of [`CentralError`]. The only places that
//! recover arbitrary failures are `ping` and dispatcher shutdown, which report
//! them as [`RecoveredError`] values instead.

use std::fmt;

use serde::Serialize;
use thiserror::Error;

/// Kind of entity a storage lookup or uniqueness constraint applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    Domain,
    Record,
    Server,
    TsigKey,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Domain => "domain",
            Self::Record => "record",
            Self::Server => "server",
            Self::TsigKey => "tsigkey",
        };
        f.write_str(name)
    }
}

/// Errors returned by the central service operations.
#[derive(Error, Debug)]
pub enum CentralError {
    /// The addressed domain does not exist
    #[error("Domain not found")]
    DomainNotFound,

    /// The addressed record does not exist, or does not belong to the addressed domain
    ///
    /// Both cases share this variant so that a mismatched domain id cannot be used
    /// to discover records in another zone.
    #[error("Record not found")]
    RecordNotFound,

    /// The addressed server does not exist
    #[error("Server not found")]
    ServerNotFound,

    /// The addressed TSIG key does not exist
    #[error("TSIG key not found")]
    TsigKeyNotFound,

    /// Policy denial, or a cross-tenant subdomain request
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// The request is well-formed but violates a zone rule (rename, containment, name syntax)
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Domains cannot be created until at least one server exists
    #[error("No servers configured. Please create at least one server")]
    NoServersConfigured,

    /// Storage rejected a domain whose name is already taken
    #[error("Domain '{0}' already exists")]
    DuplicateDomain(String),

    /// Storage rejected a server whose name is already taken
    #[error("Server '{0}' already exists")]
    DuplicateServer(String),

    /// Storage rejected a TSIG key whose name is already taken
    #[error("TSIG key '{0}' already exists")]
    DuplicateTsigKey(String),

    /// Opaque storage failure
    #[error(transparent)]
    Storage(StorageError),

    /// Opaque backend driver failure
    #[error(transparent)]
    Backend(#[from] BackendError),
}

impl CentralError {
    /// Stable label for this error, used as the `error_type` metric label.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::DomainNotFound
            | Self::RecordNotFound
            | Self::ServerNotFound
            | Self::TsigKeyNotFound => "not_found",
            Self::Forbidden(_) => "forbidden",
            Self::BadRequest(_) => "bad_request",
            Self::NoServersConfigured => "no_servers_configured",
            Self::DuplicateDomain(_) | Self::DuplicateServer(_) | Self::DuplicateTsigKey(_) => {
                "conflict"
            }
            Self::Storage(_) => "storage_error",
            Self::Backend(_) => "backend_error",
        }
    }

    /// Returns true for errors raised before any mutation took place.
    #[must_use]
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::Forbidden(_) | Self::BadRequest(_) | Self::NoServersConfigured
        )
    }
}

impl From<StorageError> for CentralError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::NotFound { entity, .. } => match entity {
                EntityKind::Domain => Self::DomainNotFound,
                EntityKind::Record => Self::RecordNotFound,
                EntityKind::Server => Self::ServerNotFound,
                EntityKind::TsigKey => Self::TsigKeyNotFound,
            },
            StorageError::Duplicate { entity, name } => match entity {
                EntityKind::Domain => Self::DuplicateDomain(name),
                EntityKind::Server => Self::DuplicateServer(name),
                EntityKind::TsigKey => Self::DuplicateTsigKey(name),
                EntityKind::Record => Self::Storage(StorageError::Duplicate { entity, name }),
            },
            other @ StorageError::Unavailable(_) => Self::Storage(other),
        }
    }
}

/// Errors returned by storage collaborators.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StorageError {
    /// No row matched a single-item lookup
    #[error("{entity} '{id}' not found")]
    NotFound {
        /// Kind of entity looked up
        entity: EntityKind,
        /// Identifier or criterion that failed to match
        id: String,
    },

    /// A uniqueness constraint rejected the write
    #[error("{entity} '{name}' already exists")]
    Duplicate {
        /// Kind of entity written
        entity: EntityKind,
        /// The conflicting unique name
        name: String,
    },

    /// The storage engine could not serve the request
    #[error("Storage unavailable: {0}")]
    Unavailable(String),
}

/// Errors returned by backend nameserver drivers.
#[derive(Error, Debug)]
pub enum BackendError {
    /// The nameserver management API answered with an error status
    #[error("HTTP {status} from {endpoint}: {message}")]
    Http {
        /// The API endpoint (host:port) that answered
        endpoint: String,
        /// HTTP status code
        status: u16,
        /// Response body or error message
        message: String,
    },

    /// A dynamic DNS update (RFC 2136) was rejected or could not be sent
    #[error("DNS update for '{name}' on server {server} failed: {reason}")]
    DnsUpdate {
        /// Owner name of the record being updated
        name: String,
        /// DNS server (IP:port) the update was sent to
        server: String,
        /// Specific reason for the failure
        reason: String,
    },

    /// The driver cannot represent this record type
    #[error("Record type {0} is not supported by this backend")]
    UnsupportedRecordType(String),

    /// Record data could not be converted into wire format
    #[error("Invalid record data for '{name}': {reason}")]
    InvalidRecordData {
        /// Owner name of the record
        name: String,
        /// Explanation of what is invalid
        reason: String,
    },

    /// Any other driver failure
    #[error(transparent)]
    Driver(#[from] anyhow::Error),
}

impl BackendError {
    /// Returns true if repeating the same call may succeed.
    ///
    /// Rate limiting, gateway and server-side HTTP failures, failed DNS
    /// updates and HTTP requests that never got an answer are transient.
    /// Anything the server rejected on its merits is not.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Http { status, .. } => matches!(*status, 429 | 500 | 502 | 503 | 504),
            Self::DnsUpdate { .. } => true,
            Self::Driver(err) => err.chain().any(|cause| {
                cause
                    .downcast_ref::<reqwest::Error>()
                    .is_some_and(|e| e.is_connect() || e.is_timeout() || e.is_request())
            }),
            Self::UnsupportedRecordType(_) | Self::InvalidRecordData { .. } => false,
        }
    }
}

/// Errors raised while loading configuration or resolving named components.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The configuration file could not be read
    #[error("Failed to read configuration file '{path}': {source}")]
    Read {
        /// Path of the configuration file
        path: String,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// The configuration file is not valid YAML for [`crate::config::CentralConfig`]
    #[error("Failed to parse configuration: {0}")]
    Parse(#[from] serde_yaml::Error),

    /// A domain name blacklist entry is not a valid regular expression
    #[error("Invalid domain name blacklist pattern '{pattern}': {source}")]
    InvalidBlacklist {
        /// The offending pattern
        pattern: String,
        /// Regex compilation error
        #[source]
        source: regex::Error,
    },

    /// The configured backend driver name is not registered
    #[error("Unknown backend driver '{0}'")]
    UnknownBackend(String),

    /// An enabled notification handler name is not registered
    #[error("Unknown notification handler '{0}'")]
    UnknownHandler(String),

    /// An enabled notification handler has no configuration section
    #[error("Notification handler '{0}' is enabled but has no configuration")]
    MissingHandlerConfig(String),

    /// A configuration section is present but invalid
    #[error("Invalid configuration for {section}: {reason}")]
    Invalid {
        /// Configuration section name
        section: String,
        /// Explanation of what is invalid
        reason: String,
    },
}

/// Errors returned by notification transports.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// The transport connection was already closed
    #[error("Transport connection is closed")]
    Closed,

    /// Publishing to an exchange/topic nobody declared
    #[error("No consumer declared for exchange '{exchange}' topic '{topic}'")]
    UnknownExchange {
        /// Exchange name
        exchange: String,
        /// Topic name
        topic: String,
    },
}

/// A failure that was caught and logged instead of propagated.
///
/// Produced by operations that must never fail loudly (health checks and
/// shutdown), so callers can still inspect what went wrong.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecoveredError {
    /// Component the failure came from (e.g. `backend`, `transport`)
    pub component: String,
    /// Rendered error message
    pub message: String,
}

impl RecoveredError {
    #[must_use]
    pub fn new(component: &str, err: &dyn std::error::Error) -> Self {
        Self {
            component: component.to_string(),
            message: err.to_string(),
        }
    }
}

impl fmt::Display for RecoveredError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.component, self.message)
    }
}

#[cfg(test)]
#[path = "errors_tests.rs"]
mod errors_tests;
