// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Global constants for dnscentral.
//!
//! This module contains the numeric and string constants used throughout the codebase.
//! Constants are organized by category for easy maintenance.

// ============================================================================
// Service Identity Constants
// ============================================================================

/// Default service host identifier reported by `ping`
pub const DEFAULT_HOST: &str = "localhost";

/// Default backend driver name
pub const DEFAULT_BACKEND_DRIVER: &str = "fake";

/// Prefix of every notification queue name declared by the dispatcher
pub const NOTIFICATION_QUEUE_PREFIX: &str = "dnscentral.notifications";

/// Exchange on which central publishes its own lifecycle events
pub const CENTRAL_EXCHANGE: &str = "dnscentral";

/// Topic on which central publishes its own lifecycle events
pub const CENTRAL_NOTIFICATION_TOPIC: &str = "notifications.info";

// ============================================================================
// Resource Type Labels
// ============================================================================

/// Resource label for domains (zones)
pub const RESOURCE_DOMAIN: &str = "domain";

/// Resource label for records
pub const RESOURCE_RECORD: &str = "record";

/// Resource label for servers
pub const RESOURCE_SERVER: &str = "server";

/// Resource label for TSIG keys
pub const RESOURCE_TSIGKEY: &str = "tsigkey";

/// Resource label for diagnostics operations
pub const RESOURCE_DIAGNOSTICS: &str = "diagnostics";

// ============================================================================
// Lifecycle Event Types
// ============================================================================

pub const EVENT_DOMAIN_CREATE: &str = "domain.create";
pub const EVENT_DOMAIN_UPDATE: &str = "domain.update";
pub const EVENT_DOMAIN_DELETE: &str = "domain.delete";
pub const EVENT_RECORD_CREATE: &str = "record.create";
pub const EVENT_RECORD_UPDATE: &str = "record.update";
pub const EVENT_RECORD_DELETE: &str = "record.delete";
pub const EVENT_SERVER_CREATE: &str = "server.create";
pub const EVENT_SERVER_UPDATE: &str = "server.update";
pub const EVENT_SERVER_DELETE: &str = "server.delete";
pub const EVENT_TSIGKEY_CREATE: &str = "tsigkey.create";
pub const EVENT_TSIGKEY_UPDATE: &str = "tsigkey.update";
pub const EVENT_TSIGKEY_DELETE: &str = "tsigkey.delete";

// ============================================================================
// DNS Protocol Constants
// ============================================================================

/// Default TTL for zones (1 hour)
pub const DEFAULT_ZONE_TTL_SECS: u32 = 3600;

/// Default TTL for records pushed through dynamic updates (5 minutes)
pub const DEFAULT_DNS_RECORD_TTL_SECS: u32 = 300;

/// Default SOA refresh interval (1 hour)
pub const DEFAULT_SOA_REFRESH_SECS: u32 = 3600;

/// Default SOA retry interval (10 minutes)
pub const DEFAULT_SOA_RETRY_SECS: u32 = 600;

/// Default SOA expire time (7 days)
pub const DEFAULT_SOA_EXPIRE_SECS: u32 = 604_800;

/// Default SOA negative TTL (1 day)
pub const DEFAULT_SOA_NEGATIVE_TTL_SECS: u32 = 86400;

/// TSIG fudge time in seconds (allows for clock skew)
pub const TSIG_FUDGE_TIME_SECS: u16 = 300;

/// Size of generated TSIG secrets in bytes (256 bits)
pub const TSIG_SECRET_BYTES: usize = 32;

// ============================================================================
// Runtime Constants
// ============================================================================

/// Number of worker threads for Tokio runtime
pub const TOKIO_WORKER_THREADS: usize = 4;

/// Capacity of each in-process topic channel
pub const LOCAL_TRANSPORT_CHANNEL_CAPACITY: usize = 256;

// ============================================================================
// Metrics Server Constants
// ============================================================================

/// Default bind address for the metrics and health HTTP server
pub const DEFAULT_METRICS_BIND_ADDRESS: &str = "0.0.0.0:8080";

/// Path for Prometheus metrics endpoint
pub const METRICS_SERVER_PATH: &str = "/metrics";

/// Path for the health endpoint
pub const HEALTH_SERVER_PATH: &str = "/healthz";
