// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Notifications: emitting central events and reacting to platform events.
//!
//! Two directions flow through this module:
//!
//! - **Outbound**: every successful mutation in [`crate::central::Central`]
//!   emits `<resource>.<action>` through a [`Notifier`].
//! - **Inbound**: the [`dispatcher::NotificationDispatcher`] consumes platform
//!   events from a [`transport::Transport`] and routes them to the
//!   [`handlers::NotificationHandler`]s that subscribe to their event type.

pub mod dispatcher;
pub mod handlers;
pub mod transport;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;

use crate::context::RequestContext;
use crate::metrics;

/// One event message. Never persisted.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub event_type: String,
    pub payload: Value,
}

impl Notification {
    #[must_use]
    pub fn new(event_type: impl Into<String>, payload: Value) -> Self {
        Self {
            event_type: event_type.into(),
            payload,
        }
    }
}

/// Sink for events emitted by the central service.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, ctx: &RequestContext, event_type: &str, payload: Value);
}

/// Notifier that only logs.
#[derive(Debug, Default)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify(&self, ctx: &RequestContext, event_type: &str, payload: Value) {
        info!(
            request_id = %ctx.request_id,
            event_type = %event_type,
            payload = %payload,
            "Emitting notification"
        );
        metrics::record_notification_emitted(event_type);
    }
}
