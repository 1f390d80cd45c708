// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Routes platform events from the transport to notification handlers.
//!
//! The dispatcher is the long-running half of the service. It starts the
//! backend, subscribes every handler to its exchange and topics, and hands
//! each consumed event to the handlers that declared its type.

use std::collections::BTreeSet;
use std::sync::{Arc, Weak};

use anyhow::{bail, Context, Result};
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

use super::handlers::NotificationHandler;
use super::transport::{NotificationCallback, Transport};
use super::Notification;
use crate::backend::Backend;
use crate::constants::NOTIFICATION_QUEUE_PREFIX;
use crate::errors::RecoveredError;
use crate::metrics;

/// Lifecycle of a [`NotificationDispatcher`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DispatcherState {
    Constructed,
    Consuming,
    Stopped,
}

/// What happened to one event.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct DispatchOutcome {
    /// Handlers that processed the event successfully, in order
    pub handled_by: Vec<String>,
    /// Handlers that failed, with their error
    pub failures: Vec<RecoveredError>,
}

impl DispatchOutcome {
    /// True when no handler subscribes to the event type.
    #[must_use]
    pub fn is_ignored(&self) -> bool {
        self.handled_by.is_empty() && self.failures.is_empty()
    }
}

/// Queue name for one handler subscription.
#[must_use]
pub fn queue_name(handler: &str, exchange: &str, topic: &str) -> String {
    format!("{NOTIFICATION_QUEUE_PREFIX}.{handler}.{exchange}.{topic}")
}

pub struct NotificationDispatcher {
    handlers: Vec<Arc<dyn NotificationHandler>>,
    transport: Arc<dyn Transport>,
    backend: Arc<dyn Backend>,
    state: Mutex<DispatcherState>,
}

impl NotificationDispatcher {
    #[must_use]
    pub fn new(
        handlers: Vec<Arc<dyn NotificationHandler>>,
        transport: Arc<dyn Transport>,
        backend: Arc<dyn Backend>,
    ) -> Self {
        Self {
            handlers,
            transport,
            backend,
            state: Mutex::new(DispatcherState::Constructed),
        }
    }

    pub async fn state(&self) -> DispatcherState {
        *self.state.lock().await
    }

    /// Start the backend and begin consuming events.
    ///
    /// With no handlers the transport is never touched.
    ///
    /// # Errors
    ///
    /// Fails if the dispatcher was already started, or if the backend or the
    /// transport refuses to start.
    pub async fn start(self: &Arc<Self>) -> Result<()> {
        let mut state = self.state.lock().await;
        if *state != DispatcherState::Constructed {
            bail!("Dispatcher cannot start from state {:?}", *state);
        }

        self.backend
            .start()
            .await
            .with_context(|| format!("Failed to start backend '{}'", self.backend.name()))?;

        if self.handlers.is_empty() {
            info!("No notification handlers enabled, not consuming events");
        } else {
            let callback = self.callback();
            for handler in &self.handlers {
                let (exchange, topics) = handler.exchange_topics();
                for topic in topics {
                    let queue = queue_name(handler.canonical_name(), &exchange, &topic);
                    self.transport
                        .declare_topic_consumer(&queue, &topic, &exchange, Arc::clone(&callback))
                        .await
                        .with_context(|| format!("Failed to declare consumer {queue}"))?;
                }
            }
            self.transport
                .consume()
                .await
                .context("Failed to start consuming")?;
            info!(handlers = self.handlers.len(), "Consuming notifications");
        }

        *state = DispatcherState::Consuming;
        Ok(())
    }

    fn callback(self: &Arc<Self>) -> NotificationCallback {
        let dispatcher: Weak<Self> = Arc::downgrade(self);
        Arc::new(move |notification| {
            let dispatcher = dispatcher.clone();
            Box::pin(async move {
                if let Some(dispatcher) = dispatcher.upgrade() {
                    dispatcher.process_notification(&notification).await;
                }
            })
        })
    }

    /// Close the transport and stop the backend.
    ///
    /// Never fails: errors are logged and returned for inspection.
    pub async fn stop(&self) -> Vec<RecoveredError> {
        let mut state = self.state.lock().await;
        if *state == DispatcherState::Stopped {
            debug!("Dispatcher already stopped");
            return Vec::new();
        }

        let mut recovered = Vec::new();
        if !self.handlers.is_empty() {
            if let Err(e) = self.transport.close().await {
                let err = RecoveredError::new("transport", &e);
                warn!(error = %err, "Failed to close transport");
                recovered.push(err);
            }
        }
        if let Err(e) = self.backend.stop().await {
            let err = RecoveredError::new("backend", &e);
            warn!(error = %err, "Failed to stop backend");
            recovered.push(err);
        }

        *state = DispatcherState::Stopped;
        info!(errors = recovered.len(), "Dispatcher stopped");
        recovered
    }

    /// Hand one event to every handler subscribed to its type, in
    /// registration order. A failing handler does not stop the others.
    pub async fn process_notification(&self, notification: &Notification) -> DispatchOutcome {
        let event_type = notification.event_type.as_str();
        let subscribed: BTreeSet<&str> = self
            .handlers
            .iter()
            .flat_map(|h| h.event_types().iter().copied())
            .collect();

        let mut outcome = DispatchOutcome::default();
        if !subscribed.contains(event_type) {
            debug!(event_type = %event_type, "No handler subscribes to event");
            return outcome;
        }

        for handler in &self.handlers {
            if !handler.event_types().contains(&event_type) {
                continue;
            }
            let name = handler.canonical_name();
            debug!(handler = name, event_type = %event_type, "Dispatching notification");
            match handler
                .process_notification(event_type, &notification.payload)
                .await
            {
                Ok(()) => {
                    metrics::record_notification_dispatched(name, true);
                    outcome.handled_by.push(name.to_string());
                }
                Err(e) => {
                    error!(handler = name, event_type = %event_type, error = %e, "Handler failed");
                    metrics::record_notification_dispatched(name, false);
                    outcome.failures.push(RecoveredError::new(name, &e));
                }
            }
        }
        outcome
    }
}

#[cfg(test)]
#[path = "dispatcher_tests.rs"]
mod dispatcher_tests;
