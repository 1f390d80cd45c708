// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Message transport contract and the in-process implementation.

use async_trait::async_trait;
use futures::future::BoxFuture;
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::{broadcast, watch, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::{Notification, Notifier};
use crate::constants::{
    CENTRAL_EXCHANGE, CENTRAL_NOTIFICATION_TOPIC, LOCAL_TRANSPORT_CHANNEL_CAPACITY,
};
use crate::context::RequestContext;
use crate::errors::TransportError;
use crate::metrics;

/// Callback invoked for every message delivered to a consumer.
pub type NotificationCallback = Arc<dyn Fn(Notification) -> BoxFuture<'static, ()> + Send + Sync>;

/// Topic-based message transport.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Bind `queue_name` to `topic` on `exchange`; messages go to `callback`
    /// once [`Transport::consume`] has been called.
    async fn declare_topic_consumer(
        &self,
        queue_name: &str,
        topic: &str,
        exchange: &str,
        callback: NotificationCallback,
    ) -> Result<(), TransportError>;

    /// Start delivering messages to every declared consumer.
    async fn consume(&self) -> Result<(), TransportError>;

    /// Stop delivery and release the connection.
    async fn close(&self) -> Result<(), TransportError>;
}

#[derive(Clone, Debug)]
struct Envelope {
    exchange: String,
    topic: String,
    notification: Notification,
}

struct Consumer {
    queue_name: String,
    exchange: String,
    topic: String,
    callback: NotificationCallback,
    receiver: broadcast::Receiver<Envelope>,
}

#[derive(Default)]
struct State {
    pending: Vec<Consumer>,
    bindings: Vec<(String, String)>,
    tasks: Vec<JoinHandle<()>>,
    closed: bool,
}

/// In-process topic bus on a tokio broadcast channel.
///
/// Consumers subscribe when declared, so messages published between
/// declaration and [`Transport::consume`] are buffered (up to the channel
/// capacity) rather than lost.
pub struct LocalTransport {
    /// Topic on [`CENTRAL_EXCHANGE`] that lifecycle events are published to
    topic: String,
    sender: broadcast::Sender<Envelope>,
    shutdown: watch::Sender<bool>,
    state: Mutex<State>,
}

impl Default for LocalTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl LocalTransport {
    #[must_use]
    pub fn new() -> Self {
        Self::with_topic(CENTRAL_NOTIFICATION_TOPIC)
    }

    /// Transport whose [`Notifier`] publishes on `topic`.
    #[must_use]
    pub fn with_topic(topic: impl Into<String>) -> Self {
        let (sender, _) = broadcast::channel(LOCAL_TRANSPORT_CHANNEL_CAPACITY);
        let (shutdown, _) = watch::channel(false);
        Self {
            topic: topic.into(),
            sender,
            shutdown,
            state: Mutex::new(State::default()),
        }
    }

    /// Publish a notification on `exchange`/`topic`.
    ///
    /// Returns the number of declared consumers bound to that pair.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::Closed`] after [`Transport::close`] and
    /// [`TransportError::UnknownExchange`] when nothing is bound to the pair.
    pub async fn publish(
        &self,
        exchange: &str,
        topic: &str,
        notification: Notification,
    ) -> Result<usize, TransportError> {
        let bound = {
            let state = self.state.lock().await;
            if state.closed {
                return Err(TransportError::Closed);
            }
            state
                .bindings
                .iter()
                .filter(|(e, t)| e == exchange && t == topic)
                .count()
        };
        if bound == 0 {
            return Err(TransportError::UnknownExchange {
                exchange: exchange.to_string(),
                topic: topic.to_string(),
            });
        }

        debug!(
            exchange = %exchange,
            topic = %topic,
            event_type = %notification.event_type,
            "Publishing notification"
        );
        self.sender
            .send(Envelope {
                exchange: exchange.to_string(),
                topic: topic.to_string(),
                notification,
            })
            .map_err(|_| TransportError::Closed)?;
        Ok(bound)
    }

    fn spawn_consumer(&self, consumer: Consumer) -> JoinHandle<()> {
        let mut shutdown = self.shutdown.subscribe();
        let Consumer {
            queue_name,
            exchange,
            topic,
            callback,
            mut receiver,
        } = consumer;

        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = shutdown.changed() => break,
                    message = receiver.recv() => match message {
                        Ok(envelope) => {
                            if envelope.exchange == exchange && envelope.topic == topic {
                                callback(envelope.notification).await;
                            }
                        }
                        Err(broadcast::error::RecvError::Lagged(skipped)) => {
                            warn!(
                                queue = %queue_name,
                                skipped = skipped,
                                "Consumer lagged, notifications dropped"
                            );
                        }
                        Err(broadcast::error::RecvError::Closed) => break,
                    },
                }
            }
            debug!(queue = %queue_name, "Consumer stopped");
        })
    }
}

#[async_trait]
impl Transport for LocalTransport {
    async fn declare_topic_consumer(
        &self,
        queue_name: &str,
        topic: &str,
        exchange: &str,
        callback: NotificationCallback,
    ) -> Result<(), TransportError> {
        let mut state = self.state.lock().await;
        if state.closed {
            return Err(TransportError::Closed);
        }
        info!(queue = %queue_name, exchange = %exchange, topic = %topic, "Declared topic consumer");
        state.bindings.push((exchange.to_string(), topic.to_string()));
        state.pending.push(Consumer {
            queue_name: queue_name.to_string(),
            exchange: exchange.to_string(),
            topic: topic.to_string(),
            callback,
            receiver: self.sender.subscribe(),
        });
        Ok(())
    }

    async fn consume(&self) -> Result<(), TransportError> {
        let mut state = self.state.lock().await;
        if state.closed {
            return Err(TransportError::Closed);
        }
        let pending = std::mem::take(&mut state.pending);
        info!(consumers = pending.len(), "Starting consumers");
        for consumer in pending {
            let handle = self.spawn_consumer(consumer);
            state.tasks.push(handle);
        }
        Ok(())
    }

    async fn close(&self) -> Result<(), TransportError> {
        let tasks = {
            let mut state = self.state.lock().await;
            if state.closed {
                return Err(TransportError::Closed);
            }
            state.closed = true;
            state.pending.clear();
            std::mem::take(&mut state.tasks)
        };
        self.shutdown.send_replace(true);
        for task in tasks {
            if let Err(e) = task.await {
                warn!(error = %e, "Consumer task ended abnormally");
            }
        }
        info!("Local transport closed");
        Ok(())
    }
}

#[async_trait]
impl Notifier for LocalTransport {
    async fn notify(&self, ctx: &RequestContext, event_type: &str, payload: Value) {
        metrics::record_notification_emitted(event_type);
        let notification = Notification::new(event_type, payload);
        match self
            .publish(CENTRAL_EXCHANGE, &self.topic, notification)
            .await
        {
            Ok(consumers) => {
                info!(
                    request_id = %ctx.request_id,
                    event_type = %event_type,
                    consumers = consumers,
                    "Emitted notification"
                );
            }
            Err(e) => {
                debug!(
                    request_id = %ctx.request_id,
                    event_type = %event_type,
                    error = %e,
                    "Notification not delivered"
                );
            }
        }
    }
}

#[cfg(test)]
#[path = "transport_tests.rs"]
mod transport_tests;
