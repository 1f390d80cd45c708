// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Unit tests for `transport.rs`

#[cfg(test)]
mod tests {
    use super::super::*;
    use serde_json::json;
    use std::time::Duration;
    use tokio::sync::mpsc;

    fn forwarding_callback(tx: mpsc::UnboundedSender<Notification>) -> NotificationCallback {
        Arc::new(move |notification| {
            let tx = tx.clone();
            Box::pin(async move {
                let _ = tx.send(notification);
            })
        })
    }

    async fn recv(rx: &mut mpsc::UnboundedReceiver<Notification>) -> Option<Notification> {
        tokio::time::timeout(Duration::from_secs(2), rx.recv())
            .await
            .ok()
            .flatten()
    }

    #[tokio::test]
    async fn test_publish_delivers_to_bound_consumer() {
        let transport = LocalTransport::new();
        let (tx, mut rx) = mpsc::unbounded_channel();
        transport
            .declare_topic_consumer("q1", "notifications.info", "nova", forwarding_callback(tx))
            .await
            .unwrap();
        transport.consume().await.unwrap();

        let n = Notification::new("compute.instance.create.end", json!({"id": 1}));
        let bound = transport
            .publish("nova", "notifications.info", n.clone())
            .await
            .unwrap();
        assert_eq!(bound, 1);
        assert_eq!(recv(&mut rx).await, Some(n));

        transport.close().await.unwrap();
    }

    #[tokio::test]
    async fn test_messages_before_consume_are_buffered() {
        let transport = LocalTransport::new();
        let (tx, mut rx) = mpsc::unbounded_channel();
        transport
            .declare_topic_consumer("q1", "notifications.info", "nova", forwarding_callback(tx))
            .await
            .unwrap();

        let n = Notification::new("compute.instance.delete.start", json!({}));
        transport
            .publish("nova", "notifications.info", n.clone())
            .await
            .unwrap();
        transport.consume().await.unwrap();

        assert_eq!(recv(&mut rx).await, Some(n));
        transport.close().await.unwrap();
    }

    #[tokio::test]
    async fn test_consumer_only_sees_its_exchange() {
        let transport = LocalTransport::new();
        let (nova_tx, mut nova_rx) = mpsc::unbounded_channel();
        let (quantum_tx, mut quantum_rx) = mpsc::unbounded_channel();
        transport
            .declare_topic_consumer("q1", "notifications.info", "nova", forwarding_callback(nova_tx))
            .await
            .unwrap();
        transport
            .declare_topic_consumer(
                "q2",
                "notifications.info",
                "quantum",
                forwarding_callback(quantum_tx),
            )
            .await
            .unwrap();
        transport.consume().await.unwrap();

        let n = Notification::new("floatingip.update.end", json!({}));
        transport
            .publish("quantum", "notifications.info", n.clone())
            .await
            .unwrap();

        assert_eq!(recv(&mut quantum_rx).await, Some(n));
        transport.close().await.unwrap();
        assert!(nova_rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_publish_without_binding_is_unknown_exchange() {
        let transport = LocalTransport::new();
        let err = transport
            .publish("nova", "notifications.info", Notification::new("x", json!({})))
            .await
            .unwrap_err();
        assert!(matches!(err, TransportError::UnknownExchange { .. }));
    }

    #[tokio::test]
    async fn test_close_twice_fails() {
        let transport = LocalTransport::new();
        transport.close().await.unwrap();
        assert!(matches!(transport.close().await, Err(TransportError::Closed)));
        assert!(matches!(transport.consume().await, Err(TransportError::Closed)));
    }

    #[tokio::test]
    async fn test_notifier_publishes_central_events() {
        let transport = LocalTransport::new();
        let (tx, mut rx) = mpsc::unbounded_channel();
        transport
            .declare_topic_consumer(
                "central-events",
                CENTRAL_NOTIFICATION_TOPIC,
                CENTRAL_EXCHANGE,
                forwarding_callback(tx),
            )
            .await
            .unwrap();
        transport.consume().await.unwrap();

        transport
            .notify(&RequestContext::admin(), "domain.create", json!({"name": "example.com."}))
            .await;

        let received = recv(&mut rx).await.unwrap();
        assert_eq!(received.event_type, "domain.create");
        assert_eq!(received.payload["name"], "example.com.");
        transport.close().await.unwrap();
    }

    #[tokio::test]
    async fn test_notifier_uses_configured_topic() {
        let transport = LocalTransport::with_topic("central.events");
        let (default_tx, mut default_rx) = mpsc::unbounded_channel();
        let (tx, mut rx) = mpsc::unbounded_channel();
        transport
            .declare_topic_consumer(
                "default-topic",
                CENTRAL_NOTIFICATION_TOPIC,
                CENTRAL_EXCHANGE,
                forwarding_callback(default_tx),
            )
            .await
            .unwrap();
        transport
            .declare_topic_consumer(
                "configured-topic",
                "central.events",
                CENTRAL_EXCHANGE,
                forwarding_callback(tx),
            )
            .await
            .unwrap();
        transport.consume().await.unwrap();

        transport
            .notify(&RequestContext::admin(), "record.create", json!({}))
            .await;

        assert_eq!(recv(&mut rx).await.unwrap().event_type, "record.create");
        assert!(default_rx.try_recv().is_err());
        transport.close().await.unwrap();
    }

    #[tokio::test]
    async fn test_notifier_without_consumers_does_not_fail() {
        LocalTransport::new()
            .notify(&RequestContext::admin(), "domain.delete", json!({}))
            .await;
    }
}
