// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Unit tests for server lifecycle operations.

#[cfg(test)]
mod tests {
    use super::super::*;
    use crate::errors::CentralError;
    use crate::test_helpers::{tenant_ctx, Harness};

    fn server(name: &str) -> CreateServer {
        CreateServer {
            name: name.to_string(),
        }
    }

    #[tokio::test]
    async fn test_create_server_requires_admin() {
        let harness = Harness::new();
        let err = harness
            .central
            .create_server(&tenant_ctx("a"), server("ns1.example.net."))
            .await
            .unwrap_err();
        assert!(matches!(err, CentralError::Forbidden(ref m) if m == "Policy does not allow 'create_server'"));
        assert!(harness.notifier.event_types().is_empty());
    }

    #[tokio::test]
    async fn test_create_server_as_admin() {
        let harness = Harness::new();
        let created = harness
            .central
            .create_server(&RequestContext::admin(), server("ns1.example.net."))
            .await
            .unwrap();
        assert_eq!(created.name, "ns1.example.net.");
        assert_eq!(harness.notifier.event_types(), vec!["server.create"]);
        // Servers are metadata only.
        assert!(harness.backend.calls().is_empty());
    }

    #[tokio::test]
    async fn test_create_server_invalid_name() {
        let harness = Harness::new();
        let err = harness
            .central
            .create_server(&RequestContext::admin(), server("ns1.example.net"))
            .await
            .unwrap_err();
        assert!(matches!(err, CentralError::BadRequest(_)));
    }

    #[tokio::test]
    async fn test_create_server_duplicate() {
        let harness = Harness::new();
        let admin = RequestContext::admin();
        harness
            .central
            .create_server(&admin, server("ns1.example.net."))
            .await
            .unwrap();
        let err = harness
            .central
            .create_server(&admin, server("ns1.example.net."))
            .await
            .unwrap_err();
        assert!(matches!(err, CentralError::DuplicateServer(_)));
    }

    #[tokio::test]
    async fn test_update_and_delete_server() {
        let harness = Harness::new();
        let admin = RequestContext::admin();
        let created = harness
            .central
            .create_server(&admin, server("ns1.example.net."))
            .await
            .unwrap();

        let updated = harness
            .central
            .update_server(
                &admin,
                created.id,
                UpdateServer {
                    name: Some("ns2.example.net.".to_string()),
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.name, "ns2.example.net.");

        harness
            .central
            .delete_server(&admin, created.id)
            .await
            .unwrap();
        let err = harness
            .central
            .get_server(&admin, created.id)
            .await
            .unwrap_err();
        assert!(matches!(err, CentralError::ServerNotFound));
        assert_eq!(
            harness.notifier.event_types(),
            vec!["server.create", "server.update", "server.delete"]
        );
    }

    #[tokio::test]
    async fn test_list_servers_forbidden_for_tenant() {
        let harness = Harness::with_server().await;
        let err = harness
            .central
            .get_servers(&tenant_ctx("a"), None)
            .await
            .unwrap_err();
        assert!(matches!(err, CentralError::Forbidden(_)));

        let servers = harness
            .central
            .get_servers(&RequestContext::admin(), None)
            .await
            .unwrap();
        assert_eq!(servers.len(), 1);
    }
}
