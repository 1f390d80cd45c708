// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Tests for bindcar zone operations.

#[cfg(test)]
mod tests {
    use super::super::*;
    use crate::backend::bind9::types::{SoaRecord, ZoneConfig, ZONE_TYPE_PRIMARY};
    use serde_json::json;
    use std::collections::BTreeMap;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(server: &MockServer, token: Option<&str>) -> BindcarClient {
        BindcarClient::new(
            HttpClient::new(),
            &server.uri(),
            token.map(str::to_string),
            Duration::from_millis(300),
        )
    }

    fn zone_request(name: &str) -> CreateZoneRequest {
        CreateZoneRequest {
            zone_name: name.to_string(),
            zone_type: ZONE_TYPE_PRIMARY.to_string(),
            zone_config: ZoneConfig {
                ttl: 3600,
                soa: SoaRecord {
                    primary_ns: "ns1.example.com.".to_string(),
                    admin_email: "hostmaster.example.com.".to_string(),
                    serial: 2_025_010_101,
                    refresh: 3600,
                    retry: 600,
                    expire: 604_800,
                    negative_ttl: 86400,
                },
                name_servers: vec!["ns1.example.com.".to_string()],
                name_server_ips: BTreeMap::new(),
                records: vec![],
            },
            update_key_name: Some("update-key".to_string()),
        }
    }

    #[test]
    fn test_build_api_url_without_scheme() {
        assert_eq!(build_api_url("localhost:8080"), "http://localhost:8080");
    }

    #[test]
    fn test_build_api_url_with_https() {
        assert_eq!(
            build_api_url("https://api.example.com:8443"),
            "https://api.example.com:8443"
        );
    }

    #[test]
    fn test_build_api_url_multiple_slashes() {
        assert_eq!(build_api_url("http://localhost:8080///"), "http://localhost:8080");
    }

    #[test]
    fn test_build_api_url_ipv6() {
        assert_eq!(build_api_url("[::1]:8080"), "http://[::1]:8080");
    }

    #[tokio::test]
    async fn test_create_zone_sends_camel_case_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v1/zones"))
            .and(header("Authorization", "Bearer s3cret"))
            .and(body_partial_json(json!({
                "zoneName": "example.com",
                "zoneType": "primary",
                "updateKeyName": "update-key",
                "zoneConfig": { "soa": { "primaryNs": "ns1.example.com." } }
            })))
            .respond_with(
                ResponseTemplate::new(201)
                    .set_body_json(json!({"success": true, "message": "Zone created"})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let created = client(&server, Some("s3cret"))
            .create_zone(&zone_request("example.com"))
            .await
            .unwrap();
        assert!(created);
    }

    #[tokio::test]
    async fn test_create_zone_conflict_is_success() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v1/zones"))
            .respond_with(ResponseTemplate::new(409).set_body_string("zone already exists"))
            .expect(1)
            .mount(&server)
            .await;

        let created = client(&server, None)
            .create_zone(&zone_request("example.com"))
            .await
            .unwrap();
        assert!(!created);
    }

    #[tokio::test]
    async fn test_create_zone_bad_request_fails_without_retry() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v1/zones"))
            .respond_with(ResponseTemplate::new(400).set_body_string("invalid zone"))
            .expect(1)
            .mount(&server)
            .await;

        let err = client(&server, None)
            .create_zone(&zone_request("example.com"))
            .await
            .unwrap_err();
        match err {
            BackendError::Http {
                status, message, ..
            } => {
                assert_eq!(status, 400);
                assert_eq!(message, "invalid zone");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_retry_until_success() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/server/status"))
            .respond_with(ResponseTemplate::new(503))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/v1/server/status"))
            .respond_with(ResponseTemplate::new(200).set_body_string("running"))
            .mount(&server)
            .await;

        let client = BindcarClient::new(
            HttpClient::new(),
            &server.uri(),
            None,
            Duration::from_secs(5),
        );
        assert_eq!(client.server_status().await.unwrap(), "running");
    }

    #[tokio::test]
    async fn test_retry_gives_up_after_budget() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/server/status"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .mount(&server)
            .await;

        let err = client(&server, None).server_status().await.unwrap_err();
        assert!(matches!(err, BackendError::Http { status: 500, .. }));
        assert!(err.is_transient());
    }

    #[tokio::test]
    async fn test_delete_zone_not_found_is_success() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/api/v1/zones/example.com"))
            .respond_with(ResponseTemplate::new(404).set_body_string("zone not found"))
            .expect(1)
            .mount(&server)
            .await;

        let deleted = client(&server, None).delete_zone("example.com").await.unwrap();
        assert!(!deleted);
    }

    #[tokio::test]
    async fn test_delete_zone() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/api/v1/zones/example.com"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"success": true})))
            .expect(1)
            .mount(&server)
            .await;

        assert!(client(&server, None).delete_zone("example.com").await.unwrap());
    }

    #[tokio::test]
    async fn test_reload_zone() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v1/zones/example.com/reload"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        client(&server, None).reload_zone("example.com").await.unwrap();
    }

    #[tokio::test]
    async fn test_connection_refused_maps_to_driver_error() {
        let client = BindcarClient::new(
            HttpClient::new(),
            "127.0.0.1:1",
            None,
            Duration::from_millis(100),
        );
        let err = client.server_status().await.unwrap_err();
        assert!(matches!(err, BackendError::Driver(_)));
        assert!(err.is_transient(), "connection failures are retried: {err:#}");
    }
}
