// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Tests for the BIND9 backend driver.

#[cfg(test)]
mod tests {
    use super::super::*;
    use crate::backend::bind9::records::{RecordUpdater, UpdateKind};
    use crate::errors::BackendError;
    use async_trait::async_trait;
    use hickory_client::rr::Record as DnsRecord;
    use std::sync::Mutex;
    use crate::models::{DomainStatus, RecordType, TsigAlgorithm};
    use chrono::Utc;
    use serde_json::json;
    use uuid::Uuid;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn settings(url: &str) -> Bind9Config {
        Bind9Config {
            bindcar_url: url.to_string(),
            api_token: None,
            dns_server: "127.0.0.1:53".to_string(),
            update_key_name: "update-key".to_string(),
            update_key_algorithm: TsigAlgorithm::HmacSha256,
            update_key_secret: "dGVzdHNlY3JldHRlc3RzZWNyZXQ=".to_string(),
            name_server_ips: BTreeMap::from([(
                "ns1.example.net.".to_string(),
                "192.0.2.53".to_string(),
            )]),
            max_retry_secs: 1,
        }
    }

    fn domain() -> Domain {
        Domain {
            id: Uuid::new_v4(),
            name: "example.com.".to_string(),
            email: "hostmaster@example.com".to_string(),
            ttl: 3600,
            serial: 2_025_010_101,
            tenant_id: Some("tenant-a".to_string()),
            parent_domain_id: None,
            status: DomainStatus::Active,
            created_at: Utc::now(),
            updated_at: None,
        }
    }

    fn record(domain_id: Uuid) -> Record {
        Record {
            id: Uuid::new_v4(),
            domain_id,
            name: "www.example.com.".to_string(),
            record_type: RecordType::A,
            data: "192.0.2.1".to_string(),
            priority: None,
            ttl: Some(120),
            managed_resource_type: None,
            managed_resource_id: None,
            created_at: Utc::now(),
            updated_at: None,
        }
    }

    /// Keeps every update as (kind, owner name, rdata, ttl).
    #[derive(Debug, Default)]
    struct RecordingUpdater {
        sent: Mutex<Vec<(UpdateKind, String, String, u32)>>,
    }

    impl RecordingUpdater {
        fn sent(&self) -> Vec<(UpdateKind, String, String, u32)> {
            self.sent.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl RecordUpdater for RecordingUpdater {
        fn server(&self) -> SocketAddr {
            "127.0.0.1:53".parse().unwrap()
        }

        async fn update(
            &self,
            kind: UpdateKind,
            _zone_name: &str,
            record: DnsRecord,
        ) -> crate::backend::Result<()> {
            let rdata = record.data().map(ToString::to_string).unwrap_or_default();
            self.sent.lock().unwrap().push((
                kind,
                record.name().to_string(),
                rdata,
                record.ttl(),
            ));
            Ok(())
        }
    }

    fn recording_backend() -> (Bind9Backend, Arc<RecordingUpdater>) {
        let updater = Arc::new(RecordingUpdater::default());
        let mut backend = Bind9Backend::new(&settings("http://127.0.0.1:1")).unwrap();
        backend.updater = updater.clone() as Arc<dyn RecordUpdater>;
        (backend, updater)
    }

    #[test]
    fn test_new_rejects_bad_dns_server() {
        let mut s = settings("http://127.0.0.1:8080");
        s.dns_server = "ns1.example.net".to_string();
        assert!(matches!(
            Bind9Backend::new(&s),
            Err(ConfigError::Invalid { .. })
        ));
    }

    #[test]
    fn test_new_rejects_bad_secret() {
        let mut s = settings("http://127.0.0.1:8080");
        s.update_key_secret = "***".to_string();
        assert!(matches!(
            Bind9Backend::new(&s),
            Err(ConfigError::Invalid { .. })
        ));
    }

    #[test]
    fn test_api_zone_name() {
        assert_eq!(api_zone_name("example.com."), "example.com");
        assert_eq!(api_zone_name("example.com"), "example.com");
    }

    #[test]
    fn test_soa_rname() {
        assert_eq!(soa_rname("hostmaster@example.com"), "hostmaster.example.com.");
        assert_eq!(soa_rname("dns.admin@example.com"), "dns\\.admin.example.com.");
        assert_eq!(soa_rname("hostmaster.example.com."), "hostmaster.example.com.");
    }

    #[test]
    fn test_zone_request_uses_configured_name_servers() {
        let backend = Bind9Backend::new(&settings("http://127.0.0.1:8080")).unwrap();
        let d = domain();
        let request = backend.zone_request(&d, &[record(d.id)], None);

        assert_eq!(request.zone_name, "example.com");
        assert_eq!(request.zone_type, ZONE_TYPE_PRIMARY);
        assert_eq!(request.update_key_name.as_deref(), Some("update-key"));
        assert_eq!(request.zone_config.name_servers, vec!["ns1.example.net."]);
        assert_eq!(request.zone_config.soa.primary_ns, "ns1.example.net.");
        assert_eq!(request.zone_config.soa.serial, 2_025_010_101);
        assert_eq!(request.zone_config.records.len(), 1);
        assert_eq!(request.zone_config.records[0].record_type, "A");
        assert_eq!(request.zone_config.records[0].ttl, Some(120));
    }

    #[test]
    fn test_zone_request_prefers_supplied_servers() {
        let backend = Bind9Backend::new(&settings("http://127.0.0.1:8080")).unwrap();
        let servers = vec![Server {
            id: Uuid::new_v4(),
            name: "ns2.example.org.".to_string(),
            created_at: Utc::now(),
            updated_at: None,
        }];
        let request = backend.zone_request(&domain(), &[], Some(&servers));
        assert_eq!(request.zone_config.name_servers, vec!["ns2.example.org."]);
        assert!(request.zone_config.name_server_ips.is_empty());
    }

    #[tokio::test]
    async fn test_create_domain_posts_zone() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v1/zones"))
            .and(body_partial_json(json!({"zoneName": "example.com"})))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({"success": true})))
            .expect(1)
            .mount(&server)
            .await;

        let backend = Bind9Backend::new(&settings(&server.uri())).unwrap();
        backend.create_domain(&domain()).await.unwrap();
    }

    #[tokio::test]
    async fn test_sync_domain_recreates_zone() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/api/v1/zones/example.com"))
            .respond_with(ResponseTemplate::new(404))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/api/v1/zones"))
            .and(body_partial_json(json!({
                "zoneConfig": {"records": [{"name": "www.example.com.", "value": "192.0.2.1"}]}
            })))
            .respond_with(ResponseTemplate::new(201))
            .expect(1)
            .mount(&server)
            .await;

        let backend = Bind9Backend::new(&settings(&server.uri())).unwrap();
        let d = domain();
        let records = vec![record(d.id)];
        let report = backend.sync_domain(&d, &records, None).await.unwrap();
        assert_eq!(report.records, 1);
        assert_eq!(report.domain_name, "example.com.");
    }

    #[tokio::test]
    async fn test_ping_reports_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/server/status"))
            .respond_with(ResponseTemplate::new(200).set_body_string("server is up"))
            .mount(&server)
            .await;

        let backend = Bind9Backend::new(&settings(&server.uri())).unwrap();
        let health = backend.ping().await.unwrap();
        assert!(health.status);
        assert_eq!(health.message.as_deref(), Some("server is up"));
    }

    #[tokio::test]
    async fn test_ping_propagates_http_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/server/status"))
            .respond_with(ResponseTemplate::new(401).set_body_string("unauthorized"))
            .mount(&server)
            .await;

        let backend = Bind9Backend::new(&settings(&server.uri())).unwrap();
        let err = backend.ping().await.unwrap_err();
        assert!(matches!(err, BackendError::Http { status: 401, .. }));
    }

    #[tokio::test]
    async fn test_create_record_rejects_invalid_data_before_sending() {
        let backend = Bind9Backend::new(&settings("http://127.0.0.1:1")).unwrap();
        let d = domain();
        let mut r = record(d.id);
        r.data = "not-an-ip".to_string();
        let err = backend.create_record(&d, &r).await.unwrap_err();
        assert!(matches!(err, BackendError::InvalidRecordData { .. }));
    }

    #[tokio::test]
    async fn test_tsigkey_operations_are_noops() {
        let backend = Bind9Backend::new(&settings("http://127.0.0.1:1")).unwrap();
        let key = TsigKey {
            id: Uuid::new_v4(),
            name: "transfer-key".to_string(),
            algorithm: TsigAlgorithm::HmacSha512,
            secret: "c2VjcmV0".to_string(),
            created_at: Utc::now(),
            updated_at: None,
        };
        backend.create_tsigkey(&key).await.unwrap();
        backend.update_tsigkey(&key).await.unwrap();
        backend.delete_tsigkey(&key).await.unwrap();
    }

    #[tokio::test]
    async fn test_update_record_leaves_sibling_records_alone() {
        let (backend, updater) = recording_backend();
        let d = domain();
        let first = record(d.id);
        let mut second = record(d.id);
        second.data = "192.0.2.2".to_string();
        let mut updated = second.clone();
        updated.data = "192.0.2.9".to_string();

        backend.create_record(&d, &first).await.unwrap();
        backend.create_record(&d, &second).await.unwrap();
        backend.update_record(&d, &second, &updated).await.unwrap();

        let sent = updater.sent();
        assert_eq!(sent.len(), 4);
        assert_eq!(
            sent[2..],
            [
                (
                    UpdateKind::DeleteRdata,
                    "www.example.com.".to_string(),
                    "192.0.2.2".to_string(),
                    120
                ),
                (
                    UpdateKind::Append,
                    "www.example.com.".to_string(),
                    "192.0.2.9".to_string(),
                    120
                ),
            ]
        );
        assert!(sent[2..].iter().all(|(_, _, rdata, _)| rdata != "192.0.2.1"));
    }

    #[tokio::test]
    async fn test_update_record_rename_removes_old_name() {
        let (backend, updater) = recording_backend();
        let d = domain();
        let previous = record(d.id);
        let mut renamed = previous.clone();
        renamed.name = "web.example.com.".to_string();

        backend.update_record(&d, &previous, &renamed).await.unwrap();

        let sent = updater.sent();
        assert_eq!(sent[0].0, UpdateKind::DeleteRdata);
        assert_eq!(sent[0].1, "www.example.com.");
        assert_eq!(sent[1].0, UpdateKind::Append);
        assert_eq!(sent[1].1, "web.example.com.");
    }

    #[tokio::test]
    async fn test_record_without_ttl_uses_zone_ttl() {
        let (backend, updater) = recording_backend();
        let d = domain();
        let mut r = record(d.id);
        r.ttl = None;

        backend.create_record(&d, &r).await.unwrap();

        assert_eq!(updater.sent()[0].3, 3600);
    }
}
