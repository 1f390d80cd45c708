// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Unit tests for the in-memory storage.

#[cfg(test)]
mod tests {
    use super::super::*;
    use crate::models::{CreateRecord, RecordType, TsigAlgorithm};
    use std::sync::Arc;

    fn new_domain(name: &str, tenant: &str) -> NewDomain {
        NewDomain {
            name: name.to_string(),
            email: "hostmaster@example.com".to_string(),
            ttl: 3600,
            serial: 2_025_010_101,
            tenant_id: Some(tenant.to_string()),
            parent_domain_id: None,
        }
    }

    fn new_record(domain_id: Uuid, name: &str) -> NewRecord {
        NewRecord {
            domain_id,
            values: CreateRecord {
                name: name.to_string(),
                record_type: RecordType::A,
                data: "192.0.2.1".to_string(),
                ..CreateRecord::default()
            },
        }
    }

    #[tokio::test]
    async fn test_domain_crud() {
        let storage = MemoryStorage::new();
        let domain = storage
            .create_domain(new_domain("example.com.", "a"))
            .await
            .unwrap();

        let fetched = storage.get_domain(domain.id).await.unwrap();
        assert_eq!(fetched, domain);

        let mut changed = fetched.clone();
        changed.ttl = 60;
        let updated = storage.update_domain(changed).await.unwrap();
        assert_eq!(updated.ttl, 60);
        assert!(updated.updated_at.is_some());

        let deleted = storage.delete_domain(domain.id).await.unwrap();
        assert_eq!(deleted.id, domain.id);

        let err = storage.get_domain(domain.id).await.unwrap_err();
        assert!(matches!(
            err,
            StorageError::NotFound {
                entity: EntityKind::Domain,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_duplicate_domain_name_rejected() {
        let storage = MemoryStorage::new();
        storage
            .create_domain(new_domain("example.com.", "a"))
            .await
            .unwrap();
        let err = storage
            .create_domain(new_domain("example.com.", "b"))
            .await
            .unwrap_err();
        assert_eq!(
            err,
            StorageError::Duplicate {
                entity: EntityKind::Domain,
                name: "example.com.".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_concurrent_duplicate_insert_only_one_wins() {
        let storage = Arc::new(MemoryStorage::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let storage = storage.clone();
                tokio::spawn(async move {
                    storage
                        .create_domain(new_domain("race.example.com.", "a"))
                        .await
                })
            })
            .collect();

        let mut successes = 0;
        for handle in handles {
            if handle.await.unwrap().is_ok() {
                successes += 1;
            }
        }
        assert_eq!(successes, 1);
    }

    #[tokio::test]
    async fn test_find_domain() {
        let storage = MemoryStorage::new();
        let domain = storage
            .create_domain(new_domain("example.com.", "a"))
            .await
            .unwrap();

        let found = storage
            .find_domain(&Criterion::new().with("name", "example.com."))
            .await
            .unwrap();
        assert_eq!(found.id, domain.id);

        let err = storage
            .find_domain(&Criterion::new().with("name", "missing.com."))
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_get_domains_filters_by_tenant() {
        let storage = MemoryStorage::new();
        storage
            .create_domain(new_domain("a.com.", "a"))
            .await
            .unwrap();
        storage
            .create_domain(new_domain("b.com.", "b"))
            .await
            .unwrap();

        let all = storage.get_domains(&Criterion::new()).await.unwrap();
        assert_eq!(all.len(), 2);

        let only_a = storage
            .get_domains(&Criterion::new().with("tenantId", "a"))
            .await
            .unwrap();
        assert_eq!(only_a.len(), 1);
        assert_eq!(only_a[0].name, "a.com.");
    }

    #[tokio::test]
    async fn test_record_requires_domain() {
        let storage = MemoryStorage::new();
        let err = storage
            .create_record(new_record(Uuid::new_v4(), "www.example.com."))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            StorageError::NotFound {
                entity: EntityKind::Domain,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_delete_domain_removes_records() {
        let storage = MemoryStorage::new();
        let domain = storage
            .create_domain(new_domain("example.com.", "a"))
            .await
            .unwrap();
        let record = storage
            .create_record(new_record(domain.id, "www.example.com."))
            .await
            .unwrap();

        let records = storage
            .get_records(&Criterion::new().with("domainId", domain.id.to_string()))
            .await
            .unwrap();
        assert_eq!(records.len(), 1);

        storage.delete_domain(domain.id).await.unwrap();
        assert!(storage.get_record(record.id).await.is_err());
    }

    #[tokio::test]
    async fn test_server_and_tsigkey_uniqueness() {
        let storage = MemoryStorage::new();
        storage
            .create_server(CreateServer {
                name: "ns1.example.net.".to_string(),
            })
            .await
            .unwrap();
        let err = storage
            .create_server(CreateServer {
                name: "ns1.example.net.".to_string(),
            })
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            StorageError::Duplicate {
                entity: EntityKind::Server,
                ..
            }
        ));

        let key = NewTsigKey {
            name: "transfer".to_string(),
            algorithm: TsigAlgorithm::HmacSha256,
            secret: "c2VjcmV0".to_string(),
        };
        storage.create_tsigkey(key.clone()).await.unwrap();
        assert!(storage.create_tsigkey(key).await.is_err());
    }

    #[tokio::test]
    async fn test_ping() {
        let storage = MemoryStorage::new();
        assert!(storage.ping().await.unwrap().status);
    }
}
