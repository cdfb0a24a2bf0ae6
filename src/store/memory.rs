use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;
use sqlx::types::Json;
use uuid::Uuid;

use super::flags::{FlagConfig, FlagRecord, FlagStore};

/// In-memory `FlagStore` with the same per-tenant-key upsert contract
/// as the Postgres store. Used by tests; handy for local experiments.
#[derive(Default)]
pub struct MemoryFlagStore {
    flags: Mutex<HashMap<(Uuid, String), FlagRecord>>,
}

impl MemoryFlagStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl FlagStore for MemoryFlagStore {
    async fn upsert(&self, client_id: Uuid, config: FlagConfig) -> Result<FlagRecord, sqlx::Error> {
        let mut flags = self.flags.lock().unwrap();
        let now = Utc::now();

        let record = match flags.get(&(client_id, config.key.clone())) {
            // Identity and creation time survive an update
            Some(existing) => FlagRecord {
                id: existing.id,
                client_id,
                key: config.key.clone(),
                enabled: config.enabled,
                conditions: Json(config.conditions),
                parameters: Json(config.parameters),
                created_at: existing.created_at,
                updated_at: now,
            },
            None => FlagRecord {
                id: Uuid::new_v4(),
                client_id,
                key: config.key.clone(),
                enabled: config.enabled,
                conditions: Json(config.conditions),
                parameters: Json(config.parameters),
                created_at: now,
                updated_at: now,
            },
        };

        flags.insert((client_id, config.key), record.clone());
        Ok(record)
    }

    async fn get(&self, client_id: Uuid, key: &str) -> Result<Option<FlagRecord>, sqlx::Error> {
        let flags = self.flags.lock().unwrap();
        Ok(flags.get(&(client_id, key.to_string())).cloned())
    }

    async fn list(
        &self,
        client_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<FlagRecord>, sqlx::Error> {
        let flags = self.flags.lock().unwrap();
        let mut records: Vec<FlagRecord> = flags
            .values()
            .filter(|r| r.client_id == client_id)
            .cloned()
            .collect();
        records.sort_by(|a, b| a.key.cmp(&b.key));

        Ok(records
            .into_iter()
            .skip(offset.max(0) as usize)
            .take(limit.max(0) as usize)
            .collect())
    }

    async fn delete(&self, client_id: Uuid, key: &str) -> Result<(), sqlx::Error> {
        let mut flags = self.flags.lock().unwrap();
        flags.remove(&(client_id, key.to_string()));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Map, Value};

    use crate::evaluation::Condition;

    fn config(key: &str, enabled: bool, parameters: Value) -> FlagConfig {
        FlagConfig {
            key: key.to_string(),
            enabled,
            conditions: vec![],
            parameters: parameters.as_object().cloned().unwrap_or_default(),
        }
    }

    #[tokio::test]
    async fn test_upsert_replaces_without_duplicating() {
        let store = MemoryFlagStore::new();
        let tenant = Uuid::new_v4();

        let first = store
            .upsert(tenant, config("promo", true, json!({"discount": 10})))
            .await
            .unwrap();

        let mut updated = config("promo", false, json!({"discount": 40}));
        updated.conditions = vec![Condition {
            attribute: "country".to_string(),
            operator: "in".to_string(),
            value: json!(["CA"]),
        }];
        let second = store.upsert(tenant, updated).await.unwrap();

        // Same record, latest payload
        assert_eq!(second.id, first.id);
        assert_eq!(second.created_at, first.created_at);
        assert!(!second.enabled);
        assert_eq!(second.conditions.0.len(), 1);
        assert_eq!(second.parameters.0, json!({"discount": 40}).as_object().cloned().unwrap());

        let listed = store.list(tenant, 50, 0).await.unwrap();
        assert_eq!(listed.len(), 1);
    }

    #[tokio::test]
    async fn test_tenant_isolation() {
        let store = MemoryFlagStore::new();
        let tenant_a = Uuid::new_v4();
        let tenant_b = Uuid::new_v4();

        store
            .upsert(tenant_a, config("promo", true, json!({})))
            .await
            .unwrap();

        // Identical key, different tenant: invisible
        assert!(store.get(tenant_b, "promo").await.unwrap().is_none());
        assert!(store.list(tenant_b, 50, 0).await.unwrap().is_empty());
        assert!(store.get(tenant_a, "promo").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_delete_is_idempotent() {
        let store = MemoryFlagStore::new();
        let tenant = Uuid::new_v4();

        store
            .upsert(tenant, config("promo", true, json!({})))
            .await
            .unwrap();

        store.delete(tenant, "promo").await.unwrap();
        assert!(store.get(tenant, "promo").await.unwrap().is_none());

        // Absent flag: still a success
        store.delete(tenant, "promo").await.unwrap();
        store.delete(tenant, "never_existed").await.unwrap();
    }

    #[tokio::test]
    async fn test_list_orders_by_key_with_paging() {
        let store = MemoryFlagStore::new();
        let tenant = Uuid::new_v4();

        for key in ["gamma", "alpha", "beta"] {
            store
                .upsert(tenant, config(key, true, json!({})))
                .await
                .unwrap();
        }

        let keys: Vec<String> = store
            .list(tenant, 2, 1)
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.key)
            .collect();
        assert_eq!(keys, vec!["beta".to_string(), "gamma".to_string()]);

        let empty = Map::new();
        assert_eq!(
            store.list(tenant, 50, 0).await.unwrap()[0].parameters.0,
            empty
        );
    }
}
