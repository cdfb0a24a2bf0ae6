use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use sqlx::types::Json;
use sqlx::PgPool;
use uuid::Uuid;

use crate::evaluation::{Condition, FlagDefinition};

// Persisted flag row, unique per (client_id, key)
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct FlagRecord {
    pub id: Uuid,
    pub client_id: Uuid,
    pub key: String,
    pub enabled: bool,
    pub conditions: Json<Vec<Condition>>,
    pub parameters: Json<Map<String, Value>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl FlagRecord {
    /// View of the stored row the evaluation engine consumes.
    pub fn definition(&self) -> FlagDefinition {
        FlagDefinition {
            key: self.key.clone(),
            enabled: self.enabled,
            conditions: self.conditions.0.clone(),
            parameters: self.parameters.0.clone(),
        }
    }
}

// Validated upsert payload, shaped at the HTTP boundary
#[derive(Debug, Clone)]
pub struct FlagConfig {
    pub key: String,
    pub enabled: bool,
    pub conditions: Vec<Condition>,
    pub parameters: Map<String, Value>,
}

/// Storage contract for tenant-scoped flags. Upsert is a single atomic
/// replace keyed by (client, key), so concurrent writers serialize in
/// the store rather than racing in application code.
#[async_trait]
pub trait FlagStore: Send + Sync {
    async fn upsert(&self, client_id: Uuid, config: FlagConfig) -> Result<FlagRecord, sqlx::Error>;
    async fn get(&self, client_id: Uuid, key: &str) -> Result<Option<FlagRecord>, sqlx::Error>;
    async fn list(
        &self,
        client_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<FlagRecord>, sqlx::Error>;
    /// Idempotent: deleting an absent flag is not an error.
    async fn delete(&self, client_id: Uuid, key: &str) -> Result<(), sqlx::Error>;
}

#[derive(Clone)]
pub struct PgFlagStore {
    pool: PgPool,
}

impl PgFlagStore {
    pub fn new(pool: PgPool) -> Self {
        PgFlagStore { pool }
    }
}

#[async_trait]
impl FlagStore for PgFlagStore {
    async fn upsert(&self, client_id: Uuid, config: FlagConfig) -> Result<FlagRecord, sqlx::Error> {
        sqlx::query_as::<_, FlagRecord>(
            r#"
            INSERT INTO flags (id, client_id, key, enabled, conditions, parameters)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (client_id, key)
            DO UPDATE SET
                enabled = EXCLUDED.enabled,
                conditions = EXCLUDED.conditions,
                parameters = EXCLUDED.parameters,
                updated_at = NOW()
            RETURNING id, client_id, key, enabled, conditions, parameters, created_at, updated_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(client_id)
        .bind(&config.key)
        .bind(config.enabled)
        .bind(Json(&config.conditions))
        .bind(Json(&config.parameters))
        .fetch_one(&self.pool)
        .await
    }

    async fn get(&self, client_id: Uuid, key: &str) -> Result<Option<FlagRecord>, sqlx::Error> {
        sqlx::query_as::<_, FlagRecord>(
            r#"
            SELECT id, client_id, key, enabled, conditions, parameters, created_at, updated_at
            FROM flags
            WHERE client_id = $1 AND key = $2
            "#,
        )
        .bind(client_id)
        .bind(key)
        .fetch_optional(&self.pool)
        .await
    }

    async fn list(
        &self,
        client_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<FlagRecord>, sqlx::Error> {
        sqlx::query_as::<_, FlagRecord>(
            r#"
            SELECT id, client_id, key, enabled, conditions, parameters, created_at, updated_at
            FROM flags
            WHERE client_id = $1
            ORDER BY key
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(client_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await
    }

    async fn delete(&self, client_id: Uuid, key: &str) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            DELETE FROM flags
            WHERE client_id = $1 AND key = $2
            "#,
        )
        .bind(client_id)
        .bind(key)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
