use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::PgPool;
use uuid::Uuid;

// Full clients row; hashes stay inside the store and auth layers
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ClientRow {
    pub id: Uuid,
    pub email: String,
    pub password_hash: String,
    pub api_key_hash: String,
    pub subscription_tier: String,
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

/// Public tenant identity. Never carries password or API key hashes,
/// so it is safe to serialize and to attach to request extensions.
#[derive(Debug, Clone, Serialize)]
pub struct Client {
    pub id: Uuid,
    pub email: String,
    pub subscription_tier: String,
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

impl From<ClientRow> for Client {
    fn from(row: ClientRow) -> Self {
        Client {
            id: row.id,
            email: row.email,
            subscription_tier: row.subscription_tier,
            active: row.active,
            created_at: row.created_at,
        }
    }
}

pub async fn create(
    db: &PgPool,
    email: &str,
    password_hash: &str,
    api_key_hash: &str,
) -> Result<ClientRow, sqlx::Error> {
    sqlx::query_as::<_, ClientRow>(
        r#"
        INSERT INTO clients (id, email, password_hash, api_key_hash, subscription_tier)
        VALUES ($1, $2, $3, $4, 'free')
        RETURNING id, email, password_hash, api_key_hash, subscription_tier, active, created_at
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(email)
    .bind(password_hash)
    .bind(api_key_hash)
    .fetch_one(db)
    .await
}

pub async fn get_by_id(db: &PgPool, id: Uuid) -> Result<Option<ClientRow>, sqlx::Error> {
    sqlx::query_as::<_, ClientRow>(
        r#"
        SELECT id, email, password_hash, api_key_hash, subscription_tier, active, created_at
        FROM clients
        WHERE id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(db)
    .await
}

pub async fn get_by_email(db: &PgPool, email: &str) -> Result<Option<ClientRow>, sqlx::Error> {
    sqlx::query_as::<_, ClientRow>(
        r#"
        SELECT id, email, password_hash, api_key_hash, subscription_tier, active, created_at
        FROM clients
        WHERE email = $1
        "#,
    )
    .bind(email)
    .fetch_optional(db)
    .await
}

pub async fn get_by_api_key_hash(
    db: &PgPool,
    api_key_hash: &str,
) -> Result<Option<ClientRow>, sqlx::Error> {
    sqlx::query_as::<_, ClientRow>(
        r#"
        SELECT id, email, password_hash, api_key_hash, subscription_tier, active, created_at
        FROM clients
        WHERE api_key_hash = $1
        "#,
    )
    .bind(api_key_hash)
    .fetch_optional(db)
    .await
}
