use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct SessionRow {
    pub id: Uuid,
    pub client_id: Uuid,
    pub token_hash: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub revoked: bool,
}

impl SessionRow {
    pub fn is_live(&self, now: DateTime<Utc>) -> bool {
        !self.revoked && self.expires_at > now
    }
}

pub async fn create(
    db: &PgPool,
    client_id: Uuid,
    token_hash: &str,
    expires_at: DateTime<Utc>,
) -> Result<SessionRow, sqlx::Error> {
    sqlx::query_as::<_, SessionRow>(
        r#"
        INSERT INTO sessions (id, client_id, token_hash, expires_at)
        VALUES ($1, $2, $3, $4)
        RETURNING id, client_id, token_hash, created_at, expires_at, revoked
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(client_id)
    .bind(token_hash)
    .bind(expires_at)
    .fetch_one(db)
    .await
}

pub async fn get_by_token_hash(
    db: &PgPool,
    token_hash: &str,
) -> Result<Option<SessionRow>, sqlx::Error> {
    sqlx::query_as::<_, SessionRow>(
        r#"
        SELECT id, client_id, token_hash, created_at, expires_at, revoked
        FROM sessions
        WHERE token_hash = $1
        "#,
    )
    .bind(token_hash)
    .fetch_optional(db)
    .await
}

/// Revoking an unknown token is a no-op so logout stays idempotent.
pub async fn revoke_by_token_hash(db: &PgPool, token_hash: &str) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        UPDATE sessions
        SET revoked = TRUE
        WHERE token_hash = $1
        "#,
    )
    .bind(token_hash)
    .execute(db)
    .await?;

    Ok(())
}
