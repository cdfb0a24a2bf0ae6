use argon2::password_hash::{rand_core::OsRng, PasswordHash, SaltString};
use argon2::{Argon2, PasswordHasher, PasswordVerifier};
use axum::{
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;
use rand::{distributions::Alphanumeric, Rng};
use serde_json::json;
use sha2::{Digest, Sha256};
use sqlx::PgPool;

use crate::store::clients::{self, Client};
use crate::store::sessions;

pub const API_KEY_PREFIX: &str = "nf_live_";
pub const SESSION_TOKEN_PREFIX: &str = "nsess_";

/// One inbound credential, whichever scheme carried it. Callers resolve
/// through [`resolve_credential`] and depend on the resolved tenant,
/// not on which scheme was active.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Credential {
    ApiKey(String),
    SessionToken(String),
}

impl Credential {
    /// Pull a credential out of the request headers. `X-Api-Key` wins
    /// when both are present; session tokens also ride in
    /// `Authorization: Bearer` for dashboard convenience.
    pub fn from_headers(headers: &HeaderMap) -> Option<Credential> {
        if let Some(key) = header_value(headers, "x-api-key") {
            return Some(Credential::ApiKey(key));
        }
        if let Some(token) = header_value(headers, "x-session-token") {
            return Some(Credential::SessionToken(token));
        }
        if let Some(auth) = header_value(headers, "authorization") {
            if let Some(token) = auth.strip_prefix("Bearer ") {
                let token = token.trim();
                if !token.is_empty() {
                    return Some(Credential::SessionToken(token.to_string()));
                }
            }
        }
        None
    }
}

fn header_value(headers: &HeaderMap, name: &str) -> Option<String> {
    let value = headers.get(name)?.to_str().ok()?.trim();
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

/// Why the gate turned a request away. Codes are stable for logs and
/// tests; the HTTP posture is a uniform 401 either way.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthRejection {
    Missing,
    ApiKeyInvalid,
    SessionInvalid,
    SessionExpired,
    TenantMissing,
    TenantInactive,
}

impl AuthRejection {
    pub fn code(&self) -> &'static str {
        match self {
            AuthRejection::Missing => "auth.missing_credentials",
            AuthRejection::ApiKeyInvalid => "auth.api_key_invalid",
            AuthRejection::SessionInvalid => "auth.session_invalid",
            AuthRejection::SessionExpired => "auth.session_expired",
            AuthRejection::TenantMissing => "auth.session_client_missing",
            AuthRejection::TenantInactive => "auth.client_inactive",
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            AuthRejection::Missing => "Missing API key or session token",
            AuthRejection::ApiKeyInvalid => "Invalid or missing API key",
            AuthRejection::SessionInvalid => "Invalid session token",
            AuthRejection::SessionExpired => "Session token expired or revoked",
            AuthRejection::TenantMissing => "Client not found for session",
            AuthRejection::TenantInactive => "Client account is inactive",
        }
    }
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "error": self.message(), "code": self.code() })),
        )
            .into_response()
    }
}

/// Outcome of resolving a credential to a tenant.
#[derive(Debug)]
pub enum Resolution {
    Tenant(Client),
    Unauthenticated(AuthRejection),
}

/// Resolve an inbound credential to the tenant that owns it.
///
/// Unauthenticated is an outcome, not an error: only storage failures
/// surface as `Err`.
pub async fn resolve_credential(
    db: &PgPool,
    credential: &Credential,
) -> Result<Resolution, sqlx::Error> {
    match credential {
        Credential::ApiKey(key) => resolve_api_key(db, key).await,
        Credential::SessionToken(token) => resolve_session_token(db, token).await,
    }
}

async fn resolve_api_key(db: &PgPool, key: &str) -> Result<Resolution, sqlx::Error> {
    // Wrong prefix means garbage input; reject before touching storage
    if !key.starts_with(API_KEY_PREFIX) {
        return Ok(Resolution::Unauthenticated(AuthRejection::ApiKeyInvalid));
    }

    let row = match clients::get_by_api_key_hash(db, &digest_credential(key)).await? {
        Some(row) => row,
        None => return Ok(Resolution::Unauthenticated(AuthRejection::ApiKeyInvalid)),
    };

    if !row.active {
        return Ok(Resolution::Unauthenticated(AuthRejection::TenantInactive));
    }

    Ok(Resolution::Tenant(Client::from(row)))
}

async fn resolve_session_token(db: &PgPool, token: &str) -> Result<Resolution, sqlx::Error> {
    let session = match sessions::get_by_token_hash(db, &digest_credential(token)).await? {
        Some(session) => session,
        None => return Ok(Resolution::Unauthenticated(AuthRejection::SessionInvalid)),
    };

    if !session.is_live(Utc::now()) {
        return Ok(Resolution::Unauthenticated(AuthRejection::SessionExpired));
    }

    // Session exists but the client row may be gone or deactivated
    let row = match clients::get_by_id(db, session.client_id).await? {
        Some(row) => row,
        None => return Ok(Resolution::Unauthenticated(AuthRejection::TenantMissing)),
    };

    if !row.active {
        return Ok(Resolution::Unauthenticated(AuthRejection::TenantInactive));
    }

    Ok(Resolution::Tenant(Client::from(row)))
}

/// One-way digest used for API key and session token lookups. Plaintext
/// credentials are never stored or compared.
pub fn digest_credential(credential: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(credential.as_bytes());
    hex::encode(hasher.finalize())
}

/// Mint a new API key. The plaintext is handed to the caller exactly
/// once, at creation; only its digest is persisted.
pub fn generate_api_key() -> String {
    format!("{}{}", API_KEY_PREFIX, random_token(32))
}

pub fn generate_session_token() -> String {
    format!("{}{}", SESSION_TOKEN_PREFIX, random_token(32))
}

fn random_token(len: usize) -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(len)
        .map(char::from)
        .collect()
}

pub fn hash_password(plain: &str) -> Result<String, argon2::password_hash::Error> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(plain.as_bytes(), &salt)
        .map(|hash| hash.to_string())
}

pub fn verify_password(plain: &str, stored_hash: &str) -> bool {
    match PasswordHash::new(stored_hash) {
        Ok(parsed) => Argon2::default()
            .verify_password(plain.as_bytes(), &parsed)
            .is_ok(),
        // Malformed stored hash reads as a failed verification
        Err(_) => false,
    }
}

/// Normalized form used for the uniqueness check on registration.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}
