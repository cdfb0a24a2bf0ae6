use axum::{
    extract::{Json, State},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
};
use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::auth::{
    digest_credential, generate_session_token, normalize_email, verify_password,
};
use crate::error::ApiError;
use crate::state::AppState;
use crate::store::clients::{self, Client};
use crate::store::sessions;

// Dashboard sessions live for a day
const SESSION_TTL_HOURS: i64 = 24;

#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Serialize)]
pub struct LoginResponse {
    pub session_token: String,
    pub client: Client,
}

/// Authenticate with email/password and mint a session token. The
/// plaintext token is returned exactly once; only its digest is stored.
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let email = normalize_email(&payload.email);
    if email.is_empty() || payload.password.is_empty() {
        return Err(ApiError::bad_request(
            "auth.missing_credentials",
            "Email and password are required.",
        ));
    }

    let row = clients::get_by_email(&state.db, &email).await?;

    // Same response for unknown email and wrong password
    let row = match row {
        Some(row) if verify_password(&payload.password, &row.password_hash) => row,
        _ => {
            return Err(ApiError::unauthorized(
                "auth.invalid_credentials",
                "Invalid email or password.",
            ))
        }
    };

    let token = generate_session_token();
    let expires_at = Utc::now() + Duration::hours(SESSION_TTL_HOURS);
    sessions::create(&state.db, row.id, &digest_credential(&token), expires_at).await?;

    Ok((
        StatusCode::OK,
        Json(LoginResponse {
            session_token: token,
            client: Client::from(row),
        }),
    ))
}

/// Revoke the presented session token. Idempotent: an unknown token
/// still yields 204.
pub async fn logout(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
    let token = session_token_from_headers(&headers).ok_or_else(|| {
        ApiError::bad_request("auth.missing_session_token", "Missing session token.")
    })?;

    sessions::revoke_by_token_hash(&state.db, &digest_credential(&token)).await?;

    Ok(StatusCode::NO_CONTENT)
}

fn session_token_from_headers(headers: &HeaderMap) -> Option<String> {
    if let Some(token) = headers.get("x-session-token").and_then(|v| v.to_str().ok()) {
        let token = token.trim();
        if !token.is_empty() {
            return Some(token.to_string());
        }
    }

    let auth = headers.get("authorization").and_then(|v| v.to_str().ok())?;
    let token = auth.strip_prefix("Bearer ")?.trim();
    if token.is_empty() {
        None
    } else {
        Some(token.to_string())
    }
}
