use axum::{
    extract::{Json, State},
    http::StatusCode,
    response::IntoResponse,
};

use super::{ProfileResponse, SignupRequest, SignupResponse};
use crate::auth::{digest_credential, generate_api_key, hash_password, normalize_email};
use crate::error::ApiError;
use crate::routes::middleware_auth::AuthClient;
use crate::state::AppState;
use crate::store::clients::{self, Client};

/// Register a new tenant. Returns the created client plus its
/// plaintext API key, which is surfaced exactly once here.
pub async fn signup(
    State(state): State<AppState>,
    Json(payload): Json<SignupRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let email = normalize_email(&payload.email);
    if email.is_empty() || !email.contains('@') {
        return Err(ApiError::bad_request(
            "clients.invalid_email",
            "Invalid email address provided.",
        ));
    }

    if payload.password.len() < 8 {
        return Err(ApiError::bad_request(
            "clients.invalid_password",
            "Password must be at least 8 characters.",
        ));
    }

    // Uniqueness is checked on the normalized email; the database
    // constraint backs this up for concurrent signups
    if clients::get_by_email(&state.db, &email).await?.is_some() {
        return Err(ApiError::conflict(
            "clients.email_conflict",
            "Email already registered",
        ));
    }

    let password_hash = hash_password(&payload.password).map_err(|e| {
        tracing::error!(error = %e, "password hashing failed");
        ApiError::bad_request("clients.invalid_password", "Password could not be processed.")
    })?;

    let api_key = generate_api_key();
    let api_key_hash = digest_credential(&api_key);

    let row = match clients::create(&state.db, &email, &password_hash, &api_key_hash).await {
        Ok(row) => row,
        Err(e) => {
            if let Some(db_error) = e.as_database_error() {
                if db_error.code() == Some(std::borrow::Cow::Borrowed("23505")) {
                    return Err(ApiError::conflict(
                        "clients.email_conflict",
                        "Email already registered",
                    ));
                }
            }
            return Err(ApiError::from(e));
        }
    };

    Ok((
        StatusCode::CREATED,
        Json(SignupResponse {
            client: Client::from(row),
            api_key,
        }),
    ))
}

/// Profile of the authenticated tenant.
pub async fn me(AuthClient(client): AuthClient) -> impl IntoResponse {
    Json(ProfileResponse { client })
}
