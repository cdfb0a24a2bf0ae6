use axum::{
    extract::{Json, Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};

use super::{validate_flag_config, FlagResponse, ListParams, UpsertFlagRequest};
use crate::error::ApiError;
use crate::routes::middleware_auth::AuthClient;
use crate::state::AppState;

/// Create or update a flag for the authenticated tenant. Upserts are
/// keyed by (tenant, key): the same payload twice yields one record.
pub async fn upsert(
    State(state): State<AppState>,
    AuthClient(client): AuthClient,
    Json(payload): Json<UpsertFlagRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_flag_config(&payload)
        .map_err(|e| ApiError::bad_request("flags.invalid_config", e))?;

    let record = state.flags.upsert(client.id, payload.into_config()).await?;

    Ok(Json(FlagResponse::from(record)))
}

/// List the tenant's flags ordered by key.
pub async fn list(
    State(state): State<AppState>,
    AuthClient(client): AuthClient,
    Query(params): Query<ListParams>,
) -> Result<impl IntoResponse, ApiError> {
    let records = state
        .flags
        .list(client.id, params.limit(), params.offset())
        .await?;

    let response: Vec<FlagResponse> = records.into_iter().map(FlagResponse::from).collect();
    Ok(Json(response))
}

/// Fetch one flag by key.
pub async fn get(
    State(state): State<AppState>,
    AuthClient(client): AuthClient,
    Path(key): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    match state.flags.get(client.id, &key).await? {
        Some(record) => Ok(Json(FlagResponse::from(record))),
        None => Err(ApiError::not_found("flags.not_found", "Flag not found")),
    }
}

/// Delete a flag by key. Idempotent: an absent flag still yields 204.
pub async fn delete(
    State(state): State<AppState>,
    AuthClient(client): AuthClient,
    Path(key): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    state.flags.delete(client.id, &key).await?;

    Ok(StatusCode::NO_CONTENT)
}
