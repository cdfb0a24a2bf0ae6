use axum::{
    extract::{Json, State},
    response::IntoResponse,
};

use super::EvaluateRequest;
use crate::error::ApiError;
use crate::evaluation::evaluate;
use crate::routes::middleware_auth::AuthClient;
use crate::state::AppState;

/// Evaluate one flag for the authenticated tenant.
///
/// A missing flag is 404, never a silent "disabled": existence and
/// enablement are orthogonal, and a caller querying a nonexistent key
/// should find out.
pub async fn post_evaluate(
    State(state): State<AppState>,
    AuthClient(client): AuthClient,
    Json(payload): Json<EvaluateRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let record = state
        .flags
        .get(client.id, &payload.flag_key)
        .await?
        .ok_or_else(|| ApiError::not_found("flags.not_found", "Flag not found"))?;

    let result = evaluate(&record.definition(), &payload.user_attributes);

    Ok(Json(result))
}
