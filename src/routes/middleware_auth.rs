use axum::{
    extract::{FromRequestParts, Request, State},
    http::request::Parts,
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::auth::{self, AuthRejection, Credential, Resolution};
use crate::error::ApiError;
use crate::state::AppState;
use crate::store::clients::Client;

/// Extractor for the tenant resolved by [`require_auth`].
pub struct AuthClient(pub Client);

impl<S> FromRequestParts<S> for AuthClient
where
    S: Send + Sync,
{
    type Rejection = (StatusCode, &'static str);

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Client>()
            .cloned()
            .map(AuthClient)
            .ok_or((StatusCode::UNAUTHORIZED, "missing client"))
    }
}

/// Access gate middleware: resolves the request credential to a tenant
/// and injects it into request extensions before handler dispatch.
/// Every rejection is a uniform 401; the reason only reaches the logs
/// and the stable body code.
pub async fn require_auth(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, Response> {
    let credential = match Credential::from_headers(req.headers()) {
        Some(credential) => credential,
        None => return Err(AuthRejection::Missing.into_response()),
    };

    match auth::resolve_credential(&state.db, &credential).await {
        Ok(Resolution::Tenant(client)) => {
            req.extensions_mut().insert(client);
            Ok(next.run(req).await)
        }
        Ok(Resolution::Unauthenticated(reason)) => {
            tracing::debug!(code = reason.code(), "request rejected by access gate");
            Err(reason.into_response())
        }
        Err(e) => Err(ApiError::from(e).into_response()),
    }
}
