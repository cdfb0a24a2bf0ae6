use axum::{
    middleware,
    routing::{get, post},
    Router,
};

mod auth;
mod clients;
mod evaluate;
mod flags;
mod health;
pub mod middleware_auth;

pub use health::health;

use crate::state::AppState;

pub fn routes(state: AppState) -> Router {
    // Everything behind the access gate: admin flag CRUD, the tenant
    // profile, and runtime evaluation
    let gated = Router::new()
        .route(
            "/admin/flags",
            post(flags::routes::upsert).get(flags::routes::list),
        )
        .route(
            "/admin/flags/{key}",
            get(flags::routes::get).delete(flags::routes::delete),
        )
        .route("/clients/me", get(clients::routes::me))
        .route("/evaluate", post(evaluate::routes::post_evaluate))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            middleware_auth::require_auth,
        ));

    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .route("/clients/signup", post(clients::routes::signup))
        .route("/auth/login", post(auth::login))
        .route("/auth/logout", post(auth::logout))
        .merge(gated)
        .with_state(state)
}

async fn root() -> &'static str {
    "NimbusFlags API"
}
