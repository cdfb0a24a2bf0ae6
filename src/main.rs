mod auth;
mod config;
mod error;
mod evaluation;
mod routes;
mod state;
mod store;

use std::sync::Arc;

use sqlx::PgPool;
use tracing_subscriber::EnvFilter;

use crate::store::flags::PgFlagStore;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = config::Config::from_env();

    let db = PgPool::connect(&config.database_url)
        .await
        .expect("Error connecting DB");

    let state = state::AppState {
        db: db.clone(),
        flags: Arc::new(PgFlagStore::new(db)),
    };

    let app = routes::routes(state);

    let listener = tokio::net::TcpListener::bind(config.addr())
        .await
        .expect("failed to bind listener");

    tracing::info!("server is chilling at http://{}", config.addr());

    axum::serve(listener, app).await.expect("server error");
}
