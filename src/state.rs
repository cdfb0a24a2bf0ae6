use std::sync::Arc;

use sqlx::PgPool;

use crate::store::flags::FlagStore;

#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub flags: Arc<dyn FlagStore>,
}
