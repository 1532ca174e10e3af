use crate::auth::AuthSettings;
use sqlx::SqlitePool;
use std::sync::Arc;

/// Everything a request handler needs; cheap to clone into each filter.
#[derive(Clone)]
pub struct AppState {
    pub pool: SqlitePool,
    pub auth: Arc<AuthSettings>,
}

impl AppState {
    pub fn new(pool: SqlitePool, auth: AuthSettings) -> Self {
        Self {
            pool,
            auth: Arc::new(auth),
        }
    }
}
