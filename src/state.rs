use std::sync::Arc;

use axum::extract::FromRef;
use sqlx::PgPool;

use crate::auth::jwt::JwtKeys;
use crate::config::AppConfig;

/// Shared application state. The pool and token service are built once from
/// the settings in `main` and handed in here; nothing re-reads the
/// environment after startup.
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub jwt: JwtKeys,
    pub config: Arc<AppConfig>,
}

impl AppState {
    pub fn new(config: AppConfig, db: PgPool) -> Self {
        let jwt = JwtKeys::new(&config.jwt);
        Self {
            db,
            jwt,
            config: Arc::new(config),
        }
    }
}

impl FromRef<AppState> for JwtKeys {
    fn from_ref(state: &AppState) -> Self {
        state.jwt.clone()
    }
}
