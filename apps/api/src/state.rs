//! Shared application state handed to every handler.

use erp_db::Database;

use crate::auth::JwtManager;
use crate::config::ApiConfig;

/// State shared across requests behind an `Arc`.
pub struct AppState {
    pub db: Database,
    pub jwt: JwtManager,
    pub config: ApiConfig,
}

impl AppState {
    pub fn new(db: Database, config: ApiConfig) -> Self {
        let jwt = JwtManager::new(config.jwt_secret.clone(), config.jwt_lifetime_secs);
        AppState { db, jwt, config }
    }
}
