use std::sync::Arc;

use crate::auth::jwt::TokenIssuer;
use crate::auth::repo::{SqliteUserStore, UserStore};
use crate::auth::services::AuthService;
use crate::config::AppConfig;
use crate::db;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub auth: AuthService,
}

impl AppState {
    pub async fn init() -> anyhow::Result<Self> {
        let config = AppConfig::from_env()?;
        let pool = db::connect(&config.database_url).await?;
        let store = Arc::new(SqliteUserStore::new(pool)) as Arc<dyn UserStore>;
        Ok(Self::from_parts(config, store))
    }

    pub fn from_parts(config: AppConfig, store: Arc<dyn UserStore>) -> Self {
        let tokens = TokenIssuer::new(&config.jwt);
        Self {
            auth: AuthService::new(store, tokens),
            config: Arc::new(config),
        }
    }
}
