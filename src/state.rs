use crate::config::settings::AppConfig;
use crate::infrastructure::db::pool::DbPool;
use crate::infrastructure::redis::client::RedisService;

#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub db: DbPool,
    pub redis: RedisService,
}

impl AppState {
    pub fn new(config: AppConfig, db: DbPool, redis: RedisService) -> Self {
        Self { config, db, redis }
    }
}
