use std::sync::Arc;

use crate::auth::repo::{MemoryUserStore, PgUserStore, UserStore};
use crate::config::AppConfig;
use crate::db;
use crate::perks::repo::{MemoryPerkStore, PerkStore, PgPerkStore};

#[derive(Clone)]
pub struct AppState {
    pub users: Arc<dyn UserStore>,
    pub perks: Arc<dyn PerkStore>,
    pub config: Arc<AppConfig>,
}

impl AppState {
    pub async fn init(config: AppConfig) -> anyhow::Result<Self> {
        let Some(url) = config.database_url.clone() else {
            tracing::warn!("DATABASE_URL not set; using in-memory stores, data is lost on restart");
            return Ok(Self::in_memory(config));
        };

        let pool = db::connect(&url, config.db_max_connections).await?;
        db::migrate(&pool).await?;

        Ok(Self::from_parts(
            Arc::new(PgUserStore::new(pool.clone())),
            Arc::new(PgPerkStore::new(pool)),
            Arc::new(config),
        ))
    }

    pub fn in_memory(config: AppConfig) -> Self {
        Self::from_parts(
            Arc::new(MemoryUserStore::new()),
            Arc::new(MemoryPerkStore::new()),
            Arc::new(config),
        )
    }

    pub fn from_parts(
        users: Arc<dyn UserStore>,
        perks: Arc<dyn PerkStore>,
        config: Arc<AppConfig>,
    ) -> Self {
        Self {
            users,
            perks,
            config,
        }
    }

    #[cfg(test)]
    pub(crate) fn fake() -> Self {
        Self::in_memory(crate::config::test_config())
    }
}
