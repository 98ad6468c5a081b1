use std::sync::Arc;

use anyhow::Context;
use tracing::{info, warn};

use crate::auth::CredentialStore;
use crate::config::AppConfig;
use crate::indicators::IndicatorClient;
use crate::query_log::QueryLog;
use crate::session::Session;
use crate::storage::{MemoryStorage, PgStorage, Storage};

/// Collaborators shared by every session.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub storage: Arc<dyn Storage>,
    pub indicators: IndicatorClient,
}

impl AppState {
    pub async fn init() -> anyhow::Result<Self> {
        let config = AppConfig::from_env().context("read configuration")?;

        let storage = match &config.database_url {
            Some(url) => {
                let pg = PgStorage::connect(url, config.max_connections).await?;
                if let Err(e) = sqlx::migrate!("./migrations").run(pg.pool()).await {
                    warn!(error = %e, "migration failed; continuing");
                }
                info!("using postgres storage");
                Arc::new(pg) as Arc<dyn Storage>
            }
            None => {
                warn!("DATABASE_URL not set; users and logs live in memory only");
                Arc::new(MemoryStorage::new()) as Arc<dyn Storage>
            }
        };

        Self::from_parts(Arc::new(config), storage)
    }

    pub fn from_parts(config: Arc<AppConfig>, storage: Arc<dyn Storage>) -> anyhow::Result<Self> {
        let indicators =
            IndicatorClient::new(config.indicators.clone()).context("build http client")?;
        Ok(Self {
            config,
            storage,
            indicators,
        })
    }

    /// In-memory state pointed at a fake provider.
    #[cfg(test)]
    pub fn fake(base_url: &str) -> Self {
        let config = Arc::new(AppConfig {
            database_url: None,
            max_connections: 1,
            indicators: crate::config::IndicatorConfig {
                base_url: base_url.to_string(),
                timeout: std::time::Duration::from_secs(2),
                max_attempts: 1,
                retry_delay: std::time::Duration::from_millis(1),
            },
        });
        Self::from_parts(config, Arc::new(MemoryStorage::new())).expect("fake state ok")
    }

    pub fn session(&self) -> Session {
        Session::new(
            CredentialStore::new(self.storage.clone()),
            self.indicators.clone(),
            QueryLog::new(self.storage.clone()),
        )
    }
}
