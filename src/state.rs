use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use axum::extract::FromRef;
use sqlx::postgres::PgPoolOptions;
use tracing::{info, warn};

use crate::accounts::AccountService;
use crate::auth::jwt::JwtKeys;
use crate::config::AppConfig;
use crate::users::{InMemoryUserStore, PgUserStore, UserStore};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub accounts: AccountService,
}

impl FromRef<AppState> for AccountService {
    fn from_ref(state: &AppState) -> Self {
        state.accounts.clone()
    }
}

impl AppState {
    pub async fn init() -> anyhow::Result<Self> {
        let config = Arc::new(AppConfig::from_env()?);
        let store = open_store(&config).await?;
        Ok(Self::from_parts(config, store))
    }

    pub fn from_parts(config: Arc<AppConfig>, store: Arc<dyn UserStore>) -> Self {
        let keys = JwtKeys::from(&config.jwt);
        let accounts = AccountService::new(store, keys, config.access_policy);
        Self { config, accounts }
    }
}

/// Connects to Postgres and runs pending migrations, or falls back to memory.
/// A failed migration is returned as an error.
pub async fn open_store(config: &AppConfig) -> anyhow::Result<Arc<dyn UserStore>> {
    let Some(url) = &config.database_url else {
        warn!("DATABASE_URL not set; users are kept in memory and lost on restart");
        return Ok(Arc::new(InMemoryUserStore::new()));
    };

    let db = PgPoolOptions::new()
        .max_connections(config.database_max_connections)
        .acquire_timeout(Duration::from_secs(5))
        .connect_lazy(url)
        .context("parse DATABASE_URL")?;

    sqlx::migrate!("./migrations")
        .run(&db)
        .await
        .context("run migrations")?;

    info!("using postgres user store");
    Ok(Arc::new(PgUserStore::new(db)))
}

#[cfg(test)]
pub struct FakeState {
    pub state: AppState,
    pub store: Arc<InMemoryUserStore>,
}

#[cfg(test)]
impl FakeState {
    pub fn keys(&self) -> JwtKeys {
        JwtKeys::from(&self.state.config.jwt)
    }
}

#[cfg(test)]
impl AppState {
    pub fn fake(policy: crate::config::AccessPolicy) -> FakeState {
        let config = Arc::new(AppConfig {
            database_url: None,
            database_max_connections: 1,
            host: "127.0.0.1".into(),
            port: 0,
            jwt: crate::config::JwtConfig {
                secret: "test".into(),
                issuer: "test-issuer".into(),
                audience: "test-aud".into(),
                ttl_minutes: 60,
            },
            access_policy: policy,
        });
        let store = Arc::new(InMemoryUserStore::new());
        FakeState {
            state: Self::from_parts(config, store.clone()),
            store,
        }
    }
}
