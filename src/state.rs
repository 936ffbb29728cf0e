use crate::accounts::{AccountStore, MemoryAccountStore, PgAccountStore};
use crate::auth::TokenService;
use crate::config::{AppConfig, JwtConfig, ServerConfig};
use axum::extract::FromRef;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub accounts: Arc<dyn AccountStore>,
    pub tokens: TokenService,
}

impl AppState {
    pub async fn init() -> anyhow::Result<Self> {
        let config = AppConfig::from_env()?;

        let store = PgAccountStore::connect(&config.database_url).await?;
        if let Err(e) = store.migrate().await {
            tracing::warn!(error = %format!("{e:#}"), "migration failed; continuing");
        }

        Ok(Self::from_parts(
            Arc::new(config),
            Arc::new(store) as Arc<dyn AccountStore>,
        ))
    }

    pub fn from_parts(config: Arc<AppConfig>, accounts: Arc<dyn AccountStore>) -> Self {
        let tokens = TokenService::new(&config.jwt.secret);
        Self {
            config,
            accounts,
            tokens,
        }
    }

    /// In-memory state for tests and local experiments.
    pub fn fake() -> Self {
        Self::fake_with(|_| {})
    }

    pub fn fake_with(tweak: impl FnOnce(&mut AppConfig)) -> Self {
        let mut config = AppConfig {
            database_url: "memory".into(),
            jwt: JwtConfig {
                secret: "test-secret".into(),
            },
            server: ServerConfig {
                host: "127.0.0.1".into(),
                port: 0,
                cors_allowed_origins: Vec::new(),
            },
            password_reset_requires_token: false,
        };
        tweak(&mut config);

        let accounts = Arc::new(MemoryAccountStore::new()) as Arc<dyn AccountStore>;
        Self::from_parts(Arc::new(config), accounts)
    }
}

impl FromRef<AppState> for TokenService {
    fn from_ref(state: &AppState) -> Self {
        state.tokens.clone()
    }
}
