//! Application state shared across handlers.

use std::sync::Arc;

use sqlx::PgPool;

use madeinworld_core::SessionKeys;

use crate::config::OrderConfig;

/// Application state shared across all handlers. Cheap to clone.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: OrderConfig,
    pool: PgPool,
    keys: SessionKeys,
}

impl AppState {
    #[must_use]
    pub fn new(config: OrderConfig, pool: PgPool) -> Self {
        let keys = config.session_keys();
        Self {
            inner: Arc::new(AppStateInner { config, pool, keys }),
        }
    }

    #[must_use]
    pub fn config(&self) -> &OrderConfig {
        &self.inner.config
    }

    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.inner.pool
    }

    /// Keys for verifying bearer tokens.
    #[must_use]
    pub fn keys(&self) -> &SessionKeys {
        &self.inner.keys
    }
}
