//! Application state shared across handlers.

use std::sync::Arc;

use sqlx::PgPool;

use madeinworld_core::SessionKeys;

use crate::config::AuthConfig;
use crate::services::{CodeHasher, DevLogMailer, EmailError, EmailService, Mailer};

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc`. Everything in it is built once
/// at startup from the immutable [`AuthConfig`].
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: AuthConfig,
    pool: PgPool,
    keys: SessionKeys,
    mailer: Mailer,
    hasher: CodeHasher,
}

impl AppState {
    /// Create a new application state.
    ///
    /// Uses SMTP when configured and the log mailer otherwise; config loading
    /// already refuses to start without SMTP outside development mode.
    ///
    /// # Errors
    ///
    /// Returns `EmailError` if the SMTP transport cannot be configured.
    pub fn new(config: AuthConfig, pool: PgPool) -> Result<Self, EmailError> {
        let mailer = match &config.email {
            Some(email) => Mailer::Smtp(EmailService::new(
                email,
                config.verification.code_ttl.num_minutes(),
            )?),
            None => Mailer::DevLog(DevLogMailer),
        };

        Ok(Self::with_parts(config, pool, mailer, CodeHasher::default()))
    }

    /// Assemble state from explicit parts.
    #[must_use]
    pub fn with_parts(config: AuthConfig, pool: PgPool, mailer: Mailer, hasher: CodeHasher) -> Self {
        let keys = config.session_keys();
        Self {
            inner: Arc::new(AppStateInner {
                config,
                pool,
                keys,
                mailer,
                hasher,
            }),
        }
    }

    /// Get a reference to the auth configuration.
    #[must_use]
    pub fn config(&self) -> &AuthConfig {
        &self.inner.config
    }

    /// Get a reference to the database connection pool.
    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.inner.pool
    }

    /// Session signing keys.
    #[must_use]
    pub fn keys(&self) -> &SessionKeys {
        &self.inner.keys
    }

    /// Code delivery.
    #[must_use]
    pub fn mailer(&self) -> &Mailer {
        &self.inner.mailer
    }

    /// Code hashing.
    #[must_use]
    pub fn hasher(&self) -> &CodeHasher {
        &self.inner.hasher
    }
}
