//! Application state shared across handlers.

use std::sync::Arc;

use sqlx::PgPool;

use crate::config::AdminConfig;
use crate::services::allocation::AllocationService;
use crate::services::carrier::HttpTrackingClient;
use crate::services::resolver::CatalogResolver;
use crate::services::sweep::StatusSweep;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: AdminConfig,
    pool: PgPool,
    sweep: StatusSweep,
    tracking: Option<HttpTrackingClient>,
}

impl AppState {
    /// Build state from configuration and an established pool.
    #[must_use]
    pub fn new(config: AdminConfig, pool: PgPool) -> Self {
        let tracking = config.carrier.as_ref().map(HttpTrackingClient::new);
        let sweep = StatusSweep::new(pool.clone());

        Self {
            inner: Arc::new(AppStateInner {
                config,
                pool,
                sweep,
                tracking,
            }),
        }
    }

    /// Application configuration.
    #[must_use]
    pub fn config(&self) -> &AdminConfig {
        &self.inner.config
    }

    /// Database connection pool.
    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.inner.pool
    }

    /// FIFO allocation service.
    #[must_use]
    pub fn allocation(&self) -> AllocationService<'_> {
        AllocationService::new(self.pool())
    }

    /// Catalog-backed product resolver.
    #[must_use]
    pub fn resolver(&self) -> CatalogResolver<'_> {
        CatalogResolver::new(self.pool())
    }

    /// Status-refresh sweep service.
    #[must_use]
    pub fn sweep(&self) -> &StatusSweep {
        &self.inner.sweep
    }

    /// Carrier tracking client, when configured.
    #[must_use]
    pub fn tracking(&self) -> Option<&HttpTrackingClient> {
        self.inner.tracking.as_ref()
    }
}
