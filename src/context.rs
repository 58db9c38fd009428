/// Application context and dependency injection
use crate::{
    access::AccessPolicy,
    account::AccountDirectory,
    config::{ServerConfig, StoreBackendConfig},
    db,
    error::AppResult,
    gallery::GalleryStore,
    ranks::RankCatalog,
    session::SessionManager,
    store::{SqliteBackend, Store},
};
use std::sync::Arc;

/// Application context holding all shared services
#[derive(Clone)]
pub struct AppContext {
    pub config: Arc<ServerConfig>,
    pub store: Store,
    pub directory: Arc<AccountDirectory>,
    pub sessions: Arc<SessionManager>,
    pub access: Arc<AccessPolicy>,
    pub gallery: Arc<GalleryStore>,
    pub ranks: Arc<RankCatalog>,
}

impl AppContext {
    /// Create a new application context from configuration
    pub async fn new(config: ServerConfig) -> AppResult<Self> {
        // Validate configuration
        config.validate()?;

        let store = match &config.storage.backend {
            StoreBackendConfig::Memory => {
                tracing::warn!("Using the in-memory store; nothing survives a restart");
                Store::memory()
            }
            StoreBackendConfig::Sqlite { path } => {
                let pool = db::create_pool(path, db::DatabaseOptions::default()).await?;
                db::run_migrations(&pool).await?;
                db::test_connection(&pool).await?;
                tracing::info!("Store opened at {}", path.display());
                Store::new(Arc::new(SqliteBackend::new(pool)))
            }
        };

        Self::with_store(config, store).await
    }

    /// Wire every service over an already opened store
    pub async fn with_store(config: ServerConfig, store: Store) -> AppResult<Self> {
        let directory = Arc::new(AccountDirectory::new(
            store.clone(),
            config.registration.unique_emails,
        ));
        let sessions = Arc::new(SessionManager::new(
            store.clone(),
            directory.clone(),
            config.authentication.clone(),
            config.registration.unique_emails,
        ));
        let access = Arc::new(AccessPolicy::new(directory.clone()));
        let gallery = Arc::new(GalleryStore::new(
            store.clone(),
            config.gallery.max_image_bytes,
        ));

        crate::metrics::set_accounts(directory.count().await?);
        crate::metrics::set_active_sessions(sessions.active_sessions().await?);

        Ok(Self {
            config: Arc::new(config),
            store,
            directory,
            sessions,
            access,
            gallery,
            ranks: Arc::new(RankCatalog::new()),
        })
    }

    /// Get service URL
    pub fn service_url(&self) -> String {
        format!(
            "http://{}:{}",
            self.config.service.hostname, self.config.service.port
        )
    }
}
