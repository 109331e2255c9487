pub mod cache;
pub mod event;
pub mod status;
pub mod triggers;

use std::sync::Arc;

use tokio::sync::{RwLock, watch};

use crate::{
    config::AppConfig,
    dao::event_store::EventStore,
    error::ServiceError,
    services::{
        computations::{DerivedComputations, LogOnlyComputations},
        images::{ImageStorage, LocalImageStorage},
    },
    state::cache::{EventCache, MemoryEventCache},
};

pub type SharedState = Arc<AppState>;

/// Central application state holding the configuration and every injected collaborator.
pub struct AppState {
    config: AppConfig,
    event_store: RwLock<Option<Arc<dyn EventStore>>>,
    cache: Arc<dyn EventCache>,
    computations: Arc<dyn DerivedComputations>,
    images: Arc<dyn ImageStorage>,
    degraded: watch::Sender<bool>,
}

impl AppState {
    /// Construct the state with the default collaborators derived from `config`.
    ///
    /// The application starts in degraded mode until a storage backend is installed.
    pub fn new(config: AppConfig) -> SharedState {
        let cache = Arc::new(MemoryEventCache::new(config.cache_ttl));
        let images = Arc::new(LocalImageStorage::new(config.uploads_dir.clone()));
        Self::with_collaborators(config, cache, Arc::new(LogOnlyComputations), images)
    }

    /// Construct the state with explicit collaborators.
    pub fn with_collaborators(
        config: AppConfig,
        cache: Arc<dyn EventCache>,
        computations: Arc<dyn DerivedComputations>,
        images: Arc<dyn ImageStorage>,
    ) -> SharedState {
        let (degraded_tx, _rx) = watch::channel(true);
        Arc::new(Self {
            config,
            event_store: RwLock::new(None),
            cache,
            computations,
            images,
            degraded: degraded_tx,
        })
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn cache(&self) -> &Arc<dyn EventCache> {
        &self.cache
    }

    pub fn computations(&self) -> &Arc<dyn DerivedComputations> {
        &self.computations
    }

    pub fn images(&self) -> &Arc<dyn ImageStorage> {
        &self.images
    }

    /// Current event store, or [`ServiceError::Degraded`] when none is installed.
    pub async fn require_event_store(&self) -> Result<Arc<dyn EventStore>, ServiceError> {
        let guard = self.event_store.read().await;
        guard.as_ref().cloned().ok_or(ServiceError::Degraded)
    }

    /// Install a new event store implementation and leave degraded mode.
    pub async fn set_event_store(&self, store: Arc<dyn EventStore>) {
        {
            let mut guard = self.event_store.write().await;
            *guard = Some(store);
        }
        self.update_degraded(false).await;
    }

    /// Current degraded flag.
    pub async fn is_degraded(&self) -> bool {
        *self.degraded.borrow()
    }

    /// Subscribe to degraded mode updates.
    pub fn degraded_watcher(&self) -> watch::Receiver<bool> {
        self.degraded.subscribe()
    }

    /// Update and broadcast the degraded flag when the value changes.
    pub async fn update_degraded(&self, value: bool) {
        self.degraded.send_if_modified(|current| {
            if *current == value {
                return false;
            }
            *current = value;
            true
        });
    }
}
