use tracing::warn;

use crate::{dto::health::HealthResponse, error::ServiceError, state::SharedState};

/// Probe the event store and report whether the service runs degraded.
pub async fn health_status(state: &SharedState) -> HealthResponse {
    let storage_reachable = match state.require_event_store().await {
        Ok(store) => match store.health_check().await {
            Ok(()) => true,
            Err(err) => {
                warn!(error = %err, "event store health check failed");
                false
            }
        },
        Err(ServiceError::Degraded) => {
            warn!("no event store installed (degraded mode)");
            false
        }
        Err(err) => {
            warn!(error = %err, "event store lookup failed");
            false
        }
    };

    if storage_reachable && !state.is_degraded().await {
        HealthResponse::ok()
    } else {
        HealthResponse::degraded()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::{config::AppConfig, dao::event_store::memory::MemoryEventStore, state::AppState};

    #[tokio::test]
    async fn reports_degraded_until_store_installed() {
        let state = AppState::new(AppConfig::default());
        assert_eq!(health_status(&state).await.status, "degraded");

        state.set_event_store(Arc::new(MemoryEventStore::new())).await;
        assert_eq!(health_status(&state).await.status, "ok");
    }
}
