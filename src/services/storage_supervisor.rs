use std::{future::Future, sync::Arc, time::Duration};

use tokio::time::sleep;
use tracing::{info, warn};

use crate::{
    dao::{event_store::EventStore, storage::StorageError},
    state::SharedState,
};

const INITIAL_DELAY: Duration = Duration::from_millis(1_000);
const MAX_DELAY: Duration = Duration::from_secs(10);
const HEALTH_POLL_INTERVAL: Duration = Duration::from_secs(5);
const MAX_RECONNECT_ATTEMPTS: u32 = 3;

fn next_delay(delay: Duration) -> Duration {
    (delay * 2).min(MAX_DELAY)
}

/// Try to revive an unhealthy store. Degraded mode starts after the first failed attempt.
async fn reconnect(state: &SharedState, store: &Arc<dyn EventStore>) -> bool {
    let mut delay = INITIAL_DELAY;
    for attempt in 0..MAX_RECONNECT_ATTEMPTS {
        match store.try_reconnect().await {
            Ok(()) => {
                info!(attempt, "event store reconnected after failed health check");
                state.update_degraded(false).await;
                return true;
            }
            Err(err) => {
                if attempt == 0 {
                    warn!(attempt, error = %err, "event store reconnect failed; entering degraded mode");
                    state.update_degraded(true).await;
                } else {
                    warn!(attempt, error = %err, "event store reconnect failed");
                }
                sleep(delay).await;
                delay = next_delay(delay);
            }
        }
    }
    false
}

/// Keep an event store installed in the shared state, leaving the application in degraded
/// mode while none is reachable.
pub async fn run<F, Fut>(state: SharedState, mut connect: F)
where
    F: FnMut() -> Fut + Send + 'static,
    Fut: Future<Output = Result<Arc<dyn EventStore>, StorageError>> + Send,
{
    let mut delay = INITIAL_DELAY;

    loop {
        let store = match connect().await {
            Ok(store) => store,
            Err(err) => {
                warn!(error = %err, "event store connection attempt failed");
                sleep(delay).await;
                delay = next_delay(delay);
                continue;
            }
        };

        state.set_event_store(store.clone()).await;
        info!("event store connected; leaving degraded mode");
        delay = INITIAL_DELAY;

        loop {
            match store.health_check().await {
                Ok(()) => {
                    if state.is_degraded().await {
                        info!("event store healthy again; leaving degraded mode");
                        state.update_degraded(false).await;
                    }
                }
                Err(err) => {
                    warn!(error = %err, "event store health check failed");
                    if !reconnect(&state, &store).await {
                        warn!("exhausted event store reconnect attempts; opening a new connection");
                        break;
                    }
                }
            }
            sleep(HEALTH_POLL_INTERVAL).await;
        }

        sleep(delay).await;
        delay = next_delay(delay);
    }
}
