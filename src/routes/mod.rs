use axum::Router;

use crate::state::SharedState;

pub mod docs;
pub mod events;
pub mod health;

/// Compose the health, event and documentation trees over the shared state.
pub fn router(state: SharedState) -> Router<()> {
    health::router()
        .merge(events::router())
        .merge(docs::router())
        .with_state(state)
}
