//! Seam towards the engines computing data derived from event status changes.
//!
//! The engines themselves live outside this service; the default implementation
//! records the request in the logs so the status workflow can run without them.

use futures::future::BoxFuture;
use thiserror::Error;
use tracing::info;

use crate::{dao::models::EntryScoreEntity, state::event::Event};

/// High scores of an event captured before its status axes change.
pub type HighScoreSnapshot = Vec<EntryScoreEntity>;

/// Failure reported by a derived computation engine.
#[derive(Debug, Error)]
#[error("{computation} failed: {message}")]
pub struct ComputationError {
    pub computation: &'static str,
    pub message: String,
}

/// Engines recomputing rankings, theme shortlists and tournament scores.
pub trait DerivedComputations: Send + Sync {
    /// Compute the theme shortlist of the event.
    fn compute_shortlist(&self, event: Event) -> BoxFuture<'static, Result<(), ComputationError>>;
    /// Compute the rankings of every entry of the event.
    fn compute_rankings(&self, event: Event) -> BoxFuture<'static, Result<(), ComputationError>>;
    /// Drop previously computed rankings.
    fn clear_rankings(&self, event: Event) -> BoxFuture<'static, Result<(), ComputationError>>;
    /// Seed tournament scores from the high scores captured before the change.
    fn seed_tournament_scores(
        &self,
        snapshot: HighScoreSnapshot,
        event: Event,
    ) -> BoxFuture<'static, Result<(), ComputationError>>;
}

/// [`DerivedComputations`] that only logs what would be computed.
#[derive(Debug, Clone, Default)]
pub struct LogOnlyComputations;

impl DerivedComputations for LogOnlyComputations {
    fn compute_shortlist(&self, event: Event) -> BoxFuture<'static, Result<(), ComputationError>> {
        Box::pin(async move {
            info!(event_id = ?event.id, name = %event.name, "theme shortlist requested");
            Ok(())
        })
    }

    fn compute_rankings(&self, event: Event) -> BoxFuture<'static, Result<(), ComputationError>> {
        Box::pin(async move {
            info!(event_id = ?event.id, name = %event.name, "rankings computation requested");
            Ok(())
        })
    }

    fn clear_rankings(&self, event: Event) -> BoxFuture<'static, Result<(), ComputationError>> {
        Box::pin(async move {
            info!(event_id = ?event.id, name = %event.name, "rankings clearing requested");
            Ok(())
        })
    }

    fn seed_tournament_scores(
        &self,
        snapshot: HighScoreSnapshot,
        event: Event,
    ) -> BoxFuture<'static, Result<(), ComputationError>> {
        Box::pin(async move {
            info!(
                event_id = ?event.id,
                name = %event.name,
                scores = snapshot.len(),
                "tournament seeding requested"
            );
            Ok(())
        })
    }
}
