pub mod memory;
#[cfg(feature = "mongo-store")]
pub mod mongodb;

use crate::dao::models::{
    EntryScoreEntity, EventDetailsEntity, EventEntity, EventId, EventPresetEntity,
    EventTemplateEntity, PostEntity,
};
use crate::dao::storage::StorageResult;
use futures::future::BoxFuture;

/// Abstraction over the persistence layer for events and the records that depend on them.
pub trait EventStore: Send + Sync {
    /// Fetch an event by primary key.
    fn find_event(&self, id: EventId) -> BoxFuture<'static, StorageResult<Option<EventEntity>>>;
    /// Every event carrying `name` (at most one once the unique index holds).
    fn find_events_by_name(&self, name: String)
    -> BoxFuture<'static, StorageResult<Vec<EventEntity>>>;
    /// Most recently started event whose tournament is accepting or playing scores.
    fn find_active_tournament_event(&self) -> BoxFuture<'static, StorageResult<Option<EventEntity>>>;
    /// Insert or replace an event. Events without id receive a fresh one.
    fn save_event(&self, event: EventEntity) -> BoxFuture<'static, StorageResult<EventEntity>>;
    /// Delete an event together with its details. Returns whether it existed.
    fn delete_event(&self, id: EventId) -> BoxFuture<'static, StorageResult<bool>>;
    /// Fetch the details record of an event.
    fn find_event_details(
        &self,
        event_id: EventId,
    ) -> BoxFuture<'static, StorageResult<Option<EventDetailsEntity>>>;
    /// Insert or replace the details record of an event.
    fn save_event_details(&self, details: EventDetailsEntity)
    -> BoxFuture<'static, StorageResult<()>>;
    /// Fetch an event template by primary key.
    fn find_event_template(
        &self,
        id: i64,
    ) -> BoxFuture<'static, StorageResult<Option<EventTemplateEntity>>>;
    /// List every event preset.
    fn list_event_presets(&self) -> BoxFuture<'static, StorageResult<Vec<EventPresetEntity>>>;
    /// High scores submitted on the entries of an event.
    fn list_entry_scores(
        &self,
        event_id: EventId,
    ) -> BoxFuture<'static, StorageResult<Vec<EntryScoreEntity>>>;
    /// Published posts attached to an event, newest first.
    fn list_event_posts(&self, event_id: EventId)
    -> BoxFuture<'static, StorageResult<Vec<PostEntity>>>;
    /// Rewrite the denormalized event name held by entries and posts of an event.
    /// Returns the number of updated records.
    fn refresh_event_references(
        &self,
        event_id: EventId,
        name: String,
    ) -> BoxFuture<'static, StorageResult<u64>>;
    /// Check the backend is reachable.
    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>>;
    /// Re-establish the backend connection after a failed health check.
    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>>;
}
