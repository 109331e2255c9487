//! Process-local [`EventStore`] used by tests and by storage-less development runs.

use std::sync::{
    Arc,
    atomic::{AtomicI64, Ordering},
};

use dashmap::DashMap;
use futures::future::BoxFuture;

use crate::dao::{
    event_store::EventStore,
    models::{
        EntryEntity, EntryScoreEntity, EventDetailsEntity, EventEntity, EventId,
        EventPresetEntity, EventTemplateEntity, PostEntity,
    },
    storage::{StorageError, StorageResult},
};

/// [`EventStore`] backed by concurrent maps. Clones share the same data.
#[derive(Clone, Default)]
pub struct MemoryEventStore {
    inner: Arc<MemoryInner>,
}

#[derive(Default)]
struct MemoryInner {
    next_event_id: AtomicI64,
    events: DashMap<EventId, EventEntity>,
    details: DashMap<EventId, EventDetailsEntity>,
    templates: DashMap<i64, EventTemplateEntity>,
    presets: DashMap<i64, EventPresetEntity>,
    entries: DashMap<i64, EntryEntity>,
    scores: DashMap<i64, EntryScoreEntity>,
    posts: DashMap<i64, PostEntity>,
}

impl MemoryEventStore {
    /// Empty store; event ids start at 1.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a template new events can be seeded from.
    pub fn insert_template(&self, template: EventTemplateEntity) {
        self.inner.templates.insert(template.id, template);
    }

    /// Register a preset listed on the event form.
    pub fn insert_preset(&self, preset: EventPresetEntity) {
        self.inner.presets.insert(preset.id, preset);
    }

    /// Register an entry referencing an event.
    pub fn insert_entry(&self, entry: EntryEntity) {
        self.inner.entries.insert(entry.id, entry);
    }

    /// Register a high score on an entry.
    pub fn insert_score(&self, score: EntryScoreEntity) {
        self.inner.scores.insert(score.id, score);
    }

    /// Register a post, optionally attached to an event.
    pub fn insert_post(&self, post: PostEntity) {
        self.inner.posts.insert(post.id, post);
    }

    /// Entries whose denormalized event name equals `name`.
    pub fn entries_named(&self, name: &str) -> Vec<EntryEntity> {
        self.inner
            .entries
            .iter()
            .filter(|entry| entry.event_name.as_deref() == Some(name))
            .map(|entry| entry.value().clone())
            .collect()
    }

    /// Posts whose denormalized event name equals `name`.
    pub fn posts_named(&self, name: &str) -> Vec<PostEntity> {
        self.inner
            .posts
            .iter()
            .filter(|post| post.event_name.as_deref() == Some(name))
            .map(|post| post.value().clone())
            .collect()
    }

    /// Number of stored events.
    pub fn event_count(&self) -> usize {
        self.inner.events.len()
    }
}

impl MemoryInner {
    fn save_event(&self, mut event: EventEntity) -> StorageResult<EventEntity> {
        let taken = self
            .events
            .iter()
            .any(|existing| existing.name == event.name && existing.id != event.id);
        if taken {
            return Err(StorageError::DuplicateName { name: event.name });
        }

        let id = match event.id {
            Some(id) => id,
            None => self.next_event_id.fetch_add(1, Ordering::SeqCst) + 1,
        };
        event.id = Some(id);
        self.events.insert(id, event.clone());
        Ok(event)
    }

    fn refresh_event_references(&self, event_id: EventId, name: &str) -> u64 {
        let mut updated = 0;
        for mut entry in self.entries.iter_mut() {
            if entry.event_id == Some(event_id) {
                entry.event_name = Some(name.to_owned());
                updated += 1;
            }
        }
        for mut post in self.posts.iter_mut() {
            if post.event_id == Some(event_id) {
                post.event_name = Some(name.to_owned());
                updated += 1;
            }
        }
        updated
    }
}

impl EventStore for MemoryEventStore {
    fn find_event(&self, id: EventId) -> BoxFuture<'static, StorageResult<Option<EventEntity>>> {
        let found = self.inner.events.get(&id).map(|event| event.value().clone());
        Box::pin(async move { Ok(found) })
    }

    fn find_events_by_name(
        &self,
        name: String,
    ) -> BoxFuture<'static, StorageResult<Vec<EventEntity>>> {
        let found: Vec<EventEntity> = self
            .inner
            .events
            .iter()
            .filter(|event| event.name == name)
            .map(|event| event.value().clone())
            .collect();
        Box::pin(async move { Ok(found) })
    }

    fn find_active_tournament_event(
        &self,
    ) -> BoxFuture<'static, StorageResult<Option<EventEntity>>> {
        let found = self
            .inner
            .events
            .iter()
            .filter(|event| event.axes.tournament.is_active())
            .map(|event| event.value().clone())
            .max_by_key(|event| event.started_at);
        Box::pin(async move { Ok(found) })
    }

    fn save_event(&self, event: EventEntity) -> BoxFuture<'static, StorageResult<EventEntity>> {
        let result = self.inner.save_event(event);
        Box::pin(async move { result })
    }

    fn delete_event(&self, id: EventId) -> BoxFuture<'static, StorageResult<bool>> {
        let existed = self.inner.events.remove(&id).is_some();
        self.inner.details.remove(&id);
        Box::pin(async move { Ok(existed) })
    }

    fn find_event_details(
        &self,
        event_id: EventId,
    ) -> BoxFuture<'static, StorageResult<Option<EventDetailsEntity>>> {
        let found = self.inner.details.get(&event_id).map(|details| details.value().clone());
        Box::pin(async move { Ok(found) })
    }

    fn save_event_details(
        &self,
        details: EventDetailsEntity,
    ) -> BoxFuture<'static, StorageResult<()>> {
        self.inner.details.insert(details.event_id, details);
        Box::pin(async move { Ok(()) })
    }

    fn find_event_template(
        &self,
        id: i64,
    ) -> BoxFuture<'static, StorageResult<Option<EventTemplateEntity>>> {
        let found = self.inner.templates.get(&id).map(|template| template.value().clone());
        Box::pin(async move { Ok(found) })
    }

    fn list_event_presets(&self) -> BoxFuture<'static, StorageResult<Vec<EventPresetEntity>>> {
        let mut presets: Vec<EventPresetEntity> = self
            .inner
            .presets
            .iter()
            .map(|preset| preset.value().clone())
            .collect();
        presets.sort_by_key(|preset| preset.id);
        Box::pin(async move { Ok(presets) })
    }

    fn list_entry_scores(
        &self,
        event_id: EventId,
    ) -> BoxFuture<'static, StorageResult<Vec<EntryScoreEntity>>> {
        let entry_ids: Vec<i64> = self
            .inner
            .entries
            .iter()
            .filter(|entry| entry.event_id == Some(event_id))
            .map(|entry| entry.id)
            .collect();
        let scores: Vec<EntryScoreEntity> = self
            .inner
            .scores
            .iter()
            .filter(|score| entry_ids.contains(&score.entry_id))
            .map(|score| score.value().clone())
            .collect();
        Box::pin(async move { Ok(scores) })
    }

    fn list_event_posts(
        &self,
        event_id: EventId,
    ) -> BoxFuture<'static, StorageResult<Vec<PostEntity>>> {
        let mut posts: Vec<PostEntity> = self
            .inner
            .posts
            .iter()
            .filter(|post| post.event_id == Some(event_id) && post.published_at.is_some())
            .map(|post| post.value().clone())
            .collect();
        posts.sort_by(|a, b| b.published_at.cmp(&a.published_at));
        Box::pin(async move { Ok(posts) })
    }

    fn refresh_event_references(
        &self,
        event_id: EventId,
        name: String,
    ) -> BoxFuture<'static, StorageResult<u64>> {
        let updated = self.inner.refresh_event_references(event_id, &name);
        Box::pin(async move { Ok(updated) })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        Box::pin(async move { Ok(()) })
    }

    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
        Box::pin(async move { Ok(()) })
    }
}

#[cfg(test)]
mod tests {
    use std::time::SystemTime;

    use super::*;
    use crate::state::status::{StatusAxes, TournamentStatus};

    fn event(name: &str) -> EventEntity {
        EventEntity {
            id: None,
            name: name.into(),
            title: name.into(),
            display_dates: String::new(),
            display_theme: String::new(),
            started_at: None,
            logo: None,
            event_preset_id: None,
            axes: StatusAxes::default(),
            countdown: Default::default(),
            divisions: Default::default(),
            created_at: SystemTime::UNIX_EPOCH,
            updated_at: SystemTime::UNIX_EPOCH,
        }
    }

    #[tokio::test]
    async fn save_assigns_sequential_ids() {
        let store = MemoryEventStore::new();
        let first = store.save_event(event("jam-1")).await.unwrap();
        let second = store.save_event(event("jam-2")).await.unwrap();
        assert_eq!(first.id, Some(1));
        assert_eq!(second.id, Some(2));
    }

    #[tokio::test]
    async fn duplicate_names_are_rejected() {
        let store = MemoryEventStore::new();
        store.save_event(event("jam-1")).await.unwrap();
        let err = store.save_event(event("jam-1")).await.unwrap_err();
        assert!(matches!(err, StorageError::DuplicateName { name } if name == "jam-1"));
    }

    #[tokio::test]
    async fn resaving_keeps_the_same_row() {
        let store = MemoryEventStore::new();
        let mut saved = store.save_event(event("jam-1")).await.unwrap();
        saved.title = "Renamed".into();
        store.save_event(saved.clone()).await.unwrap();
        assert_eq!(store.event_count(), 1);
        let found = store.find_event(1).await.unwrap().unwrap();
        assert_eq!(found.title, "Renamed");
    }

    #[tokio::test]
    async fn delete_removes_details() {
        let store = MemoryEventStore::new();
        let saved = store.save_event(event("jam-1")).await.unwrap();
        let id = saved.id.unwrap();
        store
            .save_event_details(EventDetailsEntity {
                event_id: id,
                ..Default::default()
            })
            .await
            .unwrap();

        assert!(store.delete_event(id).await.unwrap());
        assert!(store.find_event_details(id).await.unwrap().is_none());
        assert!(!store.delete_event(id).await.unwrap());
    }

    #[tokio::test]
    async fn active_tournament_prefers_latest_start() {
        let store = MemoryEventStore::new();
        let mut older = event("jam-old");
        older.axes.tournament = TournamentStatus::Playing;
        older.started_at = Some(SystemTime::UNIX_EPOCH);
        let mut newer = event("jam-new");
        newer.axes.tournament = TournamentStatus::Submission;
        newer.started_at = Some(SystemTime::now());
        let mut closed = event("jam-closed");
        closed.axes.tournament = TournamentStatus::Closed;
        closed.started_at = Some(SystemTime::now());
        for e in [older, newer, closed] {
            store.save_event(e).await.unwrap();
        }

        let active = store.find_active_tournament_event().await.unwrap().unwrap();
        assert_eq!(active.name, "jam-new");
    }
}
