//! Read side of events: cached lookups, template seeding, presets and posts.

use tracing::{debug, warn};

use crate::{
    dao::models::{EventId, EventPresetEntity},
    dto::event::{PostView, PostsPage},
    error::ServiceError,
    state::{
        SharedState,
        cache::{ACTIVE_TOURNAMENT_EVENT_KEY, CacheNamespace},
        event::{Event, EventDetails},
        status::parse_id,
    },
};

/// Posts listed per page on an event.
pub const POSTS_PAGE_SIZE: usize = 10;

/// Look an event up by name, reading through the events-by-name cache.
pub async fn find_event_by_name(
    state: &SharedState,
    name: &str,
) -> Result<Option<Event>, ServiceError> {
    if let Some(cached) = state.cache().get(CacheNamespace::EventsByName, name) {
        return Ok(cached);
    }

    let store = state.require_event_store().await?;
    let found = store
        .find_events_by_name(name.to_owned())
        .await?
        .into_iter()
        .next()
        .map(Event::from);
    state
        .cache()
        .insert(CacheNamespace::EventsByName, name, found.clone());
    Ok(found)
}

/// Look an event up by id, reading through the events-by-id cache.
pub async fn find_event_by_id(
    state: &SharedState,
    id: EventId,
) -> Result<Option<Event>, ServiceError> {
    let key = id.to_string();
    if let Some(cached) = state.cache().get(CacheNamespace::EventsById, &key) {
        return Ok(cached);
    }

    let store = state.require_event_store().await?;
    let found = store.find_event(id).await?.map(Event::from);
    state
        .cache()
        .insert(CacheNamespace::EventsById, &key, found.clone());
    Ok(found)
}

/// Event whose tournament currently accepts or plays scores, cached under the general namespace.
pub async fn find_active_tournament_event(
    state: &SharedState,
) -> Result<Option<Event>, ServiceError> {
    if let Some(cached) = state
        .cache()
        .get(CacheNamespace::General, ACTIVE_TOURNAMENT_EVENT_KEY)
    {
        return Ok(cached);
    }

    let store = state.require_event_store().await?;
    let found = store.find_active_tournament_event().await?.map(Event::from);
    debug!(name = ?found.as_ref().map(|e| &e.name), "active tournament event refreshed");
    state.cache().insert(
        CacheNamespace::General,
        ACTIVE_TOURNAMENT_EVENT_KEY,
        found.clone(),
    );
    Ok(found)
}

/// Details of a stored event; unsaved events and events without record get empty details.
pub async fn find_event_details(
    state: &SharedState,
    event: &Event,
) -> Result<EventDetails, ServiceError> {
    let Some(id) = event.id else {
        return Ok(EventDetails::default());
    };
    let store = state.require_event_store().await?;
    Ok(store
        .find_event_details(id)
        .await?
        .map(EventDetails::from)
        .unwrap_or_default())
}

/// Instantiate an unsaved event, seeded from a template when one is given and exists.
pub async fn create_event(
    state: &SharedState,
    template_id: Option<i64>,
) -> Result<(Event, EventDetails), ServiceError> {
    let Some(template_id) = template_id else {
        return Ok((Event::blank(), EventDetails::default()));
    };

    let store = state.require_event_store().await?;
    match store.find_event_template(template_id).await? {
        Some(template) => Ok(Event::from_template(&template)),
        None => {
            warn!(template_id, "event template not found; starting from a blank event");
            Ok((Event::blank(), EventDetails::default()))
        }
    }
}

/// Template id typed in a form, ignored unless it is a positive integer.
pub fn template_id_from(raw: Option<&str>) -> Option<i64> {
    raw.and_then(parse_id)
}

/// Presets offered on the event form, ordered by id.
pub async fn list_event_presets(
    state: &SharedState,
) -> Result<Vec<EventPresetEntity>, ServiceError> {
    let store = state.require_event_store().await?;
    Ok(store.list_event_presets().await?)
}

/// Published posts of an event, newest first, one page at a time.
pub async fn list_event_posts(
    state: &SharedState,
    name: &str,
    page: Option<usize>,
) -> Result<PostsPage, ServiceError> {
    let event = find_event_by_name(state, name)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("event `{name}`")))?;
    let Some(event_id) = event.id else {
        return Err(ServiceError::NotFound(format!("event `{name}`")));
    };

    let store = state.require_event_store().await?;
    let posts = store.list_event_posts(event_id).await?;
    let page_count = posts.len().div_ceil(POSTS_PAGE_SIZE).max(1);
    let page = page.unwrap_or(1).clamp(1, page_count);
    let posts = posts
        .into_iter()
        .skip((page - 1) * POSTS_PAGE_SIZE)
        .take(POSTS_PAGE_SIZE)
        .map(PostView::from)
        .collect();

    Ok(PostsPage {
        posts,
        page,
        page_count,
    })
}

#[cfg(test)]
mod tests {
    use std::{
        sync::Arc,
        time::{Duration, SystemTime},
    };

    use super::*;
    use crate::{
        config::AppConfig,
        dao::{
            event_store::{EventStore, memory::MemoryEventStore},
            models::{EventEntity, PostEntity},
        },
        state::{AppState, status::TournamentStatus},
    };

    async fn state_with(store: &MemoryEventStore) -> SharedState {
        let state = AppState::new(AppConfig::default());
        state.set_event_store(Arc::new(store.clone())).await;
        state
    }

    async fn saved(store: &MemoryEventStore, name: &str) -> Event {
        let event = Event {
            name: name.into(),
            ..Event::blank()
        };
        store.save_event(event.into()).await.unwrap().into()
    }

    #[tokio::test]
    async fn lookups_are_served_from_cache_until_invalidated() {
        let store = MemoryEventStore::new();
        let state = state_with(&store).await;
        let mut event = saved(&store, "jam-1").await;

        let first = find_event_by_name(&state, "jam-1").await.unwrap().unwrap();
        event.title = "Changed behind the cache".into();
        store.save_event(EventEntity::from(event)).await.unwrap();

        let cached = find_event_by_name(&state, "jam-1").await.unwrap().unwrap();
        assert_eq!(cached.title, first.title);

        state
            .cache()
            .invalidate(CacheNamespace::EventsByName, "jam-1")
            .unwrap();
        let fresh = find_event_by_name(&state, "jam-1").await.unwrap().unwrap();
        assert_eq!(fresh.title, "Changed behind the cache");
    }

    #[tokio::test]
    async fn missing_event_is_none() {
        let store = MemoryEventStore::new();
        let state = state_with(&store).await;
        assert!(find_event_by_name(&state, "jam-404").await.unwrap().is_none());
        assert!(find_event_by_id(&state, 404).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn degraded_state_reports_unavailable_storage() {
        let state = AppState::new(AppConfig::default());
        let err = find_event_by_name(&state, "jam-1").await.unwrap_err();
        assert!(matches!(err, ServiceError::Degraded));
    }

    #[tokio::test]
    async fn active_tournament_event_is_cached_under_general_key() {
        let store = MemoryEventStore::new();
        let state = state_with(&store).await;
        let mut event = saved(&store, "jam-1").await;
        event.axes.tournament = TournamentStatus::Playing;
        store.save_event(event.into()).await.unwrap();

        let active = find_active_tournament_event(&state).await.unwrap();
        assert_eq!(active.map(|e| e.name).as_deref(), Some("jam-1"));
        assert!(
            state
                .cache()
                .get(CacheNamespace::General, ACTIVE_TOURNAMENT_EVENT_KEY)
                .is_some()
        );
    }

    #[tokio::test]
    async fn posts_are_paginated_newest_first() {
        let store = MemoryEventStore::new();
        let state = state_with(&store).await;
        let event = saved(&store, "jam-1").await;
        for id in 1..=12 {
            store.insert_post(PostEntity {
                id,
                author_user_id: 1,
                name: format!("post-{id}"),
                title: format!("Post {id}"),
                entry_id: None,
                event_id: event.id,
                event_name: Some("jam-1".into()),
                body: String::new(),
                published_at: Some(SystemTime::UNIX_EPOCH + Duration::from_secs(id as u64)),
                special_post_type: None,
            });
        }

        let first = list_event_posts(&state, "jam-1", None).await.unwrap();
        assert_eq!(first.page_count, 2);
        assert_eq!(first.posts.len(), POSTS_PAGE_SIZE);
        assert_eq!(first.posts[0].id, 12);

        let second = list_event_posts(&state, "jam-1", Some(7)).await.unwrap();
        assert_eq!(second.page, 2);
        assert_eq!(second.posts.len(), 2);
    }

    #[test]
    fn template_ids_must_be_positive_integers() {
        assert_eq!(template_id_from(Some("3")), Some(3));
        assert_eq!(template_id_from(Some("x")), None);
        assert_eq!(template_id_from(None), None);
    }
}
