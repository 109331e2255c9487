use std::sync::Arc;

use futures::{TryStreamExt, future::BoxFuture};
use mongodb::{
    Client, Collection, Database,
    bson::{Document, doc},
    options::{IndexOptions, ReturnDocument},
};
use tokio::sync::RwLock;

use super::{
    config::MongoConfig,
    connection::connect_events_database,
    error::{MongoDaoError, MongoResult, is_duplicate_key},
    models::{MongoEventDocument, doc_id},
};
use crate::{
    dao::{
        event_store::EventStore,
        models::{
            EntryEntity, EntryScoreEntity, EventDetailsEntity, EventEntity, EventId,
            EventPresetEntity, EventTemplateEntity, PostEntity,
        },
        storage::StorageResult,
    },
    state::status::TournamentStatus,
};

const EVENT_COLLECTION_NAME: &str = "events";
const DETAILS_COLLECTION_NAME: &str = "event_details";
const TEMPLATE_COLLECTION_NAME: &str = "event_templates";
const PRESET_COLLECTION_NAME: &str = "event_presets";
const ENTRY_COLLECTION_NAME: &str = "entries";
const SCORE_COLLECTION_NAME: &str = "entry_scores";
const POST_COLLECTION_NAME: &str = "posts";
const COUNTER_COLLECTION_NAME: &str = "counters";

#[derive(Clone)]
pub struct MongoEventStore {
    inner: Arc<MongoInner>,
}

struct MongoInner {
    state: RwLock<MongoState>,
    config: MongoConfig,
}

struct MongoState {
    client: Client,
    database: Database,
}

impl MongoInner {
    async fn ping(&self) -> MongoResult<()> {
        let database = {
            let guard = self.state.read().await;
            guard.database.clone()
        };

        database
            .run_command(doc! { "ping": 1 })
            .await
            .map_err(|source| MongoDaoError::HealthPing { source })?;
        Ok(())
    }

    async fn reconnect(&self) -> MongoResult<()> {
        let (client, database) =
            connect_events_database(&self.config.options, &self.config.database_name).await?;
        let mut guard = self.state.write().await;
        guard.client = client;
        guard.database = database;
        Ok(())
    }
}

impl MongoEventStore {
    /// Establish a connection to MongoDB and ensure indexes are present.
    pub async fn connect(config: MongoConfig) -> MongoResult<Self> {
        let (client, database) =
            connect_events_database(&config.options, &config.database_name).await?;

        let inner = Arc::new(MongoInner {
            state: RwLock::new(MongoState { client, database }),
            config,
        });

        let store = Self { inner };
        store.ensure_indexes().await?;
        Ok(store)
    }

    async fn ensure_indexes(&self) -> MongoResult<()> {
        // Concurrent saves can both pass the name check; this index rejects the second.
        self.create_index(EVENT_COLLECTION_NAME, "name", doc! {"name": 1}, true)
            .await?;
        self.create_index(
            DETAILS_COLLECTION_NAME,
            "event_id",
            doc! {"event_id": 1},
            true,
        )
        .await?;
        self.create_index(ENTRY_COLLECTION_NAME, "event_id", doc! {"event_id": 1}, false)
            .await?;
        self.create_index(POST_COLLECTION_NAME, "event_id", doc! {"event_id": 1}, false)
            .await?;
        self.create_index(SCORE_COLLECTION_NAME, "entry_id", doc! {"entry_id": 1}, false)
            .await?;
        Ok(())
    }

    async fn create_index(
        &self,
        collection: &'static str,
        index: &'static str,
        keys: Document,
        unique: bool,
    ) -> MongoResult<()> {
        let model = mongodb::IndexModel::builder()
            .keys(keys)
            .options(
                IndexOptions::builder()
                    .name(Some(format!("{collection}_{index}_idx")))
                    .unique(Some(unique))
                    .build(),
            )
            .build();

        self.database()
            .await
            .collection::<Document>(collection)
            .create_index(model)
            .await
            .map_err(|source| MongoDaoError::EnsureIndex {
                collection,
                index,
                source,
            })?;
        Ok(())
    }

    async fn database(&self) -> Database {
        let guard = self.inner.state.read().await;
        guard.database.clone()
    }

    async fn collection<T: Send + Sync>(&self, name: &str) -> Collection<T> {
        self.database().await.collection::<T>(name)
    }

    async fn next_event_id(&self) -> MongoResult<EventId> {
        let counters = self.collection::<Document>(COUNTER_COLLECTION_NAME).await;
        let counter = counters
            .find_one_and_update(
                doc! {"_id": EVENT_COLLECTION_NAME},
                doc! {"$inc": {"seq": 1_i64}},
            )
            .upsert(true)
            .return_document(ReturnDocument::After)
            .await
            .map_err(|source| MongoDaoError::NextId { source })?;

        Ok(counter
            .and_then(|document| document.get_i64("seq").ok())
            .unwrap_or(1))
    }

    async fn find_event(&self, id: EventId) -> MongoResult<Option<EventEntity>> {
        let collection = self
            .collection::<MongoEventDocument>(EVENT_COLLECTION_NAME)
            .await;
        let document = collection
            .find_one(doc_id(id))
            .await
            .map_err(|source| MongoDaoError::LoadEvent { id, source })?;
        Ok(document.map(Into::into))
    }

    async fn find_events(&self, filter: Document) -> MongoResult<Vec<EventEntity>> {
        let collection = self
            .collection::<MongoEventDocument>(EVENT_COLLECTION_NAME)
            .await;
        let documents: Vec<MongoEventDocument> = collection
            .find(filter)
            .await
            .map_err(|source| MongoDaoError::QueryEvents { source })?
            .try_collect()
            .await
            .map_err(|source| MongoDaoError::QueryEvents { source })?;
        Ok(documents.into_iter().map(Into::into).collect())
    }

    async fn find_active_tournament_event(&self) -> MongoResult<Option<EventEntity>> {
        let collection = self
            .collection::<MongoEventDocument>(EVENT_COLLECTION_NAME)
            .await;
        let active = [TournamentStatus::Submission, TournamentStatus::Playing]
            .map(|status| status.to_string());
        let document = collection
            .find_one(doc! {"axes.tournament": {"$in": active.to_vec()}})
            .sort(doc! {"started_at": -1})
            .await
            .map_err(|source| MongoDaoError::QueryEvents { source })?;
        Ok(document.map(Into::into))
    }

    async fn save_event(&self, event: EventEntity) -> MongoResult<EventEntity> {
        let id = match event.id {
            Some(id) => id,
            None => self.next_event_id().await?,
        };
        let name = event.name.clone();
        let document = MongoEventDocument::new(id, event);
        let collection = self
            .collection::<MongoEventDocument>(EVENT_COLLECTION_NAME)
            .await;

        collection
            .replace_one(doc_id(id), &document)
            .upsert(true)
            .await
            .map_err(|source| {
                if is_duplicate_key(&source) {
                    MongoDaoError::DuplicateName { name: name.clone() }
                } else {
                    MongoDaoError::SaveEvent {
                        name: name.clone(),
                        source,
                    }
                }
            })?;

        Ok(document.into())
    }

    async fn delete_event(&self, id: EventId) -> MongoResult<bool> {
        let collection = self
            .collection::<MongoEventDocument>(EVENT_COLLECTION_NAME)
            .await;
        let result = collection
            .delete_one(doc_id(id))
            .await
            .map_err(|source| MongoDaoError::DeleteEvent { id, source })?;

        self.collection::<EventDetailsEntity>(DETAILS_COLLECTION_NAME)
            .await
            .delete_one(doc! {"event_id": id})
            .await
            .map_err(|source| MongoDaoError::DeleteEvent { id, source })?;

        Ok(result.deleted_count > 0)
    }

    async fn find_event_details(&self, event_id: EventId) -> MongoResult<Option<EventDetailsEntity>> {
        self.collection::<EventDetailsEntity>(DETAILS_COLLECTION_NAME)
            .await
            .find_one(doc! {"event_id": event_id})
            .await
            .map_err(|source| MongoDaoError::LoadDetails { event_id, source })
    }

    async fn save_event_details(&self, details: EventDetailsEntity) -> MongoResult<()> {
        let event_id = details.event_id;
        self.collection::<EventDetailsEntity>(DETAILS_COLLECTION_NAME)
            .await
            .replace_one(doc! {"event_id": event_id}, &details)
            .upsert(true)
            .await
            .map_err(|source| MongoDaoError::SaveDetails { event_id, source })?;
        Ok(())
    }

    async fn read_all<T>(&self, collection: &'static str, filter: Document) -> MongoResult<Vec<T>>
    where
        T: serde::de::DeserializeOwned + Send + Sync + Unpin,
    {
        self.collection::<T>(collection)
            .await
            .find(filter)
            .await
            .map_err(|source| MongoDaoError::ReadCollection { collection, source })?
            .try_collect()
            .await
            .map_err(|source| MongoDaoError::ReadCollection { collection, source })
    }

    async fn find_event_template(&self, id: i64) -> MongoResult<Option<EventTemplateEntity>> {
        let mut templates: Vec<EventTemplateEntity> = self
            .read_all(TEMPLATE_COLLECTION_NAME, doc! {"id": id})
            .await?;
        Ok(templates.pop())
    }

    async fn list_event_presets(&self) -> MongoResult<Vec<EventPresetEntity>> {
        let mut presets: Vec<EventPresetEntity> =
            self.read_all(PRESET_COLLECTION_NAME, doc! {}).await?;
        presets.sort_by_key(|preset| preset.id);
        Ok(presets)
    }

    async fn list_entry_scores(&self, event_id: EventId) -> MongoResult<Vec<EntryScoreEntity>> {
        let entries: Vec<EntryEntity> = self
            .read_all(ENTRY_COLLECTION_NAME, doc! {"event_id": event_id})
            .await?;
        if entries.is_empty() {
            return Ok(Vec::new());
        }
        let entry_ids: Vec<i64> = entries.iter().map(|entry| entry.id).collect();
        self.read_all(SCORE_COLLECTION_NAME, doc! {"entry_id": {"$in": entry_ids}})
            .await
    }

    async fn list_event_posts(&self, event_id: EventId) -> MongoResult<Vec<PostEntity>> {
        let mut posts: Vec<PostEntity> = self
            .read_all(POST_COLLECTION_NAME, doc! {"event_id": event_id})
            .await?;
        posts.retain(|post| post.published_at.is_some());
        posts.sort_by(|a, b| b.published_at.cmp(&a.published_at));
        Ok(posts)
    }

    async fn refresh_event_references(&self, event_id: EventId, name: String) -> MongoResult<u64> {
        let mut updated = 0;
        for collection in [ENTRY_COLLECTION_NAME, POST_COLLECTION_NAME] {
            let result = self
                .collection::<Document>(collection)
                .await
                .update_many(
                    doc! {"event_id": event_id},
                    doc! {"$set": {"event_name": name.as_str()}},
                )
                .await
                .map_err(|source| MongoDaoError::RefreshReferences {
                    event_id,
                    collection,
                    source,
                })?;
            updated += result.modified_count;
        }
        Ok(updated)
    }
}

impl EventStore for MongoEventStore {
    fn find_event(&self, id: EventId) -> BoxFuture<'static, StorageResult<Option<EventEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.find_event(id).await.map_err(Into::into) })
    }

    fn find_events_by_name(
        &self,
        name: String,
    ) -> BoxFuture<'static, StorageResult<Vec<EventEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .find_events(doc! {"name": name})
                .await
                .map_err(Into::into)
        })
    }

    fn find_active_tournament_event(
        &self,
    ) -> BoxFuture<'static, StorageResult<Option<EventEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.find_active_tournament_event().await.map_err(Into::into) })
    }

    fn save_event(&self, event: EventEntity) -> BoxFuture<'static, StorageResult<EventEntity>> {
        let store = self.clone();
        Box::pin(async move { store.save_event(event).await.map_err(Into::into) })
    }

    fn delete_event(&self, id: EventId) -> BoxFuture<'static, StorageResult<bool>> {
        let store = self.clone();
        Box::pin(async move { store.delete_event(id).await.map_err(Into::into) })
    }

    fn find_event_details(
        &self,
        event_id: EventId,
    ) -> BoxFuture<'static, StorageResult<Option<EventDetailsEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.find_event_details(event_id).await.map_err(Into::into) })
    }

    fn save_event_details(
        &self,
        details: EventDetailsEntity,
    ) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.save_event_details(details).await.map_err(Into::into) })
    }

    fn find_event_template(
        &self,
        id: i64,
    ) -> BoxFuture<'static, StorageResult<Option<EventTemplateEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.find_event_template(id).await.map_err(Into::into) })
    }

    fn list_event_presets(&self) -> BoxFuture<'static, StorageResult<Vec<EventPresetEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.list_event_presets().await.map_err(Into::into) })
    }

    fn list_entry_scores(
        &self,
        event_id: EventId,
    ) -> BoxFuture<'static, StorageResult<Vec<EntryScoreEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.list_entry_scores(event_id).await.map_err(Into::into) })
    }

    fn list_event_posts(
        &self,
        event_id: EventId,
    ) -> BoxFuture<'static, StorageResult<Vec<PostEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.list_event_posts(event_id).await.map_err(Into::into) })
    }

    fn refresh_event_references(
        &self,
        event_id: EventId,
        name: String,
    ) -> BoxFuture<'static, StorageResult<u64>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .refresh_event_references(event_id, name)
                .await
                .map_err(Into::into)
        })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.inner.ping().await.map_err(Into::into) })
    }

    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.inner.reconnect().await.map_err(Into::into) })
    }
}
