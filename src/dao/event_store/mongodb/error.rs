use mongodb::error::{Error as MongoError, ErrorKind, WriteFailure};
use thiserror::Error;

use crate::dao::models::EventId;

pub type MongoResult<T> = std::result::Result<T, MongoDaoError>;

/// Server error code reported when a unique index rejects a write.
const DUPLICATE_KEY_CODE: i32 = 11000;

#[derive(Debug, Error)]
pub enum MongoDaoError {
    #[error("failed to parse MongoDB connection URI `{uri}`")]
    InvalidUri {
        uri: String,
        #[source]
        source: MongoError,
    },
    #[error("failed to build MongoDB client from options")]
    ClientConstruction {
        #[source]
        source: MongoError,
    },
    #[error("MongoDB ping failed during initial connection after {attempts} attempt(s)")]
    InitialPing {
        attempts: u32,
        #[source]
        source: MongoError,
    },
    #[error("MongoDB ping health check failed")]
    HealthPing {
        #[source]
        source: MongoError,
    },
    #[error("failed to ensure index `{index}` on collection `{collection}`")]
    EnsureIndex {
        collection: &'static str,
        index: &'static str,
        #[source]
        source: MongoError,
    },
    #[error("failed to allocate a new event id")]
    NextId {
        #[source]
        source: MongoError,
    },
    #[error("event name `{name}` is already taken")]
    DuplicateName { name: String },
    #[error("failed to save event `{name}`")]
    SaveEvent {
        name: String,
        #[source]
        source: MongoError,
    },
    #[error("failed to load event `{id}`")]
    LoadEvent {
        id: EventId,
        #[source]
        source: MongoError,
    },
    #[error("failed to query events")]
    QueryEvents {
        #[source]
        source: MongoError,
    },
    #[error("failed to delete event `{id}`")]
    DeleteEvent {
        id: EventId,
        #[source]
        source: MongoError,
    },
    #[error("failed to save details of event `{event_id}`")]
    SaveDetails {
        event_id: EventId,
        #[source]
        source: MongoError,
    },
    #[error("failed to load details of event `{event_id}`")]
    LoadDetails {
        event_id: EventId,
        #[source]
        source: MongoError,
    },
    #[error("failed to read collection `{collection}`")]
    ReadCollection {
        collection: &'static str,
        #[source]
        source: MongoError,
    },
    #[error("failed to refresh references to event `{event_id}` in `{collection}`")]
    RefreshReferences {
        event_id: EventId,
        collection: &'static str,
        #[source]
        source: MongoError,
    },
}

/// Whether MongoDB rejected a write because of a unique index.
pub fn is_duplicate_key(err: &MongoError) -> bool {
    matches!(
        err.kind.as_ref(),
        ErrorKind::Write(WriteFailure::WriteError(write)) if write.code == DUPLICATE_KEY_CODE
    )
}
