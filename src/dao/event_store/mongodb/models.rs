use indexmap::IndexMap;
use mongodb::bson::{DateTime, Document, doc};
use serde::{Deserialize, Serialize};

use crate::{
    dao::models::{CountdownConfigEntity, EventEntity, EventId},
    state::status::StatusAxes,
};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoCountdownDocument {
    message: String,
    link: String,
    date: Option<DateTime>,
    phrase: String,
    enabled: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoEventDocument {
    #[serde(rename = "_id")]
    pub id: EventId,
    pub name: String,
    title: String,
    display_dates: String,
    display_theme: String,
    started_at: Option<DateTime>,
    logo: Option<String>,
    event_preset_id: Option<i64>,
    axes: StatusAxes,
    countdown: MongoCountdownDocument,
    #[serde(default)]
    divisions: IndexMap<String, String>,
    created_at: DateTime,
    updated_at: DateTime,
}

impl From<CountdownConfigEntity> for MongoCountdownDocument {
    fn from(value: CountdownConfigEntity) -> Self {
        Self {
            message: value.message,
            link: value.link,
            date: value.date.map(DateTime::from_system_time),
            phrase: value.phrase,
            enabled: value.enabled,
        }
    }
}

impl From<MongoCountdownDocument> for CountdownConfigEntity {
    fn from(value: MongoCountdownDocument) -> Self {
        Self {
            message: value.message,
            link: value.link,
            date: value.date.map(DateTime::to_system_time),
            phrase: value.phrase,
            enabled: value.enabled,
        }
    }
}

impl MongoEventDocument {
    /// Build the stored document once the event owns an id.
    pub fn new(id: EventId, value: EventEntity) -> Self {
        Self {
            id,
            name: value.name,
            title: value.title,
            display_dates: value.display_dates,
            display_theme: value.display_theme,
            started_at: value.started_at.map(DateTime::from_system_time),
            logo: value.logo,
            event_preset_id: value.event_preset_id,
            axes: value.axes,
            countdown: value.countdown.into(),
            divisions: value.divisions,
            created_at: DateTime::from_system_time(value.created_at),
            updated_at: DateTime::from_system_time(value.updated_at),
        }
    }
}

impl From<MongoEventDocument> for EventEntity {
    fn from(value: MongoEventDocument) -> Self {
        Self {
            id: Some(value.id),
            name: value.name,
            title: value.title,
            display_dates: value.display_dates,
            display_theme: value.display_theme,
            started_at: value.started_at.map(DateTime::to_system_time),
            logo: value.logo,
            event_preset_id: value.event_preset_id,
            axes: value.axes,
            countdown: value.countdown.into(),
            divisions: value.divisions,
            created_at: value.created_at.to_system_time(),
            updated_at: value.updated_at.to_system_time(),
        }
    }
}

pub fn doc_id(id: EventId) -> Document {
    doc! {"_id": id}
}
