use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::time::SystemTime;

use crate::state::status::StatusAxes;

/// Store-assigned identifier of an event.
pub type EventId = i64;

/// Countdown banner configuration shown on the event home page.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct CountdownConfigEntity {
    /// Text displayed next to the countdown.
    pub message: String,
    /// Optional link the countdown points to.
    pub link: String,
    /// Instant the countdown reaches zero.
    pub date: Option<SystemTime>,
    /// Phrase shown once the countdown is over.
    pub phrase: String,
    /// Whether the countdown is displayed at all.
    pub enabled: bool,
}

/// Event row persisted by the storage layer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct EventEntity {
    /// Primary key; `None` until the event is saved for the first time.
    pub id: Option<EventId>,
    /// Unique slug used in URLs.
    pub name: String,
    /// Display title.
    pub title: String,
    /// Free text describing the event dates.
    pub display_dates: String,
    /// Free text describing the theme.
    pub display_theme: String,
    /// Official start of the event.
    pub started_at: Option<SystemTime>,
    /// Public path of the logo picture.
    pub logo: Option<String>,
    /// Preset used to drive the countdown, if any.
    pub event_preset_id: Option<i64>,
    /// Every status axis.
    pub axes: StatusAxes,
    /// Countdown banner configuration.
    pub countdown: CountdownConfigEntity,
    /// Division key to description, in display order.
    pub divisions: IndexMap<String, String>,
    /// Creation timestamp.
    pub created_at: SystemTime,
    /// Last update timestamp.
    pub updated_at: SystemTime,
}

/// Link shown on the event page.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct EventLinkEntity {
    /// Target URL.
    pub url: String,
    /// Link label.
    pub title: String,
}

/// One-to-one extension of an event for the larger, rarely read fields.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct EventDetailsEntity {
    /// Owning event.
    pub event_id: EventId,
    /// Links shown on the event page.
    pub links: Vec<EventLinkEntity>,
    /// Rating category titles, in order.
    pub category_titles: Vec<String>,
    /// Public path of the banner picture.
    pub banner: Option<String>,
}

/// Reusable set of values new events can be seeded from.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct EventTemplateEntity {
    /// Primary key.
    pub id: i64,
    /// Name of the template itself.
    pub title: String,
    /// Title given to events created from this template.
    pub event_title: String,
    /// Prefilled date text.
    pub display_dates: String,
    /// Prefilled theme text.
    pub display_theme: String,
    /// Prefilled divisions.
    pub divisions: IndexMap<String, String>,
    /// Prefilled rating categories.
    pub category_titles: Vec<String>,
    /// Prefilled links.
    pub links: Vec<EventLinkEntity>,
    /// Prefilled countdown configuration.
    pub countdown: CountdownConfigEntity,
}

/// Named countdown/status preset selectable from the event form.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct EventPresetEntity {
    /// Primary key.
    pub id: i64,
    /// Display name of the preset.
    pub title: String,
    /// Status axes the preset moves the event to.
    pub axes: StatusAxes,
    /// Countdown configuration applied with the preset.
    pub countdown: CountdownConfigEntity,
}

/// Game submitted to an event. Keeps a denormalized copy of the event name.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct EntryEntity {
    /// Primary key.
    pub id: i64,
    /// Owning event; `None` for entries of external events.
    pub event_id: Option<EventId>,
    /// Name of the owning event, used in entry URLs.
    pub event_name: Option<String>,
    /// Entry slug.
    pub name: String,
    /// Entry title.
    pub title: String,
    /// `solo`, `team` or `unranked`.
    pub division: String,
}

/// High score submitted on an entry.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EntryScoreEntity {
    /// Primary key.
    pub id: i64,
    /// Scored entry.
    pub entry_id: i64,
    /// Player who submitted the score.
    pub user_id: i64,
    /// Raw score value.
    pub score: f64,
    /// When the score was submitted.
    pub submitted_at: SystemTime,
}

/// Blog post, optionally attached to an event. Keeps a denormalized copy of the event name.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PostEntity {
    /// Primary key.
    pub id: i64,
    /// Author.
    pub author_user_id: i64,
    /// Slug derived from the title.
    pub name: String,
    /// Post title.
    pub title: String,
    /// Related entry, if any.
    pub entry_id: Option<i64>,
    /// Related event, if any.
    pub event_id: Option<EventId>,
    /// Name of the related event.
    pub event_name: Option<String>,
    /// Markdown body.
    pub body: String,
    /// Publication date; `None` for drafts.
    pub published_at: Option<SystemTime>,
    /// Marker for announcement posts (`announcement`, `arena`...).
    pub special_post_type: Option<String>,
}
