//! DTO definitions used by the event management REST API and documentation layer.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::{
    dao::models::{EventPresetEntity, PostEntity},
    dto::format_system_time,
    state::{
        event::{CountdownConfig, Event, EventDetails, EventLink},
        status::StatusAxes,
    },
};

/// Picture already received by the upload endpoint and waiting in the incoming directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct UploadedPicture {
    /// File name inside the incoming uploads directory.
    pub file: String,
    /// Name of the file on the client, used to pick the stored extension.
    pub original_name: String,
}

/// Full replacement of the editable fields of an event.
///
/// Structured fields (`divisions`, `category_titles`, `links`) are JSON documents
/// typed by the moderator; empty strings stand for their empty value. Absent status
/// axes keep their current value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(default)]
pub struct EventManageForm {
    pub name: String,
    pub title: String,
    pub display_dates: String,
    pub display_theme: String,
    /// RFC 3339 timestamp.
    pub started_at: String,
    pub event_preset_id: String,
    /// Template to seed a new event from. Ignored on updates.
    pub event_template_id: String,
    pub status: Option<String>,
    pub status_rules: Option<String>,
    /// Enum value or id of a post.
    pub status_theme: Option<String>,
    pub status_entry: Option<String>,
    /// Enum value or id of a post.
    pub status_results: Option<String>,
    pub status_tournament: Option<String>,
    pub countdown_message: String,
    pub countdown_link: String,
    /// RFC 3339 timestamp.
    pub countdown_date: String,
    pub countdown_phrase: String,
    pub countdown_enabled: bool,
    /// JSON object mapping division keys to descriptions.
    pub divisions: String,
    /// JSON array of rating category titles.
    pub category_titles: String,
    /// JSON array of `{ "url", "title" }` objects.
    pub links: String,
    pub logo: Option<UploadedPicture>,
    pub logo_delete: bool,
    pub banner: Option<UploadedPicture>,
    pub banner_delete: bool,
}

/// Link entry as typed in the `links` JSON field.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct LinkInput {
    #[serde(default)]
    pub title: String,
    #[validate(url)]
    pub url: String,
}

impl From<LinkInput> for EventLink {
    fn from(value: LinkInput) -> Self {
        Self {
            url: value.url,
            title: value.title,
        }
    }
}

/// Query accepted by the blank event form.
#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct EventFormQuery {
    /// Template to prefill the form with.
    pub event_template_id: Option<String>,
}

/// Query accepted by paginated listings.
#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct PageQuery {
    /// One-based page number.
    pub page: Option<usize>,
}

/// Every status axis rendered as its wire value.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct StatusAxesView {
    pub status: String,
    pub status_rules: String,
    pub status_theme: String,
    pub status_entry: String,
    pub status_results: String,
    pub status_tournament: String,
}

impl From<&StatusAxes> for StatusAxesView {
    fn from(axes: &StatusAxes) -> Self {
        Self {
            status: axes.status.to_string(),
            status_rules: axes.rules.to_string(),
            status_theme: axes.theme.to_string(),
            status_entry: axes.entry.to_string(),
            status_results: axes.results.to_string(),
            status_tournament: axes.tournament.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct CountdownView {
    pub message: String,
    pub link: String,
    pub date: Option<String>,
    pub phrase: String,
    pub enabled: bool,
}

impl From<&CountdownConfig> for CountdownView {
    fn from(countdown: &CountdownConfig) -> Self {
        Self {
            message: countdown.message.clone(),
            link: countdown.link.clone(),
            date: countdown.date.map(format_system_time),
            phrase: countdown.phrase.clone(),
            enabled: countdown.enabled,
        }
    }
}

/// Public projection of an event.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct EventView {
    pub id: Option<i64>,
    pub name: String,
    pub title: String,
    pub display_dates: String,
    pub display_theme: String,
    pub started_at: Option<String>,
    pub logo: Option<String>,
    pub event_preset_id: Option<i64>,
    #[serde(flatten)]
    pub axes: StatusAxesView,
    pub countdown: CountdownView,
    #[schema(value_type = std::collections::HashMap<String, String>)]
    pub divisions: IndexMap<String, String>,
    pub created_at: String,
    pub updated_at: String,
}

impl From<&Event> for EventView {
    fn from(event: &Event) -> Self {
        Self {
            id: event.id,
            name: event.name.clone(),
            title: event.title.clone(),
            display_dates: event.display_dates.clone(),
            display_theme: event.display_theme.clone(),
            started_at: event.started_at.map(format_system_time),
            logo: event.logo.clone(),
            event_preset_id: event.event_preset_id,
            axes: (&event.axes).into(),
            countdown: (&event.countdown).into(),
            divisions: event.divisions.clone(),
            created_at: format_system_time(event.created_at),
            updated_at: format_system_time(event.updated_at),
        }
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct EventDetailsView {
    pub links: Vec<EventLink>,
    pub category_titles: Vec<String>,
    pub banner: Option<String>,
}

impl From<&EventDetails> for EventDetailsView {
    fn from(details: &EventDetails) -> Self {
        Self {
            links: details.links.clone(),
            category_titles: details.category_titles.clone(),
            banner: details.banner.clone(),
        }
    }
}

/// Preset selectable from the event form.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct EventPresetView {
    pub id: i64,
    pub title: String,
    #[serde(flatten)]
    pub axes: StatusAxesView,
    pub countdown: CountdownView,
}

impl From<&EventPresetEntity> for EventPresetView {
    fn from(preset: &EventPresetEntity) -> Self {
        Self {
            id: preset.id,
            title: preset.title.clone(),
            axes: (&preset.axes).into(),
            countdown: (&CountdownConfig::from(preset.countdown.clone())).into(),
        }
    }
}

/// Data needed to render the event form.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct EventFormResponse {
    pub event: EventView,
    pub details: EventDetailsView,
    pub presets: Vec<EventPresetView>,
}

/// Successful outcome of a create or update.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ManageResponse {
    pub event: EventView,
    pub details: EventDetailsView,
    /// Notices about derived computations that ran.
    pub info_messages: Vec<String>,
    /// Where the client should go next, set on creation.
    pub redirect: Option<String>,
}

/// Rejected create or update, echoing the submitted form so it can be corrected.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ManageFailure {
    pub message: String,
    pub form: EventManageForm,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PostView {
    pub id: i64,
    pub name: String,
    pub title: String,
    pub author_user_id: i64,
    pub entry_id: Option<i64>,
    pub event_name: Option<String>,
    pub body: String,
    pub published_at: Option<String>,
    pub special_post_type: Option<String>,
}

impl From<PostEntity> for PostView {
    fn from(post: PostEntity) -> Self {
        Self {
            id: post.id,
            name: post.name,
            title: post.title,
            author_user_id: post.author_user_id,
            entry_id: post.entry_id,
            event_name: post.event_name,
            body: post.body,
            published_at: post.published_at.map(format_system_time),
            special_post_type: post.special_post_type,
        }
    }
}

/// One page of event posts.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PostsPage {
    pub posts: Vec<PostView>,
    pub page: usize,
    pub page_count: usize,
}
