//! Domain view of an event and its details, with conversions to the stored entities.

use std::time::SystemTime;

use indexmap::IndexMap;

use crate::{
    dao::models::{
        CountdownConfigEntity, EventDetailsEntity, EventEntity, EventId, EventLinkEntity,
        EventTemplateEntity,
    },
    state::status::StatusAxes,
};

/// Countdown banner configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CountdownConfig {
    /// Text displayed next to the countdown.
    pub message: String,
    /// Optional link the countdown points to.
    pub link: String,
    /// Instant the countdown reaches zero.
    pub date: Option<SystemTime>,
    /// Phrase shown once the countdown is over.
    pub phrase: String,
    /// Whether the countdown is displayed.
    pub enabled: bool,
}

/// Runtime representation of an event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    /// Primary key; `None` until first persisted.
    pub id: Option<EventId>,
    /// Unique slug.
    pub name: String,
    /// Display title.
    pub title: String,
    /// Free text describing the dates.
    pub display_dates: String,
    /// Free text describing the theme.
    pub display_theme: String,
    /// Official start.
    pub started_at: Option<SystemTime>,
    /// Public path of the logo.
    pub logo: Option<String>,
    /// Selected preset.
    pub event_preset_id: Option<i64>,
    /// Status axes.
    pub axes: StatusAxes,
    /// Countdown banner.
    pub countdown: CountdownConfig,
    /// Division key to description.
    pub divisions: IndexMap<String, String>,
    /// Creation timestamp.
    pub created_at: SystemTime,
    /// Last update timestamp.
    pub updated_at: SystemTime,
}

/// Link shown on the event page.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize, utoipa::ToSchema)]
pub struct EventLink {
    /// Target URL.
    pub url: String,
    /// Label.
    pub title: String,
}

/// Larger, rarely read fields of an event.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventDetails {
    /// Links shown on the event page.
    pub links: Vec<EventLink>,
    /// Rating category titles.
    pub category_titles: Vec<String>,
    /// Public path of the banner.
    pub banner: Option<String>,
}

impl Event {
    /// Blank event in the initial state: pending, every other axis off.
    pub fn blank() -> Self {
        let now = SystemTime::now();
        Self {
            id: None,
            name: String::new(),
            title: String::new(),
            display_dates: String::new(),
            display_theme: String::new(),
            started_at: None,
            logo: None,
            event_preset_id: None,
            axes: StatusAxes::default(),
            countdown: CountdownConfig::default(),
            divisions: IndexMap::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Blank event with the prefilled values of a template. The template id is not kept.
    pub fn from_template(template: &EventTemplateEntity) -> (Self, EventDetails) {
        let event = Self {
            title: template.event_title.clone(),
            display_dates: template.display_dates.clone(),
            display_theme: template.display_theme.clone(),
            divisions: template.divisions.clone(),
            countdown: template.countdown.clone().into(),
            ..Self::blank()
        };
        let details = EventDetails {
            links: template.links.iter().cloned().map(Into::into).collect(),
            category_titles: template.category_titles.clone(),
            banner: None,
        };
        (event, details)
    }
}

impl From<CountdownConfigEntity> for CountdownConfig {
    fn from(value: CountdownConfigEntity) -> Self {
        Self {
            message: value.message,
            link: value.link,
            date: value.date,
            phrase: value.phrase,
            enabled: value.enabled,
        }
    }
}

impl From<CountdownConfig> for CountdownConfigEntity {
    fn from(value: CountdownConfig) -> Self {
        Self {
            message: value.message,
            link: value.link,
            date: value.date,
            phrase: value.phrase,
            enabled: value.enabled,
        }
    }
}

impl From<EventEntity> for Event {
    fn from(value: EventEntity) -> Self {
        Self {
            id: value.id,
            name: value.name,
            title: value.title,
            display_dates: value.display_dates,
            display_theme: value.display_theme,
            started_at: value.started_at,
            logo: value.logo,
            event_preset_id: value.event_preset_id,
            axes: value.axes,
            countdown: value.countdown.into(),
            divisions: value.divisions,
            created_at: value.created_at,
            updated_at: value.updated_at,
        }
    }
}

impl From<Event> for EventEntity {
    fn from(value: Event) -> Self {
        Self {
            id: value.id,
            name: value.name,
            title: value.title,
            display_dates: value.display_dates,
            display_theme: value.display_theme,
            started_at: value.started_at,
            logo: value.logo,
            event_preset_id: value.event_preset_id,
            axes: value.axes,
            countdown: value.countdown.into(),
            divisions: value.divisions,
            created_at: value.created_at,
            updated_at: value.updated_at,
        }
    }
}

impl From<EventLinkEntity> for EventLink {
    fn from(value: EventLinkEntity) -> Self {
        Self {
            url: value.url,
            title: value.title,
        }
    }
}

impl From<EventLink> for EventLinkEntity {
    fn from(value: EventLink) -> Self {
        Self {
            url: value.url,
            title: value.title,
        }
    }
}

impl From<EventDetailsEntity> for EventDetails {
    fn from(value: EventDetailsEntity) -> Self {
        Self {
            links: value.links.into_iter().map(Into::into).collect(),
            category_titles: value.category_titles,
            banner: value.banner,
        }
    }
}

impl EventDetails {
    /// Storage representation attached to the given event.
    pub fn into_entity(self, event_id: EventId) -> EventDetailsEntity {
        EventDetailsEntity {
            event_id,
            links: self.links.into_iter().map(Into::into).collect(),
            category_titles: self.category_titles,
            banner: self.banner,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::status::{EventStatus, TournamentStatus};

    #[test]
    fn template_seeds_display_fields_without_identity() {
        let mut divisions = IndexMap::new();
        divisions.insert("solo".to_owned(), "Alone".to_owned());
        let template = EventTemplateEntity {
            id: 9,
            title: "Weekly jam".into(),
            event_title: "Weekly Jam #".into(),
            display_dates: "Every weekend".into(),
            display_theme: "TBA".into(),
            divisions,
            category_titles: vec!["Fun".into(), "Graphics".into()],
            links: vec![EventLinkEntity {
                url: "https://example.org/rules".into(),
                title: "Rules".into(),
            }],
            countdown: CountdownConfigEntity {
                phrase: "Go!".into(),
                enabled: true,
                ..Default::default()
            },
        };

        let (event, details) = Event::from_template(&template);

        assert_eq!(event.id, None);
        assert!(event.name.is_empty());
        assert_eq!(event.title, "Weekly Jam #");
        assert_eq!(event.divisions.get("solo").map(String::as_str), Some("Alone"));
        assert!(event.countdown.enabled);
        assert_eq!(event.axes.status, EventStatus::Pending);
        assert_eq!(event.axes.tournament, TournamentStatus::Off);
        assert_eq!(details.category_titles.len(), 2);
        assert_eq!(details.links[0].title, "Rules");
    }
}
