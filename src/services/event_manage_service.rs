//! Creation, update and deletion of events by moderators.
//!
//! [`manage_event`] validates a full replacement of the editable fields, applies it,
//! runs the derived computations triggered by status changes, then persists the event
//! and keeps caches and denormalized name references consistent. Steps run
//! sequentially and stop at the first failure; nothing is persisted before every
//! validation passed.

use std::{path::Component, path::Path, sync::Arc, time::SystemTime};

use indexmap::IndexMap;
use tracing::{info, warn};
use validator::Validate;

use crate::{
    dao::{event_store::EventStore, models::EventPresetEntity, storage::StorageError},
    dto::{
        event::{EventManageForm, LinkInput, UploadedPicture},
        parse_date_time, sanitize_string,
        validation::{validate_event_name, validate_optional_int},
    },
    error::ServiceError,
    services::{
        computations::HighScoreSnapshot,
        event_service,
        images::{ImageReplacement, ImageUpload},
        security::{Actor, is_admin, is_moderator},
    },
    state::{
        SharedState,
        cache::{ACTIVE_TOURNAMENT_EVENT_KEY, CacheNamespace, invalidate_logged},
        event::{CountdownConfig, Event, EventDetails, EventLink},
        status::{
            EntryStatus, EventStatus, ResultsStatus, RulesStatus, StatusAxes, ThemeStatus,
            TournamentStatus,
        },
        triggers::{self, DerivedComputation},
    },
};

/// Subdirectory of the uploads directory holding pictures received but not yet stored.
pub const INCOMING_UPLOADS_DIR: &str = "incoming";

/// Result of a successful [`manage_event`].
#[derive(Debug, Clone)]
pub struct ManageOutcome {
    /// Event as saved.
    pub event: Event,
    /// Details as saved.
    pub details: EventDetails,
    /// Messages of the derived computations that ran, in trigger order.
    pub info_messages: Vec<String>,
    /// Edit location of a freshly created event.
    pub redirect: Option<String>,
}

/// Event and presets needed to render the edit form.
#[derive(Debug, Clone)]
pub struct EventForm {
    /// Existing or freshly seeded event.
    pub event: Event,
    /// Details of that event.
    pub details: EventDetails,
    /// Presets the moderator can pick from.
    pub presets: Vec<EventPresetEntity>,
}

/// Fields that passed structural validation.
struct ValidatedFields {
    name: String,
    event_preset_id: Option<i64>,
    event_template_id: Option<i64>,
    axes: StatusAxes,
}

/// JSON and date fields parsed after the uniqueness check.
struct ParsedFields {
    divisions: IndexMap<String, String>,
    category_titles: Vec<String>,
    links: Vec<EventLink>,
    started_at: Option<SystemTime>,
    countdown_date: Option<SystemTime>,
    logo: Option<ImageUpload>,
    banner: Option<ImageUpload>,
}

fn validation(message: impl Into<String>) -> ServiceError {
    ServiceError::Validation(message.into())
}

/// Parse one axis. Absent or blank values keep `current`.
fn parse_axis<T: std::str::FromStr>(
    value: Option<&str>,
    current: T,
    message: &str,
) -> Result<T, ServiceError> {
    match value.map(str::trim).filter(|value| !value.is_empty()) {
        None => Ok(current),
        Some(value) => value.parse().map_err(|_| validation(message)),
    }
}

fn parse_optional_id(value: &str, message: &str) -> Result<Option<i64>, ServiceError> {
    validate_optional_int(value).map_err(|_| validation(message))?;
    Ok(value.trim().parse().ok())
}

fn validate_fields(form: &EventManageForm, current: &StatusAxes) -> Result<ValidatedFields, ServiceError> {
    if form.title.trim().is_empty() {
        return Err(validation("Title is required"));
    }

    let name = form.name.trim().to_owned();
    if let Err(err) = validate_event_name(&name) {
        let message = err
            .message
            .map(|message| message.into_owned())
            .unwrap_or_else(|| "Name is not a valid slug".into());
        return Err(validation(message));
    }

    let event_preset_id = parse_optional_id(&form.event_preset_id, "Invalid event preset ID")?;
    let event_template_id =
        parse_optional_id(&form.event_template_id, "Invalid event template ID")?;

    let axes = StatusAxes {
        status: parse_axis::<EventStatus>(form.status.as_deref(), current.status, "Invalid status")?,
        rules: parse_axis::<RulesStatus>(
            form.status_rules.as_deref(),
            current.rules,
            "Invalid rules status",
        )?,
        theme: parse_axis::<ThemeStatus>(
            form.status_theme.as_deref(),
            current.theme,
            "Invalid theme status",
        )?,
        entry: parse_axis::<EntryStatus>(
            form.status_entry.as_deref(),
            current.entry,
            "Invalid entry status",
        )?,
        results: parse_axis::<ResultsStatus>(
            form.status_results.as_deref(),
            current.results,
            "Invalid results status",
        )?,
        tournament: parse_axis::<TournamentStatus>(
            form.status_tournament.as_deref(),
            current.tournament,
            "Invalid tournament status",
        )?,
    };

    Ok(ValidatedFields {
        name,
        event_preset_id,
        event_template_id,
        axes,
    })
}

async fn ensure_unique_name(
    store: &Arc<dyn EventStore>,
    name: &str,
    event_id: Option<i64>,
) -> Result<(), ServiceError> {
    let clash = store
        .find_events_by_name(name.to_owned())
        .await?
        .into_iter()
        .any(|other| other.id != event_id);
    if clash {
        return Err(validation("Another event with the same name exists"));
    }
    Ok(())
}

fn parse_json_or<T: serde::de::DeserializeOwned>(
    raw: &str,
    empty: T,
    message: &str,
) -> Result<T, ServiceError> {
    if raw.trim().is_empty() {
        return Ok(empty);
    }
    serde_json::from_str(raw).map_err(|_| validation(message))
}

fn resolve_upload(
    state: &SharedState,
    picture: Option<&UploadedPicture>,
) -> Result<Option<ImageUpload>, ServiceError> {
    let Some(picture) = picture else {
        return Ok(None);
    };
    let mut components = Path::new(&picture.file).components();
    let plain_file = matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    );
    if !plain_file {
        return Err(validation("Invalid upload reference"));
    }
    Ok(Some(ImageUpload {
        path: state
            .config()
            .uploads_dir
            .join(INCOMING_UPLOADS_DIR)
            .join(&picture.file),
        original_name: picture.original_name.clone(),
    }))
}

fn parse_fields(state: &SharedState, form: &EventManageForm) -> Result<ParsedFields, ServiceError> {
    let divisions = parse_json_or(&form.divisions, IndexMap::new(), "Invalid divisions JSON")?;

    let max_categories = state.config().max_category_count;
    let category_titles: Vec<String> =
        parse_json_or(&form.category_titles, Vec::new(), "Invalid rating category JSON")?;
    if category_titles.len() > max_categories {
        return Err(validation(format!(
            "Events cannot have more than {max_categories} rating categories"
        )));
    }

    let links: Vec<LinkInput> = parse_json_or(&form.links, Vec::new(), "Invalid links JSON")?;
    if links.iter().any(|link| link.validate().is_err()) {
        return Err(validation("Invalid links JSON"));
    }

    let started_at =
        parse_date_time(&form.started_at).map_err(|_| validation("Invalid start date"))?;
    let countdown_date =
        parse_date_time(&form.countdown_date).map_err(|_| validation("Invalid countdown date"))?;

    Ok(ParsedFields {
        divisions,
        category_titles: category_titles.iter().map(|t| sanitize_string(t)).collect(),
        links: links.into_iter().map(EventLink::from).collect(),
        started_at,
        countdown_date,
        logo: resolve_upload(state, form.logo.as_ref())?,
        banner: resolve_upload(state, form.banner.as_ref())?,
    })
}

async fn load_by_name(
    store: &Arc<dyn EventStore>,
    name: &str,
) -> Result<Event, ServiceError> {
    store
        .find_events_by_name(name.to_owned())
        .await?
        .into_iter()
        .next()
        .map(Event::from)
        .ok_or_else(|| ServiceError::NotFound(format!("event `{name}`")))
}

async fn run_computation(
    state: &SharedState,
    computation: DerivedComputation,
    event: &Event,
    high_scores: &mut Option<HighScoreSnapshot>,
) -> Result<(), ServiceError> {
    let engines = state.computations();
    match computation {
        DerivedComputation::ComputeShortlist => engines.compute_shortlist(event.clone()).await?,
        DerivedComputation::ComputeRankings => engines.compute_rankings(event.clone()).await?,
        DerivedComputation::ClearRankings => engines.clear_rankings(event.clone()).await?,
        DerivedComputation::SeedTournament => {
            let snapshot = high_scores.take().unwrap_or_default();
            engines
                .seed_tournament_scores(snapshot, event.clone())
                .await?
        }
    }
    info!(event_id = ?event.id, name = %event.name, ?computation, "derived computation done");
    Ok(())
}

/// Create (`existing_name` is `None`) or update an event from a full form submission.
pub async fn manage_event(
    state: &SharedState,
    actor: &Actor,
    existing_name: Option<&str>,
    form: &EventManageForm,
) -> Result<ManageOutcome, ServiceError> {
    if !is_moderator(actor) {
        return Err(ServiceError::Forbidden("moderator required".into()));
    }
    let store = state.require_event_store().await?;
    let existing = match existing_name {
        Some(name) => Some(load_by_name(&store, name).await?),
        None => None,
    };
    let creation = existing.is_none();

    let base_axes = existing.as_ref().map(|e| e.axes).unwrap_or_default();
    let fields = validate_fields(form, &base_axes)?;
    ensure_unique_name(&store, &fields.name, existing.as_ref().and_then(|e| e.id)).await?;
    let parsed = parse_fields(state, form)?;

    let slot_name = existing
        .as_ref()
        .map_or(fields.name.as_str(), |event| event.name.as_str());
    let logo_replacement = ImageReplacement {
        previous: existing.as_ref().and_then(|event| event.logo.clone()),
        upload: parsed.logo.clone(),
        delete: form.logo_delete,
        destination: format!("/events/{slot_name}/logo"),
        max_diagonal: state.config().logo_max_diagonal,
    };
    let logo = if logo_replacement.is_noop() {
        logo_replacement.previous
    } else {
        state.images().replace_image(logo_replacement).await?
    };

    let (mut event, mut details) = match existing {
        Some(event) => {
            let details = event_service::find_event_details(state, &event).await?;
            (event, details)
        }
        None => event_service::create_event(state, fields.event_template_id).await?,
    };
    let previous_axes = event.axes;
    let previous_name = (!creation).then(|| event.name.clone());

    event.title = sanitize_string(&form.title);
    event.name = fields.name;
    event.display_dates = sanitize_string(&form.display_dates);
    event.display_theme = sanitize_string(&form.display_theme);
    event.started_at = parsed.started_at;
    event.divisions = parsed.divisions;
    event.event_preset_id = fields.event_preset_id;
    event.axes = fields.axes;
    event.logo = logo;
    event.countdown = CountdownConfig {
        message: sanitize_string(&form.countdown_message),
        link: sanitize_string(&form.countdown_link),
        date: parsed.countdown_date,
        phrase: sanitize_string(&form.countdown_phrase),
        enabled: form.countdown_enabled,
    };
    event.updated_at = SystemTime::now();

    let computations = triggers::evaluate(&previous_axes, &event.axes);
    let mut high_scores = match event.id {
        Some(id) if computations.contains(&DerivedComputation::SeedTournament) => {
            Some(store.list_entry_scores(id).await?)
        }
        _ => None,
    };
    let mut info_messages = Vec::new();
    for computation in computations {
        run_computation(state, computation, &event, &mut high_scores).await?;
        if let Some(message) = computation.info_message() {
            info_messages.push(message.to_owned());
        }
    }

    let cache = state.cache().as_ref();
    invalidate_logged(cache, CacheNamespace::General, ACTIVE_TOURNAMENT_EVENT_KEY);
    let event: Event = store.save_event(event.into()).await?.into();
    let Some(event_id) = event.id else {
        return Err(ServiceError::Unavailable(StorageError::Unavailable {
            message: format!("saved event `{}` has no id", event.name),
            source: "missing id".into(),
        }));
    };
    info!(event_id, name = %event.name, creation, "event saved");

    invalidate_logged(cache, CacheNamespace::EventsById, &event_id.to_string());
    invalidate_logged(cache, CacheNamespace::EventsByName, &event.name);
    if let Some(previous_name) = previous_name.filter(|previous| *previous != event.name) {
        let updated = store
            .refresh_event_references(event_id, event.name.clone())
            .await?;
        info!(event_id, from = %previous_name, to = %event.name, updated, "event renamed");
        invalidate_logged(cache, CacheNamespace::EventsByName, &previous_name);
    }

    details.links = parsed.links;
    details.category_titles = parsed.category_titles;
    let banner_replacement = ImageReplacement {
        previous: details.banner.clone(),
        upload: parsed.banner,
        delete: form.banner_delete,
        destination: format!("/events/{}/banner", event.name),
        max_diagonal: state.config().banner_max_diagonal,
    };
    let mut banner_error = None;
    if !banner_replacement.is_noop() {
        match state.images().replace_image(banner_replacement).await {
            Ok(banner) => details.banner = banner,
            Err(err) => {
                warn!(event_id, error = %err, "banner replacement failed; saving details without it");
                banner_error = Some(err);
            }
        }
    }
    store
        .save_event_details(details.clone().into_entity(event_id))
        .await?;
    if let Some(err) = banner_error {
        return Err(ServiceError::Storage(err));
    }

    let redirect = creation.then(|| format!("/events/{}/edit", event.name));
    Ok(ManageOutcome {
        event,
        details,
        info_messages,
        redirect,
    })
}

/// Event to show in the edit form: the existing one, or a new one seeded from a template.
pub async fn prepare_event_form(
    state: &SharedState,
    actor: &Actor,
    existing_name: Option<&str>,
    template_id: Option<&str>,
) -> Result<EventForm, ServiceError> {
    if !is_moderator(actor) {
        return Err(ServiceError::Forbidden("moderator required".into()));
    }
    let store = state.require_event_store().await?;

    let (event, details) = match existing_name {
        Some(name) => {
            let event = load_by_name(&store, name).await?;
            let details = event_service::find_event_details(state, &event).await?;
            (event, details)
        }
        None => {
            event_service::create_event(state, event_service::template_id_from(template_id))
                .await?
        }
    };
    let presets = event_service::list_event_presets(state).await?;

    Ok(EventForm {
        event,
        details,
        presets,
    })
}

/// Delete a pending event and its details.
pub async fn delete_event(
    state: &SharedState,
    actor: &Actor,
    name: &str,
) -> Result<(), ServiceError> {
    if !is_admin(actor) {
        return Err(ServiceError::Forbidden("admin required".into()));
    }
    let store = state.require_event_store().await?;
    let event = load_by_name(&store, name).await?;
    if event.axes.status != EventStatus::Pending {
        return Err(ServiceError::Forbidden(
            "Only pending events can be deleted".into(),
        ));
    }
    let Some(event_id) = event.id else {
        return Err(ServiceError::NotFound(format!("event `{name}`")));
    };

    store.delete_event(event_id).await?;
    info!(event_id, name = %event.name, "event deleted");

    let cache = state.cache().as_ref();
    invalidate_logged(cache, CacheNamespace::EventsById, &event_id.to_string());
    invalidate_logged(cache, CacheNamespace::EventsByName, &event.name);
    invalidate_logged(cache, CacheNamespace::General, ACTIVE_TOURNAMENT_EVENT_KEY);
    Ok(())
}
