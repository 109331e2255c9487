//! Event lookup and management routes.
//!
//! The caller's identity is read from the `x-user-name` and `x-user-role` headers,
//! which must be set by the authenticating proxy in front of this service. Requests
//! reaching the service directly can claim any role.

use axum::{
    Extension, Json, Router,
    body::Body,
    extract::{Path, Query, State},
    http::{HeaderMap, Request, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::get,
};

use crate::{
    dto::event::{
        EventDetailsView, EventFormQuery, EventFormResponse, EventManageForm, EventView,
        ManageFailure, ManageResponse, PageQuery, PostsPage,
    },
    dao::models::EventId,
    error::AppError,
    services::{
        event_manage_service::{self, EventForm, ManageOutcome},
        event_service,
        security::{Actor, Role},
    },
    state::SharedState,
};

const USER_NAME_HEADER: &str = "x-user-name";
const USER_ROLE_HEADER: &str = "x-user-role";

/// Event lookup and management endpoints.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/events/manage", get(new_event_form).post(create_event))
        .route("/active-tournament-event", get(get_active_tournament_event))
        .route("/events-by-id/{id}", get(get_event_by_id))
        .route(
            "/events/{name}/manage",
            get(edit_event_form).put(update_event),
        )
        .route("/events/{name}/posts", get(list_event_posts))
        .route("/events/{name}", get(get_event).delete(delete_event))
        .route_layer(middleware::from_fn(resolve_actor))
}

/// Rejected manage request. Input errors echo the submitted form back.
pub struct ManageRejection {
    error: AppError,
    form: EventManageForm,
}

impl IntoResponse for ManageRejection {
    fn into_response(self) -> Response {
        let status = self.error.status();
        if status != StatusCode::BAD_REQUEST {
            return self.error.into_response();
        }
        let payload = Json(ManageFailure {
            message: self.error.to_string(),
            form: self.form,
        });
        (status, payload).into_response()
    }
}

fn form_response(form: EventForm) -> EventFormResponse {
    EventFormResponse {
        event: (&form.event).into(),
        details: (&form.details).into(),
        presets: form.presets.iter().map(Into::into).collect(),
    }
}

fn manage_response(outcome: ManageOutcome) -> ManageResponse {
    ManageResponse {
        event: (&outcome.event).into(),
        details: EventDetailsView::from(&outcome.details),
        info_messages: outcome.info_messages,
        redirect: outcome.redirect,
    }
}

/// Blank event form, optionally prefilled from a template.
#[utoipa::path(
    get,
    path = "/events/manage",
    tag = "events",
    params(
        EventFormQuery,
        ("X-User-Role" = String, Header, description = "`moderator` or `admin`")
    ),
    responses(
        (status = 200, description = "Form data for a new event", body = EventFormResponse),
        (status = 403, description = "Moderator capability required")
    )
)]
pub async fn new_event_form(
    State(state): State<SharedState>,
    Extension(actor): Extension<Actor>,
    Query(query): Query<EventFormQuery>,
) -> Result<Json<EventFormResponse>, AppError> {
    let form = event_manage_service::prepare_event_form(
        &state,
        &actor,
        None,
        query.event_template_id.as_deref(),
    )
    .await?;
    Ok(Json(form_response(form)))
}

/// Create an event.
#[utoipa::path(
    post,
    path = "/events/manage",
    tag = "events",
    params(("X-User-Role" = String, Header, description = "`moderator` or `admin`")),
    request_body = EventManageForm,
    responses(
        (status = 201, description = "Event created", body = ManageResponse),
        (status = 400, description = "Rejected input, form echoed back", body = ManageFailure),
        (status = 403, description = "Moderator capability required")
    )
)]
pub async fn create_event(
    State(state): State<SharedState>,
    Extension(actor): Extension<Actor>,
    Json(form): Json<EventManageForm>,
) -> Result<(StatusCode, Json<ManageResponse>), ManageRejection> {
    match event_manage_service::manage_event(&state, &actor, None, &form).await {
        Ok(outcome) => Ok((StatusCode::CREATED, Json(manage_response(outcome)))),
        Err(err) => Err(ManageRejection {
            error: err.into(),
            form,
        }),
    }
}

/// Edit form of an existing event.
#[utoipa::path(
    get,
    path = "/events/{name}/manage",
    tag = "events",
    params(
        ("name" = String, Path, description = "Event name"),
        ("X-User-Role" = String, Header, description = "`moderator` or `admin`")
    ),
    responses(
        (status = 200, description = "Form data for the event", body = EventFormResponse),
        (status = 403, description = "Moderator capability required"),
        (status = 404, description = "Unknown event")
    )
)]
pub async fn edit_event_form(
    State(state): State<SharedState>,
    Extension(actor): Extension<Actor>,
    Path(name): Path<String>,
) -> Result<Json<EventFormResponse>, AppError> {
    let form = event_manage_service::prepare_event_form(&state, &actor, Some(&name), None).await?;
    Ok(Json(form_response(form)))
}

/// Replace the editable fields of an event.
#[utoipa::path(
    put,
    path = "/events/{name}/manage",
    tag = "events",
    params(
        ("name" = String, Path, description = "Current event name"),
        ("X-User-Role" = String, Header, description = "`moderator` or `admin`")
    ),
    request_body = EventManageForm,
    responses(
        (status = 200, description = "Event updated", body = ManageResponse),
        (status = 400, description = "Rejected input, form echoed back", body = ManageFailure),
        (status = 403, description = "Moderator capability required"),
        (status = 404, description = "Unknown event")
    )
)]
pub async fn update_event(
    State(state): State<SharedState>,
    Extension(actor): Extension<Actor>,
    Path(name): Path<String>,
    Json(form): Json<EventManageForm>,
) -> Result<Json<ManageResponse>, ManageRejection> {
    match event_manage_service::manage_event(&state, &actor, Some(&name), &form).await {
        Ok(outcome) => Ok(Json(manage_response(outcome))),
        Err(err) => Err(ManageRejection {
            error: err.into(),
            form,
        }),
    }
}

/// Delete a pending event.
#[utoipa::path(
    delete,
    path = "/events/{name}",
    tag = "events",
    params(
        ("name" = String, Path, description = "Event name"),
        ("X-User-Role" = String, Header, description = "`admin`")
    ),
    responses(
        (status = 204, description = "Event deleted"),
        (status = 403, description = "Admin capability required or event not pending"),
        (status = 404, description = "Unknown event")
    )
)]
pub async fn delete_event(
    State(state): State<SharedState>,
    Extension(actor): Extension<Actor>,
    Path(name): Path<String>,
) -> Result<StatusCode, AppError> {
    event_manage_service::delete_event(&state, &actor, &name).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Public lookup of an event by name.
#[utoipa::path(
    get,
    path = "/events/{name}",
    tag = "events",
    params(("name" = String, Path, description = "Event name")),
    responses(
        (status = 200, description = "Event found", body = EventView),
        (status = 404, description = "Unknown event")
    )
)]
pub async fn get_event(
    State(state): State<SharedState>,
    Path(name): Path<String>,
) -> Result<Json<EventView>, AppError> {
    let event = event_service::find_event_by_name(&state, &name)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("event `{name}` not found")))?;
    Ok(Json((&event).into()))
}

/// Public lookup of an event by id.
#[utoipa::path(
    get,
    path = "/events-by-id/{id}",
    tag = "events",
    params(("id" = i64, Path, description = "Event id")),
    responses(
        (status = 200, description = "Event found", body = EventView),
        (status = 404, description = "Unknown event")
    )
)]
pub async fn get_event_by_id(
    State(state): State<SharedState>,
    Path(id): Path<EventId>,
) -> Result<Json<EventView>, AppError> {
    let event = event_service::find_event_by_id(&state, id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("event #{id} not found")))?;
    Ok(Json((&event).into()))
}

/// Event whose tournament currently accepts or plays scores.
///
/// Lives outside `/events/{name}` so that no valid event name is shadowed.
#[utoipa::path(
    get,
    path = "/active-tournament-event",
    tag = "events",
    responses(
        (status = 200, description = "Active tournament event", body = EventView),
        (status = 404, description = "No tournament is running")
    )
)]
pub async fn get_active_tournament_event(
    State(state): State<SharedState>,
) -> Result<Json<EventView>, AppError> {
    let event = event_service::find_active_tournament_event(&state)
        .await?
        .ok_or_else(|| AppError::NotFound("no active tournament".into()))?;
    Ok(Json((&event).into()))
}

/// Published posts of an event.
#[utoipa::path(
    get,
    path = "/events/{name}/posts",
    tag = "events",
    params(("name" = String, Path, description = "Event name"), PageQuery),
    responses(
        (status = 200, description = "One page of posts, newest first", body = PostsPage),
        (status = 404, description = "Unknown event")
    )
)]
pub async fn list_event_posts(
    State(state): State<SharedState>,
    Path(name): Path<String>,
    Query(query): Query<PageQuery>,
) -> Result<Json<PostsPage>, AppError> {
    Ok(Json(
        event_service::list_event_posts(&state, &name, query.page).await?,
    ))
}

fn actor_from_headers(headers: &HeaderMap) -> Result<Actor, AppError> {
    let header = |key: &str| {
        headers
            .get(key)
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
            .filter(|value| !value.is_empty())
    };

    let role = match header(USER_ROLE_HEADER) {
        Some(role) => role.parse::<Role>().map_err(AppError::BadRequest)?,
        None => Role::User,
    };
    Ok(Actor {
        name: header(USER_NAME_HEADER).map(str::to_owned),
        role,
    })
}

/// Attach the [`Actor`] described by the identity headers. The headers are trusted as is.
async fn resolve_actor(mut req: Request<Body>, next: Next) -> Result<Response, AppError> {
    let actor = actor_from_headers(req.headers())?;
    req.extensions_mut().insert(actor);
    Ok(next.run(req).await)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::http::{HeaderValue, Method};
    use tower::ServiceExt;

    use super::*;
    use crate::{
        config::AppConfig,
        dao::event_store::memory::MemoryEventStore,
        error::ServiceError,
        state::AppState,
    };

    async fn state_with_event(name: &str) -> SharedState {
        let state = AppState::new(AppConfig::default());
        state
            .set_event_store(Arc::new(MemoryEventStore::new()))
            .await;
        let form = EventManageForm {
            name: name.into(),
            title: "Some Jam".into(),
            ..Default::default()
        };
        event_manage_service::manage_event(&state, &Actor::new("mod", Role::Moderator), None, &form)
            .await
            .unwrap();
        state
    }

    async fn send(state: &SharedState, method: Method, uri: &str, role: Option<&str>) -> StatusCode {
        let mut request = Request::builder().method(method).uri(uri);
        if let Some(role) = role {
            request = request.header(USER_ROLE_HEADER, role);
        }
        router()
            .with_state(state.clone())
            .oneshot(request.body(Body::empty()).unwrap())
            .await
            .unwrap()
            .status()
    }

    #[tokio::test]
    async fn tournament_lookup_leaves_event_names_reachable() {
        let state = state_with_event("active-tournament").await;

        assert_eq!(
            send(&state, Method::GET, "/events/active-tournament", None).await,
            StatusCode::OK
        );
        assert_eq!(
            send(&state, Method::GET, "/active-tournament-event", None).await,
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            send(&state, Method::DELETE, "/events/active-tournament", Some("admin")).await,
            StatusCode::NO_CONTENT
        );
        assert_eq!(
            send(&state, Method::GET, "/events/active-tournament", None).await,
            StatusCode::NOT_FOUND
        );
    }

    #[tokio::test]
    async fn events_are_reachable_by_id() {
        let state = state_with_event("jam-1").await;
        assert_eq!(
            send(&state, Method::GET, "/events-by-id/1", None).await,
            StatusCode::OK
        );
        assert_eq!(
            send(&state, Method::GET, "/events-by-id/2", None).await,
            StatusCode::NOT_FOUND
        );
    }

    #[tokio::test]
    async fn unknown_role_header_is_rejected() {
        let state = state_with_event("jam-1").await;
        assert_eq!(
            send(&state, Method::GET, "/events/jam-1", Some("root")).await,
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn actor_defaults_to_anonymous_user() {
        assert_eq!(actor_from_headers(&HeaderMap::new()).unwrap(), Actor::anonymous());
    }

    #[test]
    fn actor_is_read_from_headers() {
        let mut headers = HeaderMap::new();
        headers.insert(USER_NAME_HEADER, HeaderValue::from_static("wan"));
        headers.insert(USER_ROLE_HEADER, HeaderValue::from_static("admin"));
        assert_eq!(
            actor_from_headers(&headers).unwrap(),
            Actor::new("wan", Role::Admin)
        );

        headers.insert(USER_ROLE_HEADER, HeaderValue::from_static("root"));
        assert!(actor_from_headers(&headers).is_err());
    }

    #[test]
    fn only_input_errors_echo_the_form() {
        let rejection = ManageRejection {
            error: ServiceError::Validation("Invalid status".into()).into(),
            form: EventManageForm::default(),
        };
        assert_eq!(rejection.into_response().status(), StatusCode::BAD_REQUEST);

        let rejection = ManageRejection {
            error: ServiceError::Forbidden("moderator required".into()).into(),
            form: EventManageForm::default(),
        };
        assert_eq!(rejection.into_response().status(), StatusCode::FORBIDDEN);
    }
}
