use utoipa::OpenApi;

#[derive(OpenApi)]
/// Aggregated OpenAPI document for the jam events backend.
#[openapi(
    paths(
        crate::routes::health::healthcheck,
        crate::routes::events::new_event_form,
        crate::routes::events::create_event,
        crate::routes::events::edit_event_form,
        crate::routes::events::update_event,
        crate::routes::events::delete_event,
        crate::routes::events::get_event,
        crate::routes::events::get_event_by_id,
        crate::routes::events::get_active_tournament_event,
        crate::routes::events::list_event_posts,
    ),
    components(
        schemas(
            crate::dto::health::HealthResponse,
            crate::dto::event::EventManageForm,
            crate::dto::event::UploadedPicture,
            crate::dto::event::ManageResponse,
            crate::dto::event::ManageFailure,
            crate::dto::event::EventFormResponse,
            crate::dto::event::EventView,
            crate::dto::event::EventDetailsView,
            crate::dto::event::EventPresetView,
            crate::dto::event::StatusAxesView,
            crate::dto::event::CountdownView,
            crate::dto::event::PostView,
            crate::dto::event::PostsPage,
            crate::state::event::EventLink,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "events", description = "Event lookup and management"),
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_lists_event_routes() {
        let doc = ApiDoc::openapi();
        assert!(doc.paths.paths.contains_key("/events/{name}/manage"));
        assert!(doc.paths.paths.contains_key("/active-tournament-event"));
        assert!(doc.paths.paths.contains_key("/events-by-id/{id}"));
    }
}
