use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};

use crate::{dto::health::HealthResponse, services::health_service, state::SharedState};

#[utoipa::path(
    get,
    path = "/healthcheck",
    tag = "health",
    responses(
        (status = 200, description = "Event store reachable", body = HealthResponse),
        (status = 503, description = "Running degraded", body = HealthResponse)
    )
)]
/// Report whether the event store is reachable.
pub async fn healthcheck(State(state): State<SharedState>) -> Response {
    health_response(health_service::health_status(&state).await)
}

fn health_response(status: HealthResponse) -> Response {
    let code = if status.is_ok() {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (code, Json(status)).into_response()
}

/// Configure the health routes subtree.
pub fn router() -> Router<SharedState> {
    Router::<SharedState>::new().route("/healthcheck", get(healthcheck))
}
