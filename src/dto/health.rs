use serde::Serialize;
use utoipa::ToSchema;

/// Health payload returned by the `/healthcheck` route.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    /// "ok" when the event store answers, "degraded" otherwise.
    pub status: &'static str,
}

impl HealthResponse {
    pub fn ok() -> Self {
        Self { status: "ok" }
    }

    pub fn degraded() -> Self {
        Self { status: "degraded" }
    }

    pub fn is_ok(&self) -> bool {
        self.status == "ok"
    }
}
