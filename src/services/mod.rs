/// Engines computing rankings, theme shortlists and tournament scores.
pub mod computations;
/// OpenAPI documentation generation.
pub mod documentation;
/// Creation, update and deletion of events.
pub mod event_manage_service;
/// Cached event lookups.
pub mod event_service;
/// Health check service.
pub mod health_service;
/// Storage of event pictures.
pub mod images;
/// Actor capabilities.
pub mod security;
/// Event store connection supervisor.
pub mod storage_supervisor;
