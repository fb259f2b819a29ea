pub mod dto;
pub mod errors;
pub mod handlers;

use axum::{
    routing::{get, post},
    Router,
};
use utoipa::OpenApi;
use utoipa_axum::router::OpenApiRouter;

use crate::{eldom::EldomClient, projection::ProjectionBoard, telemetry::TelemetryStore};

use handlers::ApiDoc;

/// Shared handles for the HTTP handlers. Every field is a cheap clone.
#[derive(Clone)]
pub struct AppState {
    pub client: EldomClient,
    pub store: TelemetryStore,
    pub board: ProjectionBoard,
}

pub fn router(state: AppState) -> Router {
    let (router, api) = OpenApiRouter::with_openapi(ApiDoc::openapi())
        .route("/boilers", get(handlers::list_boilers))
        .route("/boilers/{device_id}/sensors", get(handlers::get_sensors))
        .route("/boilers/{device_id}/snapshot", get(handlers::get_snapshot))
        .route("/boilers/{device_id}/temperature", post(handlers::set_temperature))
        .route("/boilers/{device_id}/state", post(handlers::set_state))
        .with_state(state)
        .split_for_parts();

    router
        .route("/health", get(handlers::health))
        .route(
            "/api-docs/openapi.json",
            get(move || async move { axum::Json(api) }),
        )
}
