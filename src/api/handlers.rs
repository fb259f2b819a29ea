use axum::{
    extract::{Path, State},
    Json,
};
use utoipa::OpenApi;

use super::{
    dto::{BoilerDto, CommandAccepted, SetStateBody, SetTemperatureBody, SnapshotDto},
    errors::AppError,
    AppState,
};
use crate::projection::{DeviceClass, SensorState};

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// List every configured boiler with its projected sensors.
#[utoipa::path(
    get,
    path = "/boilers",
    responses(
        (status = 200, description = "Configured boilers", body = Vec<BoilerDto>),
    ),
    tag = "boilers"
)]
pub async fn list_boilers(State(state): State<AppState>) -> Json<Vec<BoilerDto>> {
    let boilers = state
        .board
        .device_ids()
        .into_iter()
        .filter_map(|device_id| {
            let sensors = state.board.sensors(&device_id)?;
            Some(BoilerDto { device_id, sensors })
        })
        .collect();
    Json(boilers)
}

/// Projected sensor values for one boiler. Sensors with no data yet have a
/// `null` state.
#[utoipa::path(
    get,
    path = "/boilers/{device_id}/sensors",
    params(
        ("device_id" = String, Path, description = "MyEldom device ID"),
    ),
    responses(
        (status = 200, description = "Projected sensors", body = Vec<SensorState>),
        (status = 404, description = "Unknown device"),
    ),
    tag = "boilers"
)]
pub async fn get_sensors(
    State(state): State<AppState>,
    Path(device_id): Path<String>,
) -> Result<Json<Vec<SensorState>>, AppError> {
    state
        .board
        .sensors(&device_id)
        .map(Json)
        .ok_or(AppError::UnknownDevice(device_id))
}

/// Latest raw telemetry snapshot, or `null` before the first frame.
#[utoipa::path(
    get,
    path = "/boilers/{device_id}/snapshot",
    params(
        ("device_id" = String, Path, description = "MyEldom device ID"),
    ),
    responses(
        (status = 200, description = "Latest snapshot", body = SnapshotDto),
        (status = 404, description = "Unknown device"),
    ),
    tag = "boilers"
)]
pub async fn get_snapshot(
    State(state): State<AppState>,
    Path(device_id): Path<String>,
) -> Result<Json<Option<SnapshotDto>>, AppError> {
    if !state.board.contains(&device_id) {
        return Err(AppError::UnknownDevice(device_id));
    }
    let snapshot = state.store.get(&device_id).await;
    Ok(Json(snapshot.as_deref().map(SnapshotDto::from)))
}

/// Forward a target temperature to MyEldom.
#[utoipa::path(
    post,
    path = "/boilers/{device_id}/temperature",
    params(
        ("device_id" = String, Path, description = "MyEldom device ID"),
    ),
    request_body = SetTemperatureBody,
    responses(
        (status = 200, description = "Command accepted by MyEldom", body = CommandAccepted),
        (status = 404, description = "Unknown device"),
        (status = 502, description = "MyEldom rejected the command or was unreachable"),
    ),
    tag = "control"
)]
pub async fn set_temperature(
    State(state): State<AppState>,
    Path(device_id): Path<String>,
    Json(body): Json<SetTemperatureBody>,
) -> Result<Json<CommandAccepted>, AppError> {
    if !state.board.contains(&device_id) {
        return Err(AppError::UnknownDevice(device_id));
    }
    state
        .client
        .set_temperature(&device_id, body.temperature)
        .await?;
    Ok(Json(CommandAccepted {
        device_id,
        operation: "set_temperature".into(),
    }))
}

/// Switch a boiler on or off through MyEldom.
#[utoipa::path(
    post,
    path = "/boilers/{device_id}/state",
    params(
        ("device_id" = String, Path, description = "MyEldom device ID"),
    ),
    request_body = SetStateBody,
    responses(
        (status = 200, description = "Command accepted by MyEldom", body = CommandAccepted),
        (status = 404, description = "Unknown device"),
        (status = 502, description = "MyEldom rejected the command or was unreachable"),
    ),
    tag = "control"
)]
pub async fn set_state(
    State(state): State<AppState>,
    Path(device_id): Path<String>,
    Json(body): Json<SetStateBody>,
) -> Result<Json<CommandAccepted>, AppError> {
    if !state.board.contains(&device_id) {
        return Err(AppError::UnknownDevice(device_id));
    }
    state.client.set_state(&device_id, body.on).await?;
    Ok(Json(CommandAccepted {
        device_id,
        operation: "set_state".into(),
    }))
}

// ---------------------------------------------------------------------------
// Health check
// ---------------------------------------------------------------------------

/// Returns `200 OK` with `{"status":"ok"}` when the server is running.
#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service is healthy"),
    ),
    tag = "system"
)]
pub async fn health() -> axum::Json<serde_json::Value> {
    axum::Json(serde_json::json!({ "status": "ok" }))
}

// ---------------------------------------------------------------------------
// OpenAPI spec
// ---------------------------------------------------------------------------

#[derive(OpenApi)]
#[openapi(
    paths(list_boilers, get_sensors, get_snapshot, set_temperature, set_state, health),
    components(schemas(
        BoilerDto,
        SensorState,
        DeviceClass,
        SnapshotDto,
        SetTemperatureBody,
        SetStateBody,
        CommandAccepted,
    )),
    tags(
        (name = "boilers", description = "Projected boiler telemetry"),
        (name = "control", description = "Commands forwarded to MyEldom"),
        (name = "system",  description = "System endpoints"),
    ),
    info(
        title = "MyEldom Bridge API",
        version = "0.1.0",
        description = "Telemetry and control for MyEldom smart boilers"
    )
)]
pub struct ApiDoc;

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
