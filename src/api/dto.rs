use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;

use crate::{projection::SensorState, telemetry::TelemetrySnapshot};

#[derive(Debug, Serialize, ToSchema)]
pub struct BoilerDto {
    pub device_id: String,
    pub sensors: Vec<SensorState>,
}

/// Latest raw telemetry payload for one boiler.
#[derive(Debug, Serialize, ToSchema)]
pub struct SnapshotDto {
    pub device_id: String,
    pub received_at: DateTime<Utc>,
    /// Envelope as received from MyEldom: `{"Data": [{...}]}`.
    #[schema(value_type = Object)]
    pub payload: Value,
}

impl From<&TelemetrySnapshot> for SnapshotDto {
    fn from(s: &TelemetrySnapshot) -> Self {
        Self {
            device_id: s.device_id.clone(),
            received_at: s.received_at,
            payload: s.payload.clone(),
        }
    }
}

/// Request body for `POST /boilers/{device_id}/temperature`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct SetTemperatureBody {
    /// Degrees Celsius
    pub temperature: u8,
}

/// Request body for `POST /boilers/{device_id}/state`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct SetStateBody {
    pub on: bool,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CommandAccepted {
    pub device_id: String,
    pub operation: String,
}
