//! Projection of raw boiler telemetry into named sensor values.
//!
//! Each configured boiler gets one [`BoilerSensors`] holding the last known
//! value of every sensor in [`SENSORS`]. Snapshots only ever overwrite the
//! fields they carry: a missing field, a `null` or an empty `Data` list
//! leaves the previous value in place.

use std::{collections::HashMap, sync::Arc};

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::Serialize;
use serde_json::Value;
use tracing::debug;
use utoipa::ToSchema;

use crate::telemetry::store::{SnapshotObserver, TelemetrySnapshot};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum DeviceClass {
    Temperature,
    Energy,
    PowerState,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SensorDescription {
    /// Field name in the telemetry payload.
    pub key: &'static str,
    pub name: &'static str,
    pub unit: Option<&'static str>,
    pub device_class: Option<DeviceClass>,
}

const fn sensor(
    key: &'static str,
    name: &'static str,
    unit: Option<&'static str>,
    device_class: Option<DeviceClass>,
) -> SensorDescription {
    SensorDescription {
        key,
        name,
        unit,
        device_class,
    }
}

pub const STATE_KEY: &str = "State";

pub const SENSORS: &[SensorDescription] = &[
    sensor("DeviceID", "Device ID", None, None),
    sensor("HardwareVersion", "Hardware Version", None, None),
    sensor("SoftwareVersion", "Software Version", None, None),
    sensor("SetTemp", "Set Temperature", Some("°C"), Some(DeviceClass::Temperature)),
    sensor(STATE_KEY, "Power State", None, Some(DeviceClass::PowerState)),
    sensor("STL_Temp", "Cylinder 1 Temperature", Some("°C"), Some(DeviceClass::Temperature)),
    sensor("FT_Temp", "Cylinder 2 Temperature", Some("°C"), Some(DeviceClass::Temperature)),
    sensor("EnergyD", "Energy Day", Some("kWh"), Some(DeviceClass::Energy)),
    sensor("EnergyN", "Energy Night", Some("kWh"), Some(DeviceClass::Energy)),
    sensor("PowerFlag", "Power Flag", None, None),
];

/// Raw `State` 1 means on; every other value means off.
fn power_state(raw: &Value) -> Value {
    let on = raw.as_f64() == Some(1.0) || raw.as_bool() == Some(true);
    Value::from(if on { "ON" } else { "OFF" })
}

/// One sensor's current value, as exposed to consumers.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct SensorState {
    /// Stable id: `eldom_<device_id>_<key>`.
    pub unique_id: String,
    pub key: String,
    /// Display name: `<name> (<device_id>)`.
    pub name: String,
    pub unit: Option<String>,
    pub device_class: Option<DeviceClass>,
    /// `null` until a frame carrying this field arrives.
    #[schema(value_type = Object)]
    pub state: Value,
}

/// Last known sensor values for one boiler.
#[derive(Debug, Clone)]
pub struct BoilerSensors {
    device_id: String,
    values: HashMap<&'static str, Value>,
    updated_at: Option<DateTime<Utc>>,
}

impl BoilerSensors {
    pub fn new(device_id: &str) -> Self {
        Self {
            device_id: device_id.to_owned(),
            values: HashMap::new(),
            updated_at: None,
        }
    }

    /// Fold a snapshot into the current values. Returns how many sensors
    /// received a value from it.
    pub fn apply(&mut self, snapshot: &TelemetrySnapshot) -> usize {
        let Some(fields) = snapshot.fields() else {
            return 0;
        };

        let mut applied = 0;
        for description in SENSORS {
            match fields.get(description.key) {
                None | Some(Value::Null) => {}
                Some(raw) => {
                    let value = if description.key == STATE_KEY {
                        power_state(raw)
                    } else {
                        raw.clone()
                    };
                    self.values.insert(description.key, value);
                    applied += 1;
                }
            }
        }

        if applied > 0 {
            self.updated_at = Some(snapshot.received_at);
        }
        applied
    }

    pub fn reading(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    pub fn updated_at(&self) -> Option<DateTime<Utc>> {
        self.updated_at
    }

    /// Every sensor in table order, including ones with no value yet.
    pub fn states(&self) -> Vec<SensorState> {
        SENSORS
            .iter()
            .map(|d| SensorState {
                unique_id: format!("eldom_{}_{}", self.device_id, d.key),
                key: d.key.to_owned(),
                name: format!("{} ({})", d.name, self.device_id),
                unit: d.unit.map(str::to_owned),
                device_class: d.device_class,
                state: self.values.get(d.key).cloned().unwrap_or(Value::Null),
            })
            .collect()
    }
}

/// Projected sensors for every boiler, kept current as a store observer.
///
/// Backed by a `DashMap` so the synchronous observer callback never waits on
/// an async lock. Cheap to clone; clones share state.
#[derive(Debug, Clone, Default)]
pub struct ProjectionBoard {
    boilers: Arc<DashMap<String, BoilerSensors>>,
}

impl ProjectionBoard {
    /// Pre-register boilers so their sensors exist before the first frame.
    pub fn new<I>(device_ids: I) -> Self
    where
        I: IntoIterator<Item = String>,
    {
        let boilers = DashMap::new();
        for id in device_ids {
            let sensors = BoilerSensors::new(&id);
            boilers.insert(id, sensors);
        }
        Self {
            boilers: Arc::new(boilers),
        }
    }

    pub fn contains(&self, device_id: &str) -> bool {
        self.boilers.contains_key(device_id)
    }

    /// Sorted list of known boiler ids.
    pub fn device_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.boilers.iter().map(|e| e.key().clone()).collect();
        ids.sort();
        ids
    }

    pub fn sensors(&self, device_id: &str) -> Option<Vec<SensorState>> {
        self.boilers.get(device_id).map(|b| b.states())
    }

    pub fn reading(&self, device_id: &str, key: &str) -> Option<Value> {
        let boiler = self.boilers.get(device_id)?;
        boiler.reading(key).cloned()
    }
}

impl SnapshotObserver for ProjectionBoard {
    fn on_snapshot_updated(&self, device_id: &str, snapshot: &TelemetrySnapshot) {
        let mut boiler = self
            .boilers
            .entry(device_id.to_owned())
            .or_insert_with(|| BoilerSensors::new(device_id));
        let applied = boiler.apply(snapshot);
        debug!(device_id = %device_id, applied, "Projected telemetry snapshot");
    }
}
