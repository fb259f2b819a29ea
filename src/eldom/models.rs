use serde::Serialize;

/// Provider id MyEldom assigns to flat boilers on the message distributor.
pub const PROVIDER_ID: u8 = 9;
/// Distributor command that starts a telemetry stream.
pub const SUBSCRIBE_COMMAND: u8 = 2;

// ---------------------------------------------------------------------------
// Telemetry subscription
// ---------------------------------------------------------------------------

/// Outbound frame sent once per WebSocket session, right after connecting.
///
/// `Data` carries a JSON document encoded as a string, not a nested object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubscribeRequest {
    #[serde(rename = "MessageType")]
    pub message_type: &'static str,
    #[serde(rename = "Data")]
    pub data: String,
}

#[derive(Debug, Serialize)]
struct SubscribeData<'a> {
    #[serde(rename = "Data")]
    device_id: &'a str,
    #[serde(rename = "ProviderID")]
    provider_id: u8,
    #[serde(rename = "Command")]
    command: u8,
}

impl SubscribeRequest {
    pub fn for_device(device_id: &str) -> Result<Self, serde_json::Error> {
        let data = serde_json::to_string(&SubscribeData {
            device_id,
            provider_id: PROVIDER_ID,
            command: SUBSCRIBE_COMMAND,
        })?;
        Ok(Self {
            message_type: "MessageDistributor",
            data,
        })
    }

    /// Compact JSON text for the WebSocket frame.
    pub fn to_frame(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

// ---------------------------------------------------------------------------
// Control commands
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SetTemperatureRequest<'a> {
    pub device_id: &'a str,
    /// Degrees Celsius
    pub temperature: u8,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SetStateRequest<'a> {
    pub device_id: &'a str,
    /// 1 = on, 0 = off
    pub state: u8,
}

impl<'a> SetStateRequest<'a> {
    pub fn new(device_id: &'a str, on: bool) -> Self {
        Self {
            device_id,
            state: u8::from(on),
        }
    }
}
