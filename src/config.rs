use std::{collections::HashSet, fmt, time::Duration};

use anyhow::{bail, Context, Result};

// ---------------------------------------------------------------------------
// Credentials
// ---------------------------------------------------------------------------

/// MyEldom account used for the one-shot form login.
#[derive(Clone)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct Config {
    pub credentials: Credentials,
    /// Boilers to subscribe to.
    /// Format: `"id1,id2"`. At least one id, no duplicates.
    pub device_ids: Vec<String>,
    /// Origin of the REST API, without a trailing slash.
    pub base_url: String,
    /// Telemetry WebSocket endpoint.
    pub ws_url: String,
    /// Fixed wait between telemetry reconnect attempts, in seconds.
    pub reconnect_delay_secs: u64,
    /// Upper bound for any single REST call, in seconds.
    pub http_timeout_secs: u64,
    pub server_host: String,
    pub server_port: u16,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            credentials: Credentials {
                email: required("MYELDOM_EMAIL")?,
                password: required("MYELDOM_PASSWORD")?,
            },
            device_ids: parse_device_ids(&required("MYELDOM_DEVICE_IDS")?)?,
            base_url: optional("MYELDOM_BASE_URL", "https://myeldom.com")
                .trim_end_matches('/')
                .to_owned(),
            ws_url: optional("MYELDOM_WS_URL", "wss://myeldom.com/"),
            reconnect_delay_secs: positive_secs(
                "RECONNECT_DELAY_SECS",
                &optional("RECONNECT_DELAY_SECS", "5"),
            )?,
            http_timeout_secs: positive_secs(
                "HTTP_TIMEOUT_SECS",
                &optional("HTTP_TIMEOUT_SECS", "10"),
            )?,
            server_host: optional("SERVER_HOST", "0.0.0.0"),
            server_port: optional("SERVER_PORT", "8080")
                .parse()
                .context("SERVER_PORT must be a valid port number")?,
        })
    }

    pub fn reconnect_delay(&self) -> Duration {
        Duration::from_secs(self.reconnect_delay_secs)
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }
}

/// Parse `"id1,id2"` into an ordered list of boiler ids.
///
/// Blank entries are skipped. An empty list or a repeated id is an error,
/// since each boiler owns exactly one telemetry subscription.
fn parse_device_ids(raw: &str) -> Result<Vec<String>> {
    let mut seen = HashSet::new();
    let mut ids = Vec::new();

    for id in raw.split(',').map(str::trim).filter(|s| !s.is_empty()) {
        if !seen.insert(id) {
            bail!("duplicate device id in MYELDOM_DEVICE_IDS: {id:?}");
        }
        ids.push(id.to_owned());
    }

    if ids.is_empty() {
        bail!("MYELDOM_DEVICE_IDS must name at least one device");
    }
    Ok(ids)
}

/// Whole seconds, at least one. Zero would make every request time out or
/// spin the reconnect loop.
fn positive_secs(key: &str, raw: &str) -> Result<u64> {
    let secs: u64 = raw
        .trim()
        .parse()
        .with_context(|| format!("{key} must be a positive integer, got {raw:?}"))?;
    if secs == 0 {
        bail!("{key} must be at least 1 second");
    }
    Ok(secs)
}

fn required(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("missing required env var: {key}"))
}

fn optional(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_owned())
}
