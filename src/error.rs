use std::time::Duration;

use reqwest::StatusCode;
use thiserror::Error;
use tokio_tungstenite::tungstenite;

/// Failures surfaced by the MyEldom client and the telemetry pipeline.
///
/// `Auth` is fatal to start-up. Every other variant is recoverable: the
/// supervisor reconnects after stream failures, malformed frames are skipped
/// and control failures are reported to the caller.
#[derive(Debug, Error)]
pub enum BridgeError {
    #[error("login rejected: expected a redirect, got {status}")]
    Auth { status: StatusCode },

    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("WebSocket connect failed: {0}")]
    Connect(#[source] Box<tungstenite::Error>),

    #[error("WebSocket handshake did not complete within {timeout:?}")]
    HandshakeTimeout { timeout: Duration },

    #[error("WebSocket stream error: {0}")]
    Stream(#[source] Box<tungstenite::Error>),

    #[error("malformed telemetry frame: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("{operation} returned {status}")]
    Control {
        operation: &'static str,
        status: StatusCode,
    },

    #[error("invalid endpoint URL {url:?}: {reason}")]
    InvalidUrl { url: String, reason: String },
}

impl BridgeError {
    pub(crate) fn connect(e: tungstenite::Error) -> Self {
        Self::Connect(Box::new(e))
    }

    pub(crate) fn stream(e: tungstenite::Error) -> Self {
        Self::Stream(Box::new(e))
    }
}
