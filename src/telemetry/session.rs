use async_trait::async_trait;
use futures_util::{SinkExt, Stream, StreamExt};
use serde_json::Value;
use tokio::time;
use tokio_tungstenite::{
    connect_async,
    tungstenite::{self, Message},
};
use tracing::{debug, info, warn};

use crate::{
    eldom::{models::SubscribeRequest, EldomClient},
    error::BridgeError,
    shutdown::Shutdown,
    telemetry::store::TelemetryStore,
};

/// How a telemetry session ended without an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEnd {
    /// The server closed the socket or the stream ran dry.
    Closed,
    /// The shutdown signal fired.
    Cancelled,
}

/// One connection lifetime of a telemetry feed.
///
/// Implementations write every decoded payload into `store` and return when
/// the connection ends. An `Err` means the session failed and the caller
/// may reconnect.
#[async_trait]
pub trait TelemetrySource: Send + Sync {
    async fn run_session(
        &self,
        device_id: &str,
        store: &TelemetryStore,
        shutdown: &mut Shutdown,
    ) -> Result<SessionEnd, BridgeError>;
}

/// The MyEldom message-distributor WebSocket.
#[derive(Debug, Clone)]
pub struct WsTelemetrySource {
    client: EldomClient,
}

impl WsTelemetrySource {
    pub fn new(client: EldomClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl TelemetrySource for WsTelemetrySource {
    async fn run_session(
        &self,
        device_id: &str,
        store: &TelemetryStore,
        shutdown: &mut Shutdown,
    ) -> Result<SessionEnd, BridgeError> {
        let request = self.client.websocket_request()?;
        let subscribe = SubscribeRequest::for_device(device_id)?.to_frame()?;
        let limit = self.client.handshake_timeout();
        debug!(device_id = %device_id, url = %self.client.ws_url(), "Opening telemetry WebSocket");

        let handshake = async {
            let (socket, _) = connect_async(request).await.map_err(BridgeError::connect)?;
            let (mut sink, frames) = socket.split();
            sink.send(Message::Text(subscribe))
                .await
                .map_err(BridgeError::connect)?;
            Ok::<_, BridgeError>((sink, frames))
        };

        // A peer that accepts TCP but never upgrades must not pin the session.
        let (mut sink, frames) = tokio::select! {
            biased;
            _ = shutdown.triggered() => return Ok(SessionEnd::Cancelled),
            done = time::timeout(limit, handshake) => {
                done.map_err(|_| BridgeError::HandshakeTimeout { timeout: limit })??
            }
        };
        info!(device_id = %device_id, "Subscribed to telemetry channel");

        let end = pump(device_id, frames, store, shutdown).await;
        if matches!(end, Ok(SessionEnd::Cancelled)) {
            // Best effort; the process is shutting down either way.
            let _ = sink.close().await;
        }
        end
    }
}

/// Drive one session's receive loop.
///
/// Text frames are decoded and stored; a frame that is not JSON is logged
/// and skipped. Binary and control frames are ignored. A receive error ends
/// the session with `BridgeError::Stream` and is never stored.
pub async fn pump<S>(
    device_id: &str,
    mut frames: S,
    store: &TelemetryStore,
    shutdown: &mut Shutdown,
) -> Result<SessionEnd, BridgeError>
where
    S: Stream<Item = Result<Message, tungstenite::Error>> + Unpin,
{
    loop {
        let next = tokio::select! {
            biased;
            _ = shutdown.triggered() => return Ok(SessionEnd::Cancelled),
            next = frames.next() => next,
        };

        match next {
            None => return Ok(SessionEnd::Closed),
            Some(Err(e)) => return Err(BridgeError::stream(e)),
            Some(Ok(Message::Text(text))) => match decode_frame(&text) {
                Ok(payload) => {
                    debug!(device_id = %device_id, payload = %payload, "Received telemetry");
                    store.update(device_id, payload).await;
                }
                Err(e) => {
                    warn!(device_id = %device_id, error = %e, "Skipping malformed telemetry frame");
                }
            },
            Some(Ok(Message::Close(frame))) => {
                info!(device_id = %device_id, frame = ?frame, "Telemetry WebSocket closed by server");
                return Ok(SessionEnd::Closed);
            }
            Some(Ok(_)) => {}
        }
    }
}

fn decode_frame(text: &str) -> Result<Value, BridgeError> {
    Ok(serde_json::from_str(text)?)
}
