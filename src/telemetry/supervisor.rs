use std::time::Duration;

use tokio::time;
use tracing::{error, info, warn};

use crate::{
    shutdown::Shutdown,
    telemetry::{
        session::{SessionEnd, TelemetrySource},
        store::TelemetryStore,
    },
};

pub const DEFAULT_RECONNECT_DELAY: Duration = Duration::from_secs(5);

/// Wait applied between telemetry sessions. Fixed: no growth, no jitter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub delay: Duration,
}

impl RetryPolicy {
    pub fn fixed(delay: Duration) -> Self {
        Self { delay }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::fixed(DEFAULT_RECONNECT_DELAY)
    }
}

/// Keeps one device's telemetry subscription alive for as long as the
/// process wants it.
pub struct ReconnectSupervisor<S> {
    source: S,
    device_id: String,
    store: TelemetryStore,
    policy: RetryPolicy,
}

impl<S: TelemetrySource> ReconnectSupervisor<S> {
    pub fn new(source: S, device_id: String, store: TelemetryStore, policy: RetryPolicy) -> Self {
        Self {
            source,
            device_id,
            store,
            policy,
        }
    }

    /// Runs sessions back to back until `shutdown` fires, sleeping
    /// `policy.delay` after every session that ends for any other reason.
    /// Spawn this via `tokio::spawn`. Returns the number of sessions started.
    pub async fn run(self, mut shutdown: Shutdown) -> u64 {
        let device_id = self.device_id.as_str();
        info!(
            device_id = %device_id,
            delay_secs = self.policy.delay.as_secs_f64(),
            "Telemetry supervisor started"
        );

        let mut attempts: u64 = 0;
        while !shutdown.is_triggered() {
            attempts += 1;
            match self
                .source
                .run_session(device_id, &self.store, &mut shutdown)
                .await
            {
                Ok(SessionEnd::Cancelled) => break,
                Ok(SessionEnd::Closed) => {
                    warn!(device_id = %device_id, attempt = attempts, "Telemetry session closed");
                }
                Err(e) => {
                    error!(device_id = %device_id, attempt = attempts, error = %e, "Telemetry session failed");
                }
            }

            tokio::select! {
                biased;
                _ = shutdown.triggered() => break,
                _ = time::sleep(self.policy.delay) => {}
            }
        }

        info!(device_id = %device_id, attempts, "Telemetry supervisor stopped");
        attempts
    }
}
